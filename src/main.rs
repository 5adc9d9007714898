//! `cellfile` - inspect and edit cell assets from the terminal
//!
//! ```bash
//! cellfile show assets/cells/water.cell
//! cellfile --assets assets new lava
//! cellfile set assets/cells/lava.cell "LIQUID | VISCOUS"
//! cellfile set --add assets/cells/lava.cell DO_NOT_RENDER
//! ```

use std::io;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap::Subcommand;
use crossterm::execute;
use crossterm::style;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use cellfile::asset;
use cellfile::cell::CellInfo;
use cellfile::cell::LoadOptions;
use cellfile::flags::CellFlags;
use cellfile::flags::FlagsEdit;

#[derive(Parser)]
#[command(name = "cellfile")]
#[command(about = "Inspect and edit cell assets")]
#[command(version)]
struct Cli {
    /// Asset root, containing the `cells` directory
    #[arg(long, global = true, env = "CELLFILE_ASSETS")]
    assets: Option<PathBuf>,

    /// Fail on tags this version doesn't know instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the flags of one or more cells
    Show {
        /// Cell files, or cell names when `--assets` is set
        #[arg(required = true)]
        cells: Vec<String>,
    },

    /// Create a cell with default flags
    New {
        name: String,

        /// Replace an existing cell of the same name
        #[arg(long)]
        force: bool,
    },

    /// Change the flags of a cell
    Set {
        /// Cell file, or cell name when `--assets` is set
        cell: String,

        /// Flags such as "SOLID | LIQUID", or "(none)"
        flags: CellFlags,

        /// Set these flags, keeping the others
        #[arg(long, conflicts_with = "remove")]
        add: bool,

        /// Clear these flags, keeping the others
        #[arg(long)]
        remove: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let options = if cli.strict {
        LoadOptions::strict()
    } else {
        LoadOptions::default()
    };

    match cli.command {
        Command::Show { cells } => {
            for (i, cell) in cells.iter().enumerate() {
                let path = asset::resolve_cell(cli.assets.as_deref(), cell);
                let cell = open(&path, options)?;

                if i > 0 {
                    println!();
                }
                print_cell(&cell)?;
            }
        }

        Command::New { name, force } => {
            let Some(root) = cli.assets else {
                bail!("An asset root is required, use --assets or CELLFILE_ASSETS");
            };

            let res = asset::create_cell(&root, &name, force);
            if let Err(asset::AssetError::AlreadyExists { path }) = &res {
                bail!("{path:?} already exists, pass --force to overwrite it");
            }

            let cell = res.with_context(|| format!("Failed to create cell \"{name}\""))?;
            print_cell(&cell)?;
        }

        Command::Set {
            cell,
            flags,
            add,
            remove,
        } => {
            let path = asset::resolve_cell(cli.assets.as_deref(), &cell);
            let mut cell = open(&path, options)?;

            let edit = match (add, remove) {
                (true, _) => FlagsEdit::Add,
                (_, true) => FlagsEdit::Remove,
                _ => FlagsEdit::Replace,
            };
            cell.flags = edit.apply(cell.flags, flags);

            cell.save()
                .with_context(|| format!("Failed to save {path:?}"))?;
            print_cell(&cell)?;
        }
    }

    Ok(())
}

fn open(path: &Path, options: LoadOptions) -> Result<CellInfo> {
    let name = asset::cell_name(path).unwrap_or_default();

    let mut cell = CellInfo::new(name, path);
    cell.load_with(options)
        .with_context(|| format!("Failed to load {path:?}"))?;

    Ok(cell)
}

fn print_cell(cell: &CellInfo) -> io::Result<()> {
    let mut stdout = io::stdout();

    execute!(
        stdout,
        style::PrintStyledContent(cell.name.as_str().bold()),
        style::Print(format!("  {}\n", cell.path.display())),
    )?;

    for (name, flag) in CellFlags::all().iter_names() {
        let line = if cell.flags.contains(flag) {
            format!("  [x] {name}").green()
        } else {
            format!("  [ ] {name}").dark_grey()
        };

        execute!(stdout, style::PrintStyledContent(line), style::Print("\n"))?;
    }

    let unknown = cell.flags.unknown_bits();
    if unknown != 0 {
        execute!(
            stdout,
            style::PrintStyledContent(format!("  unknown bits 0x{unknown:08X}").yellow()),
            style::Print("\n"),
        )?;
    }

    Ok(())
}
