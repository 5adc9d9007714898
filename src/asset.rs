use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::cell::CellError;
use crate::cell::CellInfo;

/// Directory under the asset root holding cell files.
pub const CELLS_DIR: &str = "cells";

/// Extension of a cell file, without the dot.
pub const CELL_EXT: &str = "cell";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Cell already exists: {path:?}")]
    AlreadyExists { path: PathBuf },

    #[error("Invalid cell name \"{name}\"")]
    InvalidName { name: String },

    #[error("Cell error: {0}")]
    Cell(#[from] CellError),
}

/// `<root>/cells`
pub fn cells_dir<P: AsRef<Path>>(root: P) -> PathBuf {
    root.as_ref().join(CELLS_DIR)
}

/// `<root>/cells/<name>.cell`
pub fn cell_path<P: AsRef<Path>>(root: P, name: &str) -> PathBuf {
    cells_dir(root).join(format!("{name}.{CELL_EXT}"))
}

/// The display name of a cell file: its base name without the extension.
pub fn cell_name<P: AsRef<Path>>(path: P) -> Option<String> {
    let stem = path.as_ref().file_stem()?;

    Some(stem.to_string_lossy().into_owned())
}

/// Turn a command-line cell argument into a path.
///
/// With an asset root, a single path component without the `.cell` extension is a cell name and
/// maps to [`cell_path`]. Anything else is used as a path as-is.
pub fn resolve_cell(root: Option<&Path>, cell: &str) -> PathBuf {
    let as_path = Path::new(cell);
    let is_cell_file = as_path.extension().is_some_and(|ext| ext == CELL_EXT);
    let is_bare = as_path.components().count() == 1 && !cell.contains(['/', '\\']);

    match root {
        Some(root) if is_bare && !is_cell_file => cell_path(root, cell),
        _ => as_path.to_path_buf(),
    }
}

/// A name has to stay a single file name once placed in the cells directory.
fn validate_name(name: &str) -> Result<(), AssetError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');

    if bad {
        return Err(AssetError::InvalidName {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Create a new cell named `name` under `root` and save it with default flags.
///
/// An existing file is only replaced when `overwrite` is set. The cells directory has to exist.
pub fn create_cell<P: AsRef<Path>>(
    root: P,
    name: &str,
    overwrite: bool,
) -> Result<CellInfo, AssetError> {
    validate_name(name)?;

    let path = cell_path(root, name);
    if !overwrite && path.exists() {
        return Err(AssetError::AlreadyExists { path });
    }

    let cell = CellInfo::new(name, path);
    cell.save()?;

    info!(cell = name, path = ?cell.path, "Created cell");

    Ok(cell)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn cell_path_layout() {
        let path = cell_path("/game/assets", "water");

        assert_eq!(path, Path::new("/game/assets/cells/water.cell"));
    }

    #[test]
    fn cell_name_strips_extension() {
        assert_eq!(
            cell_name("/game/assets/cells/lava.cell").as_deref(),
            Some("lava")
        );
        assert_eq!(cell_name("/").as_deref(), None);
    }

    #[test]
    fn cell_name_of_cell_path() {
        let path = cell_path("assets", "moss.old");

        assert_eq!(cell_name(path).as_deref(), Some("moss.old"));
    }

    #[test]
    fn resolve_cell_names() {
        let root = Some(Path::new("/game/assets"));

        assert_eq!(
            resolve_cell(root, "water"),
            Path::new("/game/assets/cells/water.cell")
        );
        assert_eq!(
            resolve_cell(root, "moss.old"),
            Path::new("/game/assets/cells/moss.old.cell")
        );
    }

    #[test]
    fn resolve_cell_paths() {
        let root = Some(Path::new("/game/assets"));

        assert_eq!(resolve_cell(root, "lava.cell"), Path::new("lava.cell"));
        assert_eq!(
            resolve_cell(root, "other/cells/lava"),
            Path::new("other/cells/lava")
        );
        assert_eq!(resolve_cell(None, "water"), Path::new("water"));
        assert_eq!(resolve_cell(None, "moss.old"), Path::new("moss.old"));
    }

    #[test]
    fn rejects_path_like_names() {
        for name in ["", ".", "..", "a/b", "a\\b"] {
            let err = validate_name(name).unwrap_err();
            assert!(matches!(err, AssetError::InvalidName { .. }), "{name}");
        }

        validate_name("unnamed").unwrap();
    }
}
