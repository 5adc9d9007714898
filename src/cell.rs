use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::flags::CellFlags;
use crate::tag::TAG_END;
use crate::tag::TAG_FLAGS;
use crate::tag::TagError;
use crate::tag::TagReader;
use crate::tag::TagResult;
use crate::tag::TagWriter;

/// What the decoder does with a tag it has no payload shape for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTagPolicy {
    /// Treat the tag as having no payload and keep reading.
    ///
    /// Foreign tags that do carry a payload will desynchronize the stream.
    #[default]
    Skip,

    /// Fail with [`TagError::UnknownTag`].
    Reject,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoadOptions {
    pub unknown_tags: UnknownTagPolicy,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self {
            unknown_tags: UnknownTagPolicy::Reject,
        }
    }
}

#[derive(Debug, Error)]
pub enum CellError {
    #[error("Failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: TagError,
    },

    #[error("Failed to encode {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: TagError,
    },
}

/// A cell asset.
///
/// Only `flags` is stored in the file. `name` and `path` come from where the file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellInfo {
    pub name: String,
    pub path: PathBuf,
    pub flags: CellFlags,
}

impl CellInfo {
    /// A cell that has never been saved, with default flags.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            flags: CellFlags::default(),
        }
    }

    /// Load the cell at `path`, naming it after the file's base name.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CellError> {
        let path = path.as_ref();
        let name = crate::asset::cell_name(path).unwrap_or_default();

        let mut cell = Self::new(name, path);
        cell.load()?;

        Ok(cell)
    }

    /// Re-read `flags` from disk.
    pub fn load(&mut self) -> Result<(), CellError> {
        self.load_with(LoadOptions::default())
    }

    pub fn load_with(&mut self, options: LoadOptions) -> Result<(), CellError> {
        let mut reader = TagReader::open(&self.path).map_err(|source| CellError::Open {
            path: self.path.clone(),
            source,
        })?;

        self.flags = Self::decode(&mut reader, options).map_err(|source| CellError::Decode {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = ?self.path, flags = %self.flags, "Loaded cell");

        Ok(())
    }

    /// Overwrite the file at `path` with this cell.
    ///
    /// Missing directories are not created, and an existing file is truncated without notice.
    pub fn save(&self) -> Result<(), CellError> {
        let mut writer = TagWriter::create(&self.path).map_err(|source| CellError::Create {
            path: self.path.clone(),
            source,
        })?;

        self.encode(&mut writer)
            .and_then(|()| writer.finish())
            .map_err(|source| CellError::Encode {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = ?self.path, flags = %self.flags, "Saved cell");

        Ok(())
    }

    /// Decode a record's flags from `reader`.
    ///
    /// Stops at the end tag, or quietly at the end of the stream if the end tag is missing.
    /// Flags start at their default and each flags tag overrides them.
    pub fn decode<R: BufRead>(
        reader: &mut TagReader<R>,
        options: LoadOptions,
    ) -> TagResult<CellFlags> {
        let mut flags = CellFlags::default();

        while let Some(tag) = reader.read_tag()? {
            trace!("Read tag 0x{tag:04X}");

            match tag {
                TAG_END => break,

                TAG_FLAGS => {
                    flags = CellFlags::from_bits_retain(reader.read_i32()?);
                }

                tag => match options.unknown_tags {
                    UnknownTagPolicy::Skip => {
                        warn!("Skipping unknown tag 0x{tag:04X}");
                    }
                    UnknownTagPolicy::Reject => return Err(TagError::UnknownTag { tag }),
                },
            }
        }

        Ok(flags)
    }

    /// Encode this cell as a complete record.
    pub fn encode<W: Write>(&self, writer: &mut TagWriter<W>) -> TagResult<()> {
        writer.write_tag_i32(TAG_FLAGS, self.flags.bits())?;
        writer.write_tag(TAG_END)
    }

    /// The record as bytes.
    pub fn to_bytes(&self) -> TagResult<Vec<u8>> {
        let mut writer = TagWriter::new(Vec::new());
        self.encode(&mut writer)?;

        writer.finish()
    }

    /// Decode flags from an in-memory record.
    pub fn flags_from_bytes(bytes: &[u8], options: LoadOptions) -> TagResult<CellFlags> {
        let mut reader = TagReader::new(bytes);

        Self::decode(&mut reader, options)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn cell_with(flags: CellFlags) -> CellInfo {
        let mut cell = CellInfo::new("stone", "/assets/cells/stone.cell");
        cell.flags = flags;
        cell
    }

    #[test]
    fn fresh_cell_is_solid() {
        let cell = CellInfo::new("stone", "stone.cell");

        assert_eq!(cell.flags, CellFlags::SOLID);
        assert_eq!(cell.flags.bits(), 1);
    }

    #[test]
    fn encoded_layout() {
        let cell = cell_with(CellFlags::SOLID | CellFlags::LIQUID);
        let bytes = cell.to_bytes().unwrap();

        insta::assert_snapshot!(format!("{bytes:02X?}"), @"[01, F0, 11, 00, 00, 00, AA, FF]");
    }

    #[test]
    fn encoded_layout_word_order() {
        let cell = cell_with(CellFlags::from_bits_retain(0x1234_5678));
        let bytes = cell.to_bytes().unwrap();

        assert_eq!(bytes, [0x01, 0xF0, 0x78, 0x56, 0x34, 0x12, 0xAA, 0xFF]);
    }

    #[test]
    fn end_only_keeps_default() {
        let flags = CellInfo::flags_from_bytes(&[0xAA, 0xFF], LoadOptions::default()).unwrap();

        assert_eq!(flags, CellFlags::SOLID);
    }

    #[test]
    fn empty_stream_keeps_default() {
        let flags = CellInfo::flags_from_bytes(&[], LoadOptions::default()).unwrap();

        assert_eq!(flags, CellFlags::SOLID);
    }

    #[test]
    fn missing_end_tag() {
        let bytes = [0x01, 0xF0, 0x02, 0x00, 0x00, 0x00];
        let flags = CellInfo::flags_from_bytes(&bytes, LoadOptions::default()).unwrap();

        assert_eq!(flags, CellFlags::TRANSPARENT);
    }

    #[test]
    fn stops_at_end_tag() {
        // A second flags tag past the end is never read
        let bytes = [
            0x01, 0xF0, 0x04, 0x00, 0x00, 0x00, 0xAA, 0xFF, 0x01, 0xF0, 0x10, 0x00, 0x00, 0x00,
        ];
        let flags = CellInfo::flags_from_bytes(&bytes, LoadOptions::default()).unwrap();

        assert_eq!(flags, CellFlags::DYNAMIC);
    }

    #[test]
    fn last_flags_tag_wins() {
        let bytes = [
            0x01, 0xF0, 0x04, 0x00, 0x00, 0x00, 0x01, 0xF0, 0x10, 0x00, 0x00, 0x00, 0xAA, 0xFF,
        ];
        let flags = CellInfo::flags_from_bytes(&bytes, LoadOptions::default()).unwrap();

        assert_eq!(flags, CellFlags::LIQUID);
    }

    #[test]
    fn truncated_flags_payload() {
        let bytes = [0x01, 0xF0, 0x02, 0x00];
        let err = CellInfo::flags_from_bytes(&bytes, LoadOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            TagError::TruncatedRecord { needed: 2, got: 0 }
        ));
    }

    #[test]
    fn unknown_tags_skipped() {
        // Two payload-less foreign tags ahead of the flags
        let bytes = [
            0x02, 0xF0, 0x34, 0x12, 0x01, 0xF0, 0x00, 0x10, 0x00, 0x00, 0xAA, 0xFF,
        ];
        let flags = CellInfo::flags_from_bytes(&bytes, LoadOptions::default()).unwrap();

        assert_eq!(flags, CellFlags::LADDER);
    }

    #[test]
    fn unknown_tags_rejected() {
        let bytes = [0x02, 0xF0, 0x01, 0xF0, 0x00, 0x10, 0x00, 0x00, 0xAA, 0xFF];
        let err = CellInfo::flags_from_bytes(&bytes, LoadOptions::strict()).unwrap_err();

        assert!(matches!(err, TagError::UnknownTag { tag: 0xF002 }));
    }

    proptest! {
        #[test]
        fn flags_round_trip(bits in any::<i32>()) {
            let cell = cell_with(CellFlags::from_bits_retain(bits));
            let bytes = cell.to_bytes().unwrap();

            let flags = CellInfo::flags_from_bytes(&bytes, LoadOptions::strict()).unwrap();
            prop_assert_eq!(flags.bits(), bits);
        }
    }
}
