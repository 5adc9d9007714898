//! Tagged binary records.
//!
//! A record is a sequence of `(tag, payload)` pairs closed by [`TAG_END`]. Tags are 16 bit
//! little-endian words. The payload shape is implied by the tag, there is no length prefix.
//!
//! 32 bit integers are stored as two 16 bit little-endian words, low word first:
//! ```notrust
//! 0x12345678 => 78 56 34 12
//! |--lo--||--hi--|
//! ```
//!
//! Strings are an integer byte length followed by that many bytes of UTF-8.

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

mod reader;
mod writer;

pub use reader::TagReader;
pub use writer::TagWriter;

/// A tag identifier
pub type Tag = u16;

/// Closes a record. Carries no payload.
pub const TAG_END: Tag = 0xFFAA;

/// Cell flags, followed by one integer.
pub const TAG_FLAGS: Tag = 0xF001;

pub type TagResult<T> = Result<T, TagError>;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Truncated record: needed {needed} bytes, found {got}")]
    TruncatedRecord { needed: usize, got: usize },

    #[error("Unknown tag 0x{tag:04X}")]
    UnknownTag { tag: Tag },

    #[error("Negative string length: {len}")]
    NegativeLength { len: i32 },

    #[error("String payload is not UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Split an integer into its on-disk words, low word first.
pub(crate) const fn split_words(v: i32) -> (u16, u16) {
    let v = v as u32;

    ((v & 0xFFFF) as u16, (v >> 16) as u16)
}

/// Inverse of [`split_words`].
pub(crate) const fn join_words(lo: u16, hi: u16) -> i32 {
    ((hi as u32) << 16 | lo as u32) as i32
}
