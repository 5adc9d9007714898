use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use super::Tag;
use super::TagResult;
use super::split_words;

/// Sequential encoder for a tagged byte stream. Mirrors [`super::TagReader`].
///
/// Dropping the writer releases the sink, but buffered bytes are only guaranteed on disk after
/// [`TagWriter::finish`].
pub struct TagWriter<W> {
    inner: W,
}

impl TagWriter<BufWriter<File>> {
    /// Create or truncate the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;

        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TagWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> TagResult<W> {
        self.inner.flush()?;

        Ok(self.inner)
    }

    pub fn write_u8(&mut self, b: u8) -> TagResult<()> {
        self.inner.write_all(&[b])?;

        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> TagResult<()> {
        self.inner.write_all(&v.to_le_bytes())?;

        Ok(())
    }

    /// Write an integer as two words, low word first.
    pub fn write_i32(&mut self, v: i32) -> TagResult<()> {
        let (lo, hi) = split_words(v);
        self.write_u16(lo)?;
        self.write_u16(hi)
    }

    /// Write the UTF-8 byte length followed by the bytes.
    pub fn write_string(&mut self, s: &str) -> TagResult<()> {
        let bytes = s.as_bytes();
        let len = i32::try_from(bytes.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "string too long for record")
        })?;

        self.write_i32(len)?;
        self.inner.write_all(bytes)?;

        Ok(())
    }

    /// Write a tag with no payload.
    pub fn write_tag(&mut self, tag: Tag) -> TagResult<()> {
        self.write_u16(tag)
    }

    /// Write a tag followed by one integer.
    pub fn write_tag_i32(&mut self, tag: Tag, v: i32) -> TagResult<()> {
        self.write_tag(tag)?;
        self.write_i32(v)
    }
}
