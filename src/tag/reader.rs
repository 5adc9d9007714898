use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use super::Tag;
use super::TagError;
use super::TagResult;
use super::join_words;

/// Forward-only decoder over a tagged byte stream.
///
/// The reader owns its source. For files that means the handle is closed when the reader is
/// dropped, on error paths included.
pub struct TagReader<R> {
    inner: R,
}

impl TagReader<BufReader<File>> {
    /// Open `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;

        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TagReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Whether the source has no bytes left.
    pub fn is_eof(&mut self) -> TagResult<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    /// Read the next tag id.
    ///
    /// Returns `None` once the source is exhausted. A single dangling byte is a truncated record.
    pub fn read_tag(&mut self) -> TagResult<Option<Tag>> {
        if self.is_eof()? {
            return Ok(None);
        }

        self.read_u16().map(Some)
    }

    pub fn read_u16(&mut self) -> TagResult<u16> {
        let bytes = self.read_array::<2>()?;

        Ok(u16::from_le_bytes(bytes))
    }

    /// Read an integer stored as two words, low word first.
    pub fn read_i32(&mut self) -> TagResult<i32> {
        let lo = self.read_u16()?;
        let hi = self.read_u16()?;

        Ok(join_words(lo, hi))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> TagResult<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(TagError::NegativeLength { len });
        }

        let needed = len as usize;

        // Don't trust the prefix for the allocation, the stream may be much shorter
        let mut bytes = Vec::with_capacity(needed.min(4096));
        (&mut self.inner).take(needed as u64).read_to_end(&mut bytes)?;

        if bytes.len() < needed {
            return Err(TagError::TruncatedRecord {
                needed,
                got: bytes.len(),
            });
        }

        Ok(String::from_utf8(bytes)?)
    }

    fn read_array<const N: usize>(&mut self) -> TagResult<[u8; N]> {
        let mut buf = [0u8; N];
        let mut got = 0;

        while got < N {
            match self.inner.read(&mut buf[got..]) {
                Ok(0) => return Err(TagError::TruncatedRecord { needed: N, got }),
                Ok(n) => got += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(buf)
    }
}
