//! Byte sources the decoder can stream from.
//!
//! The decoder owns exactly one reader for its whole life. Streaming reads
//! move a cursor forward; [`Reader::load`] is the one odd operation, an
//! absolute read that leaves the streaming cursor where it was. That's what
//! lets the decoder store `(offset, length)` references to frame data on the
//! first pass and pull the actual bytes back out on every later pass.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::ApngResult;

/// A positioned byte source.
///
/// Both implementations have identical semantics; they differ only in the
/// backing storage. A short read is an error (`UnexpectedEof`), never a
/// partial fill.
pub trait Reader {
  /// Reads exactly `buf.len()` bytes at the cursor, advancing it.
  fn read(&mut self, buf: &mut [u8]) -> ApngResult<()>;

  /// Moves the cursor to an absolute offset.
  fn seek_to(&mut self, offset: u64) -> ApngResult<()>;

  /// The cursor's current absolute offset.
  fn offset(&self) -> u64;

  /// Reads `length` bytes at `offset` without disturbing the cursor.
  fn load(&mut self, offset: u64, length: usize) -> ApngResult<Vec<u8>> {
    let saved = self.offset();
    self.seek_to(offset)?;
    let mut buf = vec![0; length];
    let r = self.read(&mut buf);
    self.seek_to(saved)?;
    r?;
    Ok(buf)
  }
}

/// A [`Reader`] over a byte buffer already in memory.
#[derive(Debug, Clone)]
pub struct MemoryReader {
  bytes: Vec<u8>,
  pos: usize,
}
impl MemoryReader {
  #[inline]
  #[must_use]
  pub const fn new(bytes: Vec<u8>) -> Self {
    Self { bytes, pos: 0 }
  }
}
impl Reader for MemoryReader {
  fn read(&mut self, buf: &mut [u8]) -> ApngResult<()> {
    let end = self.pos.saturating_add(buf.len());
    if end > self.bytes.len() {
      return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    buf.copy_from_slice(&self.bytes[self.pos..end]);
    self.pos = end;
    Ok(())
  }
  fn seek_to(&mut self, offset: u64) -> ApngResult<()> {
    // seeking past the end is fine, the next read is what fails.
    self.pos = offset as usize;
    Ok(())
  }
  #[inline]
  fn offset(&self) -> u64 {
    self.pos as u64
  }
}

/// A [`Reader`] over a seekable file handle.
pub struct FileReader {
  file: BufReader<File>,
  pos: u64,
}
impl FileReader {
  /// Opens the file at `path` for streaming.
  pub fn open<P: AsRef<Path>>(path: P) -> ApngResult<Self> {
    let file = File::open(path)?;
    Ok(Self { file: BufReader::new(file), pos: 0 })
  }
}
impl Reader for FileReader {
  fn read(&mut self, buf: &mut [u8]) -> ApngResult<()> {
    match self.file.read_exact(buf) {
      Ok(()) => {
        self.pos += buf.len() as u64;
        Ok(())
      }
      Err(e) => {
        // a failed exact read may have consumed bytes; re-sync the tracked
        // position with the handle before reporting.
        self.pos = self.file.stream_position().unwrap_or(self.pos);
        Err(e.into())
      }
    }
  }
  fn seek_to(&mut self, offset: u64) -> ApngResult<()> {
    if offset != self.pos {
      self.file.seek(SeekFrom::Start(offset))?;
      self.pos = offset;
    }
    Ok(())
  }
  #[inline]
  fn offset(&self) -> u64 {
    self.pos
  }
}
