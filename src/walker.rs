//! Peek-then-decide traversal of a chunk stream.
//!
//! The walker sits on a [`Reader`] and looks at one chunk at a time. Peeking
//! never consumes anything: the caller inspects the upcoming chunk's name
//! and length, then picks how to consume it (as a typed value, as a stored
//! reference with the payload skipped, or raw and verbatim). Choosing not to
//! consume leaves the cursor exactly before the chunk header so the next
//! traversal step sees the same chunk again.

use crate::chunk::{u32_be, ChunkName, ChunkParse};
use crate::frame::ChunkRef;
use crate::reader::Reader;
use crate::{ApngError, ApngResult};

/// The header of the chunk the walker is currently looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkHead {
  pub(crate) name: ChunkName,
  /// payload length in bytes (not counting name or CRC)
  pub(crate) length: u32,
  /// absolute offset of the chunk's 4-byte length field
  pub(crate) offset: u64,
}

pub(crate) struct Walker<'r> {
  reader: &'r mut dyn Reader,
  verify_crc: bool,
}
impl<'r> Walker<'r> {
  #[inline]
  pub(crate) fn new(reader: &'r mut dyn Reader, verify_crc: bool) -> Self {
    Self { reader, verify_crc }
  }

  /// Looks at the next chunk's header without consuming it.
  pub(crate) fn peek(&mut self) -> ApngResult<ChunkHead> {
    let offset = self.reader.offset();
    let mut head = [0; 8];
    let r = self.reader.read(&mut head);
    self.reader.seek_to(offset)?;
    r?;
    Ok(ChunkHead {
      name: ChunkName(head[4..8].try_into().unwrap()),
      length: u32_be(&head[0..4]),
      offset,
    })
  }

  /// Consumes the next chunk and parses it as `T`.
  ///
  /// The next chunk's name must match `T`'s; peek first if you're not sure.
  pub(crate) fn read_typed<T: ChunkParse>(&mut self) -> ApngResult<T> {
    let head = self.peek()?;
    let mut raw = vec![0; 12 + head.length as usize];
    self.reader.read(&mut raw)?;
    crate::chunk::parse_chunk(&raw, self.verify_crc)
  }

  /// Consumes the next chunk, returning its header and payload bytes.
  pub(crate) fn read_payload(&mut self) -> ApngResult<(ChunkHead, Vec<u8>)> {
    let head = self.peek()?;
    self.skip_bytes(8)?;
    let mut payload = vec![0; head.length as usize];
    self.reader.read(&mut payload)?;
    let mut crc = [0; 4];
    self.reader.read(&mut crc)?;
    if self.verify_crc && crate::chunk::crc32(head.name, &payload) != u32_be(&crc) {
      return Err(ApngError::ChecksumMismatch(head.name.0));
    }
    Ok((head, payload))
  }

  /// Consumes the next chunk, returning its bytes verbatim: header, payload
  /// and CRC included. This is how ancillary chunks get carried over into
  /// synthesized per-frame images untouched.
  pub(crate) fn read_raw(&mut self) -> ApngResult<(ChunkHead, Vec<u8>)> {
    let head = self.peek()?;
    let mut raw = vec![0; 12 + head.length as usize];
    self.reader.read(&mut raw)?;
    if self.verify_crc {
      let payload = &raw[8..8 + head.length as usize];
      let declared = u32_be(&raw[8 + head.length as usize..]);
      if crate::chunk::crc32(head.name, payload) != declared {
        return Err(ApngError::ChecksumMismatch(head.name.0));
      }
    }
    Ok((head, raw))
  }

  /// Consumes the next chunk (which should be an `IDAT`), recording only a
  /// reference to its payload bytes.
  pub(crate) fn read_idat_ref(&mut self) -> ApngResult<ChunkRef> {
    let head = self.peek()?;
    let r = ChunkRef { offset: head.offset + 8, length: head.length };
    if self.verify_crc {
      self.read_payload()?;
    } else {
      self.skip_bytes(12 + head.length as u64)?;
    }
    Ok(r)
  }

  /// Consumes the next chunk (which should be an `fdAT`), returning its
  /// sequence number and a reference to the payload bytes *after* the
  /// sequence number.
  pub(crate) fn read_fdat_ref(&mut self) -> ApngResult<(u32, ChunkRef)> {
    let head = self.peek()?;
    if head.length < 4 {
      return Err(ApngError::FileFormatError);
    }
    let r = ChunkRef { offset: head.offset + 12, length: head.length - 4 };
    let sequence_number = if self.verify_crc {
      let (_, payload) = self.read_payload()?;
      u32_be(&payload[0..4])
    } else {
      self.skip_bytes(8)?;
      let mut seq = [0; 4];
      self.reader.read(&mut seq)?;
      self.skip_bytes(head.length as u64 - 4 + 4)?;
      u32_be(&seq)
    };
    Ok((sequence_number, r))
  }

  #[inline]
  fn skip_bytes(&mut self, n: u64) -> ApngResult<()> {
    let offset = self.reader.offset();
    self.reader.seek_to(offset + n)
  }
}
