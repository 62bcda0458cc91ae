//! Typed encode/decode of the chunks the decoder touches.
//!
//! Every PNG chunk on the wire is `length ∥ name ∥ payload ∥ crc`, where the
//! CRC-32 covers `name ∥ payload`. The sub-modules here give each chunk type
//! the decoder cares about a typed parser, and the couple of encoders needed
//! to re-materialize a standalone PNG per frame.

use crate::{ApngError, ApngResult};

mod actl;
mod fctl;
mod fdat;
mod idat;
mod iend;
mod ihdr;

pub use actl::acTL;
pub use fctl::{fcTL, BlendOp, DisposeOp};
pub use fdat::fdAT;
pub use idat::IDAT;
pub use iend::{IEND, IEND_BYTES};
pub use ihdr::{ColorSpace, ColorType, IHDR};

/// A four byte chunk name, like `IHDR` or `fcTL`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkName(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkName {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const acTL: Self = Self(*b"acTL");
  pub const fcTL: Self = Self(*b"fcTL");
  pub const fdAT: Self = Self(*b"fdAT");
}
impl core::fmt::Debug for ChunkName {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    use core::fmt::Write;
    f.write_char(self.0[0] as char)?;
    f.write_char(self.0[1] as char)?;
    f.write_char(self.0[2] as char)?;
    f.write_char(self.0[3] as char)?;
    Ok(())
  }
}

/// Chunk types that can be parsed from a chunk's payload bytes.
pub(crate) trait ChunkParse: Sized {
  const NAME: ChunkName;
  fn parse(payload: &[u8]) -> ApngResult<Self>;
}

/// One remainder per possible byte, for the reflected PNG polynomial
/// `0xEDB88320`. Folding a byte into the running CRC is then a table
/// lookup instead of eight shift-and-conditional-xor steps.
const CRC_TABLE: [u32; 256] = {
  let mut table = [0_u32; 256];
  let mut byte = 0;
  while byte < 256 {
    let mut remainder = byte as u32;
    let mut bit = 0;
    while bit < 8 {
      remainder = if remainder & 1 != 0 { 0xEDB8_8320 ^ (remainder >> 1) } else { remainder >> 1 };
      bit += 1;
    }
    table[byte] = remainder;
    byte += 1;
  }
  table
};

/// CRC-32 (PNG polynomial) over a chunk's `name ∥ payload` bytes.
#[inline]
#[must_use]
pub fn crc32(name: ChunkName, payload: &[u8]) -> u32 {
  let mut crc = u32::MAX;
  for &byte in name.0.iter().chain(payload.iter()) {
    crc = CRC_TABLE[((crc as u8) ^ byte) as usize] ^ (crc >> 8);
  }
  !crc
}

/// Encodes one complete chunk: `length ∥ name ∥ payload ∥ crc`.
#[must_use]
pub fn encode_chunk(name: ChunkName, payload: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(12 + payload.len());
  out.extend((payload.len() as u32).to_be_bytes());
  out.extend(name.0);
  out.extend(payload);
  out.extend(crc32(name, payload).to_be_bytes());
  out
}

#[inline]
#[must_use]
pub(crate) fn u32_be(bytes: &[u8]) -> u32 {
  u32::from_be_bytes(bytes.try_into().unwrap())
}

#[inline]
#[must_use]
pub(crate) fn u16_be(bytes: &[u8]) -> u16 {
  u16::from_be_bytes(bytes.try_into().unwrap())
}

/// An unparsed chunk pulled out of an in-memory PNG stream.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawChunk<'b> {
  pub(crate) name: ChunkName,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl RawChunk<'_> {
  /// Whether the trailing CRC matches the chunk's content.
  #[inline]
  #[must_use]
  pub(crate) fn crc_ok(&self) -> bool {
    crc32(self.name, self.data) == self.declared_crc
  }
}
impl core::fmt::Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("name", &self.name)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// Truncated or garbage input simply ends the iteration, it never panics.
#[derive(Debug, Clone)]
#[repr(transparent)]
pub(crate) struct RawChunkIter<'b>(&'b [u8]);
impl<'b> RawChunkIter<'b> {
  /// Pass the full PNG bytes, the signature is skipped automatically.
  #[inline]
  pub(crate) const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }
}
/// Splits `n` bytes off the front, or `None` when not enough are left.
#[inline]
fn take(bytes: &[u8], n: usize) -> Option<(&[u8], &[u8])> {
  (bytes.len() >= n).then(|| bytes.split_at(n))
}

impl<'b> Iterator for RawChunkIter<'b> {
  type Item = RawChunk<'b>;
  fn next(&mut self) -> Option<Self::Item> {
    let (header, rest) = take(self.0, 8)?;
    let (data, rest) = take(rest, u32_be(&header[0..4]) as usize)?;
    let (crc, rest) = take(rest, 4)?;
    self.0 = rest;
    Some(RawChunk {
      name: ChunkName(header[4..8].try_into().unwrap()),
      data,
      declared_crc: u32_be(crc),
    })
  }
}

/// Parses one complete chunk (`length ∥ name ∥ payload ∥ crc`) from the
/// front of a byte slice.
pub(crate) fn parse_chunk<T: ChunkParse>(bytes: &[u8], verify_crc: bool) -> ApngResult<T> {
  if bytes.len() < 12 {
    return Err(ApngError::FileFormatError);
  }
  let len = u32_be(&bytes[0..4]) as usize;
  let name = ChunkName(bytes[4..8].try_into().unwrap());
  if name != T::NAME || bytes.len() < 12 + len {
    return Err(ApngError::FileFormatError);
  }
  let payload = &bytes[8..8 + len];
  let declared_crc = u32_be(&bytes[8 + len..12 + len]);
  if verify_crc && crc32(name, payload) != declared_crc {
    return Err(ApngError::ChecksumMismatch(name.0));
  }
  T::parse(payload)
}
