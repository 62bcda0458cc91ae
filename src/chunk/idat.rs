use super::*;

/// Image Data.
///
/// * Image data is stored with Zlib compression applied.
/// * Images can have more than one `IDAT` chunk. They should all be stored
///   in a row, and together they form a single Zlib datastream.
///
/// The decoder mostly treats `IDAT` payloads as opaque byte ranges; the one
/// typed operation is re-wrapping collected payload bytes into a single
/// chunk when a standalone PNG is synthesized for a frame.
#[derive(Debug, Clone, Copy)]
pub struct IDAT;
impl IDAT {
  /// Wraps already-compressed bytes into one complete `IDAT` chunk.
  #[inline]
  #[must_use]
  pub fn encode(data: &[u8]) -> Vec<u8> {
    encode_chunk(ChunkName::IDAT, data)
  }
}
