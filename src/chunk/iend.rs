use super::*;

/// The complete encoding of an `IEND` chunk, CRC included.
///
/// `IEND` has no payload so every instance is byte-identical, which makes it
/// cheaper to keep as a literal than to re-encode.
pub const IEND_BYTES: [u8; 12] =
  [0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82];

/// Image trailer. The last chunk of every stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IEND;
impl ChunkParse for IEND {
  const NAME: ChunkName = ChunkName::IEND;
  fn parse(payload: &[u8]) -> ApngResult<Self> {
    match payload {
      [] => Ok(Self),
      _ => Err(ApngError::FileFormatError),
    }
  }
}
