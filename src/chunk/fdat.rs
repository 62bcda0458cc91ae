use super::*;

/// Frame Data.
///
/// Carries one animation frame's compressed pixel bytes. The payload is a
/// 4-byte sequence number followed by data that means exactly what an
/// `IDAT` payload means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct fdAT {
  pub sequence_number: u32,
  /// The compressed bytes, with the leading sequence number already
  /// stripped off.
  pub data: Vec<u8>,
}
impl ChunkParse for fdAT {
  const NAME: ChunkName = ChunkName::fdAT;
  fn parse(payload: &[u8]) -> ApngResult<Self> {
    match payload {
      [s0, s1, s2, s3, data @ ..] => Ok(Self {
        sequence_number: u32::from_be_bytes([*s0, *s1, *s2, *s3]),
        data: data.to_vec(),
      }),
      _ => Err(ApngError::FileFormatError),
    }
  }
}
