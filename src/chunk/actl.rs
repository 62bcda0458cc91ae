use super::*;

/// Animation Control
///
/// Declares how many frames the animation has and how many times it plays.
/// A legal stream has exactly one of these, before any image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct acTL {
  /// Number of frames in the animation. Must be at least 1.
  pub num_frames: u32,
  /// Number of times to loop the animation. 0 means play forever.
  pub num_plays: u32,
}
impl ChunkParse for acTL {
  const NAME: ChunkName = ChunkName::acTL;
  fn parse(payload: &[u8]) -> ApngResult<Self> {
    if payload.len() != 8 {
      return Err(ApngError::FileFormatError);
    }
    Ok(Self { num_frames: u32_be(&payload[0..4]), num_plays: u32_be(&payload[4..8]) })
  }
}
