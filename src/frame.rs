use crate::chunk::fcTL;
use crate::reader::Reader;
use crate::ApngResult;

/// A stored pointer to one data chunk's payload bytes.
///
/// For `fdAT` chunks the offset and length exclude the leading 4-byte
/// sequence number, so a reference always denotes compressed pixel bytes and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkRef {
  pub(crate) offset: u64,
  pub(crate) length: u32,
}

/// The pixel bytes of one frame: either references to re-read on demand, or
/// the bytes themselves when eager loading was requested.
#[derive(Debug, Clone)]
pub(crate) enum FramePayload {
  Indexed(Vec<ChunkRef>),
  Loaded(Vec<Vec<u8>>),
}
impl FramePayload {
  #[inline]
  #[must_use]
  pub(crate) fn is_empty(&self) -> bool {
    match self {
      FramePayload::Indexed(refs) => refs.is_empty(),
      FramePayload::Loaded(parts) => parts.is_empty(),
    }
  }

  /// All the payload bytes, in order, as one buffer.
  pub(crate) fn concat(&self, reader: &mut dyn Reader) -> ApngResult<Vec<u8>> {
    match self {
      FramePayload::Indexed(refs) => {
        let total: usize = refs.iter().map(|r| r.length as usize).sum();
        let mut out = Vec::with_capacity(total);
        for r in refs.iter() {
          out.extend(reader.load(r.offset, r.length as usize)?);
        }
        Ok(out)
      }
      FramePayload::Loaded(parts) => {
        let total: usize = parts.iter().map(|p| p.len()).sum();
        let mut out = Vec::with_capacity(total);
        for p in parts.iter() {
          out.extend_from_slice(p);
        }
        Ok(out)
      }
    }
  }
}

/// One animation frame: its control chunk plus its data chunk list.
///
/// For animation frames the data is the frame's `fdAT` list. When a frame is
/// also the stream's default image, the data is the `IDAT` list instead.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
  pub(crate) control: fcTL,
  pub(crate) payload: FramePayload,
}
