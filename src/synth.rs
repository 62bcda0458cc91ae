//! Re-materializing a standalone PNG for one frame of an animation.

use crate::chunk::{IDAT, IEND_BYTES, IHDR};
use crate::PNG_SIGNATURE;

/// Builds a complete single-image PNG byte stream for a frame.
///
/// The layout is: signature, the stream's `IHDR` rewritten to the frame's
/// dimensions, any shared ancillary chunks verbatim (palette, transparency,
/// gamma, and friends all keep applying to every frame), one `IDAT` wrapping
/// the frame's concatenated compressed bytes, and the `IEND` literal.
#[must_use]
pub(crate) fn synthesize_png(
  ihdr: &IHDR, width: u32, height: u32, shared_prefix: &[u8], payload: &[u8],
) -> Vec<u8> {
  let idat = IDAT::encode(payload);
  let mut out =
    Vec::with_capacity(8 + 25 + shared_prefix.len() + idat.len() + IEND_BYTES.len());
  out.extend(PNG_SIGNATURE);
  out.extend(ihdr.update(width, height));
  out.extend_from_slice(shared_prefix);
  out.extend(idat);
  out.extend(IEND_BYTES);
  out
}
