//! Decoding of one complete, non-animated PNG byte stream to RGBA.
//!
//! This is the "generic PNG decoder" half of the animation pipeline: the
//! synthesizer builds a standalone PNG for each frame, and this module turns
//! that PNG into a [`Bitmap`]. It handles every legal pixel format, packed
//! sub-byte samples, palette and transparency expansion, and Adam7
//! interlacing. 16-bit samples are narrowed to 8 bits by keeping the high
//! byte.
//!
//! The decode runs in three stages: inflate the `IDAT` stream into one
//! buffer of filtered scanlines, unfilter each pass's rows in place, then
//! scatter the recovered samples onto the output grid while expanding them
//! to RGBA.

use bitfrob::u8_replicate_bits;
use pixel_formats::r8g8b8a8_Unorm;

use crate::bitmap::Bitmap;
use crate::chunk::{u16_be, ChunkName, ChunkParse, ColorType, RawChunkIter, IHDR};

/// One deinterlacing pass, described by where its first pixel sits on the
/// full image grid and how far apart its pixels are.
#[derive(Debug, Clone, Copy)]
struct Pass {
  x_start: u32,
  y_start: u32,
  x_step: u32,
  y_step: u32,
}
impl Pass {
  /// How many pixels of a `width` by `height` image this pass covers.
  const fn size(&self, width: u32, height: u32) -> (u32, u32) {
    let w = width.saturating_sub(self.x_start);
    let h = height.saturating_sub(self.y_start);
    ((w + self.x_step - 1) / self.x_step, (h + self.y_step - 1) / self.y_step)
  }
}

/// A non-interlaced image is a single pass over the whole grid.
const PROGRESSIVE: [Pass; 1] = [Pass { x_start: 0, y_start: 0, x_step: 1, y_step: 1 }];

/// The seven Adam7 passes in storage order. Each pass is just an origin and
/// a stride; pass 1 samples every 8th pixel of every 8th row starting at
/// the corner, and the later passes fill in between at ever finer steps.
const ADAM7: [Pass; 7] = [
  Pass { x_start: 0, y_start: 0, x_step: 8, y_step: 8 },
  Pass { x_start: 4, y_start: 0, x_step: 8, y_step: 8 },
  Pass { x_start: 0, y_start: 4, x_step: 4, y_step: 8 },
  Pass { x_start: 2, y_start: 0, x_step: 4, y_step: 4 },
  Pass { x_start: 0, y_start: 2, x_step: 2, y_step: 4 },
  Pass { x_start: 1, y_start: 0, x_step: 2, y_step: 2 },
  Pass { x_start: 0, y_start: 1, x_step: 1, y_step: 2 },
];

fn passes(ihdr: &IHDR) -> &'static [Pass] {
  if ihdr.is_interlaced {
    &ADAM7
  } else {
    &PROGRESSIVE
  }
}

/// How many bytes of filtered scanline data the zlib stream must inflate
/// to. Every pass that covers at least one pixel stores its rows back to
/// back, one filter byte in front of each row.
fn stored_stream_size(ihdr: &IHDR) -> usize {
  let mut total = 0_usize;
  for pass in passes(ihdr) {
    let (w, h) = pass.size(ihdr.width, ihdr.height);
    if w > 0 && h > 0 {
      total = total.saturating_add(ihdr.bytes_per_filterline(w).saturating_mul(h as usize));
    }
  }
  total
}

fn chunk_payload(png: &[u8], name: ChunkName) -> Option<&[u8]> {
  RawChunkIter::new(png).find(|c| c.name == name).map(|c| c.data)
}

fn find_header(png: &[u8]) -> Option<IHDR> {
  let raw = RawChunkIter::new(png).find(|c| c.name == ChunkName::IHDR)?;
  if !raw.crc_ok() {
    return None;
  }
  IHDR::parse(raw.data).ok()
}

fn compressed_image_data(png: &[u8]) -> impl Iterator<Item = &[u8]> {
  RawChunkIter::new(png).filter(|c| c.name == ChunkName::IDAT).map(|c| c.data)
}

/// The big-endian 16-bit sample at position `index` of a pixel's bytes.
#[inline]
fn sample16(data: &[u8], index: usize) -> u16 {
  u16_be(&data[index * 2..index * 2 + 2])
}

/// Turns one pixel's stored bytes into RGBA.
///
/// An expander is built once per stream and carries whatever stream-level
/// state its color type needs: the palette and its alpha table for indexed
/// color, or the color marked fully transparent by a `tRNS` chunk for the
/// alpha-less formats.
enum PixelExpander<'b> {
  Grey { transparent: Option<u16> },
  GreyAlpha,
  Rgb { transparent: Option<[u16; 3]> },
  Rgba,
  Indexed { palette: &'b [u8], alphas: Option<&'b [u8]> },
}
impl<'b> PixelExpander<'b> {
  fn for_stream(ihdr: &IHDR, png: &'b [u8]) -> Self {
    let trns = chunk_payload(png, ChunkName::tRNS);
    match ihdr.color_type {
      ColorType::Y => PixelExpander::Grey {
        transparent: trns.filter(|t| t.len() >= 2).map(|t| u16_be(&t[0..2])),
      },
      ColorType::YA => PixelExpander::GreyAlpha,
      ColorType::RGB => PixelExpander::Rgb {
        transparent: trns
          .filter(|t| t.len() >= 6)
          .map(|t| [u16_be(&t[0..2]), u16_be(&t[2..4]), u16_be(&t[4..6])]),
      },
      ColorType::RGBA => PixelExpander::Rgba,
      ColorType::Index => PixelExpander::Indexed {
        palette: chunk_payload(png, ChunkName::PLTE).filter(|p| p.len() % 3 == 0).unwrap_or(&[]),
        alphas: trns,
      },
    }
  }

  /// Expands one pixel. `data` holds the pixel's stored bytes; packed
  /// sub-byte formats pass the already-extracted sample in a single byte.
  fn expand(&self, bit_depth: u8, data: &[u8]) -> r8g8b8a8_Unorm {
    match self {
      PixelExpander::Grey { transparent } => {
        // transparency is declared against the *stored* sample value, so
        // keep it around next to the displayed 8-bit level.
        let (level, stored) = if bit_depth == 16 {
          (data[0], sample16(data, 0))
        } else {
          (u8_replicate_bits(bit_depth as u32, data[0]), data[0] as u16)
        };
        let a = if *transparent == Some(stored) { 0 } else { 255 };
        r8g8b8a8_Unorm { r: level, g: level, b: level, a }
      }
      PixelExpander::GreyAlpha => {
        let (level, a) = if bit_depth == 16 { (data[0], data[2]) } else { (data[0], data[1]) };
        r8g8b8a8_Unorm { r: level, g: level, b: level, a }
      }
      PixelExpander::Rgb { transparent } => {
        let (rgb, stored) = if bit_depth == 16 {
          let full = [sample16(data, 0), sample16(data, 1), sample16(data, 2)];
          ([(full[0] >> 8) as u8, (full[1] >> 8) as u8, (full[2] >> 8) as u8], full)
        } else {
          ([data[0], data[1], data[2]], [data[0] as u16, data[1] as u16, data[2] as u16])
        };
        let a = if *transparent == Some(stored) { 0 } else { 255 };
        r8g8b8a8_Unorm { r: rgb[0], g: rgb[1], b: rgb[2], a }
      }
      PixelExpander::Rgba => {
        let [r, g, b, a] = if bit_depth == 16 {
          [data[0], data[2], data[4], data[6]]
        } else {
          [data[0], data[1], data[2], data[3]]
        };
        r8g8b8a8_Unorm { r, g, b, a }
      }
      PixelExpander::Indexed { palette, alphas } => {
        let i = data[0] as usize;
        let (r, g, b) = match palette.get(i * 3..i * 3 + 3) {
          Some([r, g, b]) => (*r, *g, *b),
          _ => (0, 0, 0),
        };
        let a = match alphas {
          Some(table) => *table.get(i).unwrap_or(&255),
          None => 255,
        };
        r8g8b8a8_Unorm { r, g, b, a }
      }
    }
  }
}

/// Undoes the per-scanline filters in place.
///
/// Filtering predicts each byte from the matching byte of the neighboring
/// pixel, so the unit png_filters needs is the pixel's byte count, with the
/// packed sub-byte formats filtering byte by byte.
fn unfilter_rows(rows: std::slice::ChunksExactMut<'_, u8>, ihdr: &IHDR) -> Option<()> {
  match (ihdr.bits_per_pixel() / 8).max(1) {
    1 => png_filters::unfilter_lines::<1>(rows),
    2 => png_filters::unfilter_lines::<2>(rows),
    3 => png_filters::unfilter_lines::<3>(rows),
    4 => png_filters::unfilter_lines::<4>(rows),
    6 => png_filters::unfilter_lines::<6>(rows),
    8 => png_filters::unfilter_lines::<8>(rows),
    _ => return None,
  }
  Some(())
}

/// Unfilters one pass worth of rows and scatters the recovered pixels onto
/// the output grid at the pass's origin and stride.
fn render_pass(
  ihdr: &IHDR, pass: Pass, rows: &mut [u8], expander: &PixelExpander<'_>, image: &mut Bitmap,
) -> Option<()> {
  let (pass_w, _) = pass.size(ihdr.width, ihdr.height);
  let line_len = ihdr.bytes_per_filterline(pass_w);
  unfilter_rows(rows.chunks_exact_mut(line_len), ihdr)?;

  let depth = ihdr.bit_depth as u32;
  for (row, line) in rows.chunks_exact(line_len).enumerate() {
    let y = pass.y_start + row as u32 * pass.y_step;
    let data = &line[1..];
    if depth >= 8 {
      let group = ihdr.bits_per_pixel() / 8;
      for (i, px) in data.chunks_exact(group).enumerate() {
        let x = pass.x_start + i as u32 * pass.x_step;
        if let Some(p) = image.get_mut(x, y) {
          *p = expander.expand(ihdr.bit_depth, px);
        }
      }
    } else {
      // packed formats put the leftmost pixel in a byte's highest bits;
      // walking to pass_w skips the padding bits of the final byte.
      let per_byte = 8 / depth;
      let mask = (1_u8 << depth) - 1;
      for i in 0..pass_w {
        let byte = data[(i / per_byte) as usize];
        let shift = 8 - depth * (i % per_byte + 1);
        let value = (byte >> shift) & mask;
        let x = pass.x_start + i * pass.x_step;
        if let Some(p) = image.get_mut(x, y) {
          *p = expander.expand(ihdr.bit_depth, &[value]);
        }
      }
    }
  }
  Some(())
}

/// Decodes a complete PNG byte stream into an RGBA bitmap.
///
/// Returns `None` when the stream can't be decoded: no usable header, bad
/// compressed data, or data that doesn't cover the declared dimensions.
pub(crate) fn decode_still(png: &[u8]) -> Option<Bitmap> {
  let ihdr = find_header(png)?;
  let stored_len = stored_stream_size(&ihdr);
  let mut stored: Vec<u8> = Vec::new();
  stored.try_reserve(stored_len).ok()?;
  stored.resize(stored_len, 0);
  let inflated = miniz_oxide::inflate::decompress_slice_iter_to_slice(
    &mut stored,
    compressed_image_data(png),
    true,
    true,
  )
  .ok()?;
  if inflated < stored_len {
    log::warn!("compressed image data ran short: {inflated} of {stored_len} bytes");
    return None;
  }

  let expander = PixelExpander::for_stream(&ihdr, png);
  let mut image = Bitmap::try_new(ihdr.width, ihdr.height)?;
  let mut rest = stored.as_mut_slice();
  for pass in passes(&ihdr) {
    let (pass_w, pass_h) = pass.size(ihdr.width, ihdr.height);
    if pass_w == 0 || pass_h == 0 {
      continue;
    }
    let bytes_here = ihdr.bytes_per_filterline(pass_w).checked_mul(pass_h as usize)?;
    if rest.len() < bytes_here {
      return None;
    }
    let (rows, tail) = rest.split_at_mut(bytes_here);
    rest = tail;
    render_pass(&ihdr, *pass, rows, &expander, &mut image)?;
  }
  Some(image)
}
