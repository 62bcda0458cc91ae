use super::*;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl ColorType {
  /// The number of channels in this type of color.
  #[inline]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }
}
impl TryFrom<u8> for ColorType {
  type Error = ();
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => ColorType::Y,
      2 => ColorType::RGB,
      3 => ColorType::Index,
      4 => ColorType::YA,
      6 => ColorType::RGBA,
      _ => return Err(()),
    })
  }
}

/// The device colour space an image renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
  DeviceGray,
  DeviceRgb,
}

/// Image Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: ColorType,
  /// if the image data is stored interlaced.
  pub is_interlaced: bool,
}
impl IHDR {
  /// The colour space this image draws into. Indexed color expands to RGB.
  #[inline]
  #[must_use]
  pub const fn color_space(&self) -> ColorSpace {
    match self.color_type {
      ColorType::Y | ColorType::YA => ColorSpace::DeviceGray,
      ColorType::RGB | ColorType::RGBA | ColorType::Index => ColorSpace::DeviceRgb,
    }
  }

  /// Whether pixels carry an alpha channel.
  #[inline]
  #[must_use]
  pub const fn has_alpha(&self) -> bool {
    matches!(self.color_type, ColorType::YA | ColorType::RGBA)
  }

  /// Bits per component as drawn. Indexed color always draws at 8.
  #[inline]
  #[must_use]
  pub const fn sample_depth(&self) -> u8 {
    match self.color_type {
      ColorType::Index => 8,
      _ => self.bit_depth,
    }
  }

  /// Components per pixel as drawn. Indexed color expands to RGBA.
  #[inline]
  #[must_use]
  pub const fn components_per_pixel(&self) -> usize {
    match self.color_type {
      ColorType::Index => 4,
      other => other.channel_count(),
    }
  }

  /// Bytes per row of the image as drawn (not as stored).
  #[inline]
  #[must_use]
  pub const fn bytes_per_row(&self) -> usize {
    let bits = self.components_per_pixel() * self.sample_depth() as usize;
    (bits * self.width as usize + 7) / 8
  }

  /// Bits per pixel as stored in the data stream.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Bytes per stored scanline, including the leading filter byte.
  ///
  /// When pixels are less than 8 bits each it's possible to end up with
  /// partial bytes on the end, so we must round up.
  #[inline]
  #[must_use]
  pub(crate) const fn bytes_per_filterline(&self, width: u32) -> usize {
    1 + ((self.bits_per_pixel() * (width as usize)) + 7) / 8
  }

  /// Re-encodes the header as a complete `IHDR` chunk with the dimensions
  /// overwritten.
  ///
  /// Everything except width and height passes through unchanged, which is
  /// what lets one shared header serve every frame of an animation: each
  /// frame's sub-image keeps the stream's bit depth and color type but gets
  /// its own dimensions.
  #[must_use]
  pub fn update(&self, width: u32, height: u32) -> [u8; 25] {
    let mut out = [0; 25];
    out[0..4].copy_from_slice(&13_u32.to_be_bytes());
    out[4..8].copy_from_slice(&ChunkName::IHDR.0);
    out[8..12].copy_from_slice(&width.to_be_bytes());
    out[12..16].copy_from_slice(&height.to_be_bytes());
    out[16] = self.bit_depth;
    out[17] = self.color_type as u8;
    // compression, filter: always 0 in a legal stream (checked at parse).
    out[18] = 0;
    out[19] = 0;
    out[20] = self.is_interlaced as u8;
    let crc = crc32(ChunkName::IHDR, &out[8..21]);
    out[21..25].copy_from_slice(&crc.to_be_bytes());
    out
  }

  /// Encodes the header as a complete `IHDR` chunk with its own dimensions.
  #[inline]
  #[must_use]
  pub fn encode(&self) -> [u8; 25] {
    self.update(self.width, self.height)
  }
}
impl ChunkParse for IHDR {
  const NAME: ChunkName = ChunkName::IHDR;
  fn parse(payload: &[u8]) -> ApngResult<Self> {
    match payload {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression, filter, interlace] => {
        if *compression != 0 || *filter != 0 {
          return Err(ApngError::FileFormatError);
        }
        let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
        let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
        if width == 0 || height == 0 {
          return Err(ApngError::FileFormatError);
        }
        Ok(Self {
          width,
          height,
          bit_depth: match *color_type {
            0 if [1, 2, 4, 8, 16].contains(bit_depth) => *bit_depth,
            2 if [8, 16].contains(bit_depth) => *bit_depth,
            3 if [1, 2, 4, 8].contains(bit_depth) => *bit_depth,
            4 if [8, 16].contains(bit_depth) => *bit_depth,
            6 if [8, 16].contains(bit_depth) => *bit_depth,
            _ => return Err(ApngError::FileFormatError),
          },
          color_type: ColorType::try_from(*color_type).map_err(|_| ApngError::FileFormatError)?,
          is_interlaced: match interlace {
            0 => false,
            1 => true,
            _ => return Err(ApngError::FileFormatError),
          },
        })
      }
      _ => Err(ApngError::FileFormatError),
    }
  }
}
