#![forbid(unsafe_code)]
#![allow(non_camel_case_types)]

//! Holds all the tools for decoding Animated PNG (APNG) data.
//!
//! ## Automated APNG Decoding
//! If you just want rendered frames, build an [`ApngDecoder`] from bytes or
//! from a file path and pull frames out of it:
//!
//! ```no_run
//! use anipng::{ApngDecoder, DecoderOptions};
//! let bytes: Vec<u8> = unimplemented!("data from somewhere");
//! let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
//! // frame 0 is rendered and published as soon as construction succeeds.
//! let first = decoder.output().unwrap();
//! // advance the animation one frame at a time.
//! decoder.render_next_sync();
//! ```
//!
//! ## How The Decoder Works
//!
//! An APNG stream is a PNG stream with three extra chunk types mixed in:
//! * **Animation Control** (`acTL`) - declares the frame count and play
//!   count. A stream without exactly one of these is not an animation, and
//!   the decoder rejects it with [`ApngError::LackOfChunk`] so that callers
//!   can fall back to a still-image path.
//! * **Frame Control** (`fcTL`) - declares one frame's sub-region, delay,
//!   and the dispose/blend operations that drive the off-screen canvas.
//! * **Frame Data** (`fdAT`) - carries one frame's compressed pixel bytes,
//!   prefixed with a sequence number.
//!
//! Sequence numbers across all `fcTL` and `fdAT` chunks must count upward
//! from zero with no gaps, which lets the decoder detect truncated or
//! reordered streams early ([`ApngError::WrongSequenceNumber`]).
//!
//! For each frame the decoder re-materializes a complete single-image PNG
//! (signature, a rewritten `IHDR` with the frame's dimensions, any shared
//! ancillary chunks, one `IDAT`, and an `IEND`), decodes that still image to
//! RGBA, and then composites it onto the canvas according to the frame's
//! dispose and blend operations. Frames can be cached after composition so
//! that later passes of an infinite loop don't redo the work.
//!
//! The pixel data for each frame is *not* kept in memory by default. The
//! first pass over the stream records the offset and length of every data
//! chunk, and later passes re-read those byte ranges on demand, which keeps
//! the resident size of a long animation small. See [`DecoderOptions`] for
//! the knobs that change this behavior.

pub mod chunk;

pub mod bitmap;
pub mod reader;

mod compositor;
mod frame;
mod still;
mod synth;
mod walker;
mod worker;

pub mod decoder;
pub mod options;

pub use bitmap::Bitmap;
pub use chunk::{acTL, fcTL, BlendOp, ColorType, DisposeOp, IHDR};
pub use decoder::{ApngDecoder, Rendered};
pub use options::{CachePolicy, DecoderOptions};
pub use pixel_formats::r8g8b8a8_Unorm;
pub use reader::{FileReader, MemoryReader, Reader};

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Shorthand for results that fail with an [`ApngError`].
pub type ApngResult<T> = Result<T, ApngError>;

/// Errors that can happen when trying to process an APNG.
///
/// Errors hit during construction are returned directly and no decoder is
/// built. Errors hit while advancing the animation are published through the
/// decoder's output slot instead, so a display layer can keep showing the
/// last good frame (or the default image) while deciding what to do.
#[derive(Debug)]
#[non_exhaustive]
pub enum ApngError {
  /// The signature didn't match, or a chunk couldn't be parsed at all.
  FileFormatError,
  /// A chunk the format requires (`acTL`, `IEND`) never showed up.
  ///
  /// A plain non-animated PNG produces `LackOfChunk(*b"acTL")`, which is the
  /// signal to decode it through a still-image path instead.
  LackOfChunk([u8; 4]),
  /// More than one `acTL` chunk was encountered.
  MultipleAnimationControlChunk,
  /// The declared frame count was 0, or hit the safety cap (1024) without
  /// [`DecoderOptions::set_unlimited_frame_count`] being set.
  InvalidNumberOfFrames(u32),
  /// Sequence numbers must be exactly 0, 1, 2, ... across all `fcTL` and
  /// `fdAT` chunks. This reports the first violation.
  WrongSequenceNumber {
    expected: u32,
    got: u32,
  },
  /// An `fcTL` wasn't followed by any `fdAT` chunk.
  FrameDataNotFound {
    expected_sequence: u32,
  },
  /// No `IDAT` chunks were found for the default image.
  ImageDataNotFound,
  /// The off-screen canvas allocation failed.
  CanvasCreatingFailed,
  /// The PNG synthesized for this frame index didn't decode to a raster of
  /// the expected dimensions.
  InvalidFrameImageData {
    index: usize,
  },
  /// A chunk's CRC-32 didn't match its payload. Only produced when checksum
  /// verification is enabled (the default).
  ChecksumMismatch([u8; 4]),
  /// The underlying reader failed.
  Io(std::io::Error),
}
impl ApngError {
  /// `true` for faults that poison the rest of the stream.
  ///
  /// Once a terminal error surfaces, advancing the animation keeps
  /// reporting it; only a reset back to frame 0 clears the fault.
  pub fn is_terminal(&self) -> bool {
    !matches!(
      self,
      ApngError::Io(_) | ApngError::InvalidFrameImageData { .. } | ApngError::CanvasCreatingFailed
    )
  }
}
impl Clone for ApngError {
  fn clone(&self) -> Self {
    match self {
      ApngError::FileFormatError => ApngError::FileFormatError,
      ApngError::LackOfChunk(name) => ApngError::LackOfChunk(*name),
      ApngError::MultipleAnimationControlChunk => ApngError::MultipleAnimationControlChunk,
      ApngError::InvalidNumberOfFrames(n) => ApngError::InvalidNumberOfFrames(*n),
      ApngError::WrongSequenceNumber { expected, got } => {
        ApngError::WrongSequenceNumber { expected: *expected, got: *got }
      }
      ApngError::FrameDataNotFound { expected_sequence } => {
        ApngError::FrameDataNotFound { expected_sequence: *expected_sequence }
      }
      ApngError::ImageDataNotFound => ApngError::ImageDataNotFound,
      ApngError::CanvasCreatingFailed => ApngError::CanvasCreatingFailed,
      ApngError::InvalidFrameImageData { index } => {
        ApngError::InvalidFrameImageData { index: *index }
      }
      ApngError::ChecksumMismatch(name) => ApngError::ChecksumMismatch(*name),
      // io::Error isn't Clone, so the clone keeps the kind and message.
      ApngError::Io(e) => ApngError::Io(std::io::Error::new(e.kind(), e.to_string())),
    }
  }
}
impl core::fmt::Display for ApngError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    fn name_str(name: &[u8; 4]) -> &str {
      core::str::from_utf8(name).unwrap_or("????")
    }
    match self {
      ApngError::FileFormatError => write!(f, "not a well-formed PNG stream"),
      ApngError::LackOfChunk(name) => write!(f, "required chunk `{}` is missing", name_str(name)),
      ApngError::MultipleAnimationControlChunk => {
        write!(f, "more than one `acTL` chunk in the stream")
      }
      ApngError::InvalidNumberOfFrames(n) => write!(f, "invalid number of frames: {n}"),
      ApngError::WrongSequenceNumber { expected, got } => {
        write!(f, "wrong sequence number: expected {expected}, got {got}")
      }
      ApngError::FrameDataNotFound { expected_sequence } => {
        write!(f, "no frame data found where sequence {expected_sequence} was expected")
      }
      ApngError::ImageDataNotFound => write!(f, "no image data found for the default image"),
      ApngError::CanvasCreatingFailed => write!(f, "could not allocate the off-screen canvas"),
      ApngError::InvalidFrameImageData { index } => {
        write!(f, "frame {index} did not decode to a usable image")
      }
      ApngError::ChecksumMismatch(name) => {
        write!(f, "CRC-32 mismatch in `{}` chunk", name_str(name))
      }
      ApngError::Io(e) => write!(f, "read error: {e}"),
    }
  }
}
impl std::error::Error for ApngError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ApngError::Io(e) => Some(e),
      _ => None,
    }
  }
}
impl From<std::io::Error> for ApngError {
  #[inline]
  fn from(e: std::io::Error) -> Self {
    ApngError::Io(e)
  }
}
