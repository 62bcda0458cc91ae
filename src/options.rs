//! Knobs that change how the decoder trades memory for work.

/// Whether composed frames are kept for later passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
  /// Cache when the animation loops forever and the whole thing fits under
  /// the built-in size limit. This is the default.
  #[default]
  Auto,
  /// Always cache composed frames.
  Always,
  /// Never cache composed frames.
  Never,
}

/// Options accepted when constructing a decoder.
///
/// The defaults stream lazily: frame metadata and pixel data are read as the
/// animation advances, data chunks are stored as byte-range references, and
/// caching is decided by [`CachePolicy::Auto`].
///
/// ```
/// use anipng::{CachePolicy, DecoderOptions};
/// let options = DecoderOptions::new()
///   .set_cache_policy(CachePolicy::Always)
///   .set_full_first_pass(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderOptions {
  pub(crate) skip_checksum_verify: bool,
  pub(crate) cache_policy: CachePolicy,
  pub(crate) full_first_pass: bool,
  pub(crate) pre_render_all_frames: bool,
  pub(crate) load_frame_data: bool,
  pub(crate) unlimited_frame_count: bool,
}
impl DecoderOptions {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self {
      skip_checksum_verify: false,
      cache_policy: CachePolicy::Auto,
      full_first_pass: false,
      pre_render_all_frames: false,
      load_frame_data: false,
      unlimited_frame_count: false,
    }
  }

  /// Skip CRC-32 comparison on every chunk.
  #[inline]
  #[must_use]
  pub const fn set_skip_checksum_verify(mut self, skip: bool) -> Self {
    self.skip_checksum_verify = skip;
    self
  }

  /// Force the composed-frame cache on or off instead of inferring.
  #[inline]
  #[must_use]
  pub const fn set_cache_policy(mut self, policy: CachePolicy) -> Self {
    self.cache_policy = policy;
    self
  }

  /// Assemble every frame's metadata during construction instead of during
  /// the first play-through.
  #[inline]
  #[must_use]
  pub const fn set_full_first_pass(mut self, yes: bool) -> Self {
    self.full_first_pass = yes;
    self
  }

  /// Render (and cache, when caching) every frame during construction.
  /// Implies a full first pass.
  #[inline]
  #[must_use]
  pub const fn set_pre_render_all_frames(mut self, yes: bool) -> Self {
    self.pre_render_all_frames = yes;
    self
  }

  /// Read frame data into memory during the first pass instead of storing
  /// byte-range references to re-read on demand.
  #[inline]
  #[must_use]
  pub const fn set_load_frame_data(mut self, yes: bool) -> Self {
    self.load_frame_data = yes;
    self
  }

  /// Lift the 1024 frame safety cap.
  #[inline]
  #[must_use]
  pub const fn set_unlimited_frame_count(mut self, yes: bool) -> Self {
    self.unlimited_frame_count = yes;
    self
  }

  #[inline]
  #[must_use]
  pub(crate) const fn wants_full_first_pass(&self) -> bool {
    self.full_first_pass || self.pre_render_all_frames
  }
}
