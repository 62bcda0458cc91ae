//! The off-screen canvas and the dispose/blend state machine.

use crate::bitmap::{Bitmap, Region};
use crate::chunk::{fcTL, BlendOp, DisposeOp};

impl fcTL {
  /// The frame's placement on the canvas, in raster coordinates.
  #[inline]
  #[must_use]
  pub(crate) const fn region(&self) -> Region {
    Region { x: self.x_offset, y: self.y_offset, width: self.width, height: self.height }
  }
}

/// Composes decoded sub-images into full-canvas frames.
///
/// The canvas is a single mutable raster reused across frames. Between two
/// frames, the *earlier* frame's dispose op decides what survives on the
/// canvas; then the later frame's blend op decides how its sub-image lands.
/// The last two composed outputs are kept so `DisposeOp::Previous` can
/// rewind one step.
#[derive(Debug)]
pub(crate) struct Compositor {
  canvas: Bitmap,
  previous_output: Option<Bitmap>,
  current_output: Option<Bitmap>,
  /// The control of the most recently composed frame; its dispose op
  /// applies before the next frame draws.
  last_control: Option<fcTL>,
}
impl Compositor {
  /// Allocates the canvas at the stream's full dimensions.
  #[must_use]
  pub(crate) fn try_new(width: u32, height: u32) -> Option<Self> {
    Some(Self {
      canvas: Bitmap::try_new(width, height)?,
      previous_output: None,
      current_output: None,
      last_control: None,
    })
  }

  /// Composes frame `index` from its decoded sub-image and returns the
  /// full-canvas snapshot.
  pub(crate) fn render(&mut self, index: usize, control: &fcTL, sub: &Bitmap) -> Bitmap {
    // dispose stage: settle what frame `index - 1` leaves behind.
    if index == 0 {
      // frame 0 always starts from scratch, even when reached by looping
      // around or by a reset.
      self.canvas.clear();
      self.previous_output = None;
      self.current_output = None;
      self.last_control = None;
    } else if let Some(prev) = self.last_control {
      match prev.dispose_op {
        DisposeOp::None => (),
        DisposeOp::Background => self.canvas.clear_region(prev.region()),
        DisposeOp::Previous => match &self.previous_output {
          Some(before) => self.canvas.pixels.copy_from_slice(&before.pixels),
          // when the disposed frame was the first one rendered there is no
          // earlier output to rewind to, and it degrades to background.
          None => self.canvas.clear_region(prev.region()),
        },
      }
    }

    // blend stage: land the new sub-image.
    match control.blend_op {
      // replacing every pixel of the region is the same as clearing the
      // region and then drawing into it.
      BlendOp::Source => self.canvas.draw_source(sub, control.x_offset, control.y_offset),
      BlendOp::Over => self.canvas.draw_over(sub, control.x_offset, control.y_offset),
    }

    let next_output = self.canvas.clone();
    self.previous_output = self.current_output.take();
    self.current_output = Some(next_output.clone());
    self.last_control = Some(*control);
    next_output
  }
}
