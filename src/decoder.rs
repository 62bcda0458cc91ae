//! The decoder itself: construction, frame assembly, and playback.
//!
//! Construction walks the head of the stream (signature, `IHDR`, everything
//! up to and including the first frame), renders frame 0, and remembers a
//! *reset point* so playback can rewind cheaply. The remaining frames are
//! assembled lazily as the animation advances, or all at once when a full
//! first pass is requested.
//!
//! Playback has two shapes:
//! * [`ApngDecoder::render_next_sync`] does everything on the calling
//!   thread and publishes before returning.
//! * [`ApngDecoder::render_next`] hands the work to a single background
//!   render thread. The caller observes completion through
//!   [`ApngDecoder::poll`], which is also where the result gets published.
//!
//! Either way frames are produced in order, one at a time, and all decoder
//! state that matters for rendering (the reader cursor, the canvas, the
//! cache) is only ever touched under the engine lock.

use core::time::Duration;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, trace, warn};

use crate::bitmap::Bitmap;
use crate::chunk::{acTL, fcTL, fdAT, ChunkName, IEND, IHDR};
use crate::compositor::Compositor;
use crate::frame::{Frame, FramePayload};
use crate::options::{CachePolicy, DecoderOptions};
use crate::reader::{FileReader, MemoryReader, Reader};
use crate::walker::Walker;
use crate::worker::RenderWorker;
use crate::{still, synth, ApngError, ApngResult, PNG_SIGNATURE};

/// Streams declaring this many frames or more are rejected unless
/// [`DecoderOptions::set_unlimited_frame_count`] lifts the cap.
pub const MAX_FRAME_COUNT: u32 = 1024;

/// The ceiling for the automatic cache decision: loop-forever animations
/// whose fully decoded size stays under this many bytes get cached.
pub const MAX_CACHE_BYTES: usize = 50 * 1024 * 1024;

/// One fully composed frame, ready for display.
#[derive(Debug, Clone)]
pub struct Rendered {
  /// Which frame this is.
  pub index: usize,
  /// How long the frame should stay on screen.
  pub delay: Duration,
  /// The full-canvas raster.
  pub bitmap: Bitmap,
}

pub(crate) type RenderOutcome = ApngResult<Rendered>;

#[derive(Debug, Clone, Copy)]
struct ResetPoint {
  offset: u64,
  expected_sequence: u32,
}

#[inline]
fn is_eof(e: &ApngError) -> bool {
  matches!(e, ApngError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof)
}

#[inline]
fn format_if_eof(e: ApngError) -> ApngError {
  if is_eof(&e) {
    ApngError::FileFormatError
  } else {
    e
  }
}

fn check_sequence(expected: &mut u32, got: u32) -> ApngResult<()> {
  if got != *expected {
    return Err(ApngError::WrongSequenceNumber { expected: *expected, got });
  }
  *expected += 1;
  Ok(())
}

fn validate_region(ihdr: &IHDR, control: &fcTL) -> ApngResult<()> {
  let fits_x = control.x_offset.checked_add(control.width).is_some_and(|e| e <= ihdr.width);
  let fits_y = control.y_offset.checked_add(control.height).is_some_and(|e| e <= ihdr.height);
  if fits_x && fits_y {
    Ok(())
  } else {
    Err(ApngError::FileFormatError)
  }
}

/// Consumes the run of consecutive `IDAT` chunks at the walker's position.
fn collect_idats(walker: &mut Walker<'_>, load: bool) -> ApngResult<FramePayload> {
  let mut refs = Vec::new();
  let mut parts = Vec::new();
  loop {
    match walker.peek() {
      Ok(head) if head.name == ChunkName::IDAT => {
        if load {
          let (_, payload) = walker.read_payload()?;
          parts.push(payload);
        } else {
          refs.push(walker.read_idat_ref()?);
        }
      }
      Ok(_) => break,
      Err(e) if is_eof(&e) => break,
      Err(e) => return Err(e),
    }
  }
  Ok(if load { FramePayload::Loaded(parts) } else { FramePayload::Indexed(refs) })
}

/// Consumes the run of consecutive `fdAT` chunks at the walker's position,
/// checking each one's sequence number on the way through.
fn collect_fdats(
  walker: &mut Walker<'_>, expected: &mut u32, load: bool,
) -> ApngResult<FramePayload> {
  let mut refs = Vec::new();
  let mut parts = Vec::new();
  loop {
    match walker.peek() {
      Ok(head) if head.name == ChunkName::fdAT => {
        if load {
          let fdat: fdAT = walker.read_typed()?;
          check_sequence(expected, fdat.sequence_number)?;
          parts.push(fdat.data);
        } else {
          let (sequence_number, r) = walker.read_fdat_ref()?;
          check_sequence(expected, sequence_number)?;
          refs.push(r);
        }
      }
      Ok(_) => break,
      Err(e) if is_eof(&e) => break,
      Err(e) => return Err(e),
    }
  }
  Ok(if load { FramePayload::Loaded(parts) } else { FramePayload::Indexed(refs) })
}

/// All the state that rendering mutates. Post-construction it is only ever
/// touched under the decoder's engine lock, either by the calling thread
/// (synchronous operations) or by the render worker.
pub(crate) struct Engine {
  options: DecoderOptions,
  ihdr: IHDR,
  actl: acTL,
  reader: Box<dyn Reader + Send>,
  /// One slot per declared frame, filled exactly once as the walker reaches
  /// each frame.
  frames: Vec<Option<Frame>>,
  /// The `IDAT` list that reconstructs the still-image fallback.
  default_image: FramePayload,
  /// Raw bytes of the ancillary chunks shared by every synthesized frame.
  shared_prefix: Vec<u8>,
  expected_sequence: u32,
  /// The frame index the walker will produce next.
  walk_index: usize,
  /// The frame most recently rendered.
  position: usize,
  compositor: Compositor,
  cache: Option<Vec<Option<Bitmap>>>,
  reset_point: ResetPoint,
  pub(crate) first_pass_done: bool,
  multiple_actl: bool,
  /// A terminal stream fault. Re-surfaced on every advance until a reset.
  fault: Option<ApngError>,
}

impl Engine {
  /// Runs the construction protocol through rendering frame 0.
  fn construct(
    mut reader: Box<dyn Reader + Send>, options: DecoderOptions,
  ) -> ApngResult<(Self, Rendered)> {
    let verify = !options.skip_checksum_verify;

    // signature
    let mut signature = [0; 8];
    reader.read(&mut signature).map_err(format_if_eof)?;
    if signature != PNG_SIGNATURE {
      return Err(ApngError::FileFormatError);
    }

    // header
    let ihdr: IHDR = {
      let mut walker = Walker::new(reader.as_mut(), verify);
      walker.read_typed().map_err(format_if_eof)?
    };

    // walk forward to the animation control, carrying ancillary chunks into
    // the shared prefix. An `fcTL` showing up before the `acTL` is legal and
    // becomes the candidate control for frame 0.
    let mut shared_prefix: Vec<u8> = Vec::new();
    let mut candidate: Option<fcTL> = None;
    let mut expected_sequence = 0_u32;
    let actl: acTL = loop {
      let mut walker = Walker::new(reader.as_mut(), verify);
      let head = match walker.peek() {
        Err(e) if is_eof(&e) => return Err(ApngError::LackOfChunk(*b"acTL")),
        r => r?,
      };
      match head.name {
        ChunkName::acTL => break walker.read_typed()?,
        ChunkName::fcTL => {
          let control: fcTL = walker.read_typed()?;
          check_sequence(&mut expected_sequence, control.sequence_number)?;
          candidate = Some(control);
        }
        ChunkName::IDAT | ChunkName::IEND => return Err(ApngError::LackOfChunk(*b"acTL")),
        _ => {
          let (_, raw) = walker.read_raw()?;
          shared_prefix.extend(raw);
        }
      }
    };

    if actl.num_frames == 0
      || (actl.num_frames >= MAX_FRAME_COUNT && !options.unlimited_frame_count)
    {
      return Err(ApngError::InvalidNumberOfFrames(actl.num_frames));
    }
    let num_frames = actl.num_frames as usize;

    let decoded_bytes =
      (ihdr.height as usize).saturating_mul(ihdr.bytes_per_row()).saturating_mul(num_frames);
    let caching = match options.cache_policy {
      CachePolicy::Always => true,
      CachePolicy::Never => false,
      CachePolicy::Auto => actl.num_plays == 0 && decoded_bytes < MAX_CACHE_BYTES,
    };
    debug!(
      "{}x{} APNG, {num_frames} frame(s), {} play(s), caching: {caching}",
      ihdr.width,
      ihdr.height,
      actl.num_plays,
    );

    let compositor =
      Compositor::try_new(ihdr.width, ihdr.height).ok_or(ApngError::CanvasCreatingFailed)?;

    let mut engine = Engine {
      options,
      ihdr,
      actl,
      reader,
      frames: vec![None; num_frames],
      default_image: FramePayload::Indexed(Vec::new()),
      shared_prefix,
      expected_sequence,
      walk_index: 1,
      position: 0,
      compositor,
      cache: caching.then(|| vec![None; num_frames]),
      reset_point: ResetPoint { offset: 0, expected_sequence: 0 },
      first_pass_done: false,
      multiple_actl: false,
      fault: None,
    };

    engine.extract_first_frame(candidate)?;
    if engine.multiple_actl {
      return Err(ApngError::MultipleAnimationControlChunk);
    }
    let first = engine.render(0)?;
    engine.reset_point = ResetPoint {
      offset: engine.reader.offset(),
      expected_sequence: engine.expected_sequence,
    };

    if num_frames == 1 {
      engine.verify_trailing_iend()?;
    } else if engine.options.wants_full_first_pass() {
      for index in 1..num_frames {
        engine.ensure_assembled(index)?;
      }
      if engine.options.pre_render_all_frames {
        if engine.cache.is_some() {
          for index in 1..num_frames {
            engine.render(index)?;
          }
        } else {
          warn!("pre-rendering all frames does nothing while caching is off");
        }
      }
    }

    Ok((engine, first))
  }

  /// Construction step: isolate the default image and assemble frame 0.
  ///
  /// Two stream shapes exist. Either an `fcTL` comes before the `IDAT` run,
  /// and the default image doubles as frame 0; or the `IDAT` run stands
  /// alone as a fallback image and frame 0 is the first `fcTL`+`fdAT` group
  /// after it.
  fn extract_first_frame(&mut self, candidate: Option<fcTL>) -> ApngResult<()> {
    let verify = !self.options.skip_checksum_verify;
    let load = self.options.load_frame_data;
    loop {
      let mut walker = Walker::new(self.reader.as_mut(), verify);
      let head = match walker.peek() {
        Err(e) if is_eof(&e) => return Err(ApngError::ImageDataNotFound),
        r => r?,
      };
      match head.name {
        ChunkName::fcTL => {
          let control: fcTL = walker.read_typed()?;
          check_sequence(&mut self.expected_sequence, control.sequence_number)?;
          validate_region(&self.ihdr, &control)?;
          let payload = collect_idats(&mut walker, load)?;
          if payload.is_empty() {
            return Err(ApngError::ImageDataNotFound);
          }
          self.default_image = payload.clone();
          self.frames[0] = Some(Frame { control, payload });
          return Ok(());
        }
        ChunkName::IDAT => {
          let payload = collect_idats(&mut walker, load)?;
          if payload.is_empty() {
            return Err(ApngError::ImageDataNotFound);
          }
          self.default_image = payload.clone();
          if let Some(control) = candidate {
            validate_region(&self.ihdr, &control)?;
            self.frames[0] = Some(Frame { control, payload });
            return Ok(());
          }
          // the default image is only a fallback; frame 0 follows it.
          return self.assemble_first_animation_frame();
        }
        ChunkName::acTL => {
          self.multiple_actl = true;
          walker.read_raw()?;
        }
        _ => {
          let (_, raw) = walker.read_raw()?;
          self.shared_prefix.extend(raw);
        }
      }
    }
  }

  /// Frame 0 when the default image is *not* part of the animation: keep
  /// walking until the first `fcTL`+`fdAT` group.
  fn assemble_first_animation_frame(&mut self) -> ApngResult<()> {
    let verify = !self.options.skip_checksum_verify;
    let load = self.options.load_frame_data;
    loop {
      let mut walker = Walker::new(self.reader.as_mut(), verify);
      let head = match walker.peek() {
        Err(e) if is_eof(&e) => {
          return Err(ApngError::FrameDataNotFound { expected_sequence: self.expected_sequence })
        }
        r => r?,
      };
      match head.name {
        ChunkName::fcTL => {
          let control: fcTL = walker.read_typed()?;
          check_sequence(&mut self.expected_sequence, control.sequence_number)?;
          validate_region(&self.ihdr, &control)?;
          let payload = collect_fdats(&mut walker, &mut self.expected_sequence, load)?;
          if payload.is_empty() {
            return Err(ApngError::FrameDataNotFound { expected_sequence: self.expected_sequence });
          }
          self.frames[0] = Some(Frame { control, payload });
          return Ok(());
        }
        ChunkName::IEND => {
          return Err(ApngError::FrameDataNotFound { expected_sequence: self.expected_sequence })
        }
        ChunkName::acTL => {
          self.multiple_actl = true;
          walker.read_raw()?;
        }
        _ => {
          walker.read_raw()?;
        }
      }
    }
  }

  /// Walks the next `fcTL`+`fdAT` group off the stream.
  ///
  /// The group lands in its slot the first time it's walked; after a reset
  /// mid-first-pass the walker covers old ground again and the already
  /// filled slots just stay as they are.
  fn assemble_next_frame(&mut self) -> ApngResult<()> {
    let verify = !self.options.skip_checksum_verify;
    let load = self.options.load_frame_data;
    loop {
      let mut walker = Walker::new(self.reader.as_mut(), verify);
      let head = match walker.peek() {
        Err(e) if is_eof(&e) => {
          return Err(ApngError::FrameDataNotFound { expected_sequence: self.expected_sequence })
        }
        r => r?,
      };
      match head.name {
        ChunkName::fcTL => {
          let control: fcTL = walker.read_typed()?;
          check_sequence(&mut self.expected_sequence, control.sequence_number)?;
          validate_region(&self.ihdr, &control)?;
          let payload = collect_fdats(&mut walker, &mut self.expected_sequence, load)?;
          if payload.is_empty() {
            return Err(ApngError::FrameDataNotFound { expected_sequence: self.expected_sequence });
          }
          let index = self.walk_index;
          if self.frames[index].is_none() {
            trace!("assembled frame {index}");
            self.frames[index] = Some(Frame { control, payload });
          }
          self.walk_index += 1;
          break;
        }
        ChunkName::IEND => {
          return Err(ApngError::FrameDataNotFound { expected_sequence: self.expected_sequence })
        }
        ChunkName::acTL => {
          self.multiple_actl = true;
          walker.read_raw()?;
          return Err(ApngError::MultipleAnimationControlChunk);
        }
        _ => {
          walker.read_raw()?;
        }
      }
    }
    if self.walk_index == self.frames.len() && !self.first_pass_done {
      self.verify_trailing_iend()?;
    }
    Ok(())
  }

  /// Scans past trailing ancillary chunks to the `IEND`, which completes
  /// the first pass.
  fn verify_trailing_iend(&mut self) -> ApngResult<()> {
    let verify = !self.options.skip_checksum_verify;
    loop {
      let mut walker = Walker::new(self.reader.as_mut(), verify);
      let head = match walker.peek() {
        Err(e) if is_eof(&e) => return Err(ApngError::LackOfChunk(*b"IEND")),
        r => r?,
      };
      match head.name {
        ChunkName::IEND => {
          let _: IEND = walker.read_typed()?;
          debug!("first pass complete: all {} frame(s) assembled", self.frames.len());
          self.first_pass_done = true;
          return Ok(());
        }
        ChunkName::acTL => {
          self.multiple_actl = true;
          walker.read_raw()?;
          return Err(ApngError::MultipleAnimationControlChunk);
        }
        _ => {
          walker.read_raw()?;
        }
      }
    }
  }

  fn ensure_assembled(&mut self, index: usize) -> ApngResult<()> {
    while self.frames[index].is_none() {
      self.assemble_next_frame()?;
    }
    Ok(())
  }

  /// Produces the composed raster for `index`, through the cache when it
  /// can. Terminal faults stick until a reset.
  fn render(&mut self, index: usize) -> ApngResult<Rendered> {
    if let Some(fault) = &self.fault {
      return Err(fault.clone());
    }
    if self.multiple_actl {
      let e = ApngError::MultipleAnimationControlChunk;
      self.fault = Some(e.clone());
      return Err(e);
    }
    if let Some(cached) = self.cache.as_ref().and_then(|c| c[index].as_ref()) {
      if let Some(frame) = self.frames[index].as_ref() {
        trace!("frame {index} served from cache");
        return Ok(Rendered { index, delay: frame.control.delay(), bitmap: cached.clone() });
      }
    }
    let result = self.render_uncached(index);
    if let Err(e) = &result {
      if e.is_terminal() {
        self.fault = Some(e.clone());
      }
    }
    result
  }

  fn render_uncached(&mut self, index: usize) -> ApngResult<Rendered> {
    self.ensure_assembled(index)?;
    let (control, payload) = match self.frames[index].as_ref() {
      Some(frame) => (frame.control, frame.payload.concat(self.reader.as_mut())?),
      None => {
        return Err(ApngError::FrameDataNotFound { expected_sequence: self.expected_sequence })
      }
    };
    let png =
      synth::synthesize_png(&self.ihdr, control.width, control.height, &self.shared_prefix, &payload);
    let sub = still::decode_still(&png).ok_or(ApngError::InvalidFrameImageData { index })?;
    if (sub.width, sub.height) != (control.width, control.height) {
      return Err(ApngError::InvalidFrameImageData { index });
    }
    let bitmap = self.compositor.render(index, &control, &sub);
    if let Some(cache) = &mut self.cache {
      cache[index] = Some(bitmap.clone());
    }
    Ok(Rendered { index, delay: control.delay(), bitmap })
  }

  /// Renders the frame after the current one, wrapping past the end.
  pub(crate) fn advance(&mut self) -> RenderOutcome {
    let target = (self.position + 1) % self.frames.len();
    let result = self.render(target);
    if result.is_ok() {
      self.position = target;
    }
    result
  }

  /// Rewinds playback to frame 0 using the stored reset point.
  fn reset(&mut self) -> ApngResult<Rendered> {
    self.fault = None;
    self.multiple_actl = false;
    self.reader.seek_to(self.reset_point.offset)?;
    self.expected_sequence = self.reset_point.expected_sequence;
    self.walk_index = 1;
    if let Some(cache) = &mut self.cache {
      // a partly filled cache can't be resumed: serving some frames from
      // the cache and composing the rest would run the canvas out of step.
      if cache.iter().any(|slot| slot.is_none()) {
        debug!("discarding partially filled frame cache");
        cache.iter_mut().for_each(|slot| *slot = None);
      }
    }
    let out = self.render(0)?;
    self.position = 0;
    Ok(out)
  }

  /// Synthesizes and decodes the still-image fallback.
  fn render_default_image(&mut self) -> ApngResult<Bitmap> {
    let payload = self.default_image.concat(self.reader.as_mut())?;
    let png = synth::synthesize_png(
      &self.ihdr,
      self.ihdr.width,
      self.ihdr.height,
      &self.shared_prefix,
      &payload,
    );
    still::decode_still(&png).ok_or(ApngError::InvalidFrameImageData { index: 0 })
  }
}

/// A streaming APNG decoder.
///
/// Construction fails loudly (see [`ApngError`]); once built, a renderable
/// frame 0 is immediately available from [`output`](Self::output), and the
/// animation advances one frame per `render_next` call, wrapping back to
/// frame 0 after the last frame.
pub struct ApngDecoder {
  ihdr: IHDR,
  actl: acTL,
  engine: Arc<Mutex<Engine>>,
  worker: Option<RenderWorker>,
  output: Option<ApngResult<Rendered>>,
  current_index: usize,
  in_flight: bool,
  on_first_pass_done: Option<Box<dyn FnOnce() + Send>>,
}

impl ApngDecoder {
  /// Builds a decoder over bytes already in memory.
  pub fn from_bytes(bytes: Vec<u8>, options: DecoderOptions) -> ApngResult<Self> {
    Self::from_reader(Box::new(MemoryReader::new(bytes)), options)
  }

  /// Builds a decoder streaming from a file on disk.
  pub fn open<P: AsRef<Path>>(path: P, options: DecoderOptions) -> ApngResult<Self> {
    Self::from_reader(Box::new(FileReader::open(path)?), options)
  }

  /// Builds a decoder over any [`Reader`].
  pub fn from_reader(reader: Box<dyn Reader + Send>, options: DecoderOptions) -> ApngResult<Self> {
    let (engine, first) = Engine::construct(reader, options)?;
    let ihdr = engine.ihdr;
    let actl = engine.actl;
    Ok(Self {
      ihdr,
      actl,
      engine: Arc::new(Mutex::new(engine)),
      worker: None,
      output: Some(Ok(first)),
      current_index: 0,
      in_flight: false,
      on_first_pass_done: None,
    })
  }

  fn engine(&self) -> MutexGuard<'_, Engine> {
    self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// The most recently published frame, or the error that stopped playback.
  ///
  /// `None` only while a [`render_next`](Self::render_next) job is in
  /// flight.
  #[inline]
  #[must_use]
  pub fn output(&self) -> Option<&ApngResult<Rendered>> {
    self.output.as_ref()
  }

  /// The index of the most recently published frame.
  #[inline]
  #[must_use]
  pub fn current_index(&self) -> usize {
    self.current_index
  }

  /// Frame count declared by the animation control.
  #[inline]
  #[must_use]
  pub fn num_frames(&self) -> u32 {
    self.actl.num_frames
  }

  /// Play count declared by the animation control. 0 means loop forever.
  #[inline]
  #[must_use]
  pub fn num_plays(&self) -> u32 {
    self.actl.num_plays
  }

  /// The animation's full pixel dimensions.
  #[inline]
  #[must_use]
  pub fn intrinsic_size(&self) -> (u32, u32) {
    (self.ihdr.width, self.ihdr.height)
  }

  /// The stream's image header.
  #[inline]
  #[must_use]
  pub fn header(&self) -> IHDR {
    self.ihdr
  }

  /// Whether composed frames are being cached.
  #[must_use]
  pub fn is_caching(&self) -> bool {
    self.engine().cache.is_some()
  }

  /// How many cache slots currently hold a composed frame.
  #[must_use]
  pub fn cached_frames(&self) -> usize {
    self.engine().cache.as_ref().map_or(0, |c| c.iter().filter(|s| s.is_some()).count())
  }

  /// Registers the observer that fires once, after the last frame has been
  /// assembled. Always invoked on the caller's context: either right here
  /// (when the pass already finished) or inside a later publishing call.
  pub fn set_on_first_pass_done<F: FnOnce() + Send + 'static>(&mut self, observer: F) {
    self.on_first_pass_done = Some(Box::new(observer));
    self.fire_first_pass_done_if_ready();
  }

  fn fire_first_pass_done_if_ready(&mut self) {
    if self.on_first_pass_done.is_none() {
      return;
    }
    let done = self.engine().first_pass_done;
    if done {
      if let Some(observer) = self.on_first_pass_done.take() {
        observer();
      }
    }
  }

  fn publish(&mut self, outcome: RenderOutcome) {
    if let Ok(rendered) = &outcome {
      self.current_index = rendered.index;
    }
    self.output = Some(outcome);
    self.fire_first_pass_done_if_ready();
  }

  /// Blocks until the in-flight render (if any) lands, and publishes it.
  fn drain_in_flight(&mut self) {
    let outcome = match (self.in_flight, &self.worker) {
      (true, Some(worker)) => worker.outcomes.recv().ok(),
      _ => None,
    };
    self.in_flight = false;
    if let Some(outcome) = outcome {
      self.publish(outcome);
    }
  }

  /// Advances to the next frame on the calling thread and publishes the
  /// result before returning.
  pub fn render_next_sync(&mut self) {
    self.drain_in_flight();
    self.output = None;
    let outcome = self.engine().advance();
    self.publish(outcome);
  }

  /// Clears the output and dispatches the next-frame render onto the
  /// background render thread. Completion is observed through
  /// [`poll`](Self::poll). At most one render is in flight at a time;
  /// calling again before the output comes back does nothing.
  pub fn render_next(&mut self) {
    if self.in_flight {
      warn!("render_next called while a render is already in flight");
      return;
    }
    self.output = None;
    if self.worker.is_none() {
      match RenderWorker::spawn(Arc::clone(&self.engine)) {
        Ok(worker) => self.worker = Some(worker),
        Err(e) => {
          self.output = Some(Err(e));
          return;
        }
      }
    }
    if let Some(worker) = &self.worker {
      worker.enqueue_advance();
      self.in_flight = true;
    }
  }

  /// Publishes a completed background render, if one has landed.
  ///
  /// Returns `true` when a new output was published. Callers using
  /// [`render_next`](Self::render_next) should poll from the same context
  /// that reads [`output`](Self::output); completions always publish in the
  /// order the renders were requested.
  pub fn poll(&mut self) -> bool {
    let outcome = match (self.in_flight, &self.worker) {
      (true, Some(worker)) => worker.outcomes.try_recv().ok(),
      _ => None,
    };
    match outcome {
      Some(outcome) => {
        self.in_flight = false;
        self.publish(outcome);
        true
      }
      None => {
        self.fire_first_pass_done_if_ready();
        false
      }
    }
  }

  /// Rewinds playback to frame 0.
  ///
  /// Does nothing when frame 0 is already current. Otherwise the reader
  /// seeks back to the reset point, a partially filled cache is discarded,
  /// and a freshly rendered frame 0 is published synchronously. A render in
  /// flight is drained first, so a `render_next` issued after `reset` sees
  /// frame 1 next.
  pub fn reset(&mut self) {
    self.drain_in_flight();
    // already showing a good frame 0: nothing to do. A published error
    // still goes through the full reset so playback can recover.
    if self.current_index == 0 && matches!(self.output, Some(Ok(_))) {
      return;
    }
    let outcome = self.engine().reset();
    self.publish(outcome);
  }

  /// Decodes the stream's still-image fallback (the `IDAT` image).
  ///
  /// For streams whose default image doubles as frame 0 this equals frame
  /// 0's sub-image; for streams with a standalone default image it is the
  /// picture a non-animated viewer would show.
  pub fn default_image(&mut self) -> ApngResult<Bitmap> {
    self.drain_in_flight();
    self.engine().render_default_image()
  }
}

impl core::fmt::Debug for ApngDecoder {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ApngDecoder")
      .field("ihdr", &self.ihdr)
      .field("actl", &self.actl)
      .field("current_index", &self.current_index)
      .field("in_flight", &self.in_flight)
      .finish_non_exhaustive()
  }
}
