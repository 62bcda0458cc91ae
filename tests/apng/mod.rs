//! End-to-end decoding tests over synthetic APNG streams.
//!
//! The helpers at the top build real APNG byte streams chunk by chunk, so
//! each test can state the exact stream shape it cares about.

use anipng::chunk::{encode_chunk, ChunkName};
use anipng::{ApngDecoder, ApngError, CachePolicy, DecoderOptions, PNG_SIGNATURE};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const YELLOW: [u8; 4] = [255, 255, 0, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// RGBA8, not interlaced.
fn ihdr_chunk(width: u32, height: u32) -> Vec<u8> {
  let mut payload = Vec::new();
  payload.extend(width.to_be_bytes());
  payload.extend(height.to_be_bytes());
  payload.extend([8, 6, 0, 0, 0]);
  encode_chunk(ChunkName::IHDR, &payload)
}

fn actl_chunk(num_frames: u32, num_plays: u32) -> Vec<u8> {
  let mut payload = Vec::new();
  payload.extend(num_frames.to_be_bytes());
  payload.extend(num_plays.to_be_bytes());
  encode_chunk(ChunkName::acTL, &payload)
}

fn fctl_chunk(
  sequence: u32, width: u32, height: u32, x: u32, y: u32, dispose: u8, blend: u8,
) -> Vec<u8> {
  let mut payload = Vec::new();
  payload.extend(sequence.to_be_bytes());
  payload.extend(width.to_be_bytes());
  payload.extend(height.to_be_bytes());
  payload.extend(x.to_be_bytes());
  payload.extend(y.to_be_bytes());
  payload.extend(1_u16.to_be_bytes()); // delay 1/10 s
  payload.extend(10_u16.to_be_bytes());
  payload.push(dispose);
  payload.push(blend);
  encode_chunk(ChunkName::fcTL, &payload)
}

/// Filters (all rows filter 0) and zlib-compresses RGBA pixel rows.
fn compress_rgba(width: usize, pixels: &[[u8; 4]]) -> Vec<u8> {
  assert_eq!(pixels.len() % width, 0);
  let mut raw = Vec::new();
  for row in pixels.chunks(width) {
    raw.push(0);
    for px in row {
      raw.extend(px);
    }
  }
  miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6)
}

fn idat_chunk(width: usize, pixels: &[[u8; 4]]) -> Vec<u8> {
  encode_chunk(ChunkName::IDAT, &compress_rgba(width, pixels))
}

fn fdat_chunk(sequence: u32, width: usize, pixels: &[[u8; 4]]) -> Vec<u8> {
  let mut payload = sequence.to_be_bytes().to_vec();
  payload.extend(compress_rgba(width, pixels));
  encode_chunk(ChunkName::fdAT, &payload)
}

fn iend_chunk() -> Vec<u8> {
  encode_chunk(ChunkName::IEND, &[])
}

fn stream(chunks: &[Vec<u8>]) -> Vec<u8> {
  let mut out = PNG_SIGNATURE.to_vec();
  for c in chunks {
    out.extend_from_slice(c);
  }
  out
}

/// 1x1, two frames: red (shared with the default image), then blue.
fn minimal_two_frame() -> Vec<u8> {
  stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(2, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    fdat_chunk(2, 1, &[BLUE]),
    iend_chunk(),
  ])
}

fn output_bytes(decoder: &ApngDecoder) -> Vec<u8> {
  let rendered = decoder.output().unwrap().as_ref().unwrap();
  rendered.bitmap.as_bytes().to_vec()
}

#[test]
fn two_frames_advance_and_wrap() {
  let mut decoder = ApngDecoder::from_bytes(minimal_two_frame(), DecoderOptions::new()).unwrap();
  assert_eq!(decoder.num_frames(), 2);
  assert_eq!(decoder.num_plays(), 0);
  assert_eq!(decoder.intrinsic_size(), (1, 1));

  // construction publishes a rendered frame 0 immediately.
  assert_eq!(decoder.current_index(), 0);
  assert_eq!(output_bytes(&decoder), RED);

  decoder.render_next_sync();
  assert_eq!(decoder.current_index(), 1);
  assert_eq!(output_bytes(&decoder), BLUE);

  // past the last frame the animation wraps back around.
  decoder.render_next_sync();
  assert_eq!(decoder.current_index(), 0);
  assert_eq!(output_bytes(&decoder), RED);
}

#[test]
fn rendered_frames_carry_their_delay() {
  let decoder = ApngDecoder::from_bytes(minimal_two_frame(), DecoderOptions::new()).unwrap();
  let rendered = decoder.output().unwrap().as_ref().unwrap();
  assert_eq!(rendered.delay, core::time::Duration::from_millis(100));
}

#[test]
fn dispose_previous_composes_the_same_across_passes() {
  // 2x1 canvas. Frame 1 is a green dot that reverts when disposed, frame 2
  // draws blue over the left half.
  let bytes = stream(&[
    ihdr_chunk(2, 1),
    actl_chunk(3, 0),
    fctl_chunk(0, 2, 1, 0, 0, 0, 0),
    idat_chunk(2, &[RED, RED]),
    fctl_chunk(1, 1, 1, 1, 0, 2, 1), // dispose=previous, blend=over
    fdat_chunk(2, 1, &[GREEN]),
    fctl_chunk(3, 1, 1, 0, 0, 0, 1),
    fdat_chunk(4, 1, &[BLUE]),
    iend_chunk(),
  ]);
  let options = DecoderOptions::new().set_cache_policy(CachePolicy::Never);
  let mut decoder = ApngDecoder::from_bytes(bytes, options).unwrap();

  let mut first_pass = vec![output_bytes(&decoder)];
  for _ in 0..2 {
    decoder.render_next_sync();
    first_pass.push(output_bytes(&decoder));
  }
  assert_eq!(first_pass[0], [RED, RED].concat());
  assert_eq!(first_pass[1], [RED, GREEN].concat());
  // frame 1's dispose=previous reverted the canvas to frame 0's output
  // before frame 2 drew, so the green dot is gone.
  assert_eq!(first_pass[2], [BLUE, RED].concat());

  // a second pass over the wrap produces bit-identical frames.
  for expected in first_pass.iter() {
    decoder.render_next_sync();
    assert_eq!(&output_bytes(&decoder), expected);
  }
}

#[test]
fn dispose_previous_on_the_first_frame_acts_as_background() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(2, 0),
    fctl_chunk(0, 1, 1, 0, 0, 2, 0), // dispose=previous on the first frame
    idat_chunk(1, &[RED]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 1),
    fdat_chunk(2, 1, &[CLEAR]),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  decoder.render_next_sync();
  // with nothing rendered before frame 0, its region simply clears.
  assert_eq!(output_bytes(&decoder), CLEAR);
}

#[test]
fn frame_control_may_precede_animation_control() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    actl_chunk(2, 0),
    idat_chunk(1, &[RED]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    fdat_chunk(2, 1, &[BLUE]),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  assert_eq!(output_bytes(&decoder), RED);
  // the default image and frame 0 share the IDAT list here.
  let default = decoder.default_image().unwrap();
  assert_eq!(default.as_bytes(), RED);
  decoder.render_next_sync();
  assert_eq!(output_bytes(&decoder), BLUE);
}

#[test]
fn standalone_default_image_is_not_part_of_the_animation() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(1, 0),
    idat_chunk(1, &[YELLOW]), // fallback picture only
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    fdat_chunk(1, 1, &[RED]),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  assert_eq!(output_bytes(&decoder), RED);
  assert_eq!(decoder.default_image().unwrap().as_bytes(), YELLOW);
}

#[test]
fn sequence_gaps_are_rejected_with_both_numbers() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(2, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    fdat_chunk(3, 1, &[BLUE]), // gap: should be 2
    iend_chunk(),
  ]);
  // eager assembly hits the gap during construction...
  let err = ApngDecoder::from_bytes(bytes.clone(), DecoderOptions::new().set_full_first_pass(true))
    .unwrap_err();
  assert!(matches!(err, ApngError::WrongSequenceNumber { expected: 2, got: 3 }));

  // ...lazy assembly hits it on the first advance, through the output slot.
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  decoder.render_next_sync();
  assert!(matches!(
    decoder.output(),
    Some(Err(ApngError::WrongSequenceNumber { expected: 2, got: 3 }))
  ));
  // the fault is terminal: the index never moved and retrying repeats it.
  assert_eq!(decoder.current_index(), 0);
  decoder.render_next_sync();
  assert!(matches!(decoder.output(), Some(Err(ApngError::WrongSequenceNumber { .. }))));
}

#[test]
fn a_plain_png_is_rejected_as_not_animated() {
  let bytes = stream(&[ihdr_chunk(1, 1), idat_chunk(1, &[RED]), iend_chunk()]);
  let err = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap_err();
  assert!(matches!(err, ApngError::LackOfChunk(name) if &name == b"acTL"));
}

#[test]
fn frame_count_cap_and_the_unlimited_escape_hatch() {
  let make = |frames: u32| {
    stream(&[
      ihdr_chunk(1, 1),
      actl_chunk(frames, 0),
      fctl_chunk(0, 1, 1, 0, 0, 0, 0),
      idat_chunk(1, &[RED]),
      iend_chunk(),
    ])
  };
  let err = ApngDecoder::from_bytes(make(1024), DecoderOptions::new()).unwrap_err();
  assert!(matches!(err, ApngError::InvalidNumberOfFrames(1024)));

  let err = ApngDecoder::from_bytes(make(0), DecoderOptions::new()).unwrap_err();
  assert!(matches!(err, ApngError::InvalidNumberOfFrames(0)));

  // frame metadata is read lazily, so a declared-but-unread tail is fine.
  let decoder =
    ApngDecoder::from_bytes(make(1024), DecoderOptions::new().set_unlimited_frame_count(true))
      .unwrap();
  assert_eq!(decoder.num_frames(), 1024);
}

#[test]
fn second_animation_control_before_frame_zero_fails_construction() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(2, 0),
    actl_chunk(2, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    fdat_chunk(2, 1, &[BLUE]),
    iend_chunk(),
  ]);
  let err = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap_err();
  assert!(matches!(err, ApngError::MultipleAnimationControlChunk));
}

#[test]
fn second_animation_control_mid_stream_stops_playback() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(2, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    actl_chunk(2, 0), // illegal second control
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    fdat_chunk(2, 1, &[BLUE]),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  assert_eq!(output_bytes(&decoder), RED);
  decoder.render_next_sync();
  assert!(matches!(decoder.output(), Some(Err(ApngError::MultipleAnimationControlChunk))));
  assert_eq!(decoder.current_index(), 0);
  decoder.render_next_sync();
  assert!(matches!(decoder.output(), Some(Err(ApngError::MultipleAnimationControlChunk))));
}

#[test]
fn corrupt_checksums_fail_loud_or_are_skipped_on_request() {
  let clean = minimal_two_frame();
  let mut corrupt = clean.clone();
  // flip a bit in the fdAT chunk's trailing CRC.
  let name_at = corrupt.windows(4).position(|w| w == b"fdAT").unwrap();
  let len = u32::from_be_bytes(corrupt[name_at - 4..name_at].try_into().unwrap()) as usize;
  corrupt[name_at + 4 + len + 3] ^= 0xFF;

  let mut decoder = ApngDecoder::from_bytes(corrupt.clone(), DecoderOptions::new()).unwrap();
  decoder.render_next_sync();
  assert!(matches!(
    decoder.output(),
    Some(Err(ApngError::ChecksumMismatch(name))) if name == b"fdAT"
  ));

  // with verification off the corrupted stream decodes exactly like the
  // clean one.
  let mut skipped =
    ApngDecoder::from_bytes(corrupt, DecoderOptions::new().set_skip_checksum_verify(true)).unwrap();
  let mut reference = ApngDecoder::from_bytes(clean, DecoderOptions::new()).unwrap();
  for _ in 0..4 {
    assert_eq!(skipped.current_index(), reference.current_index());
    assert_eq!(output_bytes(&skipped), output_bytes(&reference));
    skipped.render_next_sync();
    reference.render_next_sync();
  }
}

#[test]
fn reset_reproduces_the_initial_output_exactly() {
  let bytes = stream(&[
    ihdr_chunk(2, 1),
    actl_chunk(3, 0),
    fctl_chunk(0, 2, 1, 0, 0, 0, 0),
    idat_chunk(2, &[RED, GREEN]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 1),
    fdat_chunk(2, 1, &[BLUE]),
    fctl_chunk(3, 1, 1, 1, 0, 1, 1),
    fdat_chunk(4, 1, &[YELLOW]),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  let initial = output_bytes(&decoder);

  // resetting while already at frame 0 is a no-op.
  decoder.reset();
  assert_eq!(decoder.current_index(), 0);
  assert_eq!(output_bytes(&decoder), initial);

  for steps in 1..6 {
    for _ in 0..steps {
      decoder.render_next_sync();
    }
    decoder.reset();
    assert_eq!(decoder.current_index(), 0);
    assert_eq!(output_bytes(&decoder), initial);
  }
}

#[test]
fn cache_policy_is_inferred_and_reset_respects_cache_completeness() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(3, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    fdat_chunk(2, 1, &[GREEN]),
    fctl_chunk(3, 1, 1, 0, 0, 0, 0),
    fdat_chunk(4, 1, &[BLUE]),
    iend_chunk(),
  ]);

  // looping forever + tiny: the auto policy caches.
  let mut decoder = ApngDecoder::from_bytes(bytes.clone(), DecoderOptions::new()).unwrap();
  assert!(decoder.is_caching());
  assert_eq!(decoder.cached_frames(), 1); // frame 0 landed during construction

  // playing through once fills every slot.
  decoder.render_next_sync();
  decoder.render_next_sync();
  assert_eq!(decoder.cached_frames(), 3);

  // a full cache survives reset.
  decoder.render_next_sync(); // wrap to 0
  decoder.render_next_sync(); // frame 1
  decoder.reset();
  assert_eq!(decoder.cached_frames(), 3);
  assert_eq!(output_bytes(&decoder), RED);

  // a partial cache is discarded by reset and rebuilds from frame 0.
  let mut decoder = ApngDecoder::from_bytes(bytes.clone(), DecoderOptions::new()).unwrap();
  decoder.render_next_sync();
  assert_eq!(decoder.cached_frames(), 2);
  decoder.reset();
  assert_eq!(decoder.cached_frames(), 1);
  assert_eq!(output_bytes(&decoder), RED);

  // a finite loop count turns the inference off, an explicit policy wins.
  let finite = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(1, 3),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    iend_chunk(),
  ]);
  let decoder = ApngDecoder::from_bytes(finite.clone(), DecoderOptions::new()).unwrap();
  assert!(!decoder.is_caching());
  let decoder = ApngDecoder::from_bytes(
    finite,
    DecoderOptions::new().set_cache_policy(CachePolicy::Always),
  )
  .unwrap();
  assert!(decoder.is_caching());
  let decoder =
    ApngDecoder::from_bytes(bytes, DecoderOptions::new().set_cache_policy(CachePolicy::Never))
      .unwrap();
  assert!(!decoder.is_caching());
}

#[test]
fn caching_never_changes_the_rendered_frames() {
  let bytes = stream(&[
    ihdr_chunk(2, 2),
    actl_chunk(3, 0),
    fctl_chunk(0, 2, 2, 0, 0, 0, 0),
    idat_chunk(2, &[RED, GREEN, BLUE, YELLOW]),
    fctl_chunk(1, 1, 1, 1, 1, 1, 1), // dispose=background
    fdat_chunk(2, 1, &[GREEN]),
    fctl_chunk(3, 2, 1, 0, 0, 0, 1),
    fdat_chunk(4, 2, &[BLUE, CLEAR]),
    iend_chunk(),
  ]);
  let mut cached = ApngDecoder::from_bytes(
    bytes.clone(),
    DecoderOptions::new().set_cache_policy(CachePolicy::Always),
  )
  .unwrap();
  let mut uncached =
    ApngDecoder::from_bytes(bytes, DecoderOptions::new().set_cache_policy(CachePolicy::Never))
      .unwrap();
  for _ in 0..8 {
    assert_eq!(cached.current_index(), uncached.current_index());
    assert_eq!(output_bytes(&cached), output_bytes(&uncached));
    cached.render_next_sync();
    uncached.render_next_sync();
  }
}

#[test]
fn eagerly_loaded_frame_data_matches_referenced_frame_data() {
  let mut loaded = ApngDecoder::from_bytes(
    minimal_two_frame(),
    DecoderOptions::new().set_load_frame_data(true),
  )
  .unwrap();
  let mut referenced =
    ApngDecoder::from_bytes(minimal_two_frame(), DecoderOptions::new()).unwrap();
  for _ in 0..4 {
    assert_eq!(output_bytes(&loaded), output_bytes(&referenced));
    loaded.render_next_sync();
    referenced.render_next_sync();
  }
}

#[test]
fn single_frame_animations_wrap_onto_themselves() {
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(1, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  decoder.render_next_sync();
  assert_eq!(decoder.current_index(), 0);
  assert_eq!(output_bytes(&decoder), RED);
}

#[test]
fn first_pass_observer_fires_exactly_once() {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  // single frame: the pass completes during construction, so the observer
  // fires as soon as it's registered.
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(1, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  let fired = Arc::new(AtomicUsize::new(0));
  let observed = Arc::clone(&fired);
  decoder.set_on_first_pass_done(move || {
    observed.fetch_add(1, Ordering::SeqCst);
  });
  assert_eq!(fired.load(Ordering::SeqCst), 1);
  decoder.render_next_sync();
  decoder.render_next_sync();
  assert_eq!(fired.load(Ordering::SeqCst), 1);

  // multi frame, lazy: the observer fires when the walker finishes the
  // last frame, from inside the publishing call.
  let mut decoder = ApngDecoder::from_bytes(minimal_two_frame(), DecoderOptions::new()).unwrap();
  let fired = Arc::new(AtomicUsize::new(0));
  let observed = Arc::clone(&fired);
  decoder.set_on_first_pass_done(move || {
    observed.fetch_add(1, Ordering::SeqCst);
  });
  assert_eq!(fired.load(Ordering::SeqCst), 0);
  decoder.render_next_sync(); // assembles the final frame
  assert_eq!(fired.load(Ordering::SeqCst), 1);
  decoder.render_next_sync();
  decoder.render_next_sync();
  assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn full_first_pass_assembles_everything_up_front() {
  let options = DecoderOptions::new()
    .set_full_first_pass(true)
    .set_pre_render_all_frames(true)
    .set_cache_policy(CachePolicy::Always);
  let mut decoder = ApngDecoder::from_bytes(minimal_two_frame(), options).unwrap();
  assert_eq!(decoder.cached_frames(), 2);

  let fired = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
  let observed = std::sync::Arc::clone(&fired);
  decoder.set_on_first_pass_done(move || {
    observed.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
  });
  assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn background_rendering_publishes_through_poll() {
  let mut decoder = ApngDecoder::from_bytes(minimal_two_frame(), DecoderOptions::new()).unwrap();
  decoder.render_next();
  // the output slot is cleared while the render is in flight.
  assert!(decoder.output().is_none() || decoder.poll());
  let mut waited = 0;
  while !decoder.poll() && decoder.output().is_none() {
    std::thread::sleep(core::time::Duration::from_millis(1));
    waited += 1;
    assert!(waited < 5000, "background render never completed");
  }
  assert_eq!(decoder.current_index(), 1);
  assert_eq!(output_bytes(&decoder), BLUE);

  // sync and async renders interleave in order: the sync call drains the
  // in-flight render (1 -> 0) before advancing again (0 -> 1).
  decoder.render_next();
  decoder.render_next_sync();
  assert_eq!(decoder.current_index(), 1);
  assert_eq!(output_bytes(&decoder), BLUE);
}

#[test]
fn file_backed_streams_decode_identically_to_memory() {
  let bytes = minimal_two_frame();
  let path = std::env::temp_dir().join("anipng-file-backed-decode.png");
  std::fs::write(&path, &bytes).unwrap();

  let mut from_file = ApngDecoder::open(&path, DecoderOptions::new()).unwrap();
  let mut from_memory = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  for _ in 0..4 {
    assert_eq!(from_file.current_index(), from_memory.current_index());
    assert_eq!(output_bytes(&from_file), output_bytes(&from_memory));
    from_file.render_next_sync();
    from_memory.render_next_sync();
  }
  drop(from_file);
  let _ = std::fs::remove_file(&path);
}

#[test]
fn ancillary_chunks_are_carried_into_every_frame() {
  // an indexed-color animation: the PLTE between acTL and the image data
  // must reach the synthesized PNG of *every* frame, or nothing decodes.
  let plte = encode_chunk(ChunkName::PLTE, &[255, 0, 0, 0, 0, 255]);
  let pix = |indexes: &[u8]| {
    let mut raw = vec![0];
    raw.extend(indexes);
    miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6)
  };
  let mut ihdr_payload = Vec::new();
  ihdr_payload.extend(1_u32.to_be_bytes());
  ihdr_payload.extend(1_u32.to_be_bytes());
  ihdr_payload.extend([8, 3, 0, 0, 0]); // 8-bit indexed
  let mut fdat_payload = 2_u32.to_be_bytes().to_vec();
  fdat_payload.extend(pix(&[1]));
  let bytes = stream(&[
    encode_chunk(ChunkName::IHDR, &ihdr_payload),
    actl_chunk(2, 0),
    plte,
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    encode_chunk(ChunkName::IDAT, &pix(&[0])),
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    encode_chunk(ChunkName::fdAT, &fdat_payload),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  assert_eq!(output_bytes(&decoder), RED);
  decoder.render_next_sync();
  assert_eq!(output_bytes(&decoder), BLUE);
}

#[test]
fn truly_random_bytes_never_panic_the_decoder() {
  for _ in 0..10 {
    let bytes = crate::rand_bytes(1024);
    // almost certainly not a PNG; the point is that it fails cleanly.
    let _ = ApngDecoder::from_bytes(bytes, DecoderOptions::new());
  }
}

#[test]
fn missing_frame_data_is_reported() {
  // an fcTL with no data chunks behind it at all.
  let bytes = stream(&[
    ihdr_chunk(1, 1),
    actl_chunk(2, 0),
    fctl_chunk(0, 1, 1, 0, 0, 0, 0),
    idat_chunk(1, &[RED]),
    fctl_chunk(1, 1, 1, 0, 0, 0, 0),
    iend_chunk(),
  ]);
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  decoder.render_next_sync();
  assert!(matches!(
    decoder.output(),
    Some(Err(ApngError::FrameDataNotFound { expected_sequence: 2 }))
  ));
}

#[test]
fn missing_trailer_is_reported_at_end_of_pass() {
  let mut bytes = minimal_two_frame();
  bytes.truncate(bytes.len() - 12); // drop the IEND
  let mut decoder = ApngDecoder::from_bytes(bytes, DecoderOptions::new()).unwrap();
  decoder.render_next_sync();
  assert!(matches!(
    decoder.output(),
    Some(Err(ApngError::LackOfChunk(name))) if name == b"IEND"
  ));
}
