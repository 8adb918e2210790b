// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Temporal resampling of pose sequences.
//!
//! Sequences are brought to a common length by linear interpolation along the time
//! axis, independently for every landmark coordinate and confidence channel. New
//! sample instants are spread uniformly over the original frame grid and values
//! outside it clamp to the first or last frame.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use ndarray::{Array2, Array3};

use crate::error::{PoseError, Result};
use crate::sequence::PoseSequence;

/// Slack added before flooring the output frame count, so that `duration * rate`
/// landing a rounding error below an integer does not lose a frame.
const FRAME_COUNT_EPSILON: f64 = 1e-6;

/// Frame rate that maps `frames` native frames at `fps` onto `target_frames` frames.
///
/// This is `(target_frames / frames) * fps`.
#[must_use]
pub fn target_rate(frames: usize, fps: f64, target_frames: usize) -> f64 {
    (target_frames as f64 / frames as f64) * fps
}

/// Largest frame count a resample may produce.
pub const MAX_OUTPUT_FRAMES: usize = 1 << 16;

/// Number of frames produced when a sequence of `frames` frames at `fps` is resampled
/// to `new_fps`. Never less than one.
///
/// # Errors
///
/// Returns [`PoseError::DegenerateInput`] if `duration * new_fps` is not finite or the
/// count exceeds [`MAX_OUTPUT_FRAMES`].
pub fn output_frames(frames: usize, fps: f64, new_fps: f64) -> Result<usize> {
    let duration = frames as f64 / fps;
    let count = duration.mul_add(new_fps, FRAME_COUNT_EPSILON).floor();
    if !count.is_finite() || count > MAX_OUTPUT_FRAMES as f64 {
        return Err(PoseError::DegenerateInput(format!(
            "{frames} frames at {fps} fps resampled to {new_fps} fps gives {count} frames, limit is {MAX_OUTPUT_FRAMES}"
        )));
    }
    Ok(if count < 1.0 { 1 } else { count as usize })
}

/// Resample a sequence to `target_frames` frames.
///
/// The output frame rate is [`target_rate`] of the input.
///
/// # Errors
///
/// Returns [`PoseError::DegenerateInput`] if the sequence has no frames or its frame
/// rate yields an unbounded output, and [`PoseError::Config`] if `target_frames` is zero.
pub fn resample(sequence: &PoseSequence, target_frames: usize) -> Result<PoseSequence> {
    if target_frames == 0 {
        return Err(PoseError::Config("target frame count must be positive".to_string()));
    }
    if sequence.frames() == 0 {
        return Err(PoseError::DegenerateInput(
            "cannot resample a sequence with no frames".to_string(),
        ));
    }
    let new_fps = target_rate(sequence.frames(), sequence.fps(), target_frames);
    resample_to_rate(sequence, new_fps)
}

/// Resample a sequence to a new frame rate, keeping its duration.
///
/// # Arguments
///
/// * `sequence` - Input sequence with `n0` frames at rate `r0`.
/// * `new_fps` - Target rate `r1`.
///
/// # Returns
///
/// * A new sequence of [`output_frames`] frames at `new_fps`. When `new_fps` equals the
///   native rate the output equals the input.
///
/// # Errors
///
/// Returns [`PoseError::DegenerateInput`] if the sequence has no frames or the output
/// would exceed [`MAX_OUTPUT_FRAMES`], and [`PoseError::Config`] if `new_fps` is not a
/// positive finite number.
pub fn resample_to_rate(sequence: &PoseSequence, new_fps: f64) -> Result<PoseSequence> {
    let n0 = sequence.frames();
    if n0 == 0 {
        return Err(PoseError::DegenerateInput(
            "cannot resample a sequence with no frames".to_string(),
        ));
    }
    if !(new_fps.is_finite() && new_fps > 0.0) {
        return Err(PoseError::Config(format!("invalid target frame rate {new_fps}")));
    }

    let k = output_frames(n0, sequence.fps(), new_fps)?;
    let steps: Vec<Step> = (0..k).map(|j| Step::new(j, k, n0)).collect();

    let data = sequence.data();
    let (_, points, dims) = data.dim();
    let resampled = Array3::from_shape_fn((k, points, dims), |(j, p, d)| {
        let step = &steps[j];
        lerp(data[[step.lo, p, d]], data[[step.hi, p, d]], step.frac)
    });

    let confidence = sequence.confidence();
    let resampled_conf = Array2::from_shape_fn((k, points), |(j, p)| {
        let step = &steps[j];
        lerp(confidence[[step.lo, p]], confidence[[step.hi, p]], step.frac)
    });

    PoseSequence::new(resampled, resampled_conf, new_fps)
}

/// Position of one output sample on the original frame grid.
#[derive(Debug, Clone, Copy)]
struct Step {
    lo: usize,
    hi: usize,
    frac: f32,
}

impl Step {
    fn new(j: usize, k: usize, n0: usize) -> Self {
        let last = n0 - 1;
        if k == 1 || last == 0 {
            return Self {
                lo: 0,
                hi: 0,
                frac: 0.0,
            };
        }
        let t = (j * last) as f64 / (k - 1) as f64;
        let lo = (t.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let frac = (t - lo as f64).clamp(0.0, 1.0) as f32;
        Self { lo, hi, frac }
    }
}

/// Linear interpolation that never leaves `[min(a, b), max(a, b)]`.
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t == 0.0 {
        return a;
    }
    let value = (b - a).mul_add(t, a);
    value.max(a.min(b)).min(a.max(b))
}
