// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Anchor-based pose normalization.
//!
//! Every frame is translated so the midpoint between two anchor landmarks sits at
//! the origin and scaled so the anchors are exactly one unit apart. Shoulders are
//! the usual anchors, which makes signers of different builds and camera
//! distances directly comparable.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PoseError, Result};
use crate::sequence::PoseSequence;
use crate::topology::{LandmarkId, POSE_LANDMARKS, Topology};

/// Anchor distances at or below this are treated as coincident.
pub const MIN_ANCHOR_DISTANCE: f32 = 1e-6;

/// Two landmarks that define the normalization reference frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorPair {
    /// First anchor (e.g. right shoulder).
    pub first: LandmarkId,
    /// Second anchor (e.g. left shoulder).
    pub second: LandmarkId,
}

impl AnchorPair {
    /// Create an anchor pair.
    #[must_use]
    pub const fn new(first: LandmarkId, second: LandmarkId) -> Self {
        Self { first, second }
    }

    /// Right and left shoulder of the body pose group.
    #[must_use]
    pub fn shoulders() -> Self {
        Self::new(
            LandmarkId::new(POSE_LANDMARKS, "RIGHT_SHOULDER"),
            LandmarkId::new(POSE_LANDMARKS, "LEFT_SHOULDER"),
        )
    }

    /// Resolve both anchors to flat point indices in `topology`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] if either anchor is not part of the topology or
    /// both name the same landmark.
    pub fn resolve(&self, topology: &Topology) -> Result<(usize, usize)> {
        let find = |id: &LandmarkId| {
            topology
                .point_index(id)
                .ok_or_else(|| PoseError::Config(format!("anchor {id} not found in topology")))
        };
        let first = find(&self.first)?;
        let second = find(&self.second)?;
        if first == second {
            return Err(PoseError::Config(format!(
                "anchors {} and {} are the same landmark",
                self.first, self.second
            )));
        }
        Ok((first, second))
    }
}

impl Default for AnchorPair {
    fn default() -> Self {
        Self::shoulders()
    }
}

/// Per-frame reference: anchor midpoint and anchor distance.
#[derive(Debug, Clone)]
struct Reference {
    midpoint: Array1<f32>,
    distance: f32,
}

fn frame_reference(
    frame: ArrayView2<f32>,
    confidence: ArrayView1<f32>,
    (a, b): (usize, usize),
) -> Option<Reference> {
    if confidence[a] <= 0.0 || confidence[b] <= 0.0 {
        return None;
    }
    let pa = frame.row(a);
    let pb = frame.row(b);
    let distance = pa
        .iter()
        .zip(pb.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt();
    // NaN fails this comparison as well
    if !(distance > MIN_ANCHOR_DISTANCE) {
        return None;
    }
    let midpoint = (&pa + &pb) * 0.5;
    Some(Reference { midpoint, distance })
}

/// Normalize a sequence against two anchor points.
///
/// An anchor pair is valid in a frame when both anchors have positive confidence and
/// are more than [`MIN_ANCHOR_DISTANCE`] apart. Frames with a valid pair are centered
/// on the anchor midpoint and scaled by the inverse anchor distance. Frames without
/// one reuse the reference of the closest preceding valid frame, or of the first valid
/// frame when none precedes them. Confidence is copied unchanged.
///
/// # Arguments
///
/// * `sequence` - Input sequence.
/// * `anchors` - Flat point indices of the two anchors.
///
/// # Returns
///
/// * A new normalized sequence; the input is not modified.
///
/// # Errors
///
/// Returns [`PoseError::DegenerateAnchor`] if an anchor index is outside the sequence,
/// both indices are equal, or no frame has a valid anchor pair.
pub fn normalize(sequence: &PoseSequence, anchors: (usize, usize)) -> Result<PoseSequence> {
    let (a, b) = anchors;
    let points = sequence.points();
    if a >= points || b >= points {
        return Err(PoseError::DegenerateAnchor(format!(
            "anchor indices ({a}, {b}) are absent from a sequence of {points} points"
        )));
    }
    if a == b {
        return Err(PoseError::DegenerateAnchor(format!(
            "anchor indices ({a}, {b}) coincide"
        )));
    }

    let references: Vec<Option<Reference>> = sequence
        .data()
        .outer_iter()
        .zip(sequence.confidence().outer_iter())
        .map(|(frame, confidence)| frame_reference(frame, confidence, anchors))
        .collect();

    let Some(mut current) = references.iter().position(Option::is_some) else {
        return Err(PoseError::DegenerateAnchor(format!(
            "anchors ({a}, {b}) are missing or coincide in all {} frames",
            sequence.frames()
        )));
    };

    let mut data = sequence.data().clone();
    for (f, mut frame) in data.axis_iter_mut(Axis(0)).enumerate() {
        if references[f].is_some() {
            current = f;
        }
        let Some(reference) = references[current].as_ref() else {
            continue;
        };
        for mut point in frame.outer_iter_mut() {
            point -= &reference.midpoint;
            point /= reference.distance;
        }
    }

    PoseSequence::new(data, sequence.confidence().clone(), sequence.fps())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn distance(seq: &PoseSequence, f: usize, a: usize, b: usize) -> f32 {
        let data = seq.data();
        (0..seq.dims())
            .map(|d| (data[[f, a, d]] - data[[f, b, d]]).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    fn moving_sequence(dims: usize) -> PoseSequence {
        // Anchors drift apart and move across the image over time
        let data = Array3::from_shape_fn((6, 4, dims), |(f, p, d)| {
            let f = f as f32;
            match (p, d) {
                (0, 0) => 100.0 + 3.0 * f,
                (1, 0) => 160.0 + 11.0 * f,
                (_, 0) => 120.0 + p as f32 * 7.0,
                (_, 1) => 200.0 + 2.0 * f + p as f32,
                _ => 0.5 * f,
            }
        });
        PoseSequence::new(data, Array2::ones((6, 4)), 30.0).unwrap()
    }

    #[test]
    fn test_anchor_distance_is_unit() {
        for dims in [2, 3] {
            let seq = moving_sequence(dims);
            let normalized = normalize(&seq, (0, 1)).unwrap();
            for f in 0..normalized.frames() {
                assert!((distance(&normalized, f, 0, 1) - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_midpoint_is_origin() {
        let normalized = normalize(&moving_sequence(2), (0, 1)).unwrap();
        let data = normalized.data();
        for f in 0..normalized.frames() {
            for d in 0..2 {
                assert!((data[[f, 0, d]] + data[[f, 1, d]]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_confidence_untouched() {
        let mut seq = moving_sequence(2);
        let conf = Array2::from_shape_fn((6, 4), |(f, p)| 0.1 + (f * 4 + p) as f32 * 0.01);
        seq = PoseSequence::new(seq.data().clone(), conf.clone(), 30.0).unwrap();
        let normalized = normalize(&seq, (0, 1)).unwrap();
        assert_eq!(normalized.confidence(), &conf);
    }

    #[test]
    fn test_input_not_mutated() {
        let seq = moving_sequence(2);
        let before = seq.clone();
        let _ = normalize(&seq, (0, 1)).unwrap();
        assert_eq!(seq, before);
    }

    #[test]
    fn test_degenerate_anchors() {
        let data = Array3::from_elem((4, 3, 2), 5.0);
        let seq = PoseSequence::new(data, Array2::ones((4, 3)), 30.0).unwrap();
        assert!(matches!(
            normalize(&seq, (0, 1)),
            Err(PoseError::DegenerateAnchor(_))
        ));
        assert!(matches!(
            normalize(&seq, (0, 0)),
            Err(PoseError::DegenerateAnchor(_))
        ));
        assert!(matches!(
            normalize(&seq, (0, 9)),
            Err(PoseError::DegenerateAnchor(_))
        ));
    }

    #[test]
    fn test_missing_anchor_everywhere() {
        let seq = moving_sequence(2);
        let mut conf = Array2::ones((6, 4));
        conf.column_mut(1).fill(0.0);
        let seq = PoseSequence::new(seq.data().clone(), conf, 30.0).unwrap();
        assert!(matches!(
            normalize(&seq, (0, 1)),
            Err(PoseError::DegenerateAnchor(_))
        ));
    }

    #[test]
    fn test_invalid_frame_reuses_previous_reference() {
        let seq = moving_sequence(2);
        let mut conf = Array2::ones((6, 4));
        conf[[3, 0]] = 0.0;
        conf[[0, 1]] = 0.0;
        let masked = PoseSequence::new(seq.data().clone(), conf, 30.0).unwrap();
        let normalized = normalize(&masked, (0, 1)).unwrap();

        // Frame 3 is transformed with frame 2's reference
        let mid_x = (seq.data()[[2, 0, 0]] + seq.data()[[2, 1, 0]]) / 2.0;
        let dist = distance(&seq, 2, 0, 1);
        let expected = (seq.data()[[3, 2, 0]] - mid_x) / dist;
        assert!((normalized.data()[[3, 2, 0]] - expected).abs() < 1e-5);

        // Frame 0 has no predecessor and borrows frame 1's reference
        let mid_x = (seq.data()[[1, 0, 0]] + seq.data()[[1, 1, 0]]) / 2.0;
        let dist = distance(&seq, 1, 0, 1);
        let expected = (seq.data()[[0, 2, 0]] - mid_x) / dist;
        assert!((normalized.data()[[0, 2, 0]] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_resolve_anchors() {
        let topology = Topology::holistic();
        assert_eq!(AnchorPair::shoulders().resolve(&topology).unwrap(), (12, 11));

        let missing = AnchorPair::new(
            LandmarkId::new(POSE_LANDMARKS, "RIGHT_SHOULDER"),
            LandmarkId::new("TAIL", "TIP"),
        );
        assert!(matches!(
            missing.resolve(&topology),
            Err(PoseError::Config(_))
        ));

        let same = AnchorPair::new(
            LandmarkId::new(POSE_LANDMARKS, "NOSE"),
            LandmarkId::new(POSE_LANDMARKS, "NOSE"),
        );
        assert!(same.resolve(&topology).is_err());
    }
}
