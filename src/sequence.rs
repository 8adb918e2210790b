// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose sequences: per-frame landmark coordinates, confidence, and frame rate.

#![allow(clippy::cast_precision_loss)]

use ndarray::{Array2, Array3};

use crate::error::{PoseError, Result};

/// A sequence of pose frames sharing a single topology.
///
/// Coordinates are stored with shape (frames, points, dims) where dims is 2 (x, y)
/// or 3 (x, y, z). Confidence is stored separately with shape (frames, points).
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSequence {
    data: Array3<f32>,
    confidence: Array2<f32>,
    fps: f64,
}

impl PoseSequence {
    /// Create a sequence from coordinate and confidence arrays.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Shape`] if the confidence shape does not match the first two
    /// coordinate axes, the coordinate dimensionality is not 2 or 3, or the frame rate
    /// is not a positive finite number.
    pub fn new(data: Array3<f32>, confidence: Array2<f32>, fps: f64) -> Result<Self> {
        let shape = data.shape();
        if confidence.shape() != &shape[..2] {
            return Err(PoseError::Shape(format!(
                "confidence shape {:?} does not match coordinate shape {:?}",
                confidence.shape(),
                shape
            )));
        }
        if !(2..=3).contains(&shape[2]) {
            return Err(PoseError::Shape(format!(
                "coordinate dimensionality must be 2 or 3, got {}",
                shape[2]
            )));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(PoseError::Shape(format!("invalid frame rate {fps}")));
        }
        Ok(Self {
            data,
            confidence,
            fps,
        })
    }

    /// Build a sequence from nested `[frames][points][dims]` and `[frames][points]` vectors.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Shape`] if the input is ragged or empty, or any of the
    /// conditions of [`PoseSequence::new`] fail.
    pub fn from_nested(data: &[Vec<Vec<f32>>], confidence: &[Vec<f32>], fps: f64) -> Result<Self> {
        let frames = data.len();
        let points = data.first().map_or(0, Vec::len);
        let dims = data
            .first()
            .and_then(|frame| frame.first())
            .map_or(0, Vec::len);
        if frames == 0 || points == 0 {
            return Err(PoseError::Shape("pose data has no frames or points".to_string()));
        }
        if confidence.len() != frames {
            return Err(PoseError::Shape(format!(
                "{} confidence frames for {frames} coordinate frames",
                confidence.len()
            )));
        }

        let mut flat = Vec::with_capacity(frames * points * dims);
        let mut conf = Vec::with_capacity(frames * points);
        for (f, (frame, frame_conf)) in data.iter().zip(confidence).enumerate() {
            if frame.len() != points || frame_conf.len() != points {
                return Err(PoseError::Shape(format!(
                    "frame {f} has {} points and {} confidences, expected {points}",
                    frame.len(),
                    frame_conf.len()
                )));
            }
            for point in frame {
                if point.len() != dims {
                    return Err(PoseError::Shape(format!(
                        "frame {f} has a point with {} dims, expected {dims}",
                        point.len()
                    )));
                }
                flat.extend_from_slice(point);
            }
            conf.extend_from_slice(frame_conf);
        }

        let data = Array3::from_shape_vec((frames, points, dims), flat)
            .map_err(|e| PoseError::Shape(e.to_string()))?;
        let confidence = Array2::from_shape_vec((frames, points), conf)
            .map_err(|e| PoseError::Shape(e.to_string()))?;
        Self::new(data, confidence, fps)
    }

    /// Coordinates with shape (frames, points, dims).
    #[must_use]
    pub const fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Confidence with shape (frames, points).
    #[must_use]
    pub const fn confidence(&self) -> &Array2<f32> {
        &self.confidence
    }

    /// Native frame rate.
    #[must_use]
    pub const fn fps(&self) -> f64 {
        self.fps
    }

    /// Number of frames.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.data.shape()[0]
    }

    /// Number of points per frame.
    #[must_use]
    pub fn points(&self) -> usize {
        self.data.shape()[1]
    }

    /// Coordinate dimensionality (2 or 3).
    #[must_use]
    pub fn dims(&self) -> usize {
        self.data.shape()[2]
    }

    /// Duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.fps
    }

    /// Consume the sequence, returning coordinates, confidence, and frame rate.
    #[must_use]
    pub fn into_parts(self) -> (Array3<f32>, Array2<f32>, f64) {
        (self.data, self.confidence, self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nested() {
        let data = vec![
            vec![vec![0.0, 1.0], vec![2.0, 3.0]],
            vec![vec![4.0, 5.0], vec![6.0, 7.0]],
            vec![vec![8.0, 9.0], vec![10.0, 11.0]],
        ];
        let confidence = vec![vec![1.0, 0.5]; 3];
        let seq = PoseSequence::from_nested(&data, &confidence, 30.0).unwrap();

        assert_eq!(seq.frames(), 3);
        assert_eq!(seq.points(), 2);
        assert_eq!(seq.dims(), 2);
        assert!((seq.data()[[2, 1, 0]] - 10.0).abs() < f32::EPSILON);
        assert!((seq.confidence()[[1, 1]] - 0.5).abs() < f32::EPSILON);
        assert!((seq.duration() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_from_nested_rejects_ragged() {
        let data = vec![vec![vec![0.0, 1.0]], vec![vec![0.0, 1.0], vec![2.0, 3.0]]];
        let confidence = vec![vec![1.0], vec![1.0, 1.0]];
        assert!(matches!(
            PoseSequence::from_nested(&data, &confidence, 30.0),
            Err(PoseError::Shape(_))
        ));

        let data = vec![vec![vec![0.0, 1.0], vec![2.0]]];
        let confidence = vec![vec![1.0, 1.0]];
        assert!(PoseSequence::from_nested(&data, &confidence, 30.0).is_err());
    }

    #[test]
    fn test_new_validates() {
        let conf = Array2::<f32>::ones((2, 3));
        assert!(PoseSequence::new(Array3::zeros((2, 3, 2)), conf.clone(), 30.0).is_ok());
        assert!(PoseSequence::new(Array3::zeros((2, 3, 4)), conf.clone(), 30.0).is_err());
        assert!(PoseSequence::new(Array3::zeros((2, 4, 2)), conf.clone(), 30.0).is_err());
        assert!(PoseSequence::new(Array3::zeros((2, 3, 2)), conf, 0.0).is_err());
    }
}
