// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pipeline and retrieval configuration.
//!
//! This module defines [`PipelineConfig`], which controls how raw examples are turned
//! into stored samples (landmark groups, normalization anchors, temporal resampling)
//! and how samples are turned into feature tensors at retrieval time (output
//! dimensionality, augmentation bounds, seeding, precision).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::augment::{AugmentSeed, AugmentationConfig};
use crate::error::{PoseError, Result};
use crate::normalize::AnchorPair;
use crate::resample::MAX_OUTPUT_FRAMES;
use crate::topology::{LEFT_HAND_LANDMARKS, POSE_LANDMARKS, RIGHT_HAND_LANDMARKS};

/// Landmark groups kept by default: body pose and both hands (75 points).
pub const DEFAULT_GROUPS: [&str; 3] = [POSE_LANDMARKS, LEFT_HAND_LANDMARKS, RIGHT_HAND_LANDMARKS];

/// Default resample frame-count numerator.
pub const DEFAULT_TARGET_FRAMES: usize = 32;

/// Default native frame rate of raw examples.
pub const DEFAULT_NATIVE_FPS: f64 = 30.0;

/// Default output coordinate dimensionality.
pub const DEFAULT_OUTPUT_DIMS: usize = 2;

/// Settings applied when a corpus turns a stored sample into a feature tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    /// Number of leading coordinate channels kept in the feature tensor.
    pub output_dims: usize,
    /// Augmentation bounds for training corpora.
    pub augmentation: AugmentationConfig,
    /// Augmentation seeding policy.
    pub seed: AugmentSeed,
    /// Whether feature tensors are returned in FP16.
    pub half: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            output_dims: DEFAULT_OUTPUT_DIMS,
            augmentation: AugmentationConfig::default(),
            seed: AugmentSeed::Unseeded,
            half: false,
        }
    }
}

impl RetrievalConfig {
    /// Create a retrieval configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output dimensionality.
    #[must_use]
    pub const fn with_output_dims(mut self, dims: usize) -> Self {
        self.output_dims = dims;
        self
    }

    /// Set the augmentation bounds.
    #[must_use]
    pub const fn with_augmentation(mut self, augmentation: AugmentationConfig) -> Self {
        self.augmentation = augmentation;
        self
    }

    /// Set the augmentation seeding policy.
    #[must_use]
    pub const fn with_seed(mut self, seed: AugmentSeed) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable FP16 feature tensors.
    #[must_use]
    pub const fn with_half(mut self, half: bool) -> Self {
        self.half = half;
        self
    }

    /// Check the output dimensionality and augmentation bounds.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] if the output dimensionality is not 2 or 3, or the
    /// augmentation bounds are invalid.
    pub fn validate(&self) -> Result<()> {
        if !(2..=3).contains(&self.output_dims) {
            return Err(PoseError::Config(format!(
                "output dimensionality must be 2 or 3, got {}",
                self.output_dims
            )));
        }
        self.augmentation.validate()
    }
}

/// Configuration for building a pose corpus.
///
/// Uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use pose_corpus::PipelineConfig;
///
/// let config = PipelineConfig::new()
///     .with_target_frames(48)
///     .with_native_fps(25.0)
///     .with_output_dims(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Landmark groups to keep, in output order.
    pub groups: Vec<String>,
    /// Normalization anchors; both must belong to the selected groups.
    pub anchors: AnchorPair,
    /// Resample frame-count numerator `k` in `new_fps = (k / n0) * fps`.
    pub target_frames: usize,
    /// Frame rate assumed for raw examples that do not carry their own.
    pub native_fps: f64,
    /// Retrieval settings handed to every corpus built with this configuration.
    pub retrieval: RetrievalConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            groups: DEFAULT_GROUPS.iter().map(ToString::to_string).collect(),
            anchors: AnchorPair::shoulders(),
            target_frames: DEFAULT_TARGET_FRAMES,
            native_fps: DEFAULT_NATIVE_FPS,
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values.
    ///
    /// # Returns
    ///
    /// * A new `PipelineConfig` keeping body pose and both hands, normalized on the
    ///   shoulders and resampled with numerator 32 against 30 fps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the landmark groups to keep.
    ///
    /// # Arguments
    ///
    /// * `groups` - Group names, in output order.
    #[must_use]
    pub fn with_groups<S: Into<String>>(mut self, groups: impl IntoIterator<Item = S>) -> Self {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Set the normalization anchors.
    #[must_use]
    pub fn with_anchors(mut self, anchors: AnchorPair) -> Self {
        self.anchors = anchors;
        self
    }

    /// Set the resample frame-count numerator.
    #[must_use]
    pub const fn with_target_frames(mut self, frames: usize) -> Self {
        self.target_frames = frames;
        self
    }

    /// Set the native frame rate assumed for raw examples.
    #[must_use]
    pub const fn with_native_fps(mut self, fps: f64) -> Self {
        self.native_fps = fps;
        self
    }

    /// Set the output coordinate dimensionality.
    #[must_use]
    pub const fn with_output_dims(mut self, dims: usize) -> Self {
        self.retrieval.output_dims = dims;
        self
    }

    /// Set the training-time augmentation bounds.
    #[must_use]
    pub const fn with_augmentation(mut self, augmentation: AugmentationConfig) -> Self {
        self.retrieval.augmentation = augmentation;
        self
    }

    /// Set the augmentation seeding policy.
    #[must_use]
    pub const fn with_seed(mut self, seed: AugmentSeed) -> Self {
        self.retrieval.seed = seed;
        self
    }

    /// Enable or disable FP16 feature tensors.
    #[must_use]
    pub const fn with_half(mut self, half: bool) -> Self {
        self.retrieval.half = half;
        self
    }

    /// Check the values that do not depend on a topology.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] if no groups are selected, the target frame count
    /// is zero or above [`MAX_OUTPUT_FRAMES`], the native rate is not positive, or the
    /// retrieval settings are invalid (see [`RetrievalConfig::validate`]).
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(PoseError::Config("no landmark groups selected".to_string()));
        }
        if self.target_frames == 0 {
            return Err(PoseError::Config("target frame count must be positive".to_string()));
        }
        if !(self.native_fps.is_finite() && self.native_fps > 0.0) {
            return Err(PoseError::Config(format!(
                "native frame rate must be positive, got {}",
                self.native_fps
            )));
        }
        if self.target_frames > MAX_OUTPUT_FRAMES {
            return Err(PoseError::Config(format!(
                "target frame count {} exceeds {MAX_OUTPUT_FRAMES}",
                self.target_frames
            )));
        }
        self.retrieval.validate()
    }

    /// Hash of every setting that affects stored samples.
    ///
    /// Retrieval settings are excluded since they only shape feature tensors. The
    /// value is stable for a given build of the crate.
    #[must_use]
    pub fn cache_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.groups.hash(&mut hasher);
        self.anchors.hash(&mut hasher);
        self.target_frames.hash(&mut hasher);
        self.native_fps.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}
