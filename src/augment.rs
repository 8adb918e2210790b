// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Training-time 2D geometric augmentation.
//!
//! An [`Augmenter`] draws a random affine transform (rotation, shear, per-axis scale,
//! translation) within configured bounds and applies it to the x/y channels of every
//! point of every frame. Any z channel passes through. The input is never modified.

use ndarray::{Array3, ArrayView3, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{PoseError, Result};

/// Largest accepted value for any augmentation bound.
pub const MAX_AUGMENTATION_BOUND: f32 = 1e6;

/// Bounds for the random affine transform.
///
/// Each parameter is drawn uniformly from a symmetric interval:
/// rotation from `[-rotation, rotation]` radians, shear from `[-shear, shear]`,
/// each axis scale from `[1 - scale, 1 + scale]`, and each axis translation from
/// `[-translation, translation]`. A bound of zero disables that component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentationConfig {
    /// Maximum absolute rotation in radians.
    pub rotation: f32,
    /// Maximum absolute shear factor.
    pub shear: f32,
    /// Maximum absolute deviation of each axis scale from 1.
    pub scale: f32,
    /// Maximum absolute translation per axis, in normalized units.
    pub translation: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotation: 0.2,
            shear: 0.2,
            scale: 0.2,
            translation: 0.0,
        }
    }
}

impl AugmentationConfig {
    /// Create a configuration with default bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that leaves every sequence unchanged.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            rotation: 0.0,
            shear: 0.0,
            scale: 0.0,
            translation: 0.0,
        }
    }

    /// Set the rotation bound in radians.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the shear bound.
    #[must_use]
    pub const fn with_shear(mut self, shear: f32) -> Self {
        self.shear = shear;
        self
    }

    /// Set the scale bound.
    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the translation bound.
    #[must_use]
    pub const fn with_translation(mut self, translation: f32) -> Self {
        self.translation = translation;
        self
    }

    /// Check that all bounds are finite, non-negative and at most
    /// [`MAX_AUGMENTATION_BOUND`], and that scaling cannot collapse or mirror an axis.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] describing the first invalid bound.
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("rotation", self.rotation),
            ("shear", self.shear),
            ("scale", self.scale),
            ("translation", self.translation),
        ];
        for (name, value) in bounds {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PoseError::Config(format!(
                    "augmentation {name} bound must be finite and non-negative, got {value}"
                )));
            }
            if value > MAX_AUGMENTATION_BOUND {
                return Err(PoseError::Config(format!(
                    "augmentation {name} bound {value} exceeds {MAX_AUGMENTATION_BOUND}"
                )));
            }
        }
        if self.scale >= 1.0 {
            return Err(PoseError::Config(format!(
                "augmentation scale bound must be below 1, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Seeding policy for training-time augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AugmentSeed {
    /// Fresh thread-local randomness on every retrieval.
    #[default]
    Unseeded,
    /// Deterministic parameters derived from `(seed, epoch, index)`.
    Seeded(u64),
}

/// Derive the RNG seed for one sample in one epoch.
#[must_use]
pub fn sample_seed(seed: u64, epoch: u64, index: usize) -> u64 {
    // splitmix64 finalizer over the combined key
    let mut z = seed
        ^ epoch.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeded RNG for one sample in one epoch.
#[must_use]
pub fn sample_rng(seed: u64, epoch: u64, index: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(sample_seed(seed, epoch, index))
}

/// Concrete parameters of one affine draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParams {
    /// Rotation angle in radians.
    pub rotation: f32,
    /// Shear factor.
    pub shear: f32,
    /// Scale along x and y.
    pub scale: (f32, f32),
    /// Translation along x and y.
    pub translation: (f32, f32),
}

impl AffineParams {
    /// Parameters that map every point to itself.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            rotation: 0.0,
            shear: 0.0,
            scale: (1.0, 1.0),
            translation: (0.0, 0.0),
        }
    }

    /// Draw parameters within `config` bounds.
    pub fn sample<R: Rng + ?Sized>(config: &AugmentationConfig, rng: &mut R) -> Self {
        Self {
            rotation: symmetric(rng, config.rotation),
            shear: symmetric(rng, config.shear),
            scale: (
                1.0 + symmetric(rng, config.scale),
                1.0 + symmetric(rng, config.scale),
            ),
            translation: (
                symmetric(rng, config.translation),
                symmetric(rng, config.translation),
            ),
        }
    }

    /// Linear part `R(rotation) · Shear · diag(scale)` as a row-major 2x2 matrix.
    #[must_use]
    pub fn matrix(&self) -> [[f32; 2]; 2] {
        let (sin, cos) = self.rotation.sin_cos();
        let rotation = [[cos, -sin], [sin, cos]];
        let shear = [[1.0, 0.0], [self.shear, 1.0]];
        let scale = [[self.scale.0, 0.0], [0.0, self.scale.1]];
        matmul(&matmul(&rotation, &shear), &scale)
    }

    /// Apply the transform to the x/y channels of `data`, returning a new array.
    #[must_use]
    pub fn apply(&self, data: ArrayView3<f32>) -> Array3<f32> {
        let m = self.matrix();
        let (tx, ty) = self.translation;
        let mut out = data.to_owned();
        if out.shape()[2] < 2 {
            return out;
        }
        for mut point in out.lanes_mut(Axis(2)) {
            let (x, y) = (point[0], point[1]);
            point[0] = m[0][0].mul_add(x, m[0][1] * y) + tx;
            point[1] = m[1][0].mul_add(x, m[1][1] * y) + ty;
        }
        out
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, bound: f32) -> f32 {
    if bound > 0.0 {
        rng.gen_range(-bound..=bound)
    } else {
        0.0
    }
}

fn matmul(a: &[[f32; 2]; 2], b: &[[f32; 2]; 2]) -> [[f32; 2]; 2] {
    let mut out = [[0.0; 2]; 2];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = a[i][0].mul_add(b[0][j], a[i][1] * b[1][j]);
        }
    }
    out
}

/// Random bounded 2D affine augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Augmenter {
    config: AugmentationConfig,
}

impl Augmenter {
    /// Create an augmenter with the given bounds.
    #[must_use]
    pub const fn new(config: AugmentationConfig) -> Self {
        Self { config }
    }

    /// Configured bounds.
    #[must_use]
    pub const fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    /// Draw fresh parameters from `rng` and apply them to a copy of `data`.
    ///
    /// # Arguments
    ///
    /// * `data` - Coordinates with shape (frames, points, dims).
    /// * `rng` - Random source for this call.
    pub fn augment<R: Rng + ?Sized>(&self, data: ArrayView3<f32>, rng: &mut R) -> Array3<f32> {
        AffineParams::sample(&self.config, rng).apply(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Array3<f32> {
        Array3::from_shape_vec(
            (2, 4, 3),
            vec![
                -0.5, -0.5, 0.1, 0.5, -0.5, 0.2, 0.5, 0.5, 0.3, -0.5, 0.5, 0.4, //
                -0.4, -0.6, 0.5, 0.6, -0.4, 0.6, 0.4, 0.6, 0.7, -0.6, 0.4, 0.8,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_identity_params() {
        let data = square();
        let out = AffineParams::identity().apply(data.view());
        assert_eq!(out, data);
        assert_eq!(
            AffineParams::sample(&AugmentationConfig::disabled(), &mut sample_rng(1, 0, 0)),
            AffineParams::identity()
        );
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let params = AffineParams {
            rotation: std::f32::consts::FRAC_PI_2,
            ..AffineParams::identity()
        };
        let data = Array3::from_shape_vec((1, 1, 2), vec![1.0, 0.0]).unwrap();
        let out = params.apply(data.view());
        assert!(out[[0, 0, 0]].abs() < 1e-6);
        assert!((out[[0, 0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_translation_and_scale() {
        let params = AffineParams {
            scale: (2.0, 0.5),
            translation: (1.0, -1.0),
            ..AffineParams::identity()
        };
        let data = Array3::from_shape_vec((1, 1, 2), vec![3.0, 4.0]).unwrap();
        let out = params.apply(data.view());
        assert!((out[[0, 0, 0]] - 7.0).abs() < 1e-6);
        assert!((out[[0, 0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sampled_params_within_bounds() {
        let config = AugmentationConfig::new().with_translation(0.1);
        let mut rng = sample_rng(7, 0, 0);
        for _ in 0..500 {
            let p = AffineParams::sample(&config, &mut rng);
            assert!(p.rotation.abs() <= 0.2);
            assert!(p.shear.abs() <= 0.2);
            assert!((0.8..=1.2).contains(&p.scale.0));
            assert!((0.8..=1.2).contains(&p.scale.1));
            assert!(p.translation.0.abs() <= 0.1);
            assert!(p.translation.1.abs() <= 0.1);
        }
    }

    #[test]
    fn test_augment_preserves_shape_and_input() {
        let data = square();
        let before = data.clone();
        let augmenter = Augmenter::new(AugmentationConfig::new().with_translation(0.3));
        let out = augmenter.augment(data.view(), &mut rand::thread_rng());
        assert_eq!(out.shape(), data.shape());
        assert_eq!(data, before);
        // z passes through
        for f in 0..2 {
            for p in 0..4 {
                assert!((out[[f, p, 2]] - data[[f, p, 2]]).abs() < f32::EPSILON);
            }
        }
    }

    #[test]
    fn test_same_transform_for_every_frame() {
        let data = Array3::from_shape_vec((2, 1, 2), vec![1.0, 2.0, 1.0, 2.0]).unwrap();
        let out = Augmenter::default().augment(data.view(), &mut sample_rng(3, 1, 4));
        assert!((out[[0, 0, 0]] - out[[1, 0, 0]]).abs() < f32::EPSILON);
        assert!((out[[0, 0, 1]] - out[[1, 0, 1]]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_seeded_rng_reproducible() {
        let data = square();
        let augmenter = Augmenter::default();
        let a = augmenter.augment(data.view(), &mut sample_rng(42, 3, 9));
        let b = augmenter.augment(data.view(), &mut sample_rng(42, 3, 9));
        let c = augmenter.augment(data.view(), &mut sample_rng(42, 4, 9));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(sample_seed(42, 0, 1), sample_seed(42, 1, 0));
    }

    #[test]
    fn test_validate() {
        assert!(AugmentationConfig::default().validate().is_ok());
        assert!(AugmentationConfig::disabled().validate().is_ok());
        assert!(AugmentationConfig::new().with_rotation(-0.1).validate().is_err());
        assert!(AugmentationConfig::new().with_scale(1.0).validate().is_err());
        assert!(AugmentationConfig::new().with_shear(f32::NAN).validate().is_err());
        assert!(AugmentationConfig::new().with_rotation(f32::INFINITY).validate().is_err());
        assert!(AugmentationConfig::new().with_translation(f32::MAX).validate().is_err());
        assert!(
            AugmentationConfig::new()
                .with_translation(MAX_AUGMENTATION_BOUND)
                .validate()
                .is_ok()
        );
    }
}
