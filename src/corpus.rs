// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose samples, the corpus container, and feature retrieval.
//!
//! A [`Corpus`] owns shared, immutable [`PoseSample`]s. Retrieval never touches the
//! stored arrays: augmentation and dimensionality projection always write into new
//! buffers, so a corpus can be read from many threads at once without locking.

use std::collections::BTreeSet;
use std::sync::Arc;

use half::f16;
use ndarray::{Array3, ArrayView3, s};

use crate::augment::{AugmentSeed, Augmenter, sample_rng};
use crate::config::RetrievalConfig;
use crate::error::{PoseError, Result};
use crate::sequence::PoseSequence;

/// A processed, labeled pose sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    id: String,
    signer: u64,
    sequence: PoseSequence,
    label: i64,
}

impl PoseSample {
    /// Create a sample.
    ///
    /// # Arguments
    ///
    /// * `id` - Example identifier.
    /// * `signer` - Identity of the person performing the sign.
    /// * `sequence` - Normalized and resampled pose sequence.
    /// * `label` - Class (gloss) identifier.
    pub fn new(id: impl Into<String>, signer: u64, sequence: PoseSequence, label: i64) -> Self {
        Self {
            id: id.into(),
            signer,
            sequence,
            label,
        }
    }

    /// Example identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Signer identity.
    #[must_use]
    pub const fn signer(&self) -> u64 {
        self.signer
    }

    /// Stored pose sequence.
    #[must_use]
    pub const fn sequence(&self) -> &PoseSequence {
        &self.sequence
    }

    /// Class label.
    #[must_use]
    pub const fn label(&self) -> i64 {
        self.label
    }
}

/// Feature tensor that can be either FP32 or FP16.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// 32-bit floating point tensor.
    Float32(Array3<f32>),
    /// 16-bit floating point tensor.
    Float16(Array3<f16>),
}

impl TensorData {
    /// Get the shape of the tensor (frames, points, dims).
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Float32(t) => t.shape(),
            Self::Float16(t) => t.shape(),
        }
    }

    /// Borrow the FP32 tensor, if this is one.
    #[must_use]
    pub const fn as_f32(&self) -> Option<&Array3<f32>> {
        match self {
            Self::Float32(t) => Some(t),
            Self::Float16(_) => None,
        }
    }

    /// Convert to an owned FP32 tensor.
    #[must_use]
    pub fn to_f32(&self) -> Array3<f32> {
        match self {
            Self::Float32(t) => t.clone(),
            Self::Float16(t) => t.mapv(f16::to_f32),
        }
    }
}

/// One retrieved corpus entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusItem {
    /// Example identifier.
    pub id: String,
    /// Signer identity.
    pub signer: u64,
    /// Features with shape (frames, points, `output_dims`).
    pub features: TensorData,
    /// Class label.
    pub label: i64,
}

/// Keep the leading `output_dims` coordinate channels.
///
/// Returns a new array; when the input has no more than `output_dims` channels it is
/// copied as is.
#[must_use]
pub fn project(data: ArrayView3<f32>, output_dims: usize) -> Array3<f32> {
    if data.shape()[2] > output_dims {
        data.slice(s![.., .., ..output_dims]).to_owned()
    } else {
        data.to_owned()
    }
}

/// Ordered collection of pose samples with indexed feature retrieval.
#[derive(Debug, Clone)]
pub struct Corpus {
    samples: Vec<Arc<PoseSample>>,
    is_train: bool,
    retrieval: RetrievalConfig,
}

impl Corpus {
    /// Create a corpus with default retrieval settings.
    ///
    /// # Arguments
    ///
    /// * `samples` - Shared samples, in retrieval order.
    /// * `is_train` - Whether retrieval applies training-time augmentation.
    #[must_use]
    pub fn new(samples: Vec<Arc<PoseSample>>, is_train: bool) -> Self {
        Self {
            samples,
            is_train,
            retrieval: RetrievalConfig::default(),
        }
    }

    /// Replace the retrieval settings.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] if `retrieval` fails [`RetrievalConfig::validate`].
    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Result<Self> {
        retrieval.validate()?;
        self.retrieval = retrieval;
        Ok(self)
    }

    /// Corpus over `samples` with this corpus's retrieval settings.
    pub(crate) const fn share(&self, samples: Vec<Arc<PoseSample>>, is_train: bool) -> Self {
        Self {
            samples,
            is_train,
            retrieval: self.retrieval,
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the corpus holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether retrieval applies training-time augmentation.
    #[must_use]
    pub const fn is_train(&self) -> bool {
        self.is_train
    }

    /// Retrieval settings.
    #[must_use]
    pub const fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Shared samples in retrieval order.
    #[must_use]
    pub fn samples(&self) -> &[Arc<PoseSample>] {
        &self.samples
    }

    /// Distinct signer identities.
    #[must_use]
    pub fn signers(&self) -> BTreeSet<u64> {
        self.samples.iter().map(|s| s.signer()).collect()
    }

    /// Retrieve sample `index` as a feature tensor.
    ///
    /// Equivalent to [`Corpus::get_for_epoch`] with epoch 0. Unseeded training corpora
    /// draw fresh augmentation on every call; seeded ones return the same draw for
    /// `index` every time, so harnesses wanting a new draw per epoch call
    /// [`Corpus::get_for_epoch`].
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Index`] if `index` is out of range.
    pub fn get(&self, index: usize) -> Result<CorpusItem> {
        self.get_for_epoch(index, 0)
    }

    /// Retrieve sample `index` during training epoch `epoch`.
    ///
    /// The stored sequence is augmented (training corpora only), projected to
    /// `output_dims` channels, and converted to the configured precision. The epoch
    /// only matters for seeded augmentation, where it selects the draw.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Index`] if `index` is out of range.
    pub fn get_for_epoch(&self, index: usize, epoch: u64) -> Result<CorpusItem> {
        let sample = self.samples.get(index).ok_or(PoseError::Index {
            index,
            len: self.samples.len(),
        })?;
        let stored = sample.sequence().data().view();

        let features = if self.is_train {
            let augmented = self.augment(stored, index, epoch);
            project(augmented.view(), self.retrieval.output_dims)
        } else {
            project(stored, self.retrieval.output_dims)
        };

        let features = if self.retrieval.half {
            TensorData::Float16(features.mapv(f16::from_f32))
        } else {
            TensorData::Float32(features)
        };

        Ok(CorpusItem {
            id: sample.id().to_string(),
            signer: sample.signer(),
            features,
            label: sample.label(),
        })
    }

    fn augment(&self, data: ArrayView3<f32>, index: usize, epoch: u64) -> Array3<f32> {
        let augmenter = Augmenter::new(self.retrieval.augmentation);
        match self.retrieval.seed {
            AugmentSeed::Unseeded => augmenter.augment(data, &mut rand::thread_rng()),
            AugmentSeed::Seeded(seed) => augmenter.augment(data, &mut sample_rng(seed, epoch, index)),
        }
    }

    /// Iterate over all items in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<CorpusItem>> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }
}
