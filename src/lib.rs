// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Pose Corpus Library
//!
//! Preparation of labeled body-pose keypoint sequences for gesture and sign
//! classification. Raw examples of named landmarks with per-point confidence are
//! restricted to a landmark topology, normalized against a pair of anchor landmarks,
//! resampled to a consistent length, and stored in an immutable corpus. Retrieval
//! optionally applies a random 2D affine perturbation at training time and projects
//! coordinates to the requested dimensionality. Corpora split into train and
//! validation partitions with disjoint signers.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pose_corpus::{CorpusBuilder, JsonlProvider, PipelineConfig, PosePipeline, Topology};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // MediaPipe Holistic layout, keep body pose and both hands
//!     let pipeline = PosePipeline::new(&Topology::holistic(), PipelineConfig::new())?;
//!
//!     // Build a training corpus from a JSON-lines file
//!     let report = CorpusBuilder::new(pipeline).build(&JsonlProvider::new("autsl.jsonl"), true)?;
//!     let corpus = report.corpus;
//!
//!     for i in 0..corpus.len() {
//!         let item = corpus.get(i)?;
//!         println!("{} signer {} -> {:?}", item.id, item.signer, item.features.shape());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Signer-Disjoint Splits
//!
//! ```no_run
//! use std::collections::HashSet;
//! use pose_corpus::{CorpusBuilder, JsonlProvider, PipelineConfig, PosePipeline, Topology, split_by_signer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PosePipeline::new(&Topology::holistic(), PipelineConfig::new())?;
//! let corpus = CorpusBuilder::new(pipeline)
//!     .build(&JsonlProvider::new("autsl.jsonl"), true)?
//!     .corpus;
//!
//! let (train, validation) = split_by_signer(&corpus, &HashSet::from([3, 7]));
//! assert!(train.is_train());
//! assert!(!validation.is_train());
//! # Ok(())
//! # }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Build a corpus and report its contents
//! pose-corpus prepare --input autsl.jsonl
//!
//! # Hold out two signers and seed augmentation
//! pose-corpus prepare -i autsl.jsonl --held-out 3,7 --seed 42
//!
//! # Custom topology and groups
//! pose-corpus prepare -i corpus.jsonl -t openpose.json --groups BODY,LEFT_HAND,RIGHT_HAND
//! ```
//!
//! **CLI Options:**
//!
//! | Option | Short | Description | Default |
//! |--------|-------|-------------|---------|
//! | `--input` | `-i` | JSON-lines corpus | required |
//! | `--topology` | `-t` | JSON topology descriptor | MediaPipe Holistic |
//! | `--groups` | | Landmark groups to keep | pose + both hands |
//! | `--frames` | | Resample frame-count numerator | `32` |
//! | `--fps` | | Native frame rate fallback | `30` |
//! | `--dims` | | Output dimensionality | `2` |
//! | `--held-out` | | Validation signer ids | none |
//! | `--seed` | | Augmentation seed | unseeded |
//! | `--half` | | FP16 feature tensors | `false` |
//!
//! ## Custom Configuration
//!
//! ```rust
//! use pose_corpus::{AugmentationConfig, AugmentSeed, PipelineConfig};
//!
//! let config = PipelineConfig::new()
//!     .with_target_frames(48)                    // Resample numerator
//!     .with_output_dims(3)                       // Keep depth
//!     .with_augmentation(AugmentationConfig::new().with_rotation(0.1))
//!     .with_seed(AugmentSeed::Seeded(42));       // Reproducible draws
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`topology`] | Landmark groups, identities, and group selection ([`Topology`], [`Selection`]) |
//! | [`sequence`] | Coordinate and confidence arrays ([`PoseSequence`]) |
//! | [`normalize`] | Anchor-pair normalization ([`AnchorPair`]) |
//! | [`resample`] | Temporal resampling by linear interpolation |
//! | [`augment`] | Training-time affine perturbation ([`Augmenter`]) |
//! | [`corpus`] | Samples, corpus retrieval, projection ([`Corpus`], [`TensorData`]) |
//! | [`split`] | Signer-disjoint splitting |
//! | [`pipeline`] | Per-example processing ([`PosePipeline`], [`RawExample`]) |
//! | [`provider`] | Providers, caches, corpus building ([`CorpusBuilder`]) |
//! | [`config`] | [`PipelineConfig`] and [`RetrievalConfig`] |
//! | [`error`] | Error types ([`PoseError`], [`Result`]) |
//!
//! ## License
//!
//! This project is licensed under [AGPL-3.0](https://ultralytics.com/license).

// Modules
pub mod augment;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod resample;
pub mod sequence;
pub mod split;
pub mod topology;

// Re-export main types for convenience
pub use augment::{AugmentSeed, AugmentationConfig, Augmenter};
pub use config::{PipelineConfig, RetrievalConfig};
pub use corpus::{Corpus, CorpusItem, PoseSample, TensorData, project};
pub use error::{PoseError, Result};
pub use normalize::{AnchorPair, normalize};
pub use pipeline::{PosePipeline, RawExample};
pub use provider::{
    BuildReport, CachedBuild, CorpusBuilder, CorpusCache, CorpusProvider, JsonlProvider,
    MemoryCache, Rejection,
};
pub use resample::{resample, resample_to_rate};
pub use sequence::PoseSequence;
pub use split::split_by_signer;
pub use topology::{LandmarkGroup, LandmarkId, Selection, Topology};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pose-corpus");
    }
}
