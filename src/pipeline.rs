// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Raw example processing: topology selection, normalization, resampling.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::corpus::PoseSample;
use crate::error::{PoseError, Result};
use crate::normalize::normalize;
use crate::resample::resample;
use crate::sequence::PoseSequence;
use crate::topology::{Selection, Topology};

/// A raw example as delivered by a corpus provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExample {
    /// Example identifier.
    pub id: String,
    /// Signer identity.
    pub signer: u64,
    /// Class (gloss) identifier.
    pub label: i64,
    /// Native frame rate; the pipeline's configured rate is used when absent.
    #[serde(default)]
    pub fps: Option<f64>,
    /// Coordinates as `[frames][points][dims]`, laid out in the raw topology order.
    pub data: Vec<Vec<Vec<f32>>>,
    /// Confidence as `[frames][points]`.
    pub confidence: Vec<Vec<f32>>,
}

/// Validated processing pipeline for one raw topology.
///
/// Construction checks every group and anchor against the topology, so a bad
/// configuration fails before any example is read.
#[derive(Debug, Clone)]
pub struct PosePipeline {
    selection: Selection,
    anchors: (usize, usize),
    config: PipelineConfig,
}

impl PosePipeline {
    /// Create a pipeline for examples laid out in `topology`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] if the configuration is invalid, a selected group
    /// is not part of `topology`, or an anchor is not part of the selected groups.
    pub fn new(topology: &Topology, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let selection = topology.select(&config.groups).map_err(|err| match err {
            PoseError::Topology(msg) | PoseError::Config(msg) => PoseError::Config(msg),
            other => other,
        })?;
        let anchors = config.anchors.resolve(selection.topology())?;
        Ok(Self {
            selection,
            anchors,
            config,
        })
    }

    /// Configuration this pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Group selection applied to every example.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Flat indices of the anchors inside the selected topology.
    #[must_use]
    pub const fn anchors(&self) -> (usize, usize) {
        self.anchors
    }

    /// Turn a raw example into a stored sample.
    ///
    /// # Errors
    ///
    /// * [`PoseError::DegenerateInput`] if the example has no frames.
    /// * [`PoseError::Shape`] if its arrays are ragged.
    /// * [`PoseError::Topology`] if it does not cover the raw topology.
    /// * [`PoseError::DegenerateAnchor`] if its anchors never form a valid pair.
    pub fn process(&self, raw: RawExample) -> Result<PoseSample> {
        if raw.data.is_empty() {
            return Err(PoseError::DegenerateInput(format!(
                "example '{}' has no frames",
                raw.id
            )));
        }
        let fps = raw.fps.unwrap_or(self.config.native_fps);
        let sequence = PoseSequence::from_nested(&raw.data, &raw.confidence, fps)?;
        let sample = self.process_sequence(&sequence)?;
        Ok(PoseSample::new(raw.id, raw.signer, sample, raw.label))
    }

    /// Run selection, normalization, and resampling on a sequence in the raw topology.
    ///
    /// # Errors
    ///
    /// See [`PosePipeline::process`].
    pub fn process_sequence(&self, sequence: &PoseSequence) -> Result<PoseSequence> {
        let selected = self.selection.apply_sequence(sequence)?;
        let normalized = normalize(&selected, self.anchors)?;
        resample(&normalized, self.config.target_frames)
    }
}
