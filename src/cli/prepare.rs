// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::collections::{BTreeSet, HashSet};
use std::process;
use std::time::Instant;

use crate::cli::args::PrepareArgs;
use crate::{
    AugmentSeed, Corpus, CorpusBuilder, JsonlProvider, PipelineConfig, PosePipeline, Result,
    Topology, VERSION, split_by_signer,
};
use crate::{error, info, section, success, verbose};

/// What a `prepare` run produced.
#[derive(Debug)]
pub struct PrepareSummary {
    /// Examples that made it into the corpus.
    pub samples: usize,
    /// Examples rejected during processing.
    pub rejected: usize,
    /// Training partition size (the whole corpus when nothing is held out).
    pub train: usize,
    /// Validation partition size.
    pub validation: usize,
    /// Distinct signers in the corpus.
    pub signers: BTreeSet<u64>,
    /// Feature shape of the first retrieved item.
    pub shape: Option<Vec<usize>>,
}

/// Run the `prepare` command, exiting with status 1 on failure.
pub fn run_prepare(args: &PrepareArgs) {
    info!("Ultralytics pose-corpus {VERSION} 🚀 Rust");
    if let Err(e) = prepare(args) {
        error!("{e}");
        process::exit(1);
    }
}

/// Build the corpus described by `args` and report on it.
///
/// # Errors
///
/// Returns an error if the topology or corpus cannot be loaded, the configuration is
/// invalid, or the first item cannot be retrieved.
pub fn prepare(args: &PrepareArgs) -> Result<PrepareSummary> {
    let start = Instant::now();

    let topology = match &args.topology {
        Some(path) => {
            verbose!("Loading topology from {}", path.display());
            Topology::load(path)?
        }
        None => Topology::holistic(),
    };

    let seed = args.seed.map_or(AugmentSeed::Unseeded, AugmentSeed::Seeded);
    let config = PipelineConfig::new()
        .with_groups(args.groups.iter().map(String::as_str))
        .with_target_frames(args.frames)
        .with_native_fps(args.fps)
        .with_output_dims(args.dims)
        .with_seed(seed)
        .with_half(args.half);

    let pipeline = PosePipeline::new(&topology, config)?;
    section!("Pipeline");
    verbose!(
        "groups {:?} -> {} points, {} frames, {} dims",
        args.groups,
        pipeline.selection().num_points(),
        args.frames,
        args.dims
    );

    let provider = JsonlProvider::new(&args.input);
    let report = CorpusBuilder::new(pipeline).build(&provider, true)?;
    let corpus = report.corpus;

    section!("Corpus");
    info!(
        "{}: {} samples, {} rejected",
        args.input.display(),
        corpus.len(),
        report.rejected.len()
    );
    for (id, reason) in &report.rejected {
        verbose!("  {id}: {reason}");
    }
    let signers = corpus.signers();
    info!("signers {signers:?}");

    let (train, validation) = if args.held_out.is_empty() {
        (corpus.clone(), Corpus::new(Vec::new(), false))
    } else {
        let held_out: HashSet<u64> = args.held_out.iter().copied().collect();
        let (train, validation) = split_by_signer(&corpus, &held_out);
        section!("Split");
        info!(
            "train {} samples {:?}, validation {} samples {:?}",
            train.len(),
            train.signers(),
            validation.len(),
            validation.signers()
        );
        (train, validation)
    };

    let shape = match train.iter().next().or_else(|| validation.iter().next()) {
        Some(item) => {
            let item = item?;
            let shape = item.features.shape().to_vec();
            info!("first item '{}' features {shape:?}", item.id);
            Some(shape)
        }
        None => None,
    };

    success!(
        "Prepared {} samples in {:.1}s",
        corpus.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(PrepareSummary {
        samples: corpus.len(),
        rejected: report.rejected.len(),
        train: train.len(),
        validation: validation.len(),
        signers,
        shape,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoseError;
    use crate::pipeline::RawExample;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const TOPOLOGY: &str = r#"{"groups": [
        {"name": "POSE_LANDMARKS", "points": ["NOSE", "LEFT_SHOULDER", "RIGHT_SHOULDER"]},
        {"name": "FACE_LANDMARKS", "points": ["0", "1"]},
        {"name": "HAND", "points": ["WRIST", "THUMB_TIP"]}
    ]}"#;

    fn example(id: &str, signer: u64, frames: usize) -> RawExample {
        RawExample {
            id: id.to_string(),
            signer,
            label: 1,
            fps: None,
            data: (0..frames)
                .map(|f| {
                    (0..7)
                        .map(|p| vec![p as f32 * 2.0 + f as f32 * 0.1, p as f32, 0.5])
                        .collect()
                })
                .collect(),
            confidence: vec![vec![1.0; 7]; frames],
        }
    }

    fn files(examples: &[RawExample]) -> (NamedTempFile, NamedTempFile) {
        let mut corpus = NamedTempFile::new().unwrap();
        for ex in examples {
            writeln!(corpus, "{}", serde_json::to_string(ex).unwrap()).unwrap();
        }
        let mut topology = NamedTempFile::new().unwrap();
        write!(topology, "{TOPOLOGY}").unwrap();
        (corpus, topology)
    }

    fn args(input: PathBuf, topology: PathBuf) -> PrepareArgs {
        PrepareArgs {
            input,
            topology: Some(topology),
            groups: vec!["POSE_LANDMARKS".to_string(), "HAND".to_string()],
            frames: 8,
            fps: 30.0,
            dims: 2,
            held_out: Vec::new(),
            seed: Some(3),
            half: false,
            quiet: false,
            verbose: false,
        }
    }

    #[test]
    fn test_prepare_with_split() {
        let (corpus, topology) = files(&[
            example("a", 1, 10),
            example("b", 2, 12),
            example("c", 3, 0),
            example("d", 1, 9),
        ]);
        let mut args = args(corpus.path().to_path_buf(), topology.path().to_path_buf());
        args.held_out = vec![2];

        let summary = prepare(&args).unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.train, 2);
        assert_eq!(summary.validation, 1);
        assert_eq!(summary.signers.into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(summary.shape, Some(vec![8, 5, 2]));
    }

    #[test]
    fn test_prepare_without_split() {
        let (corpus, topology) = files(&[example("a", 1, 10)]);
        let mut args = args(corpus.path().to_path_buf(), topology.path().to_path_buf());
        args.dims = 3;

        let summary = prepare(&args).unwrap();
        assert_eq!(summary.train, 1);
        assert_eq!(summary.validation, 0);
        assert_eq!(summary.shape, Some(vec![8, 5, 3]));
    }

    #[test]
    fn test_prepare_rejects_unknown_group() {
        let (corpus, topology) = files(&[example("a", 1, 10)]);
        let mut args = args(corpus.path().to_path_buf(), topology.path().to_path_buf());
        args.groups.push("TAIL".to_string());
        assert!(matches!(prepare(&args), Err(PoseError::Config(_))));
    }
}
