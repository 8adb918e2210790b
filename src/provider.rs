// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Corpus ingestion: providers, processed-sample caches, and the corpus builder.
//!
//! A [`CorpusProvider`] yields raw examples; the [`CorpusBuilder`] runs them through a
//! [`PosePipeline`] and packs the results into a [`Corpus`]. An optional
//! [`CorpusCache`] keyed by the pipeline configuration lets repeated builds skip the
//! processing step entirely.

use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use lru::LruCache;
use rayon::prelude::*;

use crate::corpus::{Corpus, PoseSample};
use crate::error::{PoseError, Result};
use crate::pipeline::{PosePipeline, RawExample};
use crate::{verbose, warn};

/// Iterator over raw examples produced by a provider.
pub type RawExamples<'a> = Box<dyn Iterator<Item = Result<RawExample>> + 'a>;

/// Source of raw examples.
pub trait CorpusProvider {
    /// Start reading the corpus.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened.
    fn load(&self) -> Result<RawExamples<'_>>;

    /// Identifies the provider's content in cache keys.
    ///
    /// Providers with different content must return different tags.
    fn cache_tag(&self) -> u64;
}

impl CorpusProvider for Vec<RawExample> {
    fn load(&self) -> Result<RawExamples<'_>> {
        Ok(Box::new(self.iter().cloned().map(Ok)))
    }

    fn cache_tag(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.len().hash(&mut hasher);
        for example in self {
            example.id.hash(&mut hasher);
            example.signer.hash(&mut hasher);
            example.label.hash(&mut hasher);
            example.fps.map(f64::to_bits).hash(&mut hasher);
            example.data.len().hash(&mut hasher);
            for (frame, confidence) in example.data.iter().zip(&example.confidence) {
                frame.len().hash(&mut hasher);
                for point in frame {
                    point.len().hash(&mut hasher);
                    for value in point {
                        value.to_bits().hash(&mut hasher);
                    }
                }
                for value in confidence {
                    value.to_bits().hash(&mut hasher);
                }
            }
            example.confidence.len().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Reads one JSON-encoded [`RawExample`] per line. Blank lines are skipped.
#[derive(Debug, Clone)]
pub struct JsonlProvider {
    path: PathBuf,
}

impl JsonlProvider {
    /// Create a provider for a JSON-lines file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the JSON-lines file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusProvider for JsonlProvider {
    fn load(&self) -> Result<RawExamples<'_>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let path = self.path.display().to_string();
        Ok(Box::new(reader.lines().enumerate().filter_map(
            move |(i, line)| match line {
                Err(err) => Some(Err(PoseError::Io(err))),
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(serde_json::from_str(&line).map_err(|err| {
                    PoseError::Parse(format!("{path}:{}: {err}", i + 1))
                })),
            },
        )))
    }

    /// Hash of the path, file length, and modification time. Edits that keep both the
    /// length and the modification time are not detected.
    fn cache_tag(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.path.hash(&mut hasher);
        if let Ok(metadata) = fs::metadata(&self.path) {
            metadata.len().hash(&mut hasher);
            metadata.modified().ok().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// An example that failed processing, with the reason.
pub type Rejection = (String, Arc<PoseError>);

/// Processed output of one build, as stored in a cache.
#[derive(Debug, Clone, Default)]
pub struct CachedBuild {
    /// Samples in provider order.
    pub samples: Vec<Arc<PoseSample>>,
    /// Examples that failed processing.
    pub rejected: Vec<Rejection>,
}

/// Storage for processed builds, keyed by configuration and provider hash.
pub trait CorpusCache: Send + Sync {
    /// Fetch the build stored under `key`.
    fn get(&self, key: u64) -> Option<CachedBuild>;

    /// Store a build under `key`.
    fn put(&self, key: u64, build: CachedBuild);
}

/// In-memory LRU cache of processed corpora.
pub struct MemoryCache {
    entries: Mutex<LruCache<u64, CachedBuild>>,
}

impl MemoryCache {
    /// Create a cache holding up to `capacity` corpora (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached corpora.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CorpusCache for MemoryCache {
    fn get(&self, key: u64) -> Option<CachedBuild> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn put(&self, key: u64, build: CachedBuild) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, build);
    }
}

/// Outcome of a corpus build.
#[derive(Debug)]
pub struct BuildReport {
    /// The built corpus.
    pub corpus: Corpus,
    /// Examples that failed processing, with the reason. Cache hits report the
    /// rejections of the build that filled the cache.
    pub rejected: Vec<Rejection>,
    /// Whether the samples came from the cache.
    pub from_cache: bool,
}

/// Builds corpora from providers.
pub struct CorpusBuilder {
    pipeline: PosePipeline,
    cache: Option<Arc<dyn CorpusCache>>,
}

impl CorpusBuilder {
    /// Create a builder around a validated pipeline.
    #[must_use]
    pub const fn new(pipeline: PosePipeline) -> Self {
        Self {
            pipeline,
            cache: None,
        }
    }

    /// Attach a processed-sample cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CorpusCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Pipeline used for every example.
    #[must_use]
    pub const fn pipeline(&self) -> &PosePipeline {
        &self.pipeline
    }

    /// Cache key for a provider under this builder's configuration.
    #[must_use]
    pub fn cache_key(&self, provider: &dyn CorpusProvider) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.pipeline.config().cache_key().hash(&mut hasher);
        provider.cache_tag().hash(&mut hasher);
        hasher.finish()
    }

    /// Load, process, and collect every example of `provider`.
    ///
    /// Examples are processed in parallel; the corpus keeps provider order. An example
    /// that fails processing is left out and listed in [`BuildReport::rejected`].
    ///
    /// # Arguments
    ///
    /// * `provider` - Source of raw examples.
    /// * `is_train` - Whether the built corpus applies training-time augmentation.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to open or yields an error, or the
    /// retrieval settings are invalid.
    pub fn build(&self, provider: &dyn CorpusProvider, is_train: bool) -> Result<BuildReport> {
        let retrieval = self.pipeline.config().retrieval;
        let key = self.cache_key(provider);

        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(key)) {
            verbose!(
                "Loaded {} samples ({} rejected) from cache (key {key:016x})",
                cached.samples.len(),
                cached.rejected.len()
            );
            return Ok(BuildReport {
                corpus: Corpus::new(cached.samples, is_train).with_retrieval(retrieval)?,
                rejected: cached.rejected,
                from_cache: true,
            });
        }

        let start = Instant::now();
        let examples = provider.load()?.collect::<Result<Vec<_>>>()?;
        let total = examples.len();

        let outcomes: Vec<(String, Result<PoseSample>)> = examples
            .into_par_iter()
            .map(|raw| (raw.id.clone(), self.pipeline.process(raw)))
            .collect();

        let mut samples = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(sample) => samples.push(Arc::new(sample)),
                Err(err) => {
                    warn!("Rejected example '{id}': {err}");
                    rejected.push((id, Arc::new(err)));
                }
            }
        }

        verbose!(
            "Processed {} of {total} examples in {:.1}ms",
            samples.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        if let Some(cache) = &self.cache {
            cache.put(
                key,
                CachedBuild {
                    samples: samples.clone(),
                    rejected: rejected.clone(),
                },
            );
        }

        Ok(BuildReport {
            corpus: Corpus::new(samples, is_train).with_retrieval(retrieval)?,
            rejected,
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::normalize::AnchorPair;
    use crate::topology::{LandmarkGroup, LandmarkId, Topology};
    use std::io::Write;

    fn pipeline() -> PosePipeline {
        let topology = Topology::new(vec![LandmarkGroup::new("BODY", ["R", "L", "N"])]).unwrap();
        let config = PipelineConfig::new()
            .with_groups(["BODY"])
            .with_anchors(AnchorPair::new(LandmarkId::new("BODY", "R"), LandmarkId::new("BODY", "L")))
            .with_target_frames(4);
        PosePipeline::new(&topology, config).unwrap()
    }

    fn example(id: &str, signer: u64, frames: usize) -> RawExample {
        RawExample {
            id: id.to_string(),
            signer,
            label: 0,
            fps: None,
            data: (0..frames)
                .map(|f| vec![vec![0.0, f as f32], vec![2.0, f as f32], vec![1.0, 3.0]])
                .collect(),
            confidence: vec![vec![1.0; 3]; frames],
        }
    }

    #[test]
    fn test_build_keeps_order_and_rejects() {
        let examples = vec![example("a", 1, 5), example("b", 2, 0), example("c", 3, 9)];
        let report = CorpusBuilder::new(pipeline()).build(&examples, true).unwrap();

        assert!(!report.from_cache);
        assert!(report.corpus.is_train());
        let ids: Vec<&str> = report.corpus.samples().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, "b");
        assert!(matches!(*report.rejected[0].1, PoseError::DegenerateInput(_)));
    }

    #[test]
    fn test_cache_hit_skips_processing() {
        let cache = Arc::new(MemoryCache::new(2));
        let builder = CorpusBuilder::new(pipeline()).with_cache(cache.clone());
        let examples = vec![example("a", 1, 5), example("b", 2, 6), example("c", 3, 0)];

        let first = builder.build(&examples, false).unwrap();
        assert!(!first.from_cache);
        assert_eq!(cache.len(), 1);

        let second = builder.build(&examples.clone(), false).unwrap();
        assert!(second.from_cache);
        assert_eq!(second.corpus.len(), 2);
        assert!(Arc::ptr_eq(&first.corpus.samples()[0], &second.corpus.samples()[0]));

        // Rejections survive the cache
        assert_eq!(second.rejected.len(), 1);
        assert_eq!(second.rejected[0].0, "c");
        assert!(matches!(*second.rejected[0].1, PoseError::DegenerateInput(_)));
    }

    #[test]
    fn test_different_examples_miss_cache() {
        let builder = CorpusBuilder::new(pipeline()).with_cache(Arc::new(MemoryCache::new(4)));

        let first = builder.build(&vec![example("a", 1, 5)], false).unwrap();
        let second = builder
            .build(&vec![example("b", 2, 5), example("c", 3, 5)], false)
            .unwrap();
        assert!(!first.from_cache);
        assert!(!second.from_cache);
        let ids: Vec<&str> = second.corpus.samples().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        // Same ids, different coordinates
        let mut moved = example("a", 1, 5);
        moved.data[0][2][0] += 1.0;
        assert_ne!(vec![moved].cache_tag(), vec![example("a", 1, 5)].cache_tag());
    }

    #[test]
    fn test_jsonl_cache_tag_tracks_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", serde_json::to_string(&example("a", 1, 3)).unwrap()).unwrap();
        file.flush().unwrap();
        let provider = JsonlProvider::new(file.path());
        let before = provider.cache_tag();
        assert_eq!(before, provider.cache_tag());

        writeln!(file, "{}", serde_json::to_string(&example("b", 2, 3)).unwrap()).unwrap();
        file.flush().unwrap();
        assert_ne!(before, provider.cache_tag());
    }

    #[test]
    fn test_memory_cache_evicts() {
        let cache = MemoryCache::new(1);
        assert!(cache.is_empty());
        cache.put(1, CachedBuild::default());
        cache.put(2, CachedBuild::default());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
    }

    #[test]
    fn test_jsonl_provider() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for ex in [example("a", 1, 3), example("b", 2, 4)] {
            writeln!(file, "{}", serde_json::to_string(&ex).unwrap()).unwrap();
            writeln!(file).unwrap();
        }
        let provider = JsonlProvider::new(file.path());
        let examples: Vec<RawExample> = provider.load().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].id, "b");
        assert_eq!(examples[1].data.len(), 4);
    }

    #[test]
    fn test_jsonl_provider_errors() {
        assert!(matches!(
            JsonlProvider::new("/nonexistent/corpus.jsonl").load().map(|_| ()),
            Err(PoseError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", serde_json::to_string(&example("a", 1, 3)).unwrap()).unwrap();
        writeln!(file, "not json").unwrap();
        let provider = JsonlProvider::new(file.path());
        let err = CorpusBuilder::new(pipeline()).build(&provider, false).unwrap_err();
        match err {
            PoseError::Parse(msg) => assert!(msg.contains(":2:")),
            other => panic!("unexpected error {other}"),
        }
    }
}
