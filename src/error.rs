// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the corpus pipeline.

use std::fmt;

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the corpus pipeline.
#[derive(Debug)]
pub enum PoseError {
    /// A raw example is missing a required landmark group.
    Topology(String),
    /// Normalization anchors coincide or are absent for the whole sequence.
    DegenerateAnchor(String),
    /// Zero-length sequence passed to resampling.
    DegenerateInput(String),
    /// Out-of-range corpus retrieval.
    Index {
        /// Requested index.
        index: usize,
        /// Corpus length at the time of the call.
        len: usize,
    },
    /// Invalid pipeline configuration, detected before any sample is processed.
    Config(String),
    /// Array shapes that do not form a valid pose sequence.
    Shape(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
    /// Malformed corpus or topology descriptor input.
    Parse(String),
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topology(msg) => write!(f, "Topology error: {msg}"),
            Self::DegenerateAnchor(msg) => write!(f, "Degenerate anchor error: {msg}"),
            Self::DegenerateInput(msg) => write!(f, "Degenerate input error: {msg}"),
            Self::Index { index, len } => {
                write!(f, "Index error: index {index} out of range for corpus of length {len}")
            }
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Shape(msg) => write!(f, "Shape error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for PoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PoseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
