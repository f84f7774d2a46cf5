use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, persisting or loading a recommendation index.
///
/// A title that is absent from the corpus is not represented here;
/// `SimilarityEngine::recommend` reports it as `None`.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("corpus is empty, nothing to vectorize")]
    EmptyCorpus,
    #[error("vocabulary is empty: all {docs} documents are empty after cleaning")]
    EmptyVocabulary { docs: usize },
    #[error("row misalignment: corpus has {corpus_rows} rows but {what} has {other_rows}")]
    Misaligned {
        what: &'static str,
        corpus_rows: usize,
        other_rows: usize,
    },
    #[error("snapshot mismatch: {what} was built from {found}, corpus is {expected}")]
    SnapshotMismatch {
        what: &'static str,
        expected: String,
        found: String,
    },
    #[error("corrupt {what} artifact: {reason}")]
    Corrupt { what: &'static str, reason: String },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CBOR error in {path:?}: {source}")]
    Cbor {
        path: PathBuf,
        #[source]
        source: serde_cbor::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("no source configured for artifact '{0}' and no local copy exists")]
    NoSource(&'static str),
    #[error("download of '{artifact}' failed: {source}")]
    Download {
        artifact: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl RecommendError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecommendError::Io { path: path.into(), source }
    }

    pub(crate) fn cbor(path: impl Into<PathBuf>, source: serde_cbor::Error) -> Self {
        RecommendError::Cbor { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
