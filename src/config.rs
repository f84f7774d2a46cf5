use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    cover::DEFAULT_FALLBACK_COVER_URL,
    engine::{SimilarityStrategy, DEFAULT_TOP_N},
    error::{RecommendError, Result},
    store::ArtifactId,
    vectorizer::{DEFAULT_MAX_FEATURES, DEFAULT_MIN_TOKEN_LEN},
};

/// Settings shared by the build and serve sides.
/// Every field has a default, so an empty TOML file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Directory holding corpus.cbor, features.cbor and similarity.cbor
    pub artifact_dir: PathBuf,
    pub max_features: usize,
    pub min_token_len: usize,
    pub top_n: usize,
    pub similarity: SimilarityStrategy,
    /// Rows to sample from the raw dataset, all rows when unset
    pub sample_size: Option<usize>,
    pub seed: u64,
    pub covers: CoverConfig,
    pub sources: SourcesConfig,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            max_features: DEFAULT_MAX_FEATURES,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            top_n: DEFAULT_TOP_N,
            similarity: SimilarityStrategy::default(),
            sample_size: None,
            seed: 42,
            covers: CoverConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub fallback_url: String,
    /// ISO 3166-1 market passed to the track search
    pub market: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            fallback_url: DEFAULT_FALLBACK_COVER_URL.to_string(),
            market: None,
            timeout_secs: 10,
        }
    }
}

/// Remote locations of prebuilt artifacts
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub corpus: Option<String>,
    pub features: Option<String>,
    pub similarity: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl SourcesConfig {
    pub fn url(&self, id: ArtifactId) -> Option<&str> {
        match id {
            ArtifactId::Corpus => self.corpus.as_deref(),
            ArtifactId::Features => self.features.as_deref(),
            ArtifactId::Similarity => self.similarity.as_deref(),
        }
    }
}

impl RecommenderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RecommendError::io(path, e))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = RecommenderConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.max_features, 5000);
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.similarity, SimilarityStrategy::Lazy);
        assert_eq!(cfg.covers.fallback_url, DEFAULT_FALLBACK_COVER_URL);
        assert!(cfg.sources.url(ArtifactId::Corpus).is_none());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let cfg = RecommenderConfig::from_toml_str(
            r#"
            artifact_dir = "/srv/lyrics"
            similarity = "precomputed"
            sample_size = 10000

            [covers]
            market = "US"

            [sources]
            features = "https://example.org/features.cbor"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.artifact_dir, PathBuf::from("/srv/lyrics"));
        assert_eq!(cfg.similarity, SimilarityStrategy::Precomputed);
        assert_eq!(cfg.sample_size, Some(10000));
        assert_eq!(cfg.covers.market.as_deref(), Some("US"));
        assert_eq!(cfg.covers.timeout_secs, 10);
        assert_eq!(cfg.sources.url(ArtifactId::Features), Some("https://example.org/features.cbor"));
        assert_eq!(cfg.max_features, 5000);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = RecommenderConfig::from_toml_str("similarity = \"sometimes\"").unwrap_err();
        assert!(matches!(err, RecommendError::Config(_)));
    }
}
