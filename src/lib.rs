/// This crate is a content-based song recommender over TF-IDF lyric vectors.
pub mod cleaner;
pub mod config;
pub mod cover;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod store;
pub mod utils;
pub mod vectorizer;

/// Similarity Engine
/// The top-level query struct of this crate.
/// It answers "songs most similar to this title" over a loaded index.
///
/// Internally, it holds:
/// - The cleaned corpus table (artist, song, cleaned lyrics)
/// - The TF-IDF feature matrix, one L2-normalized sparse row per song
/// - Optionally, the full pairwise similarity matrix
///
/// All three share one row order and one snapshot id.
///
/// # Thread Safety
/// Immutable after construction. `recommend` takes `&self` and can be called
/// from many threads at once.
pub use engine::{RankedSong, Recommendations, SimilarityEngine, SimilarityStrategy};

/// Feature Builder and Feature Matrix
/// `FeatureBuilder` fits a vocabulary of at most `max_features` terms over
/// cleaned lyrics and produces a `FeatureMatrix`.
///
/// `FeatureMatrix<N, E>` has the following generic parameters:
/// - `N`: stored weight type (f32 by default, f64 also works)
/// - `E`: TF-IDF calculation engine type (e.g., DefaultTFIDFEngine)
///
/// # Serialization
/// Supported. The engine type is not serialized.
pub use vectorizer::{FeatureBuilder, FeatureMatrix};

/// Corpus statistics
/// Per-term document frequency and total count over all fitted documents.
/// Used for vocabulary selection and IDF calculation.
pub use vectorizer::corpus::Corpus;

/// Token Frequency structure
/// Occurrence counts of each token within one document, plus the total.
/// Used as base data for TF (Term Frequency) calculation.
pub use vectorizer::token::TokenFrequency;

/// TF IDF Calculation Engine Trait
/// Defines how IDF weights and TF-IDF rows are computed.
///
/// A default implementation, `DefaultTFIDFEngine`, is provided and performs
/// smoothed-IDF weighting with raw term counts and L2-normalized rows.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Corpus table and artifact storage
/// - `CorpusTable`: ordered cleaned songs with case-insensitive title lookup
/// - `ArtifactStore`: reads and writes the CBOR artifacts of one directory
/// - `ArtifactFetcher`: downloads missing artifacts from configured URLs
pub use store::{fetch::ArtifactFetcher, ArtifactId, ArtifactStore, CorpusEntry, CorpusTable};

pub use config::RecommenderConfig;
pub use cover::{CoverArt, CoverLookup, FallbackCovers, SpotifyCovers};
pub use error::{RecommendError, Result};
