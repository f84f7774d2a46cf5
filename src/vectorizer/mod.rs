pub mod compare;
pub mod corpus;
pub mod tfidf;
pub mod token;

use std::marker::PhantomData;

use indexmap::IndexSet;
use num::Float;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{RecommendError, Result},
    utils::sparse::SparseRow,
    vectorizer::{corpus::Corpus, tfidf::{DefaultTFIDFEngine, TFIDFEngine}, token::TokenFrequency},
};

/// Vocabulary cap used when none is configured
pub const DEFAULT_MAX_FEATURES: usize = 5000;
/// Shorter tokens are not counted as terms
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// TF-IDF feature matrix, one sparse row per corpus entry.
///
/// Row `i` belongs to corpus row `i`. Columns follow `vocabulary` order,
/// which is alphabetical. Rows are unit length unless the document has no
/// vocabulary term at all, in which case the row is empty.
///
/// Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix<N = f32, E = DefaultTFIDFEngine>
where
    N: Float,
{
    vocabulary: IndexSet<String>,
    idf: Vec<f64>,
    rows: Vec<SparseRow<N>>,
    min_token_len: usize,
    #[serde(skip)]
    _marker: PhantomData<E>,
}

impl<N, E> FeatureMatrix<N, E>
where
    N: Float + Send + Sync,
    E: TFIDFEngine<N>,
{
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &IndexSet<String> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&SparseRow<N>> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[SparseRow<N>] {
        &self.rows
    }

    /// Total stored non-zero weights
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.nnz()).sum()
    }

    /// Project an unseen cleaned text onto the fitted vocabulary
    pub fn transform(&self, cleaned_text: &str) -> SparseRow<N> {
        let freq = TokenFrequency::from_text(cleaned_text, self.min_token_len);
        E::tfidf_vec(&freq, &self.vocabulary, &self.idf)
    }

    /// Structural checks run after deserialization
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(format!(
                "idf has {} weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            ));
        }
        if let Some(i) = self.rows.iter().position(|r| r.min_dim() > self.vocabulary.len()) {
            return Err(format!("row {} references a column outside the vocabulary", i));
        }
        Ok(())
    }
}

/// Fits the vocabulary and IDF weights over a cleaned corpus and emits the
/// TF-IDF row of every document.
#[derive(Debug, Clone)]
pub struct FeatureBuilder<E = DefaultTFIDFEngine> {
    pub max_features: usize,
    pub min_token_len: usize,
    _marker: PhantomData<E>,
}

impl Default for FeatureBuilder<DefaultTFIDFEngine> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl<E> FeatureBuilder<E> {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            _marker: PhantomData,
        }
    }

    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }

    /// Build the feature matrix and vocabulary for `cleaned_texts`.
    ///
    /// The vocabulary keeps the `max_features` terms with the highest
    /// corpus-wide count. Fails with `EmptyCorpus` on no documents and with
    /// `EmptyVocabulary` when no document has a single countable token.
    pub fn fit_transform<N, S>(&self, cleaned_texts: &[S]) -> Result<FeatureMatrix<N, E>>
    where
        N: Float + Send + Sync,
        S: AsRef<str> + Sync,
        E: TFIDFEngine<N> + Sync,
    {
        if cleaned_texts.is_empty() {
            return Err(RecommendError::EmptyCorpus);
        }

        let freqs: Vec<TokenFrequency> = cleaned_texts
            .par_iter()
            .map(|text| TokenFrequency::from_text(text.as_ref(), self.min_token_len))
            .collect();

        let corpus = freqs
            .par_iter()
            .fold(Corpus::new, |mut corpus, freq| {
                corpus.add_doc(freq);
                corpus
            })
            .reduce(Corpus::new, Corpus::merge);
        debug!(docs = corpus.doc_num(), terms = corpus.vocab_size(), "corpus statistics collected");

        if corpus.vocab_size() == 0 || self.max_features == 0 {
            return Err(RecommendError::EmptyVocabulary { docs: cleaned_texts.len() });
        }

        let mut terms = corpus.most_frequent_terms(self.max_features);
        terms.sort_unstable();
        let vocabulary: IndexSet<String> = terms.into_iter().map(str::to_string).collect();

        let idf = E::idf_vec(&corpus, &vocabulary);
        let rows: Vec<SparseRow<N>> = freqs
            .par_iter()
            .map(|freq| E::tfidf_vec(freq, &vocabulary, &idf))
            .collect();

        let matrix = FeatureMatrix {
            vocabulary,
            idf,
            rows,
            min_token_len: self.min_token_len,
            _marker: PhantomData,
        };
        info!(
            rows = matrix.row_count(),
            features = matrix.n_features(),
            nnz = matrix.nnz(),
            "TF-IDF matrix built"
        );
        Ok(matrix)
    }
}
