use indexmap::IndexSet;
use num::Float;

use crate::{utils::sparse::SparseRow, vectorizer::{corpus::Corpus, token::TokenFrequency}};

pub trait TFIDFEngine<N>
where
    N: Float,
{
    /// IDF weight per vocabulary column
    /// # Arguments
    /// * `corpus` - corpus statistics the vocabulary was selected from
    /// * `vocabulary` - column order
    fn idf_vec(corpus: &Corpus, vocabulary: &IndexSet<String>) -> Vec<f64>;

    /// TF-IDF row of one document.
    /// Tokens outside `vocabulary` are ignored.
    fn tfidf_vec(freq: &TokenFrequency, vocabulary: &IndexSet<String>, idf: &[f64]) -> SparseRow<N>;
}

/// Textbook TF-IDF
///
/// - tf: raw count of the term in the document
/// - idf: `ln((1 + n) / (1 + df)) + 1` (smoothed, never zero)
/// - each row is scaled to unit L2 length
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl DefaultTFIDFEngine {
    #[inline]
    pub fn idf_calc(doc_num: u64, doc_freq: u64) -> f64 {
        ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
    }
}

impl<N> TFIDFEngine<N> for DefaultTFIDFEngine
where
    N: Float,
{
    fn idf_vec(corpus: &Corpus, vocabulary: &IndexSet<String>) -> Vec<f64> {
        let doc_num = corpus.doc_num();
        vocabulary
            .iter()
            .map(|term| Self::idf_calc(doc_num, corpus.doc_count(term)))
            .collect()
    }

    fn tfidf_vec(freq: &TokenFrequency, vocabulary: &IndexSet<String>, idf: &[f64]) -> SparseRow<N> {
        let mut row = SparseRow::from_unsorted(freq.iter().filter_map(|(token, count)| {
            let col = vocabulary.get_index_of(token)?;
            let weight = count as f64 * idf[col];
            Some((col as u32, N::from(weight)?))
        }));
        row.l2_normalize();
        row.shrink_to_fit();
        row
    }
}
