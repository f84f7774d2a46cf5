use indexmap::IndexMap;

use crate::vectorizer::token::TokenFrequency;

/// Per-term statistics gathered over the whole corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermStats {
    /// number of documents containing the term
    pub doc_count: u64,
    /// occurrences of the term across all documents
    pub total_count: u64,
}

/// keep document count and term counts for IDF and vocabulary selection
///
/// Two corpora built over disjoint document sets can be merged, which lets
/// the statistics be collected with a parallel fold.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    doc_num: u64,
    term_stats: IndexMap<String, TermStats>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's terms to the corpus
    pub fn add_doc(&mut self, doc: &TokenFrequency) {
        self.doc_num += 1;
        for (term, count) in doc.iter() {
            let stats = self.term_stats.entry(term.to_string()).or_default();
            stats.doc_count += 1;
            stats.total_count += count as u64;
        }
    }

    /// Merge another corpus into self
    pub fn merge(mut self, other: Corpus) -> Corpus {
        self.doc_num += other.doc_num;
        for (term, theirs) in other.term_stats {
            let ours = self.term_stats.entry(term).or_default();
            ours.doc_count += theirs.doc_count;
            ours.total_count += theirs.total_count;
        }
        self
    }

    /// Get the number of documents in the corpus
    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Number of documents containing `term`
    #[inline]
    pub fn doc_count(&self, term: &str) -> u64 {
        self.term_stats.get(term).map_or(0, |s| s.doc_count)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_stats.len()
    }

    /// The `limit` terms with the highest corpus-wide occurrence count.
    /// Ties are resolved by term order so the selection is reproducible.
    pub fn most_frequent_terms(&self, limit: usize) -> Vec<&str> {
        let mut terms: Vec<(&str, u64)> = self
            .term_stats
            .iter()
            .map(|(term, stats)| (term.as_str(), stats.total_count))
            .collect();
        terms.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(limit);
        terms.into_iter().map(|(term, _)| term).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(tokens: &[&str]) -> TokenFrequency {
        let mut f = TokenFrequency::new();
        f.add_tokens(tokens);
        f
    }

    #[test]
    fn doc_count_is_per_document_not_per_occurrence() {
        let mut corpus = Corpus::new();
        corpus.add_doc(&freq(&["love", "love", "love"]));
        corpus.add_doc(&freq(&["love", "rain"]));
        assert_eq!(corpus.doc_num(), 2);
        assert_eq!(corpus.doc_count("love"), 2);
        assert_eq!(corpus.doc_count("rain"), 1);
        assert_eq!(corpus.doc_count("sun"), 0);
    }

    #[test]
    fn merge_equals_sequential_build() {
        let docs = [freq(&["a", "b"]), freq(&["b", "c", "c"]), freq(&["a"])];

        let mut sequential = Corpus::new();
        docs.iter().for_each(|d| sequential.add_doc(d));

        let mut left = Corpus::new();
        left.add_doc(&docs[0]);
        let mut right = Corpus::new();
        right.add_doc(&docs[1]);
        right.add_doc(&docs[2]);
        let merged = left.merge(right);

        assert_eq!(merged.doc_num(), sequential.doc_num());
        for term in ["a", "b", "c"] {
            assert_eq!(merged.doc_count(term), sequential.doc_count(term));
        }
        assert_eq!(merged.most_frequent_terms(3), sequential.most_frequent_terms(3));
    }

    #[test]
    fn most_frequent_terms_uses_total_count_then_term() {
        let mut corpus = Corpus::new();
        corpus.add_doc(&freq(&["night", "night", "night", "day"]));
        corpus.add_doc(&freq(&["day", "sky", "arm"]));
        // night=3, day=2, arm=1, sky=1
        assert_eq!(corpus.most_frequent_terms(3), vec!["night", "day", "arm"]);
        assert_eq!(corpus.most_frequent_terms(10).len(), 4);
    }
}
