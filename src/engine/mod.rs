pub mod matrix;
pub mod scoring;

use std::{borrow::Cow, path::Path};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    engine::{matrix::SimilarityMatrix, scoring::Hits},
    error::{RecommendError, Result},
    store::{ArtifactStore, CorpusTable},
    vectorizer::{compare::cosine_similarity, FeatureMatrix},
};

/// Number of recommendations when the caller does not ask for a count
pub const DEFAULT_TOP_N: usize = 5;

/// How pairwise similarity is obtained at query time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityStrategy {
    /// One similarity row per query, nothing cached
    #[default]
    Lazy,
    /// Full matrix held in memory, loaded from disk or computed once
    Precomputed,
}

/// One recommended song, `rank` starts at 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSong {
    pub rank: usize,
    pub artist: String,
    pub song: String,
}

/// Answer to a query that matched a corpus title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// title as the corpus spells it
    pub resolved_title: String,
    pub query_index: usize,
    pub songs: Vec<RankedSong>,
}

/// Read-only recommendation index.
///
/// Holds a corpus table and its feature matrix (and optionally the full
/// similarity matrix), all from the same snapshot. Nothing is mutated after
/// construction, so one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    corpus: CorpusTable,
    features: FeatureMatrix,
    similarity: Option<SimilarityMatrix>,
}

impl SimilarityEngine {
    /// Pair a corpus table with its feature matrix.
    /// Fails when their row counts differ.
    pub fn new(corpus: CorpusTable, features: FeatureMatrix) -> Result<Self> {
        if corpus.len() != features.row_count() {
            return Err(RecommendError::Misaligned {
                what: "feature matrix",
                corpus_rows: corpus.len(),
                other_rows: features.row_count(),
            });
        }
        Ok(Self { corpus, features, similarity: None })
    }

    /// Attach a precomputed similarity matrix
    pub fn with_similarity(mut self, matrix: SimilarityMatrix) -> Result<Self> {
        if matrix.size() != self.corpus.len() {
            return Err(RecommendError::Misaligned {
                what: "similarity matrix",
                corpus_rows: self.corpus.len(),
                other_rows: matrix.size(),
            });
        }
        self.similarity = Some(matrix);
        Ok(self)
    }

    /// Compute the full similarity matrix now if the strategy asks for it
    pub fn with_strategy(self, strategy: SimilarityStrategy) -> Self {
        match strategy {
            SimilarityStrategy::Precomputed if self.similarity.is_none() => {
                let matrix = SimilarityMatrix::compute(&self.features);
                Self { similarity: Some(matrix), ..self }
            }
            SimilarityStrategy::Lazy => Self { similarity: None, ..self },
            SimilarityStrategy::Precomputed => self,
        }
    }

    /// Load all artifacts of `dir` and check they belong together.
    /// Any failure here means the engine cannot serve.
    pub fn load(dir: impl AsRef<Path>, strategy: SimilarityStrategy) -> Result<Self> {
        let store = ArtifactStore::new(dir.as_ref());
        info!(dir = %store.dir().display(), ?strategy, "loading recommendation index");
        let corpus = store.load_corpus()?;
        let features = store.load_features(&corpus)?;
        let mut engine = Self::new(corpus, features)?;
        if strategy == SimilarityStrategy::Precomputed {
            if let Some(matrix) = store.load_similarity(&engine.corpus)? {
                engine = engine.with_similarity(matrix)?;
            }
        }
        let engine = engine.with_strategy(strategy);
        info!(
            rows = engine.len(),
            features = engine.features.n_features(),
            precomputed = engine.similarity.is_some(),
            "recommendation index ready"
        );
        Ok(engine)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn corpus(&self) -> &CorpusTable {
        &self.corpus
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn similarity_matrix(&self) -> Option<&SimilarityMatrix> {
        self.similarity.as_ref()
    }

    /// Every title in corpus order, duplicates included
    pub fn list_titles(&self) -> Vec<&str> {
        self.corpus.entries().iter().map(|e| e.song.as_str()).collect()
    }

    /// Row index of the first title equal to `title` ignoring case
    pub fn find(&self, title: &str) -> Option<usize> {
        self.corpus.find_title(title)
    }

    /// Cosine similarity of row `index` against every row, itself included
    pub fn similarity_row(&self, index: usize) -> Option<Cow<'_, [f64]>> {
        if let Some(matrix) = &self.similarity {
            return matrix.row(index).map(Cow::Borrowed);
        }
        let query = self.features.row(index)?;
        let row: Vec<f64> = self
            .features
            .rows()
            .par_iter()
            .map(|other| cosine_similarity(query.raw_iter(), other.raw_iter()))
            .collect();
        Some(Cow::Owned(row))
    }

    pub fn similarity(&self, i: usize, j: usize) -> Option<f64> {
        if let Some(matrix) = &self.similarity {
            return matrix.get(i, j);
        }
        let a = self.features.row(i)?;
        let b = self.features.row(j)?;
        Some(cosine_similarity(a.raw_iter(), b.raw_iter()))
    }

    /// Top `top_n` songs most similar to `title`.
    ///
    /// Returns `None` when no corpus title matches. Songs are ordered by
    /// descending cosine similarity, ties by corpus order, and never include
    /// the matched row itself.
    pub fn recommend(&self, title: &str, top_n: usize) -> Option<Recommendations> {
        let Some(index) = self.find(title) else {
            warn!(query = title, "song not found in corpus");
            return None;
        };
        let scores = self.similarity_row(index)?;
        let mut hits = Hits::from_scores(&scores);
        hits.sort_by_score_desc().exclude(index).truncate(top_n);
        debug!(hits = ?hits, "ranked");

        let songs: Vec<RankedSong> = hits
            .indices()
            .filter_map(|i| self.corpus.get(i))
            .enumerate()
            .map(|(rank, entry)| RankedSong {
                rank: rank + 1,
                artist: entry.artist.clone(),
                song: entry.song.clone(),
            })
            .collect();

        let resolved_title = self.corpus.get(index).map(|e| e.song.clone()).unwrap_or_default();
        info!(query = title, resolved = %resolved_title, results = songs.len(), "recommendations ready");
        Some(Recommendations {
            resolved_title,
            query_index: index,
            songs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::CorpusEntry, vectorizer::FeatureBuilder};

    fn engine(rows: &[(&str, &str, &str)]) -> SimilarityEngine {
        let corpus = CorpusTable::new(
            rows.iter()
                .map(|(a, s, t)| CorpusEntry {
                    artist: a.to_string(),
                    song: s.to_string(),
                    cleaned_text: t.to_string(),
                })
                .collect(),
        );
        let features = FeatureBuilder::default().fit_transform(&corpus.cleaned_texts()).unwrap();
        SimilarityEngine::new(corpus, features).unwrap()
    }

    fn pairs(r: &Recommendations) -> Vec<(&str, &str)> {
        r.songs.iter().map(|s| (s.artist.as_str(), s.song.as_str())).collect()
    }

    fn xyz() -> SimilarityEngine {
        engine(&[
            ("A", "X", "love heart night"),
            ("B", "Y", "love heart day"),
            ("C", "Z", "love rain cloud"),
        ])
    }

    #[test]
    fn nearest_first() {
        let e = xyz();
        let r = e.recommend("X", 2).unwrap();
        assert_eq!(r.resolved_title, "X");
        assert_eq!(pairs(&r), vec![("B", "Y"), ("C", "Z")]);
        assert_eq!(r.songs[0].rank, 1);
        assert_eq!(r.songs[1].rank, 2);
    }

    #[test]
    fn not_found_is_none() {
        assert!(xyz().recommend("Nonexistent Song", 5).is_none());
    }

    #[test]
    fn lookup_ignores_case_and_reports_canonical_title() {
        let e = engine(&[
            ("Beatles", "Let It Be", "whisper words wisdom"),
            ("Other", "Hey Jude", "hey jude make sad song better"),
            ("Third", "Wisdom", "words wisdom night"),
        ]);
        let upper = e.recommend("Let It Be", 5).unwrap();
        let lower = e.recommend("let it be", 5).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(lower.resolved_title, "Let It Be");
    }

    #[test]
    fn duplicate_titles_resolve_to_first_row() {
        let e = engine(&[
            ("A", "Home", "road home long"),
            ("B", "home", "sea salt wave"),
            ("C", "Road", "road long dust"),
        ]);
        let r = e.recommend("HOME", 5).unwrap();
        assert_eq!(r.query_index, 0);
        assert_eq!(r.resolved_title, "Home");
        assert_eq!(r.songs[0].song, "Road");
        // the second "home" row is not the query and may be recommended
        assert!(r.songs.iter().any(|s| s.artist == "B"));
    }

    #[test]
    fn never_recommends_itself_and_caps_length() {
        let e = xyz();
        for (i, title) in e.list_titles().iter().enumerate() {
            for top_n in 0..5 {
                let r = e.recommend(title, top_n).unwrap();
                assert_eq!(r.songs.len(), top_n.min(e.len() - 1));
                assert!(r.songs.iter().all(|s| s.song != *title), "row {i} recommended itself");
            }
        }
    }

    #[test]
    fn ties_follow_corpus_order() {
        // B, C and D are identical, so they tie against A
        let e = engine(&[
            ("A", "Q", "sun moon"),
            ("B", "T1", "sun star"),
            ("C", "T2", "sun star"),
            ("D", "T3", "sun star"),
        ]);
        let r = e.recommend("Q", 3).unwrap();
        assert_eq!(pairs(&r), vec![("B", "T1"), ("C", "T2"), ("D", "T3")]);
    }

    #[test]
    fn identical_document_outranks_self_position() {
        // the query's twin scores 1.0 and must come first
        let e = engine(&[
            ("A", "One", "river stone"),
            ("B", "Two", "river stone"),
            ("C", "Three", "river light"),
        ]);
        let r = e.recommend("Two", 2).unwrap();
        assert_eq!(pairs(&r), vec![("A", "One"), ("C", "Three")]);
    }

    #[test]
    fn lazy_and_precomputed_agree() {
        let rows = [
            ("A", "s0", "night drive city lights"),
            ("B", "s1", "city rain night"),
            ("C", "s2", "ocean waves night"),
            ("D", "s3", "drive fast lights"),
            ("E", "s4", "rain ocean"),
        ];
        let lazy = engine(&rows);
        let pre = engine(&rows).with_strategy(SimilarityStrategy::Precomputed);
        assert!(pre.similarity_matrix().is_some());
        for title in lazy.list_titles() {
            assert_eq!(lazy.recommend(title, 4), pre.recommend(title, 4));
            let i = lazy.find(title).unwrap();
            assert_eq!(lazy.similarity_row(i).unwrap(), pre.similarity_row(i).unwrap());
        }
        assert_eq!(lazy.similarity(0, 1), pre.similarity(1, 0));
    }

    #[test]
    fn misaligned_inputs_are_rejected() {
        let corpus = CorpusTable::new(vec![CorpusEntry {
            artist: "A".into(),
            song: "S".into(),
            cleaned_text: "one".into(),
        }]);
        let features = FeatureBuilder::default().fit_transform(&["one two", "three four"]).unwrap();
        let err = SimilarityEngine::new(corpus, features).unwrap_err();
        assert!(matches!(err, RecommendError::Misaligned { corpus_rows: 1, other_rows: 2, .. }));
    }

    #[test]
    fn concurrent_queries_see_the_same_answers() {
        let e = xyz();
        let expected = e.recommend("Y", 2);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| e.recommend("y", 2))).collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }
}
