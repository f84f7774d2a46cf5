use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::vectorizer::{compare::cosine_similarity, FeatureMatrix};

/// Dense pairwise cosine similarity, row-major, `size * size` entries.
///
/// Entry (i, j) is computed exactly like a lazily computed similarity row,
/// so both paths rank identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    size: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    /// O(n² · nnz) time and O(n²) memory
    pub fn compute(features: &FeatureMatrix) -> Self {
        let size = features.row_count();
        let rows = features.rows();
        let mut data = vec![0.0; size * size];
        if size > 0 {
            data.par_chunks_mut(size).enumerate().for_each(|(i, out)| {
                let query = &rows[i];
                for (j, slot) in out.iter_mut().enumerate() {
                    *slot = cosine_similarity(query.raw_iter(), rows[j].raw_iter());
                }
            });
        }
        info!(size, "similarity matrix computed");
        Self { size, data }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.size {
            return None;
        }
        Some(&self.data[index * self.size..(index + 1) * self.size])
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.row(i).and_then(|r| r.get(j).copied())
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.data.len() != self.size * self.size {
            return Err(format!("{} entries for a {}x{} matrix", self.data.len(), self.size, self.size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::FeatureBuilder;

    fn features(texts: &[&str]) -> FeatureMatrix {
        FeatureBuilder::default().fit_transform(texts).unwrap()
    }

    #[test]
    fn symmetric_bounded_with_unit_diagonal() {
        let m = SimilarityMatrix::compute(&features(&[
            "love heart night",
            "love heart day",
            "love rain cloud",
            "guitar drums bass",
        ]));
        assert_eq!(m.size(), 4);
        for i in 0..4 {
            assert!((m.get(i, i).unwrap() - 1.0).abs() < 1e-6);
            for j in 0..4 {
                let s = m.get(i, j).unwrap();
                assert_eq!(s, m.get(j, i).unwrap());
                assert!((-1e-9..=1.0 + 1e-9).contains(&s), "({i},{j}) = {s}");
            }
        }
        assert_eq!(m.get(0, 3), Some(0.0));
        assert_eq!(m.get(4, 0), None);
    }

    #[test]
    fn empty_feature_row_has_zero_diagonal() {
        let m = SimilarityMatrix::compute(&features(&["love song", "x"]));
        assert_eq!(m.get(1, 1), Some(0.0));
        assert_eq!(m.get(0, 1), Some(0.0));
    }
}
