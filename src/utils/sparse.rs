use num::Float;
use serde::{Deserialize, Serialize};

use crate::utils::sort::radix_sort_u32_soa;

/// Sparse vector in SoA layout.
/// `inds` is strictly ascending, `vals` holds the matching non-zero weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseRow<N> {
    inds: Vec<u32>,
    vals: Vec<N>,
}

impl<N> SparseRow<N>
where
    N: Float,
{
    pub fn new() -> Self {
        Self { inds: Vec::new(), vals: Vec::new() }
    }

    /// Build from (column, value) pairs in any order.
    /// Zero values are dropped; columns must be distinct.
    pub fn from_unsorted(pairs: impl IntoIterator<Item = (u32, N)>) -> Self {
        let (mut inds, mut vals): (Vec<u32>, Vec<N>) =
            pairs.into_iter().filter(|(_, v)| !v.is_zero()).unzip();
        radix_sort_u32_soa(&mut inds, &mut vals);
        debug_assert!(inds.windows(2).all(|w| w[0] < w[1]), "duplicate column in sparse row");
        Self { inds, vals }
    }

    /// Non-zero entries as (column, value), column ascending
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, N)> + '_ {
        self.inds.iter().zip(self.vals.iter()).map(|(&i, &v)| (i as usize, v))
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inds.is_empty()
    }

    /// Largest column index + 1, zero for an empty row
    pub fn min_dim(&self) -> usize {
        self.inds.last().map_or(0, |&i| i as usize + 1)
    }

    /// Euclidean norm, accumulated in f64
    pub fn l2_norm(&self) -> f64 {
        self.vals
            .iter()
            .map(|v| v.to_f64().unwrap_or(0.0).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Scale to unit length. An all-zero row is left untouched.
    pub fn l2_normalize(&mut self) {
        let norm = self.l2_norm();
        if norm == 0.0 {
            return;
        }
        if let Some(inv) = N::from(1.0 / norm) {
            self.vals.iter_mut().for_each(|v| *v = *v * inv);
        }
    }

    pub fn shrink_to_fit(&mut self) {
        self.inds.shrink_to_fit();
        self.vals.shrink_to_fit();
    }
}
