use std::fmt::Debug;

/// Scored corpus rows for one query
pub struct Hits {
    /// (row index, score)
    pub list: Vec<(usize, f64)>,
}

impl Hits {
    /// Hits for every row of a similarity row, in row order
    pub fn from_scores(scores: &[f64]) -> Self {
        Hits {
            list: scores.iter().copied().enumerate().collect(),
        }
    }

    /// Sort by descending score.
    /// The sort is stable, so equal scores keep row order.
    pub fn sort_by_score_desc(&mut self) -> &mut Self {
        self.list.retain(|(_, s)| !s.is_nan());
        self.list.sort_by(|a, b| b.1.total_cmp(&a.1));
        self
    }

    /// Drop the hit for `index`
    pub fn exclude(&mut self, index: usize) -> &mut Self {
        self.list.retain(|(i, _)| *i != index);
        self
    }

    pub fn truncate(&mut self, n: usize) -> &mut Self {
        self.list.truncate(n);
        self
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.list.iter().map(|(i, _)| *i)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for (index, score) in &self.list {
                writeln!(f, "    {}: {:.6}", index, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}
