use std::cmp::Ordering;

use num::Float;

/// Cosine similarity of two sparse rows given as (column, value) iterators
/// sorted by column.
///
/// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
///
/// Accumulates in f64. If either side has zero norm the result is 0.0,
/// so an empty document is similar to nothing, itself included.
/// Rounding can push the quotient one ulp past ±1, so it is clamped.
pub fn cosine_similarity<N>(
    vec: impl Iterator<Item = (usize, N)>,
    other: impl Iterator<Item = (usize, N)>,
) -> f64
where
    N: Float,
{
    let f = |v: N| v.to_f64().unwrap_or(0.0);
    let mut a_it = vec.fuse();
    let mut b_it = other.fuse();
    let mut a_next = a_it.next();
    let mut b_next = b_it.next();
    let mut sum_a2: f64 = 0.0;
    let mut sum_b2: f64 = 0.0;
    let mut sum_ab: f64 = 0.0;
    while let (Some((ia, va)), Some((ib, vb))) = (a_next, b_next) {
        match ia.cmp(&ib) {
            Ordering::Equal => {
                let (va, vb) = (f(va), f(vb));
                sum_a2 += va * va;
                sum_b2 += vb * vb;
                sum_ab += va * vb;
                a_next = a_it.next();
                b_next = b_it.next();
            }
            Ordering::Less => {
                sum_a2 += f(va).powi(2);
                a_next = a_it.next();
            }
            Ordering::Greater => {
                sum_b2 += f(vb).powi(2);
                b_next = b_it.next();
            }
        }
    }
    if let Some((_, va)) = a_next {
        sum_a2 += f(va).powi(2);
    }
    if let Some((_, vb)) = b_next {
        sum_b2 += f(vb).powi(2);
    }
    sum_a2 += a_it.map(|(_, v)| f(v).powi(2)).sum::<f64>();
    sum_b2 += b_it.map(|(_, v)| f(v).powi(2)).sum::<f64>();
    if sum_a2 == 0.0 || sum_b2 == 0.0 {
        0.0
    } else {
        (sum_ab / (sum_a2.sqrt() * sum_b2.sqrt())).clamp(-1.0, 1.0)
    }
}
