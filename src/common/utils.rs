use super::defs::*;
use ndarray::{Array2, ArrayView1, Axis};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

/// Sample an index according to the (not necessarily normalised) weights `p`.
pub fn pick_next(rng: &mut StdRng, p: &[Continous]) -> Discrete {
    let dist = WeightedIndex::new(p)
        .unwrap_or_else(|e| panic!("Cannot sample from weights {p:?}: {e}"));
    dist.sample(rng)
}

/// Indices of every entry equal to the row maximum.
pub fn argmax_all(row: ArrayView1<Continous>) -> Vec<Discrete> {
    let max = max_value(row);
    row.iter()
        .enumerate()
        .filter(|(_, q)| **q == max)
        .map(|(i, _)| i)
        .collect()
}

pub fn max_value(row: ArrayView1<Continous>) -> Continous {
    row.iter().copied().fold(Continous::NEG_INFINITY, Continous::max)
}

/// Scale each row to sum to one. Rows without mass stay all-zero.
pub fn normalize_rows(m: &mut Array2<Continous>) {
    for mut row in m.axis_iter_mut(Axis(0)) {
        let sum = row.sum();
        if sum > 0. {
            row /= sum;
        } else {
            row.fill(0.);
        }
    }
}
