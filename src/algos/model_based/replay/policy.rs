use crate::common::{defs::*, utils::*};
use crate::config::ActionPolicy;
use ndarray::ArrayView1;
use rand::prelude::*;

impl ActionPolicy {
    /// Action probabilities for one row of Q-values.
    pub fn probabilities(&self, q: ArrayView1<Continous>) -> Vec<Continous> {
        let n_a = q.len();
        assert!(n_a > 0, "Cannot build a policy over zero actions.");

        match *self {
            ActionPolicy::Greedy => greedy(q),
            ActionPolicy::EGreedy { epsilon } => greedy(q)
                .into_iter()
                .map(|p| (1. - epsilon) * p + epsilon / n_a as Continous)
                .collect(),
            ActionPolicy::Softmax { beta } => {
                let max = max_value(q);
                let e = q.iter().map(|x| (beta * (x - max)).exp()).collect::<Vec<_>>();
                let z: Continous = e.iter().sum();
                e.into_iter().map(|x| x / z).collect()
            }
        }
    }

    pub fn sample(&self, q: ArrayView1<Continous>, rng: &mut StdRng) -> Discrete {
        pick_next(rng, &self.probabilities(q))
    }
}

fn greedy(q: ArrayView1<Continous>) -> Vec<Continous> {
    let best = argmax_all(q);
    let p = 1. / best.len() as Continous;
    let mut probs = vec![0.; q.len()];
    for a in best {
        probs[a] = p;
    }
    probs
}
