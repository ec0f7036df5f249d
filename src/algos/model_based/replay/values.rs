use crate::common::{defs::*, utils::*};
use ndarray::{Array2, ArrayView1};

/// Action values and their eligibility traces.
#[derive(Debug, Clone)]
pub struct ValueStore {
    q: Array2<Continous>,
    traces: Array2<Continous>,
}

impl ValueStore {
    pub fn new(n_s: usize, n_a: usize) -> Self {
        Self {
            q: Array2::zeros((n_s, n_a)),
            traces: Array2::zeros((n_s, n_a)),
        }
    }

    pub fn q(&self) -> &Array2<Continous> {
        &self.q
    }

    pub fn q_row(&self, s: Discrete) -> ArrayView1<Continous> {
        self.q.row(s)
    }

    pub fn traces(&self) -> &Array2<Continous> {
        &self.traces
    }

    pub fn max_q(&self, s: Discrete) -> Continous {
        max_value(self.q.row(s))
    }

    /// One-step Q(λ) update from a real transition.
    ///
    /// Returns the TD error.
    pub fn online_update(
        &mut self,
        t: &Transition,
        alpha: Continous,
        gamma: Continous,
        lambda: Continous,
    ) -> Continous {
        let delta = t.r + gamma * self.max_q(t.s_next) - self.q[[t.s, t.a]];

        self.mark_trace(t.s, t.a);
        self.q.scaled_add(alpha * delta, &self.traces);
        self.decay_traces(gamma * lambda);

        delta
    }

    /// Move `Q[s, a]` by `alpha` towards `target`.
    pub fn backup(&mut self, s: Discrete, a: Discrete, target: Continous, alpha: Continous) {
        let q = &mut self.q[[s, a]];
        *q += alpha * (target - *q);
    }

    pub fn reset_traces(&mut self) {
        self.traces.fill(0.);
    }

    pub fn snapshot(&self) -> Array2<Continous> {
        self.q.clone()
    }

    fn mark_trace(&mut self, s: Discrete, a: Discrete) {
        self.traces.row_mut(s).fill(0.);
        self.traces[[s, a]] = 1.;
    }

    fn decay_traces(&mut self, factor: Continous) {
        self.traces *= factor;
    }
}
