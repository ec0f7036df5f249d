use super::{experience::ExperienceModel, values::ValueStore};
use crate::common::{defs::*, utils::*};
use itertools::iproduct;
use rand::prelude::*;

/// Contiguous sequence of steps considered for a single multi-step backup.
///
/// Invariant: the successor of every step is the start of the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    steps: Vec<Transition>,
}

impl Trajectory {
    pub fn single(t: Transition) -> Self {
        Self { steps: vec![t] }
    }

    pub fn from_steps(steps: Vec<Transition>) -> Self {
        assert!(!steps.is_empty(), "A trajectory needs at least one step.");
        let traj = Self { steps };
        assert!(traj.is_chained(), "Steps do not form a chain: {:?}", traj.steps);
        traj
    }

    pub fn steps(&self) -> &[Transition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> &Transition {
        &self.steps[self.steps.len() - 1]
    }

    pub fn is_chained(&self) -> bool {
        self.steps.windows(2).all(|w| w[0].s_next == w[1].s)
    }

    /// Whether `s` is the start or the successor of any step.
    pub fn visits(&self, s: Discrete) -> bool {
        self.steps.iter().any(|t| t.s == s || t.s_next == s)
    }

    /// Copy of this trajectory with `t` appended.
    pub fn extended(&self, t: Transition) -> Self {
        assert_eq!(self.last().s_next, t.s, "Extension does not continue the trajectory.");
        let mut steps = self.steps.clone();
        steps.push(t);
        Self { steps }
    }

    /// Discounted rewards from step `n` to the end plus the discounted value of
    /// the final successor.
    pub fn n_step_target(&self, n: usize, gamma: Continous, values: &ValueStore) -> Continous {
        let rest = &self.steps[n..];
        let r_plan: Continous = rest
            .iter()
            .enumerate()
            .map(|(k, t)| gamma.powi(k as i32) * t.r)
            .sum();
        let s_end = self.last().s_next;

        r_plan + gamma.powi(rest.len() as i32) * values.max_q(s_end)
    }
}

/// One-step candidates, one per (state, action) pair the model can answer for.
///
/// Never-tried pairs are skipped unless `plan_unvisited`, in which case they
/// stand in as zero-reward self-loops.
pub fn one_step_candidates(
    model: &ExperienceModel,
    remove_same_state: bool,
    plan_unvisited: bool,
) -> Vec<Trajectory> {
    iproduct!(0..model.n_s(), 0..model.n_a())
        .filter_map(|(s, a)| match model.last_outcome(s, a) {
            Some(t) => Some(t),
            None if plan_unvisited => Some(Transition::new(s, a, 0., s)),
            None => None,
        })
        .filter(|t| !(remove_same_state && t.is_self_transition()))
        .map(Trajectory::single)
        .collect()
}

/// Try to grow `current` by one greedy step and add the result to `candidates`.
///
/// Returns whether a candidate was added.
pub fn expand(
    candidates: &mut Vec<Trajectory>,
    current: &Trajectory,
    model: &ExperienceModel,
    values: &ValueStore,
    allow_loops: bool,
    rng: &mut StdRng,
) -> bool {
    let s_n = current.last().s_next;
    let best = argmax_all(values.q_row(s_n));
    if best.len() == model.n_a() {
        return false;
    }

    let a_n = best[rng.gen_range(0..best.len())];
    let Some(step) = model.last_outcome(s_n, a_n) else {
        return false;
    };
    if !allow_loops && current.visits(step.s_next) {
        return false;
    }

    candidates.push(current.extended(step));
    true
}
