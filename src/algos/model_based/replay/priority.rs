//! Expected Value of Memory: how much a replayed trajectory is worth right now.
//!
//! EVM is the product of
//! - Gain: how much the value of the replayed states improves if the backup is
//!   applied, and
//! - Need: how soon the agent is expected to be in those states again,
//!   estimated from the learned transition model.

use super::{candidates::Trajectory, experience::ExperienceModel, values::ValueStore};
use crate::common::defs::*;
use crate::config::{GainMode, NeedMode, Params};
use ndarray::{Array1, Array2};
use rand::prelude::*;

const TOLERANCE: Continous = 1e-10;
const MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Gain of each step.
    pub gain: Vec<Continous>,
    /// Need of the last step.
    pub need: Continous,
    pub evm: Continous,
}

/// Gain of each step of `traj` if it were backed up with the current values.
pub fn gain(traj: &Trajectory, values: &ValueStore, params: &Params) -> Vec<Continous> {
    let policy = params.action_policy;

    traj.steps()
        .iter()
        .enumerate()
        .map(|(n, t)| {
            let q_pre = values.q_row(t.s).to_owned();
            let target = traj.n_step_target(n, params.gamma, values);
            let mut q_post = q_pre.clone();
            q_post[t.a] += params.alpha * (target - q_post[t.a]);

            let pi_pre = Array1::from(policy.probabilities(q_pre.view()));
            let pi_post = Array1::from(policy.probabilities(q_post.view()));

            match params.gain_mode {
                GainMode::ValueChange => pi_post.dot(&q_post) - pi_pre.dot(&q_pre),
                GainMode::PolicyImprovement => (&pi_post - &pi_pre).dot(&q_post),
            }
        })
        .collect()
}

/// Need of every state seen from `s`.
pub fn need(model: &ExperienceModel, s: Discrete, params: &Params) -> Array1<Continous> {
    match params.need_mode {
        NeedMode::SuccessorRepresentation => {
            successor_representation(model.transitions(), s, params.gamma)
        }
        NeedMode::StationaryDistribution => stationary_distribution(model.transitions()),
    }
}

/// Row `s` of `(I - γT)^-1`: discounted expected visits to every state when
/// starting from `s`. Rows of `T` without mass contribute nothing.
pub fn successor_representation(
    t: &Array2<Continous>,
    s: Discrete,
    gamma: Continous,
) -> Array1<Continous> {
    let n_s = t.nrows();
    assert!(s < n_s, "State {s} is out of range.");
    let mut onehot = Array1::zeros(n_s);
    onehot[s] = 1.;

    let mut x = onehot.clone();
    for _ in 0..MAX_ITERATIONS {
        let next = &onehot + &(x.dot(t) * gamma);
        let delta = max_abs_diff(&next, &x);
        x = next;
        if delta < TOLERANCE {
            break;
        }
    }
    x
}

/// Long-run state occupancy under `T`. All zeros if `T` has no mass.
pub fn stationary_distribution(t: &Array2<Continous>) -> Array1<Continous> {
    let n_s = t.nrows();
    let mut p = Array1::from_elem(n_s, 1. / n_s as Continous);
    for _ in 0..MAX_ITERATIONS {
        let stepped = p.dot(t);
        if stepped.sum() <= 0. {
            return Array1::zeros(n_s);
        }
        // Lazy chain: same fixed point, but converges on periodic models too.
        let mut next = (&p + &stepped) * 0.5;
        next /= next.sum();
        let delta = max_abs_diff(&next, &p);
        p = next;
        if delta < TOLERANCE {
            break;
        }
    }
    p
}

/// `(Need^mask_need * Σ max(Gain, baseline))^mask_gain`.
pub fn evm(gain: &[Continous], need: Continous, params: &Params) -> Continous {
    let gain: Continous = gain.iter().map(|g| g.max(params.baseline_gain)).sum();
    (need.powi(params.mask_need()) * gain).powi(params.mask_gain())
}

/// Score every candidate. `need` is the per-state Need vector; a candidate is
/// judged by the Need of the start of its last step.
pub fn score(
    candidates: &[Trajectory],
    values: &ValueStore,
    need: &Array1<Continous>,
    params: &Params,
) -> Vec<Score> {
    candidates
        .iter()
        .map(|traj| {
            let gain = gain(traj, values, params);
            let need = need[traj.last().s];
            let evm = evm(&gain, need, params);
            Score { gain, need, evm }
        })
        .collect()
}

/// Replay is only worth it if it beats the average reward of acting.
pub fn threshold(model: &ExperienceModel, params: &Params) -> Continous {
    model.mean_reward().min(params.evm_thresh)
}

/// Index of the candidate to replay, or `None` when no candidate beats
/// `threshold`. Ties go to the shortest trajectory, then to a random pick.
pub fn select(
    candidates: &[Trajectory],
    scores: &[Score],
    threshold: Continous,
    rng: &mut StdRng,
) -> Option<usize> {
    assert_eq!(candidates.len(), scores.len());
    let max_evm = scores
        .iter()
        .map(|sc| sc.evm)
        .fold(Continous::NEG_INFINITY, Continous::max);
    if max_evm.is_nan() || max_evm <= threshold {
        return None;
    }

    let best = (0..scores.len())
        .filter(|&i| scores[i].evm == max_evm)
        .collect::<Vec<_>>();
    let shortest = best.iter().map(|&i| candidates[i].len()).min()?;
    let best = best
        .into_iter()
        .filter(|&i| candidates[i].len() == shortest)
        .collect::<Vec<_>>();

    best.choose(rng).copied()
}

fn max_abs_diff(a: &Array1<Continous>, b: &Array1<Continous>) -> Continous {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0., Continous::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionPolicy;
    use float_eq::*;
    use ndarray::array;
    use rstest::*;

    fn greedy_params() -> Params {
        Params {
            action_policy: ActionPolicy::Greedy,
            alpha: 1.,
            gamma: 0.9,
            baseline_gain: 0.,
            ..Params::default()
        }
    }

    fn traj(steps: &[(Discrete, Discrete, Continous, Discrete)]) -> Trajectory {
        Trajectory::from_steps(
            steps
                .iter()
                .map(|&(s, a, r, s_next)| Transition::new(s, a, r, s_next))
                .collect(),
        )
    }

    #[test]
    fn value_change_gain_on_rewarding_step() {
        let values = ValueStore::new(2, 2);
        let g = gain(&traj(&[(0, 1, 1., 1)]), &values, &greedy_params());
        assert_float_eq!(g, vec![1.], abs_all <= 1e-12);
    }

    #[test]
    fn policy_improvement_gain_ignores_value_only_changes() {
        let mut values = ValueStore::new(2, 2);
        values.backup(0, 1, 0.5, 1.);
        let params = Params {
            gain_mode: GainMode::PolicyImprovement,
            ..greedy_params()
        };

        // Raising the greedy action does not change the policy.
        let g = gain(&traj(&[(0, 1, 1., 1)]), &values, &params);
        assert_float_eq!(g, vec![0.], abs_all <= 1e-12);

        // Raising the other action flips it: gain is the value of the switch.
        let g = gain(&traj(&[(0, 0, 1., 1)]), &values, &params);
        assert_float_eq!(g, vec![0.5], abs_all <= 1e-12);
    }

    #[test]
    fn gain_is_zero_for_converged_values() {
        let mut values = ValueStore::new(2, 1);
        values.backup(0, 0, 1., 1.);
        let g = gain(&traj(&[(0, 0, 1., 1)]), &values, &greedy_params());
        assert_float_eq!(g, vec![0.], abs_all <= 1e-12);
    }

    #[test]
    fn multi_step_gain_uses_return_to_end() {
        let values = ValueStore::new(3, 1);
        let g = gain(&traj(&[(0, 0, 0., 1), (1, 0, 1., 2)]), &values, &greedy_params());
        assert_float_eq!(g, vec![0.9, 1.], abs_all <= 1e-12);
    }

    #[test]
    fn successor_representation_of_a_chain() {
        let t = array![[0., 1., 0.], [0., 0., 1.], [0., 0., 0.]];
        let sr = successor_representation(&t, 0, 0.5);
        assert_float_eq!(sr.to_vec(), vec![1., 0.5, 0.25], abs_all <= 1e-9);
    }

    #[test]
    fn successor_representation_of_a_self_loop() {
        let t = array![[1., 0.], [0., 1.]];
        let sr = successor_representation(&t, 1, 0.9);
        assert_float_eq!(sr.to_vec(), vec![0., 10.], abs_all <= 1e-6);
    }

    #[test]
    fn successor_representation_of_an_empty_model() {
        let t = Array2::zeros((3, 3));
        let sr = successor_representation(&t, 2, 0.9);
        assert_float_eq!(sr.to_vec(), vec![0., 0., 1.], abs_all <= 0.);
    }

    #[test]
    fn stationary_distribution_of_a_cycle() {
        let t = array![[0., 1.], [1., 0.]];
        let sd = stationary_distribution(&t);
        assert_float_eq!(sd.to_vec(), vec![0.5, 0.5], abs_all <= 1e-9);

        let t = array![[0.5, 0.5], [1., 0.]];
        let sd = stationary_distribution(&t);
        assert_float_eq!(sd.to_vec(), vec![2. / 3., 1. / 3.], abs_all <= 1e-8);
    }

    #[test]
    fn stationary_distribution_of_an_empty_model() {
        let sd = stationary_distribution(&Array2::zeros((2, 2)));
        assert!(sd.iter().all(|&p| p == 0.));
    }

    #[rstest]
    #[case(false, false, 0.5 * (0.2 + 0.3))]
    #[case(true, false, 0.2 + 0.3)]
    #[case(false, true, 1.)]
    #[case(true, true, 1.)]
    fn evm_masks(#[case] need_off: bool, #[case] gain_off: bool, #[case] expected: Continous) {
        let params = Params {
            set_all_need_to_1: need_off,
            set_all_gain_to_1: gain_off,
            baseline_gain: 0.,
            ..Params::default()
        };
        assert_float_eq!(evm(&[0.2, 0.3], 0.5, &params), expected, abs <= 1e-12);
    }

    #[test]
    fn evm_floors_gain_at_baseline() {
        let params = Params {
            baseline_gain: 0.1,
            ..Params::default()
        };
        assert_float_eq!(evm(&[-5., 0.3], 2., &params), 2. * (0.1 + 0.3), abs <= 1e-12);
    }

    #[test]
    fn dyna_q_scores_are_uniform() {
        let values = ValueStore::new(3, 2);
        let params = Params::default().dyna_q();
        let candidates = vec![
            traj(&[(0, 0, 1., 1)]),
            traj(&[(1, 1, 0., 2)]),
            traj(&[(2, 0, -3., 0)]),
        ];
        let need = array![0., 0.3, 7.];

        let scores = score(&candidates, &values, &need, &params);
        assert!(scores.iter().all(|sc| sc.evm == 1.));
    }

    #[test]
    fn threshold_is_capped_by_configuration() {
        let mut model = ExperienceModel::new(2, 1, 1.);
        model.observe(0, 0, 1., 1);
        let params = Params {
            evm_thresh: 0.25,
            ..Params::default()
        };
        assert_float_eq!(threshold(&model, &params), 0.25, abs <= 0.);

        let params = Params {
            evm_thresh: 5.,
            ..Params::default()
        };
        assert_float_eq!(threshold(&model, &params), 1., abs <= 0.);
    }

    fn scored(evm: Continous) -> Score {
        Score {
            gain: vec![],
            need: 1.,
            evm,
        }
    }

    #[test]
    fn select_stops_at_threshold() {
        let candidates = vec![traj(&[(0, 0, 0., 1)])];
        let rng = &mut StdRng::seed_from_u64(0);
        assert_eq!(select(&candidates, &[scored(0.5)], 0.5, rng), None);
        assert_eq!(select(&candidates, &[scored(0.5)], 0.4, rng), Some(0));
    }

    #[test]
    fn select_prefers_shorter_trajectories() {
        let candidates = vec![
            traj(&[(0, 0, 0., 1), (1, 0, 0., 2)]),
            traj(&[(1, 0, 0., 2)]),
            traj(&[(2, 0, 0., 0)]),
        ];
        let scores = vec![scored(2.), scored(2.), scored(1.)];
        let rng = &mut StdRng::seed_from_u64(0);
        for _ in 0..20 {
            assert_eq!(select(&candidates, &scores, 0., rng), Some(1));
        }
    }

    #[test]
    fn select_breaks_remaining_ties_reproducibly() {
        let candidates = (0..4).map(|s| traj(&[(s, 0, 0., s)])).collect::<Vec<_>>();
        let scores = vec![scored(1.), scored(3.), scored(3.), scored(3.)];

        let picks = |seed| {
            let rng = &mut StdRng::seed_from_u64(seed);
            (0..10)
                .map(|_| select(&candidates, &scores, 0., rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(42), picks(42));

        let mut counts = [0usize; 4];
        for seed in 0..3000 {
            let rng = &mut StdRng::seed_from_u64(seed);
            counts[select(&candidates, &scores, 0., rng).unwrap()] += 1;
        }
        assert_eq!(counts[0], 0);
        for &c in &counts[1..] {
            assert_float_eq!(c as f64 / 3000., 1. / 3., abs <= 0.05);
        }
    }
}
