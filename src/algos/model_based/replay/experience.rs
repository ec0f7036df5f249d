use crate::common::{defs::*, utils::*};
use crate::mdps::mdp_simulator::MdpSimulator;
use ndarray::{Array1, Array2};

/// Everything the agent has learned about the world: the experience log, the
/// last observed outcome of every (state, action) and the state-to-state
/// transition model.
#[derive(Debug, Clone)]
pub struct ExperienceModel {
    log: Vec<ExperienceEvent>,
    last_reward: Array2<Continous>,
    last_s_next: Array2<Discrete>,
    visited: Array2<bool>,
    transitions: Array2<Continous>,
    t_learning_rate: Continous,
}

impl ExperienceModel {
    pub fn new(n_s: usize, n_a: usize, t_learning_rate: Continous) -> Self {
        Self {
            log: vec![],
            last_reward: Array2::zeros((n_s, n_a)),
            last_s_next: Array2::zeros((n_s, n_a)),
            visited: Array2::from_elem((n_s, n_a), false),
            transitions: Array2::zeros((n_s, n_s)),
            t_learning_rate,
        }
    }

    pub fn n_s(&self) -> usize {
        self.last_reward.nrows()
    }

    pub fn n_a(&self) -> usize {
        self.last_reward.ncols()
    }

    pub fn log(&self) -> &[ExperienceEvent] {
        &self.log
    }

    /// Learned state-to-state transition probabilities.
    pub fn transitions(&self) -> &Array2<Continous> {
        &self.transitions
    }

    /// Record a real step.
    pub fn observe(&mut self, s: Discrete, a: Discrete, r: Continous, s_next: Discrete) {
        self.remember(Transition::new(s, a, r, s_next));
        self.update_transition(s, s_next);
    }

    /// Record the jump from a terminal state to the next episode's start.
    pub fn observe_boundary(&mut self, s: Discrete, s_next: Discrete) {
        self.check_state(s);
        self.check_state(s_next);
        self.log.push(ExperienceEvent {
            s,
            a: None,
            r: None,
            s_next,
        });
        self.update_transition(s, s_next);
    }

    /// Last outcome of `a` in `s`, `None` if the pair was never tried.
    pub fn last_outcome(&self, s: Discrete, a: Discrete) -> Option<Transition> {
        self.visited[[s, a]].then(|| {
            Transition::new(s, a, self.last_reward[[s, a]], self.last_s_next[[s, a]])
        })
    }

    pub fn is_visited(&self, s: Discrete, a: Discrete) -> bool {
        self.visited[[s, a]]
    }

    /// Average reward over the whole log, episode boundaries counting as zero.
    /// This is the opportunity cost of spending time on replay.
    pub fn mean_reward(&self) -> Continous {
        if self.log.is_empty() {
            return 0.;
        }
        let total: Continous = self.log.iter().map(|e| e.r.unwrap_or(0.)).sum();
        total / self.log.len() as Continous
    }

    /// Force every action once from every non-terminal state, seeding the
    /// outcome tables with zero reward and `T` with normalised visit counts.
    pub fn pre_explore<M: MdpSimulator + ?Sized>(&mut self, env: &mut M) {
        assert_eq!(env.n_s(), self.n_s(), "Model and environment disagree on states.");
        assert_eq!(env.n_a(), self.n_a(), "Model and environment disagree on actions.");

        for s in 0..env.n_s() {
            if env.is_terminal(s) {
                continue;
            }
            for a in 0..env.n_a() {
                env.force_state(s);
                let s_next = env.step(a).observation;
                self.remember(Transition::new(s, a, 0., s_next));
                self.transitions[[s, s_next]] += 1.;
            }
        }

        normalize_rows(&mut self.transitions);
    }

    /// Make terminal states lead back to where episodes start, either the
    /// fixed `start` or uniformly any non-terminal state.
    pub fn route_terminals_to_start(&mut self, terminals: &[Discrete], start: Option<Discrete>) {
        let n_s = self.n_s();
        let row = match start {
            Some(start) => {
                self.check_state(start);
                let mut row = Array1::zeros(n_s);
                row[start] = 1.;
                row
            }
            None => {
                let n_open = n_s - terminals.iter().filter(|&&s| s < n_s).count();
                let p = if n_open == 0 { 0. } else { 1. / n_open as Continous };
                Array1::from_shape_fn(n_s, |s| if terminals.contains(&s) { 0. } else { p })
            }
        };

        for &term in terminals {
            self.check_state(term);
            self.transitions.row_mut(term).assign(&row);
        }
    }

    fn remember(&mut self, t: Transition) {
        self.check_state(t.s);
        self.check_state(t.s_next);
        assert!(t.a < self.n_a(), "Action {} is out of range.", t.a);

        self.log.push(t.into());
        self.last_reward[[t.s, t.a]] = t.r;
        self.last_s_next[[t.s, t.a]] = t.s_next;
        self.visited[[t.s, t.a]] = true;
    }

    /// Move row `s` of `T` towards the one-hot vector of `s_next`.
    fn update_transition(&mut self, s: Discrete, s_next: Discrete) {
        let lr = self.t_learning_rate;
        for (j, p) in self.transitions.row_mut(s).iter_mut().enumerate() {
            let target = if j == s_next { 1. } else { 0. };
            *p += lr * (target - *p);
        }
    }

    fn check_state(&self, s: Discrete) {
        assert!(s < self.n_s(), "State {s} is out of range.");
    }
}
