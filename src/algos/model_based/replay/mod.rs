//! Model-based agent with prioritized replay.
//!
//! After every real step the agent learns with a Q(λ) update and may then
//! replay remembered transitions, most valuable first. The value of replaying
//! a trajectory (its EVM) is the product of its Gain, how much the backup
//! would improve the agent's values, and its Need, how soon the agent expects
//! to be where the backup applies. Replayed trajectories can grow one greedy
//! step at a time, which turns one-step replay into multi-step backups.
//!
//! Ref: Mattar & Daw, "Prioritized memory access explains planning and
//! hippocampal replay", Nature Neuroscience 2018.

pub mod candidates;
pub mod experience;
pub mod planning;
pub mod policy;
pub mod priority;
pub mod training;
pub mod values;

use crate::common::defs::*;
use crate::config::Params;
use crate::error::Result;
use experience::ExperienceModel;
use planning::BackupLog;
use rand::prelude::*;
use values::ValueStore;

pub use training::LearnOutcome;

/// One learning run's worth of state. Nothing is shared between agents, so
/// independent runs are independent values.
#[derive(Debug, Clone)]
pub struct ReplayAgent {
    params: Params,
    model: ExperienceModel,
    values: ValueStore,
    rng: StdRng,
}

impl ReplayAgent {
    pub fn new(n_s: usize, n_a: usize, params: Params) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            model: ExperienceModel::new(n_s, n_a, params.t_learning_rate),
            values: ValueStore::new(n_s, n_a),
            rng: StdRng::seed_from_u64(0),
            params,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn model(&self) -> &ExperienceModel {
        &self.model
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Sample an action for `s` from the behaviour policy.
    pub fn act(&mut self, s: Discrete) -> Discrete {
        self.params
            .action_policy
            .sample(self.values.q_row(s), &mut self.rng)
    }

    /// Learn from a real step: update the model, then apply the
    /// eligibility-trace TD backup. Returns the TD error.
    pub fn observe(&mut self, t: Transition) -> Continous {
        self.model.observe(t.s, t.a, t.r, t.s_next);
        let p = &self.params;
        self.values.online_update(&t, p.alpha, p.gamma, p.lambda)
    }

    /// Run the replay loop with the agent in `s`.
    pub fn do_planning(&mut self, s: Discrete) -> BackupLog {
        planning::do_planning(
            s,
            &self.model,
            &mut self.values,
            &self.params,
            &mut self.rng,
        )
    }
}
