use crate::common::defs::Continous;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the behaviour policy turns a row of Q-values into action probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ActionPolicy {
    /// Uniform over the maximising actions.
    Greedy,
    EGreedy { epsilon: Continous },
    /// Boltzmann policy with inverse temperature `beta`.
    Softmax { beta: Continous },
}

/// Source of the Need term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedMode {
    /// Discounted expected visits from the current state.
    SuccessorRepresentation,
    /// Long-run occupancy of the learned transition model.
    StationaryDistribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainMode {
    /// Change of the state value `Σ π·Q` caused by the backup.
    ValueChange,
    /// Value of the policy change alone, `Σ (π_post - π_pre)·Q_post`.
    PolicyImprovement,
}

/// Run configuration. Built once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub gamma: Continous,
    pub lambda: Continous,
    pub alpha: Continous,
    pub t_learning_rate: Continous,
    pub planning_steps: usize,
    pub evm_thresh: Continous,
    pub baseline_gain: Continous,
    pub set_all_gain_to_1: bool,
    pub set_all_need_to_1: bool,
    pub allow_loops: bool,
    pub expand_further: bool,
    pub plan_only_start_end: bool,
    pub start_random: bool,
    pub transi_goal_to_start: bool,
    pub pre_explore: bool,
    pub remove_same_state: bool,
    pub plan_unvisited: bool,
    pub action_policy: ActionPolicy,
    pub need_mode: NeedMode,
    pub gain_mode: GainMode,
    pub episodes: usize,
    pub max_episode_steps: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            lambda: 0.,
            alpha: 1.,
            t_learning_rate: 0.9,
            planning_steps: 20,
            evm_thresh: 0.,
            baseline_gain: 1e-10,
            set_all_gain_to_1: false,
            set_all_need_to_1: false,
            allow_loops: false,
            expand_further: true,
            plan_only_start_end: false,
            start_random: false,
            transi_goal_to_start: true,
            pre_explore: true,
            remove_same_state: true,
            plan_unvisited: false,
            action_policy: ActionPolicy::Softmax { beta: 5. },
            need_mode: NeedMode::SuccessorRepresentation,
            gain_mode: GainMode::ValueChange,
            episodes: 50,
            max_episode_steps: 1000,
        }
    }
}

impl Params {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Dyna-Q: uniform replay priorities.
    pub fn dyna_q(self) -> Self {
        Self {
            set_all_gain_to_1: true,
            set_all_need_to_1: true,
            ..self
        }
    }

    /// Plain Q(λ) learning without replay.
    pub fn q_learning(self) -> Self {
        Self {
            planning_steps: 0,
            ..self.dyna_q()
        }
    }

    pub fn mask_gain(&self) -> i32 {
        i32::from(!self.set_all_gain_to_1)
    }

    pub fn mask_need(&self) -> i32 {
        i32::from(!self.set_all_need_to_1)
    }

    pub fn validate(&self) -> Result<()> {
        check("gamma", self.gamma, (0. ..1.).contains(&self.gamma), "[0, 1)")?;
        check("lambda", self.lambda, (0. ..=1.).contains(&self.lambda), "[0, 1]")?;
        check("alpha", self.alpha, self.alpha > 0. && self.alpha <= 1., "(0, 1]")?;
        check(
            "t_learning_rate",
            self.t_learning_rate,
            (0. ..=1.).contains(&self.t_learning_rate),
            "[0, 1]",
        )?;
        check(
            "baseline_gain",
            self.baseline_gain,
            self.baseline_gain.is_finite(),
            "finite",
        )?;
        check(
            "evm_thresh",
            self.evm_thresh,
            !self.evm_thresh.is_nan(),
            "a number",
        )?;
        check(
            "max_episode_steps",
            self.max_episode_steps as f64,
            self.max_episode_steps > 0,
            "at least 1",
        )?;

        match self.action_policy {
            ActionPolicy::Greedy => Ok(()),
            ActionPolicy::EGreedy { epsilon } => {
                check("epsilon", epsilon, (0. ..=1.).contains(&epsilon), "[0, 1]")
            }
            ActionPolicy::Softmax { beta } => {
                check("beta", beta, beta.is_finite() && beta >= 0., "finite and >= 0")
            }
        }
    }
}

fn check(name: &'static str, value: f64, ok: bool, expected: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            expected,
        })
    }
}
