use crate::common::defs::*;
use rand::prelude::*;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct StepInfo {
    pub observation: Discrete,
    pub reward: Continous,
    pub truncated: bool,
    pub terminated: bool,
    pub info: Value,
}

impl StepInfo {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Discrete environment the agent learns in.
///
/// The agent only interacts with the world through this trait; transition and
/// reward generation stay opaque.
pub trait MdpSimulator {
    fn name(&self) -> String;

    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn terminal_states(&self) -> &[Discrete];

    /// Designated start of an episode.
    fn start_state(&self) -> Discrete;

    fn is_terminal(&self, s: Discrete) -> bool {
        self.terminal_states().contains(&s)
    }

    /// Start a new episode. With `uniform` the start state is drawn uniformly
    /// over all states, otherwise the environment's designated start is used.
    fn reset(&mut self, uniform: bool, rng: &mut StdRng) -> Discrete;

    fn step(&mut self, a: Discrete) -> StepInfo;

    fn done(&self) -> bool;

    /// Maximum number of steps before an episode is truncated.
    fn set_timeout(&mut self, max_episode_steps: usize);

    /// Teleport the agent, used to force-execute actions from every state.
    fn force_state(&mut self, s: Discrete);
}
