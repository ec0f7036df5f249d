use rand::prelude::*;
use replay_sim::*;
use serde_json::Value;

/// Line of `n_s` states. Action 0 moves one state to the right, every other
/// action stays put. Entering the last state ends the episode with `reward`.
#[derive(Debug, Clone)]
pub struct ChainMdp {
    n_s: usize,
    n_a: usize,
    reward: Continous,
    terminals: Vec<Discrete>,
    current: Discrete,
    steps: usize,
    timeout: usize,
    done: bool,
}

#[allow(dead_code)]
impl ChainMdp {
    pub fn new(n_s: usize, n_a: usize, reward: Continous) -> Self {
        assert!(n_s >= 2 && n_a >= 1);
        Self {
            n_s,
            n_a,
            reward,
            terminals: vec![n_s - 1],
            current: 0,
            steps: 0,
            timeout: usize::MAX,
            done: false,
        }
    }
}

impl MdpSimulator for ChainMdp {
    fn name(&self) -> String {
        format!("Chain-{}", self.n_s)
    }

    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn terminal_states(&self) -> &[Discrete] {
        &self.terminals
    }

    fn start_state(&self) -> Discrete {
        0
    }

    fn reset(&mut self, uniform: bool, rng: &mut StdRng) -> Discrete {
        self.current = if uniform { rng.gen_range(0..self.n_s) } else { 0 };
        self.steps = 0;
        self.done = false;
        self.current
    }

    fn step(&mut self, a: Discrete) -> StepInfo {
        let s_next = if a == 0 {
            (self.current + 1).min(self.n_s - 1)
        } else {
            self.current
        };
        let terminated = self.is_terminal(s_next);
        self.current = s_next;
        self.steps += 1;
        let truncated = !terminated && self.steps >= self.timeout;
        self.done = terminated || truncated;

        StepInfo {
            observation: s_next,
            reward: if terminated { self.reward } else { 0. },
            truncated,
            terminated,
            info: Value::Null,
        }
    }

    fn done(&self) -> bool {
        self.done
    }

    fn set_timeout(&mut self, max_episode_steps: usize) {
        self.timeout = max_episode_steps;
    }

    fn force_state(&mut self, s: Discrete) {
        self.current = s;
        self.done = false;
    }
}
