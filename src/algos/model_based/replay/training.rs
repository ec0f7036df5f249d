use super::ReplayAgent;
use crate::common::defs::*;
use crate::mdps::mdp_simulator::MdpSimulator;
use ndarray::Array2;
use serde::Serialize;
use tracing::info;

/// What a learning run leaves behind for evaluation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LearnOutcome {
    pub steps_per_episode: Vec<usize>,
    pub rewards_per_episode: Vec<Continous>,
    /// Backups replayed after each real step, per episode.
    pub backups_per_step: Vec<Vec<usize>>,
    /// Q-table at the end of every episode.
    pub q_snapshots: Vec<Array2<Continous>>,
}

impl ReplayAgent {
    /// Run `episodes` episodes in `env`. The agent's random source is reseeded
    /// with `seed` so that runs are reproducible.
    pub fn learn<M: MdpSimulator + ?Sized>(&mut self, env: &mut M, seed: u64) -> LearnOutcome {
        assert_eq!(env.n_s(), self.model.n_s(), "Agent and environment disagree on states.");
        assert_eq!(env.n_a(), self.model.n_a(), "Agent and environment disagree on actions.");
        assert!(
            env.terminal_states().len() < env.n_s(),
            "'{}' has no non-terminal state to start from.",
            env.name()
        );

        self.reseed(seed);
        env.set_timeout(self.params.max_episode_steps);

        if self.params.pre_explore {
            self.model.pre_explore(env);
        }
        if self.params.transi_goal_to_start {
            let start = (!self.params.start_random).then(|| env.start_state());
            let terminals = env.terminal_states().to_vec();
            self.model.route_terminals_to_start(&terminals, start);
        }

        let mut outcome = LearnOutcome::default();
        let mut tot_reward = 0.;
        let mut s = self.start(env);
        for ep in 0..self.params.episodes {
            let mut steps = 0;
            let mut ep_reward = 0.;
            let mut starting = true;
            let mut backups = vec![];

            while !env.done() {
                let a = self.act(s);
                let si = env.step(a);
                let t = Transition::new(s, a, si.reward, si.observation);
                ep_reward += t.r;
                self.observe(t);

                let plan = !self.params.plan_only_start_end
                    || (starting && tot_reward > 0.)
                    || si.done()
                    || env.is_terminal(t.s_next);
                backups.push(if plan { self.do_planning(s).len() } else { 0 });

                s = t.s_next;
                starting = false;
                steps += 1;
            }

            let s_next = self.start(env);
            if self.params.transi_goal_to_start && env.is_terminal(s) {
                self.model.observe_boundary(s, s_next);
            }
            self.values.reset_traces();
            tot_reward += ep_reward;

            info!(episode = ep + 1, steps, reward = ep_reward, "episode finished");
            outcome.steps_per_episode.push(steps);
            outcome.rewards_per_episode.push(ep_reward);
            outcome.backups_per_step.push(backups);
            outcome.q_snapshots.push(self.values.snapshot());

            s = s_next;
        }

        outcome
    }

    /// Reset `env` for a new episode and return the start state, never a
    /// terminal one.
    fn start<M: MdpSimulator + ?Sized>(&mut self, env: &mut M) -> Discrete {
        if !self.params.start_random {
            return env.reset(false, &mut self.rng);
        }
        loop {
            let s = env.reset(true, &mut self.rng);
            if !env.is_terminal(s) {
                return s;
            }
        }
    }
}
