use super::candidates::{expand, one_step_candidates, Trajectory};
use super::experience::ExperienceModel;
use super::priority::{need, score, select, threshold};
use super::values::ValueStore;
use crate::common::defs::*;
use crate::config::Params;
use rand::prelude::*;
use tracing::{debug, trace};

/// An executed backup: the last step of the replayed trajectory, its length
/// and the priority it was chosen with.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupRecord {
    pub last: Transition,
    pub len: usize,
    pub gain: Continous,
    pub need: Continous,
    pub evm: Continous,
}

/// Backups executed during one planning call, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupLog {
    records: Vec<BackupRecord>,
}

impl BackupLog {
    pub fn records(&self) -> &[BackupRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trajectory being grown: the steps recorded since the last one-step
    /// backup.
    pub fn current_sequence(&self) -> Option<Trajectory> {
        let start = self.records.iter().rposition(|b| b.len == 1)?;
        Some(Trajectory::from_steps(
            self.records[start..].iter().map(|b| b.last).collect(),
        ))
    }

    fn push(&mut self, record: BackupRecord) {
        self.records.push(record);
    }
}

/// Replay up to `planning_steps` trajectories while the agent sits in `s`.
pub fn do_planning(
    s: Discrete,
    model: &ExperienceModel,
    values: &mut ValueStore,
    params: &Params,
    rng: &mut StdRng,
) -> BackupLog {
    let mut log = BackupLog::default();
    if params.planning_steps == 0 {
        return log;
    }

    // The model does not change while planning.
    let need = need(model, s, params);
    let threshold = threshold(model, params);

    for _ in 0..params.planning_steps {
        let mut candidates =
            one_step_candidates(model, params.remove_same_state, params.plan_unvisited);
        if params.expand_further {
            if let Some(current) = log.current_sequence() {
                expand(&mut candidates, &current, model, values, params.allow_loops, rng);
            }
        }

        let scores = score(&candidates, values, &need, params);
        let Some(best) = select(&candidates, &scores, threshold, rng) else {
            trace!(s, threshold, backups = log.len(), "planning stopped");
            break;
        };

        let traj = &candidates[best];
        execute_backup(traj, values, params);

        let sc = &scores[best];
        let record = BackupRecord {
            last: *traj.last(),
            len: traj.len(),
            gain: sc.gain.iter().sum(),
            need: sc.need,
            evm: sc.evm,
        };
        debug!(
            s = record.last.s,
            a = record.last.a,
            len = record.len,
            evm = record.evm,
            "backup"
        );
        log.push(record);
    }

    log
}

/// n-step backup of every step of `traj` towards its return to the end.
pub fn execute_backup(traj: &Trajectory, values: &mut ValueStore, params: &Params) {
    for (n, t) in traj.steps().iter().enumerate() {
        let target = traj.n_step_target(n, params.gamma, values);
        values.backup(t.s, t.a, target, params.alpha);
    }
}
