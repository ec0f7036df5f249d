use serde::{Deserialize, Serialize};

pub type Discrete = usize;
pub type Continous = f64;

/// One observed or hypothesised step `(s, a, r, s')`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub s: Discrete,
    pub a: Discrete,
    pub r: Continous,
    pub s_next: Discrete,
}

impl Transition {
    pub fn new(s: Discrete, a: Discrete, r: Continous, s_next: Discrete) -> Self {
        Self { s, a, r, s_next }
    }

    pub fn is_self_transition(&self) -> bool {
        self.s == self.s_next
    }
}

/// Entry of the experience log.
///
/// Episode boundaries are logged without an action or a reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEvent {
    pub s: Discrete,
    pub a: Option<Discrete>,
    pub r: Option<Continous>,
    pub s_next: Discrete,
}

impl From<Transition> for ExperienceEvent {
    fn from(t: Transition) -> Self {
        Self {
            s: t.s,
            a: Some(t.a),
            r: Some(t.r),
            s_next: t.s_next,
        }
    }
}
