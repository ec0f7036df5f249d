pub mod algos;
pub mod common;
pub mod config;
pub mod envs;
pub mod error;
pub mod mdps;

pub use algos::model_based::replay::{LearnOutcome, ReplayAgent};
pub use common::defs::*;
pub use config::{ActionPolicy, GainMode, NeedMode, Params};
pub use error::{ConfigError, Result};
pub use mdps::mdp_simulator::{MdpSimulator, StepInfo};
