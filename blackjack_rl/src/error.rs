use thiserror::Error;

use crate::{Action, EpisodePhase};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{name} must be a finite value in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("action set must hold Stand and Hit exactly once, got {0:?}")]
    InvalidActionSet(Vec<Action>),
    #[error("{method} is only allowed in {expected:?} phase, current phase is {actual:?}")]
    WrongPhase {
        method: &'static str,
        expected: EpisodePhase,
        actual: EpisodePhase,
    },
}
