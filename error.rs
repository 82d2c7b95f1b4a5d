//! The single fallible boundary of the core (spec §7): config validation at
//! `EpisodeConfig::build` / `Episode::new`. Everything that happens once an
//! episode is running is a flag on `StepResult`, never an `Err`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("time_max must be positive, got {0}")]
    TimeMaxNotPositive(f64),
    #[error("invalid_action_penalty must be positive, got {0}")]
    InvalidActionPenaltyNotPositive(f64),
    #[error("unknown config option: {0}")]
    UnknownOption(String),
}
