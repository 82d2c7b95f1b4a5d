//! Episode configuration (spec §6 `create(config?)`).
//!
//! Two recognized options, `time_max` and `invalid_action_penalty`; an
//! omitted option takes its default, an unrecognized key is a
//! `CoreError::UnknownOption`, and an out-of-range value is rejected before
//! any episode state is allocated (spec §7: "the core is not left partially
//! initialized").

use crate::constants::{DEFAULT_INVALID_ACTION_PENALTY, DEFAULT_TIME_MAX};
use crate::error::CoreError;

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeConfig {
    /// Total time budget; `time_remaining` starts here and truncation
    /// fires when it reaches zero.
    pub time_max: f64,
    /// Additive reward penalty applied whenever an action decodes invalid.
    pub invalid_action_penalty: f64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            time_max: DEFAULT_TIME_MAX,
            invalid_action_penalty: DEFAULT_INVALID_ACTION_PENALTY,
        }
    }
}

impl EpisodeConfig {
    /// Build a config from a set of `(key, value)` overrides, validating
    /// each against its bound. Recognized keys: `"time_max"`,
    /// `"invalid_action_penalty"`.
    pub fn build(overrides: &[(&str, f64)]) -> Result<Self, CoreError> {
        let mut cfg = Self::default();
        for &(key, value) in overrides {
            match key {
                "time_max" => {
                    if !(value > 0.0) {
                        return Err(CoreError::TimeMaxNotPositive(value));
                    }
                    cfg.time_max = value;
                }
                "invalid_action_penalty" => {
                    if !(value > 0.0) {
                        return Err(CoreError::InvalidActionPenaltyNotPositive(value));
                    }
                    cfg.invalid_action_penalty = value;
                }
                other => return Err(CoreError::UnknownOption(other.to_string())),
            }
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EpisodeConfig::default();
        assert_eq!(cfg.time_max, DEFAULT_TIME_MAX);
        assert_eq!(cfg.invalid_action_penalty, DEFAULT_INVALID_ACTION_PENALTY);
    }

    #[test]
    fn omitted_options_get_defaults() {
        let cfg = EpisodeConfig::build(&[("time_max", 500.0)]).unwrap();
        assert_eq!(cfg.time_max, 500.0);
        assert_eq!(cfg.invalid_action_penalty, DEFAULT_INVALID_ACTION_PENALTY);
    }

    #[test]
    fn rejects_nonpositive_time_max() {
        assert!(EpisodeConfig::build(&[("time_max", 0.0)]).is_err());
        assert!(EpisodeConfig::build(&[("time_max", -5.0)]).is_err());
    }

    #[test]
    fn rejects_unknown_option() {
        let err = EpisodeConfig::build(&[("bogus", 1.0)]).unwrap_err();
        assert!(matches!(err, CoreError::UnknownOption(ref k) if k == "bogus"));
    }
}
