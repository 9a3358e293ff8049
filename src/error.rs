//! Error types.
//!
//! Only configuration problems and an empty input are errors. Everything a
//! run can get wrong about the timetable itself is reported as a
//! [`Conflict`](crate::models::Conflict).

use thiserror::Error;

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid must have at least one slot per day")]
    NoSlots,

    #[error("{field} slot {slot} lies outside the {slots}-slot day")]
    SlotOutOfRange {
        field: &'static str,
        slot: usize,
        slots: usize,
    },

    #[error("mandatory window overlaps the Saturday open slots at slot {0}")]
    WindowOverlap(usize),

    #[error("quality weights must be non-negative and not all zero")]
    InvalidWeights,

    #[error("lab block length must be at least 1")]
    ZeroLabBlock,

    #[error("population size must be at least 2")]
    PopulationTooSmall,

    #[error("elite fraction {0} must lie in [0, 1]")]
    InvalidEliteFraction(f64),

    #[error("cooling rate {0} must lie in (0, 1)")]
    InvalidCoolingRate(f64),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Engine-level errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// No subjects or no faculty. The engine turns this into a degenerate
    /// result; it never escapes [`TimetableEngine::generate`](crate::TimetableEngine::generate).
    #[error("nothing to schedule: {0}")]
    EmptyInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = ConfigError::SlotOutOfRange {
            field: "mandatory_window",
            slot: 9,
            slots: 8,
        };
        assert_eq!(e.to_string(), "mandatory_window slot 9 lies outside the 8-slot day");

        let wrapped: EngineError = ConfigError::NoSlots.into();
        assert_eq!(
            wrapped.to_string(),
            "invalid configuration: grid must have at least one slot per day"
        );
    }

    #[test]
    fn test_parse_error_conversion() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let cfg: ConfigError = err.into();
        assert!(matches!(cfg, ConfigError::Parse(_)));
    }
}
