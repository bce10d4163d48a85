// Session error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Session error code constants
///
/// Single source of truth for the numeric codes reported by the CLI and
/// telemetry surfaces.
///
/// Error code range: 3001-3004
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Counter thresholds are not `0 <= low < high <= 1`
    pub const INVALID_THRESHOLDS: i32 = 3001;

    /// Pose confidence gate outside `[0, 1)`
    pub const INVALID_GATE: i32 = 3002;

    /// The same exercise was registered twice
    pub const DUPLICATE_EXERCISE: i32 = 3003;

    /// A session needs at least one tracked exercise
    pub const NO_EXERCISES: i32 = 3004;
}

/// Log a session error with structured context
///
/// Logs the numeric code, the component and the human-readable message.
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=Session, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Session construction errors
///
/// `observe` itself never fails; these errors only arise while building a
/// session from configuration.
///
/// Error code ranges: 3001-3004
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Counter thresholds are not `0 <= low < high <= 1`
    InvalidThresholds { low: f32, high: f32 },

    /// Pose confidence gate outside `[0, 1)`
    InvalidGate { threshold: f32 },

    /// The same exercise was registered twice
    DuplicateExercise { exercise: String },

    /// A session needs at least one tracked exercise
    NoExercises,
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::InvalidThresholds { .. } => SessionErrorCodes::INVALID_THRESHOLDS,
            SessionError::InvalidGate { .. } => SessionErrorCodes::INVALID_GATE,
            SessionError::DuplicateExercise { .. } => SessionErrorCodes::DUPLICATE_EXERCISE,
            SessionError::NoExercises => SessionErrorCodes::NO_EXERCISES,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::InvalidThresholds { low, high } => {
                format!(
                    "Invalid thresholds: need 0 <= low < high <= 1 (got low={}, high={})",
                    low, high
                )
            }
            SessionError::InvalidGate { threshold } => {
                format!(
                    "Invalid pose confidence gate: need 0 <= threshold < 1 (got {})",
                    threshold
                )
            }
            SessionError::DuplicateExercise { exercise } => {
                format!("Exercise '{}' is already tracked", exercise)
            }
            SessionError::NoExercises => "Session has no tracked exercises".to_string(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_codes() {
        assert_eq!(
            SessionError::InvalidThresholds {
                low: 0.9,
                high: 0.1
            }
            .code(),
            SessionErrorCodes::INVALID_THRESHOLDS
        );
        assert_eq!(
            SessionError::InvalidGate { threshold: 1.5 }.code(),
            SessionErrorCodes::INVALID_GATE
        );
        assert_eq!(
            SessionError::DuplicateExercise {
                exercise: "pushup".to_string()
            }
            .code(),
            SessionErrorCodes::DUPLICATE_EXERCISE
        );
        assert_eq!(
            SessionError::NoExercises.code(),
            SessionErrorCodes::NO_EXERCISES
        );
    }

    #[test]
    fn test_session_error_messages() {
        let err = SessionError::InvalidThresholds {
            low: 0.9,
            high: 0.1,
        };
        assert!(err.message().contains("low=0.9"));

        let err = SessionError::DuplicateExercise {
            exercise: "situp".to_string(),
        };
        assert_eq!(err.message(), "Exercise 'situp' is already tracked");

        let err = SessionError::NoExercises;
        assert!(err.message().contains("no tracked exercises"));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::NoExercises;
        let display = format!("{}", err);
        assert!(display.contains("SessionError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
