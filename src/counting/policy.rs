// Counter policy - hysteresis thresholds and low-score reset behavior
//
// Both exercises share the same rule shape:
//   1. score < low_threshold  → reset to Down (subject to ResetPolicy)
//   2. score > high_threshold while Down → Up, count += 1
//
// They differ only in when the reset fires. Pushups reset unconditionally,
// situps reset only when currently Up.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default low threshold (exclusive) below which a counter resets
pub const DEFAULT_LOW_THRESHOLD: f32 = 0.1;

/// Default high threshold (exclusive) above which a repetition is counted
pub const DEFAULT_HIGH_THRESHOLD: f32 = 0.9;

/// When a low score is allowed to force the stage back to `Down`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Any low score forces `Down`
    Always,
    /// A low score forces `Down` only if the counter is currently `Up`
    #[serde(alias = "onlyWhenUp")]
    OnlyWhenUp,
}

/// Construction parameters for a single repetition counter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Scores strictly below this reset the stage
    #[serde(default = "default_low_threshold", alias = "lowThreshold")]
    pub low_threshold: f32,
    /// Scores strictly above this count a repetition when `Down`
    #[serde(default = "default_high_threshold", alias = "highThreshold")]
    pub high_threshold: f32,
    #[serde(alias = "resetPolicy")]
    pub reset_policy: ResetPolicy,
}

fn default_low_threshold() -> f32 {
    DEFAULT_LOW_THRESHOLD
}

fn default_high_threshold() -> f32 {
    DEFAULT_HIGH_THRESHOLD
}

impl CounterConfig {
    pub fn new(low_threshold: f32, high_threshold: f32, reset_policy: ResetPolicy) -> Self {
        Self {
            low_threshold,
            high_threshold,
            reset_policy,
        }
    }

    /// Pushup policy: 0.1 / 0.9, unconditional reset
    pub fn pushup() -> Self {
        Self::new(
            DEFAULT_LOW_THRESHOLD,
            DEFAULT_HIGH_THRESHOLD,
            ResetPolicy::Always,
        )
    }

    /// Situp policy: 0.1 / 0.9, reset only from `Up`
    pub fn situp() -> Self {
        Self::new(
            DEFAULT_LOW_THRESHOLD,
            DEFAULT_HIGH_THRESHOLD,
            ResetPolicy::OnlyWhenUp,
        )
    }

    /// Require finite thresholds with `0 <= low < high <= 1`
    pub fn validate(&self) -> Result<(), SessionError> {
        let low = self.low_threshold;
        let high = self.high_threshold;
        let in_range = low.is_finite() && high.is_finite() && low >= 0.0 && high <= 1.0;
        if in_range && low < high {
            Ok(())
        } else {
            Err(SessionError::InvalidThresholds { low, high })
        }
    }
}
