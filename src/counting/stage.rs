// Stage and transition labels for the up/down repetition state machine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a tracked exercise within one repetition
///
/// Every counter starts in `Down` and flips to `Up` exactly when a repetition
/// is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Contracted / starting position (initial stage)
    #[default]
    Down,
    /// Repetition completed, waiting for the score to fall back
    Up,
}

impl Stage {
    /// Label as shown by the UI sink
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Down => "down",
            Stage::Up => "up",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stage change produced by a single observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Stage and count unchanged
    #[default]
    None,
    /// `down → up`; the count was incremented by one
    Rose,
    /// `up → down`; the count is unchanged
    Fell,
}

impl Transition {
    /// Whether this transition added a repetition
    pub fn counted(&self) -> bool {
        matches!(self, Transition::Rose)
    }
}
