//! Repetition counting core.
//!
//! One [`RepetitionCounter`] per tracked exercise turns per-frame classifier
//! scores into a `(stage, count)` pair using an up/down hysteresis state
//! machine. Frames are gated on pose confidence by [`PoseGate`].

pub mod counter;
pub mod gate;
pub mod policy;
pub mod stage;

pub use counter::{clamp_score, CounterSnapshot, RepetitionCounter};
pub use gate::{PoseGate, SkipReason, DEFAULT_MIN_POSE_CONFIDENCE};
pub use policy::{CounterConfig, ResetPolicy, DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD};
pub use stage::{Stage, Transition};
