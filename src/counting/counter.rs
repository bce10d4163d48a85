// RepetitionCounter - up/down hysteresis state machine for one exercise
//
// Converts a stream of noisy per-frame classifier scores into a monotonic
// repetition count. The counter owns its stage; nothing else mutates it.
//
// State machine:
//   Down --(score > high)--> Up      count += 1
//   Up   --(score < low)---> Down    (ResetPolicy::Always also re-asserts Down)

use serde::{Deserialize, Serialize};

use super::gate::PoseGate;
use super::policy::{CounterConfig, ResetPolicy};
use super::stage::{Stage, Transition};
use crate::error::SessionError;

/// Stage and count after an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub stage: Stage,
    pub count: u32,
}

/// Clamp a classifier score into `[0, 1]`
///
/// Returns `None` for NaN, which carries no usable signal.
pub fn clamp_score(score: f32) -> Option<f32> {
    if score.is_nan() {
        None
    } else {
        Some(score.clamp(0.0, 1.0))
    }
}

/// Repetition counter for a single tracked exercise
#[derive(Debug, Clone)]
pub struct RepetitionCounter {
    config: CounterConfig,
    gate: PoseGate,
    stage: Stage,
    count: u32,
}

impl RepetitionCounter {
    /// Create a counter in the `Down` stage with a zero count
    ///
    /// Fails with `InvalidThresholds` unless `0 <= low < high <= 1`.
    pub fn new(config: CounterConfig) -> Result<Self, SessionError> {
        Self::with_gate(config, PoseGate::default())
    }

    pub fn with_gate(config: CounterConfig, gate: PoseGate) -> Result<Self, SessionError> {
        config.validate()?;
        gate.validate()?;
        Ok(Self::from_validated(config, gate))
    }

    /// Build from parameters the caller has already validated
    pub(crate) fn from_validated(config: CounterConfig, gate: PoseGate) -> Self {
        Self {
            config,
            gate,
            stage: Stage::Down,
            count: 0,
        }
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            stage: self.stage,
            count: self.count,
        }
    }

    /// Feed one frame's score, gated on pose confidence
    ///
    /// A missing pose or a confidence at or below the gate leaves the
    /// counter untouched.
    pub fn observe(&mut self, score: f32, pose_confidence: Option<f32>) -> CounterSnapshot {
        if self.gate.admits(pose_confidence) {
            self.advance(score);
        }
        self.snapshot()
    }

    /// Apply the transition rules to a score without consulting the gate
    ///
    /// Callers that gate a whole frame once (the session) use this directly.
    pub fn advance(&mut self, score: f32) -> Transition {
        let Some(score) = clamp_score(score) else {
            return Transition::None;
        };

        let mut transition = Transition::None;

        if score < self.config.low_threshold {
            let was_up = self.stage == Stage::Up;
            let resets = match self.config.reset_policy {
                ResetPolicy::Always => true,
                ResetPolicy::OnlyWhenUp => was_up,
            };
            if resets {
                self.stage = Stage::Down;
                if was_up {
                    transition = Transition::Fell;
                }
            }
        }

        if score > self.config.high_threshold && self.stage == Stage::Down {
            self.stage = Stage::Up;
            self.count = self.count.saturating_add(1);
            transition = Transition::Rose;
        }

        transition
    }
}
