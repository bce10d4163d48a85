//! Core telemetry event types describing diagnostics data exposed to
//! CLI surfaces and broadcast subscribers.

use serde::{Deserialize, Serialize};

use crate::counting::{SkipReason, Stage};
use crate::observation::Exercise;

/// Metric events covering repetitions, stage changes, skipped frames and
/// tick latency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Repetition {
        exercise: Exercise,
        count: u32,
        frame_index: u64,
    },
    StageChanged {
        exercise: Exercise,
        from: Stage,
        to: Stage,
        frame_index: u64,
    },
    FrameSkipped {
        reason: SkipReason,
        frame_index: u64,
    },
    TickLatency {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
    Error {
        code: i32,
        context: String,
    },
}
