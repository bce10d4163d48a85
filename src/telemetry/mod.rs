//! Diagnostics telemetry collector and helpers.
//!
//! The collector multiplexes repetition, stage, skipped-frame and tick
//! latency events into a bounded history plus a broadcast stream. Telemetry
//! only mirrors what the session reports; it never holds counter state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::counting::{SkipReason, Stage, Transition};
use crate::error::ErrorCode;
use crate::session::FrameReport;

pub mod events;
pub mod report;

pub use events::MetricEvent;
pub use report::{drain_metrics, TelemetryAggregator, TelemetryReport};

/// Global telemetry hub shared across the crate.
static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut history) = self.history.lock() {
            if self.history_capacity > 0 {
                if history.len() == self.history_capacity {
                    history.pop_front();
                    self.dropped_history.fetch_add(1, Ordering::Relaxed);
                }
                history.push_back(event.clone());
            }
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let recent = self
            .history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default();
        TelemetrySnapshot {
            recent,
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Latency tracker maintains a rolling window to compute avg/max latency.
struct LatencyTracker {
    samples: VecDeque<f32>,
    max_samples: usize,
    observed: u64,
}

impl LatencyTracker {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            observed: 0,
        }
    }

    fn observe(&mut self, value: f32) -> (f32, f32, usize) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value.abs());
        self.observed += 1;

        let count = self.samples.len();
        let sum: f32 = self.samples.iter().copied().sum();
        let max = self
            .samples
            .iter()
            .copied()
            .fold(0.0_f32, |acc, next| acc.max(next));
        let avg = if count == 0 { 0.0 } else { sum / count as f32 };
        (avg, max, count)
    }

    /// A latency summary is published once per full window
    fn window_complete(&self) -> bool {
        self.observed % self.max_samples as u64 == 0
    }
}

/// Collapses consecutive skipped frames into runs
///
/// Owned by whoever drives a session, so independent sessions never share
/// run state.
#[derive(Debug, Default)]
pub struct SkipDebounce {
    last: Option<SkipReason>,
}

impl SkipDebounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the skip reason when this frame starts a new skip run
    pub fn observe(&mut self, skipped: Option<SkipReason>) -> Option<SkipReason> {
        let started = skipped.filter(|reason| self.last != Some(*reason));
        self.last = skipped;
        started
    }
}

/// Top-level hub wrapping collector state plus derived gauges.
///
/// Publishing is stateless per session; the only derived gauge is the
/// process-wide tick latency window.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    latency: Mutex<LatencyTracker>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, latency_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            latency: Mutex::new(LatencyTracker::new(latency_window)),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    /// Publish the start of a skip run (see [`SkipDebounce`])
    pub fn record_skip_run(&self, reason: SkipReason, frame_index: u64) {
        self.collector.publish(MetricEvent::FrameSkipped {
            reason,
            frame_index,
        });
    }

    /// Publish repetition and stage events for one frame
    pub fn record_report(&self, report: &FrameReport) {
        for update in &report.updates {
            match update.transition {
                Transition::Rose => {
                    self.collector.publish(MetricEvent::StageChanged {
                        exercise: update.exercise,
                        from: Stage::Down,
                        to: Stage::Up,
                        frame_index: report.frame_index,
                    });
                    self.collector.publish(MetricEvent::Repetition {
                        exercise: update.exercise,
                        count: update.count,
                        frame_index: report.frame_index,
                    });
                }
                Transition::Fell => {
                    self.collector.publish(MetricEvent::StageChanged {
                        exercise: update.exercise,
                        from: Stage::Up,
                        to: Stage::Down,
                        frame_index: report.frame_index,
                    });
                }
                Transition::None => {}
            }
        }
    }

    pub fn record_tick_latency(&self, elapsed: Duration) {
        let summary = match self.latency.lock() {
            Ok(mut tracker) => {
                let (avg, max, count) = tracker.observe(elapsed.as_secs_f32() * 1000.0);
                tracker.window_complete().then_some((avg, max, count))
            }
            Err(_) => None,
        };

        if let Some((avg_ms, max_ms, sample_count)) = summary {
            self.collector.publish(MetricEvent::TickLatency {
                avg_ms,
                max_ms,
                sample_count,
            });
        }
    }

    pub fn record_error<E: ErrorCode>(&self, err: &E, context: impl Into<String>) {
        self.collector.publish(MetricEvent::Error {
            code: err.code(),
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, 30)
    }
}
