//! Aggregates broadcast telemetry into a summary for CLI output.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

use crate::counting::SkipReason;
use crate::observation::Exercise;
use crate::telemetry::{MetricEvent, TelemetrySnapshot};

#[derive(Default)]
pub struct TelemetryAggregator {
    total_events: usize,
    lagged_events: usize,
    repetitions: BTreeMap<Exercise, u32>,
    stage_changes: usize,
    no_pose_runs: usize,
    low_confidence_runs: usize,
    last_latency: Option<LatencySummary>,
    errors: Vec<String>,
}

impl TelemetryAggregator {
    pub fn record(&mut self, event: MetricEvent) {
        self.total_events += 1;
        match event {
            MetricEvent::Repetition {
                exercise, count, ..
            } => {
                self.repetitions.insert(exercise, count);
            }
            MetricEvent::StageChanged { .. } => self.stage_changes += 1,
            MetricEvent::FrameSkipped { reason, .. } => match reason {
                SkipReason::NoPose => self.no_pose_runs += 1,
                SkipReason::LowConfidence => self.low_confidence_runs += 1,
            },
            MetricEvent::TickLatency {
                avg_ms,
                max_ms,
                sample_count,
            } => {
                self.last_latency = Some(LatencySummary {
                    avg_ms,
                    max_ms,
                    sample_count,
                });
            }
            MetricEvent::Error { code, context } => self.errors.push(format!("{code}: {context}")),
        }
    }

    pub fn lagged(&mut self, skipped: usize) {
        self.lagged_events += skipped;
    }

    pub fn into_report(self, snapshot: &TelemetrySnapshot) -> TelemetryReport {
        TelemetryReport {
            observed_events: self.total_events,
            collector_total: snapshot.total_events,
            collector_dropped: snapshot.dropped_events,
            lagged_events: self.lagged_events,
            repetitions: self.repetitions,
            stage_changes: self.stage_changes,
            no_pose_runs: self.no_pose_runs,
            low_confidence_runs: self.low_confidence_runs,
            latency: self.last_latency,
            error_messages: self.errors,
        }
    }
}

pub fn drain_metrics(rx: &mut Receiver<MetricEvent>, aggregator: &mut TelemetryAggregator) {
    loop {
        match rx.try_recv() {
            Ok(event) => aggregator.record(event),
            Err(TryRecvError::Lagged(skipped)) => aggregator.lagged(skipped as usize),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TelemetryReport {
    pub observed_events: usize,
    pub collector_total: u64,
    pub collector_dropped: u64,
    pub lagged_events: usize,
    /// Latest repetition count seen per exercise
    pub repetitions: BTreeMap<Exercise, u32>,
    pub stage_changes: usize,
    pub no_pose_runs: usize,
    pub low_confidence_runs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error_messages: Vec<String>,
}

impl TelemetryReport {
    pub fn print_json(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing telemetry report")?;
        println!("{json}");
        Ok(())
    }

    pub fn print_table(&self) {
        println!("Telemetry events observed : {}", self.observed_events);
        println!(
            "Collector totals          : {} (dropped {}, lagged {})",
            self.collector_total, self.collector_dropped, self.lagged_events
        );

        if self.repetitions.is_empty() {
            println!("Repetitions               : none");
        } else {
            println!("Repetitions               :");
            for (exercise, count) in &self.repetitions {
                println!("  - {exercise}: {count}");
            }
        }
        println!("Stage changes             : {}", self.stage_changes);
        println!(
            "Skip runs                 : {} no pose, {} low confidence",
            self.no_pose_runs, self.low_confidence_runs
        );

        if let Some(latency) = &self.latency {
            println!(
                "Tick latency avg/max (ms) : {:.3} / {:.3} over {} samples",
                latency.avg_ms, latency.max_ms, latency.sample_count
            );
        } else {
            println!("Tick latency avg/max (ms) : n/a");
        }

        if !self.error_messages.is_empty() {
            println!("Errors                    :");
            for msg in &self.error_messages {
                println!("  - {msg}");
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LatencySummary {
    pub avg_ms: f32,
    pub max_ms: f32,
    pub sample_count: usize,
}
