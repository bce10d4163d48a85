//! FrameDriver: the per-frame loop between an observation source and a
//! render sink.
//!
//! Each tick pulls one observation, feeds it to the [`Session`], and hands the
//! resulting [`FrameReport`] to the sink. Ticks are strictly sequential, so
//! counter state is only ever touched from the driving thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::config::DriverConfig;
use crate::driver::{ObservationSource, RenderSink};
use crate::session::{ExerciseTotals, FrameReport, Session};
use crate::telemetry::{self, SkipDebounce};

/// Result of a single driver tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Rendered(FrameReport),
    /// Source has no more frames
    Finished,
    /// Stop was requested before the frame was pulled
    Cancelled,
}

/// Totals after the loop ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    pub frames: u64,
    pub skipped_frames: u64,
    pub cancelled: bool,
    pub totals: Vec<ExerciseTotals>,
}

pub struct FrameDriver {
    session: Session,
    config: DriverConfig,
    running: Arc<AtomicBool>,
    skip_runs: SkipDebounce,
}

impl FrameDriver {
    pub fn new(session: Session, config: DriverConfig) -> Self {
        Self {
            session,
            config,
            running: Arc::new(AtomicBool::new(true)),
            skip_runs: SkipDebounce::new(),
        }
    }

    /// Flag cleared to stop the loop; checked before every tick
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Process exactly one frame
    pub fn tick<S, K>(&mut self, source: &mut S, sink: &mut K) -> TickOutcome
    where
        S: ObservationSource + ?Sized,
        K: RenderSink + ?Sized,
    {
        if !self.running.load(Ordering::SeqCst) {
            return TickOutcome::Cancelled;
        }

        let Some(observation) = source.next_frame() else {
            return TickOutcome::Finished;
        };

        let started = Instant::now();
        let report = self.session.observe(&observation);
        sink.render(&report);

        let hub = telemetry::hub();
        if let Some(reason) = self.skip_runs.observe(report.skipped) {
            hub.record_skip_run(reason, report.frame_index);
        }
        hub.record_report(&report);
        hub.record_tick_latency(started.elapsed());

        let interval = self.config.log_every_n_frames;
        if interval > 0 && (report.frame_index + 1) % interval == 0 {
            tracing::info!(
                "[FrameDriver] {} frames processed ({} skipped), totals: {}",
                self.session.frames_observed(),
                self.session.skipped_frames(),
                format_totals(&self.session.totals())
            );
        }

        TickOutcome::Rendered(report)
    }

    /// Drive the loop until the source ends or a stop is requested
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> DriverSummary
    where
        S: ObservationSource + ?Sized,
        K: RenderSink + ?Sized,
    {
        let pacing = Duration::from_millis(self.config.frame_interval_ms);
        tracing::info!(
            "[FrameDriver] Starting frame loop (interval {} ms)",
            self.config.frame_interval_ms
        );

        let cancelled = loop {
            let tick_start = Instant::now();
            match self.tick(source, sink) {
                TickOutcome::Rendered(_) => {}
                TickOutcome::Finished => break false,
                TickOutcome::Cancelled => break true,
            }

            if !pacing.is_zero() {
                if let Some(remaining) = pacing.checked_sub(tick_start.elapsed()) {
                    thread::sleep(remaining);
                }
            }
        };

        let summary = self.summary(cancelled);
        tracing::info!(
            "[FrameDriver] Frame loop exited after {} frames{}, totals: {}",
            summary.frames,
            if cancelled { " (cancelled)" } else { "" },
            format_totals(&summary.totals)
        );
        summary
    }

    /// Run the loop on a dedicated thread
    pub fn spawn<S, K>(mut self, mut source: S, mut sink: K) -> DriverHandle
    where
        S: ObservationSource + Send + 'static,
        K: RenderSink + Send + 'static,
    {
        let running = self.running_flag();
        let join = thread::spawn(move || self.run(&mut source, &mut sink));
        DriverHandle {
            running,
            join: Some(join),
        }
    }

    fn summary(&self, cancelled: bool) -> DriverSummary {
        DriverSummary {
            frames: self.session.frames_observed(),
            skipped_frames: self.session.skipped_frames(),
            cancelled,
            totals: self.session.totals(),
        }
    }
}

/// Handle to a driver running on its own thread
pub struct DriverHandle {
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<DriverSummary>>,
}

impl DriverHandle {
    /// Request the loop to stop after the current tick
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn join(mut self) -> anyhow::Result<DriverSummary> {
        let handle = self
            .join
            .take()
            .ok_or_else(|| anyhow!("frame driver already joined"))?;
        handle
            .join()
            .map_err(|_| anyhow!("frame driver thread panicked"))
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.join.take() {
            self.running.store(false, Ordering::SeqCst);
            let _ = handle.join();
        }
    }
}

fn format_totals(totals: &[ExerciseTotals]) -> String {
    totals
        .iter()
        .map(|t| format!("{}={} ({})", t.exercise, t.count, t.stage))
        .collect::<Vec<_>>()
        .join(", ")
}
