// Render sinks - read-only consumers of per-frame counter state
//
// A sink must never stall the frame loop. Broadcast sends ignore missing or
// lagging receivers, and write failures are logged and counted rather than
// propagated.

use std::io::Write;

use tokio::sync::broadcast;

use crate::session::FrameReport;

/// Receiver of the updated `(stage, count)` pairs after every frame
pub trait RenderSink {
    fn render(&mut self, report: &FrameReport);
}

impl<K: RenderSink + ?Sized> RenderSink for Box<K> {
    fn render(&mut self, report: &FrameReport) {
        (**self).render(report)
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Vec<FrameReport>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[FrameReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<FrameReport> {
        self.reports
    }
}

impl RenderSink for CollectingSink {
    fn render(&mut self, report: &FrameReport) {
        self.reports.push(report.clone());
    }
}

/// Publishes reports on a tokio broadcast channel
///
/// Buffer size bounds how far a UI subscriber may fall behind before it
/// starts missing frames (`RecvError::Lagged`).
pub struct BroadcastSink {
    tx: broadcast::Sender<FrameReport>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<FrameReport>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FrameReport> {
        self.tx.subscribe()
    }
}

impl RenderSink for BroadcastSink {
    fn render(&mut self, report: &FrameReport) {
        let _ = self.tx.send(report.clone());
    }
}

/// Writes one JSON document per frame
pub struct JsonLinesSink<W: Write> {
    writer: W,
    write_errors: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            write_errors: 0,
        }
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, report: &FrameReport) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn render(&mut self, report: &FrameReport) {
        if let Err(err) = self.write_line(report) {
            if self.write_errors == 0 {
                tracing::warn!(
                    "[JsonLinesSink] Failed to write frame {}: {}",
                    report.frame_index,
                    err
                );
            }
            self.write_errors += 1;
        }
    }
}
