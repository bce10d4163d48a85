// Rep Counter Core - pose-based repetition counting
// Per-exercise up/down hysteresis counters driven by a frame loop

// Module declarations
pub mod adapter;
pub mod config;
pub mod counting;
pub mod driver;
pub mod error;
pub mod fixtures;
pub mod observation;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use config::AppConfig;
pub use counting::{CounterConfig, RepetitionCounter, ResetPolicy, Stage, Transition};
pub use driver::{FrameDriver, ObservationSource, RenderSink};
pub use observation::{Exercise, FrameObservation};
pub use session::{FrameReport, Session};

use tracing_subscriber::EnvFilter;

/// Install the stderr tracing subscriber
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this more than
/// once is harmless; later calls keep the first subscriber.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
