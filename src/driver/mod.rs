//! Frame driver
//!
//! Pulls observations from an [`ObservationSource`], feeds them to the
//! counting [`Session`](crate::session::Session) and publishes the result to
//! a [`RenderSink`].

mod core;
pub mod sinks;
pub mod source;

pub use self::core::{DriverHandle, DriverSummary, FrameDriver, TickOutcome};
pub use sinks::{BroadcastSink, CollectingSink, JsonLinesSink, RenderSink};
pub use source::{ObservationSource, ReplaySource};
