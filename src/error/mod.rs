// Error types for the repetition counter
//
// Structured error types with numeric codes for the session and the
// classifier adapter boundary. Counting itself never fails.

mod adapter;
mod session;

pub use adapter::{log_adapter_error, AdapterError, AdapterErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting across the
/// CLI and telemetry surfaces.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
