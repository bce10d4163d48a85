// Classifier adapter error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Adapter error code constants
///
/// Error code range: 4001-4004
pub struct AdapterErrorCodes {}

impl AdapterErrorCodes {
    /// Model file could not be read
    pub const MODEL_LOAD: i32 = 4001;

    /// Model file parsed but its contents are unusable
    pub const INVALID_MODEL: i32 = 4002;

    /// Feature vector length does not match the model input
    pub const FEATURE_MISMATCH: i32 = 4003;

    /// External pose detector failed for a frame
    pub const POSE_SOURCE: i32 = 4004;
}

/// Log an adapter error with structured context
pub fn log_adapter_error(err: &AdapterError, context: &str) {
    error!(
        "Adapter error in {}: code={}, component=ClassifierAdapter, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised at the classifier adapter boundary
///
/// Model errors surface once, before the frame loop starts. Per-frame errors
/// (`PoseSource`) are converted into an absent observation by the pipeline
/// and never reach the counters.
///
/// Error code ranges: 4001-4004
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Model file could not be read
    ModelLoad { path: String, reason: String },

    /// Model file parsed but its contents are unusable
    InvalidModel { reason: String },

    /// Feature vector length does not match the model input
    FeatureMismatch { expected: usize, actual: usize },

    /// External pose detector failed for a frame
    PoseSource { reason: String },
}

impl ErrorCode for AdapterError {
    fn code(&self) -> i32 {
        match self {
            AdapterError::ModelLoad { .. } => AdapterErrorCodes::MODEL_LOAD,
            AdapterError::InvalidModel { .. } => AdapterErrorCodes::INVALID_MODEL,
            AdapterError::FeatureMismatch { .. } => AdapterErrorCodes::FEATURE_MISMATCH,
            AdapterError::PoseSource { .. } => AdapterErrorCodes::POSE_SOURCE,
        }
    }

    fn message(&self) -> String {
        match self {
            AdapterError::ModelLoad { path, reason } => {
                format!("Failed to load model {}: {}", path, reason)
            }
            AdapterError::InvalidModel { reason } => format!("Invalid model: {}", reason),
            AdapterError::FeatureMismatch { expected, actual } => {
                format!(
                    "Feature length mismatch: model expects {}, got {}",
                    expected, actual
                )
            }
            AdapterError::PoseSource { reason } => format!("Pose detection failed: {}", reason),
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AdapterError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AdapterError {}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::InvalidModel {
            reason: err.to_string(),
        }
    }
}
