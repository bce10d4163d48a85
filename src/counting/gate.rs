//! Pose confidence gate
//!
//! Frames without a detected pose, or whose pose confidence is not strictly
//! above the gate threshold, are ignored by every counter.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default minimum pose confidence (exclusive)
pub const DEFAULT_MIN_POSE_CONFIDENCE: f32 = 0.5;

/// Why a frame was excluded from counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The pose detector reported no pose for this frame
    NoPose,
    /// A pose was detected but its confidence did not clear the gate
    LowConfidence,
}

/// Confidence gate shared by all counters of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseGate {
    min_confidence: f32,
}

impl PoseGate {
    pub fn new(min_confidence: f32) -> Self {
        Self { min_confidence }
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Check a frame's pose confidence
    ///
    /// Passes only when `confidence > min_confidence`. A NaN confidence never
    /// passes.
    pub fn check(&self, pose_confidence: Option<f32>) -> Result<(), SkipReason> {
        match pose_confidence {
            None => Err(SkipReason::NoPose),
            Some(confidence) if confidence > self.min_confidence => Ok(()),
            Some(_) => Err(SkipReason::LowConfidence),
        }
    }

    pub fn admits(&self, pose_confidence: Option<f32>) -> bool {
        self.check(pose_confidence).is_ok()
    }

    /// Require a finite threshold in `[0, 1)`
    pub fn validate(&self) -> Result<(), SessionError> {
        let threshold = self.min_confidence;
        if threshold.is_finite() && (0.0..1.0).contains(&threshold) {
            Ok(())
        } else {
            Err(SessionError::InvalidGate { threshold })
        }
    }
}

impl Default for PoseGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POSE_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_pose_is_rejected() {
        let gate = PoseGate::default();
        assert_eq!(gate.check(None), Err(SkipReason::NoPose));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let gate = PoseGate::default();
        assert_eq!(gate.check(Some(0.5)), Err(SkipReason::LowConfidence));
        assert_eq!(gate.check(Some(0.2)), Err(SkipReason::LowConfidence));
        assert!(gate.admits(Some(0.51)));
        assert!(gate.admits(Some(1.0)));
    }

    #[test]
    fn test_nan_confidence_is_rejected() {
        let gate = PoseGate::default();
        assert_eq!(gate.check(Some(f32::NAN)), Err(SkipReason::LowConfidence));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        assert!(PoseGate::default().validate().is_ok());
        assert!(PoseGate::new(0.0).validate().is_ok());
        for threshold in [1.0, -0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                PoseGate::new(threshold).validate(),
                Err(SessionError::InvalidGate { .. })
            ));
        }
    }

    #[test]
    fn test_custom_threshold() {
        let gate = PoseGate::new(0.8);
        assert!(!gate.admits(Some(0.7)));
        assert!(gate.admits(Some(0.85)));
    }
}
