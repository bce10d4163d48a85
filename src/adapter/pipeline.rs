// Pose pipeline - external pose detector feeding the classifier adapter

use crate::adapter::{ClassifierAdapter, PoseEstimate};
use crate::driver::ObservationSource;
use crate::error::AdapterError;
use crate::observation::FrameObservation;
use crate::telemetry;

/// External single-pose detector, one call per captured frame
///
/// * `None` - the capture stream ended
/// * `Some(Ok(None))` - no person in the frame
/// * `Some(Err(_))` - detection failed for this frame only
pub trait PoseSource {
    fn next_pose(&mut self) -> Option<Result<Option<PoseEstimate>, AdapterError>>;
}

/// Observation source backed by a pose detector and per-exercise classifiers
pub struct PipelineSource<P: PoseSource> {
    poses: P,
    adapter: ClassifierAdapter,
    failed_frames: u64,
}

impl<P: PoseSource> PipelineSource<P> {
    pub fn new(poses: P, adapter: ClassifierAdapter) -> Self {
        Self {
            poses,
            adapter,
            failed_frames: 0,
        }
    }

    /// Frames where the detector reported an error
    pub fn failed_frames(&self) -> u64 {
        self.failed_frames
    }

    pub fn adapter(&self) -> &ClassifierAdapter {
        &self.adapter
    }
}

impl<P: PoseSource> ObservationSource for PipelineSource<P> {
    fn next_frame(&mut self) -> Option<FrameObservation> {
        let pose = match self.poses.next_pose()? {
            Ok(pose) => pose,
            Err(err) => {
                // Counted as a frame without a pose
                self.failed_frames += 1;
                tracing::warn!("[PipelineSource] Pose detection failed: {}", err);
                telemetry::hub().record_error(&err, "PipelineSource::next_frame");
                None
            }
        };
        Some(self.adapter.observe_pose(pose.as_ref()))
    }
}
