//! Pose keypoints and the flattened classifier input vector.

use serde::{Deserialize, Serialize};

/// Keypoints produced by a single-pose MoveNet detector
pub const MOVENET_KEYPOINT_COUNT: usize = 17;

/// One detected body keypoint in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Per-keypoint confidence, when the detector provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, score: None }
    }
}

/// Pose detector output for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    /// Overall pose confidence in `[0, 1]`
    pub score: f32,
    pub keypoints: Vec<Keypoint>,
}

impl PoseEstimate {
    pub fn new(score: f32, keypoints: Vec<Keypoint>) -> Self {
        Self { score, keypoints }
    }

    /// Classifier input for this pose
    pub fn feature_vector(&self) -> Vec<f32> {
        flatten_keypoints(&self.keypoints)
    }
}

/// Flatten keypoints into `[x0, y0, x1, y1, ...]`
///
/// Keypoint confidences are not part of the vector; the classifiers were
/// trained on coordinates only.
pub fn flatten_keypoints(keypoints: &[Keypoint]) -> Vec<f32> {
    let mut features = Vec::with_capacity(keypoints.len() * 2);
    for keypoint in keypoints {
        features.push(keypoint.x);
        features.push(keypoint.y);
    }
    features
}
