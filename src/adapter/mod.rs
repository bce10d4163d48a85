//! Frame classifier adapter.
//!
//! Turns the external pose detector's output into a [`FrameObservation`]:
//! flatten the keypoints, run one binary classifier per exercise, attach the
//! pose confidence. Models are loaded once when the adapter is built; failures
//! during a frame degrade to a missing score or an absent pose, never to an
//! error reaching the counters.

pub mod keypoints;
pub mod model;
pub mod pipeline;

pub use keypoints::{flatten_keypoints, Keypoint, PoseEstimate, MOVENET_KEYPOINT_COUNT};
pub use model::{LogisticModel, ScoreModel};
pub use pipeline::{PipelineSource, PoseSource};

use crate::config::ModelsConfig;
use crate::error::{log_adapter_error, AdapterError};
use crate::observation::{Exercise, FrameObservation};

/// Per-exercise classifiers over one pose estimate
pub struct ClassifierAdapter {
    models: Vec<(Exercise, Box<dyn ScoreModel>)>,
}

impl ClassifierAdapter {
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Register (or replace) the classifier for an exercise
    pub fn with_model<M>(mut self, exercise: Exercise, model: M) -> Self
    where
        M: ScoreModel + 'static,
    {
        self.models.retain(|(tracked, _)| *tracked != exercise);
        self.models.push((exercise, Box::new(model)));
        self.models.sort_by_key(|(tracked, _)| *tracked);
        self
    }

    /// Load every configured model file up front
    pub fn from_config(config: &ModelsConfig) -> Result<Self, AdapterError> {
        let mut adapter = Self::new();
        for exercise in Exercise::all() {
            if let Some(path) = config.path_for(*exercise) {
                let model = LogisticModel::load(path).inspect_err(|err| {
                    log_adapter_error(err, "ClassifierAdapter::from_config");
                })?;
                adapter = adapter.with_model(*exercise, model);
            }
        }
        Ok(adapter)
    }

    pub fn exercises(&self) -> impl Iterator<Item = Exercise> + '_ {
        self.models.iter().map(|(exercise, _)| *exercise)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Build the observation for one frame
    ///
    /// No pose yields [`FrameObservation::no_pose`]. A classifier that
    /// rejects the feature vector, or returns a non-finite score, contributes
    /// no score for its exercise.
    pub fn observe_pose(&self, pose: Option<&PoseEstimate>) -> FrameObservation {
        let Some(pose) = pose else {
            return FrameObservation::no_pose();
        };

        let features = pose.feature_vector();
        let mut observation =
            FrameObservation::detected(pose.score, std::iter::empty::<(Exercise, f32)>());
        for (exercise, model) in &self.models {
            match score_features(model.as_ref(), &features) {
                Ok(score) if score.is_finite() => {
                    tracing::debug!("[Adapter] {} prediction: {:.4}", exercise, score);
                    observation = observation.with_score(*exercise, score);
                }
                Ok(score) => {
                    tracing::warn!("[Adapter] {} produced non-finite score {}", exercise, score);
                }
                Err(err) => {
                    tracing::warn!("[Adapter] {} classifier skipped: {}", exercise, err);
                }
            }
        }
        observation
    }
}

/// Check the vector length against the model before predicting
fn score_features(model: &dyn ScoreModel, features: &[f32]) -> Result<f32, AdapterError> {
    let expected = model.input_len();
    if features.len() != expected {
        return Err(AdapterError::FeatureMismatch {
            expected,
            actual: features.len(),
        });
    }
    model.predict(features)
}

impl Default for ClassifierAdapter {
    fn default() -> Self {
        Self::new()
    }
}
