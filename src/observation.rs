//! Frame observations delivered by the classifier adapter.
//!
//! An observation carries the pose confidence for one video frame plus one
//! classifier score per tracked exercise. A frame without a detected pose has
//! no scores; [`FrameObservation::score_for`] enforces that even when a
//! deserialized record carries stray scores.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::counting::CounterConfig;

/// Exercises with a trained classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    Pushup,
    Situp,
}

impl Exercise {
    pub const ALL: [Exercise; 2] = [Exercise::Pushup, Exercise::Situp];

    pub fn all() -> &'static [Exercise] {
        &Self::ALL
    }

    pub fn name(&self) -> &'static str {
        match self {
            Exercise::Pushup => "pushup",
            Exercise::Situp => "situp",
        }
    }

    /// Counter policy this exercise uses unless configured otherwise
    pub fn default_counter_config(&self) -> CounterConfig {
        match self {
            Exercise::Pushup => CounterConfig::pushup(),
            Exercise::Situp => CounterConfig::situp(),
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-frame input to the counting core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    #[serde(default, alias = "poseConfidence")]
    pose_confidence: Option<f32>,
    #[serde(
        default,
        alias = "exerciseScores",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    scores: BTreeMap<Exercise, f32>,
}

impl FrameObservation {
    /// Frame in which the pose detector found nobody
    pub fn no_pose() -> Self {
        Self::default()
    }

    /// Frame with a detected pose and its classifier scores
    pub fn detected<I>(pose_confidence: f32, scores: I) -> Self
    where
        I: IntoIterator<Item = (Exercise, f32)>,
    {
        Self {
            pose_confidence: Some(pose_confidence),
            scores: scores.into_iter().collect(),
        }
    }

    /// Add or replace one exercise score; ignored when no pose was detected
    pub fn with_score(mut self, exercise: Exercise, score: f32) -> Self {
        if self.pose_confidence.is_some() {
            self.scores.insert(exercise, score);
        }
        self
    }

    pub fn pose_confidence(&self) -> Option<f32> {
        self.pose_confidence
    }

    pub fn has_pose(&self) -> bool {
        self.pose_confidence.is_some()
    }

    /// Score for an exercise, or `None` if absent or no pose was detected
    pub fn score_for(&self, exercise: Exercise) -> Option<f32> {
        self.pose_confidence?;
        self.scores.get(&exercise).copied()
    }

    /// Scores in exercise order; empty when no pose was detected
    pub fn scores(&self) -> impl Iterator<Item = (Exercise, f32)> + '_ {
        let visible = self.pose_confidence.is_some();
        self.scores
            .iter()
            .filter(move |_| visible)
            .map(|(exercise, score)| (*exercise, *score))
    }
}
