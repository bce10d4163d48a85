//! Counting session: owns one repetition counter per tracked exercise.
//!
//! The session is the only owner of counter state. The frame driver hands it
//! one observation per tick and forwards the resulting [`FrameReport`] to the
//! render sink, which only ever reads it.

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, GateConfig};
use crate::counting::{
    CounterConfig, CounterSnapshot, PoseGate, RepetitionCounter, SkipReason, Stage, Transition,
};
use crate::error::{log_session_error, SessionError};
use crate::observation::{Exercise, FrameObservation};

/// Counter state for one exercise after a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseUpdate {
    pub exercise: Exercise,
    pub stage: Stage,
    pub count: u32,
    pub transition: Transition,
    /// Score fed to the counter this frame (before clamping), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Result of feeding one frame to the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_confidence: Option<f32>,
    pub updates: Vec<ExerciseUpdate>,
}

impl FrameReport {
    pub fn update_for(&self, exercise: Exercise) -> Option<&ExerciseUpdate> {
        self.updates.iter().find(|update| update.exercise == exercise)
    }

    /// Updates that counted a repetition this frame
    pub fn repetitions(&self) -> impl Iterator<Item = &ExerciseUpdate> {
        self.updates
            .iter()
            .filter(|update| update.transition.counted())
    }
}

/// Final counter state for one exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseTotals {
    pub exercise: Exercise,
    pub stage: Stage,
    pub count: u32,
}

pub struct Session {
    gate: PoseGate,
    counters: Vec<(Exercise, RepetitionCounter)>,
    frames_observed: u64,
    skipped_frames: u64,
}

impl Session {
    /// Create a session tracking the given exercises
    ///
    /// Every counter starts `Down` with a zero count. Thresholds and the gate
    /// are validated up front so `observe` never has to fail.
    pub fn new(
        table: &[(Exercise, CounterConfig)],
        gate: &GateConfig,
    ) -> Result<Self, SessionError> {
        gate.validate()?;
        if table.is_empty() {
            return Err(SessionError::NoExercises);
        }

        let pose_gate = gate.pose_gate();
        let mut counters: Vec<(Exercise, RepetitionCounter)> = Vec::with_capacity(table.len());
        for (exercise, config) in table {
            if counters.iter().any(|(tracked, _)| tracked == exercise) {
                return Err(SessionError::DuplicateExercise {
                    exercise: exercise.to_string(),
                });
            }
            counters.push((*exercise, RepetitionCounter::with_gate(*config, pose_gate)?));
        }

        Ok(Self {
            gate: pose_gate,
            counters,
            frames_observed: 0,
            skipped_frames: 0,
        })
    }

    /// Track every exercise using the configured policies
    pub fn from_config(config: &AppConfig) -> Result<Self, SessionError> {
        Self::new(&config.counters.table(), &config.gate)
            .inspect_err(|err| log_session_error(err, "Session::from_config"))
    }

    /// Session with the default pushup and situp policies
    pub fn with_defaults() -> Self {
        let gate = PoseGate::default();
        let counters = Exercise::all()
            .iter()
            .map(|exercise| {
                let config = exercise.default_counter_config();
                (*exercise, RepetitionCounter::from_validated(config, gate))
            })
            .collect();
        Self {
            gate,
            counters,
            frames_observed: 0,
            skipped_frames: 0,
        }
    }

    /// Feed one frame to every tracked counter
    ///
    /// A frame without a pose, or with insufficient pose confidence, leaves
    /// every counter unchanged. An exercise with no score in an admitted frame
    /// is unchanged as well.
    pub fn observe(&mut self, frame: &FrameObservation) -> FrameReport {
        let frame_index = self.frames_observed;
        self.frames_observed += 1;

        let gate_result = self.gate.check(frame.pose_confidence());
        if let Err(reason) = gate_result {
            self.skipped_frames += 1;
            tracing::trace!("[Session] Frame {} skipped: {:?}", frame_index, reason);
        }

        let updates = self
            .counters
            .iter_mut()
            .map(|(exercise, counter)| {
                let score = frame.score_for(*exercise);
                let transition = match (gate_result, score) {
                    (Ok(()), Some(score)) => {
                        tracing::debug!(
                            "[Session] Frame {} {} prediction: {:.4}",
                            frame_index,
                            exercise,
                            score
                        );
                        counter.advance(score)
                    }
                    _ => Transition::None,
                };

                if transition.counted() {
                    tracing::info!(
                        "[Session] {} repetition #{} at frame {}",
                        exercise,
                        counter.count(),
                        frame_index
                    );
                }

                ExerciseUpdate {
                    exercise: *exercise,
                    stage: counter.stage(),
                    count: counter.count(),
                    transition,
                    score: gate_result.ok().and(score),
                }
            })
            .collect();

        FrameReport {
            frame_index,
            skipped: gate_result.err(),
            pose_confidence: frame.pose_confidence(),
            updates,
        }
    }

    pub fn counter(&self, exercise: Exercise) -> Option<&RepetitionCounter> {
        self.counters
            .iter()
            .find(|(tracked, _)| *tracked == exercise)
            .map(|(_, counter)| counter)
    }

    pub fn snapshot_for(&self, exercise: Exercise) -> Option<CounterSnapshot> {
        self.counter(exercise).map(RepetitionCounter::snapshot)
    }

    /// Current totals in registration order
    pub fn totals(&self) -> Vec<ExerciseTotals> {
        self.counters
            .iter()
            .map(|(exercise, counter)| ExerciseTotals {
                exercise: *exercise,
                stage: counter.stage(),
                count: counter.count(),
            })
            .collect()
    }

    pub fn exercises(&self) -> impl Iterator<Item = Exercise> + '_ {
        self.counters.iter().map(|(exercise, _)| *exercise)
    }

    pub fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::ResetPolicy;

    fn frame(pushup: f32, situp: f32) -> FrameObservation {
        FrameObservation::detected(0.9, [(Exercise::Pushup, pushup), (Exercise::Situp, situp)])
    }

    #[test]
    fn test_counters_start_down_at_zero() {
        let session = Session::with_defaults();
        for totals in session.totals() {
            assert_eq!(totals.stage, Stage::Down);
            assert_eq!(totals.count, 0);
        }
        assert_eq!(session.exercises().count(), 2);
    }

    #[test]
    fn test_exercises_count_independently() {
        let mut session = Session::with_defaults();
        session.observe(&frame(0.95, 0.05));
        let report = session.observe(&frame(0.05, 0.95));

        let pushup = report.update_for(Exercise::Pushup).unwrap();
        assert_eq!((pushup.stage, pushup.count), (Stage::Down, 1));
        assert_eq!(pushup.transition, Transition::Fell);

        let situp = report.update_for(Exercise::Situp).unwrap();
        assert_eq!((situp.stage, situp.count), (Stage::Up, 1));
        assert_eq!(report.repetitions().count(), 1);
    }

    #[test]
    fn test_skipped_frames_leave_state_unchanged() {
        let mut session = Session::with_defaults();
        session.observe(&frame(0.95, 0.95));
        let before = session.totals();

        let no_pose = session.observe(&FrameObservation::no_pose());
        assert_eq!(no_pose.skipped, Some(SkipReason::NoPose));

        let weak = FrameObservation::detected(0.5, [(Exercise::Pushup, 0.05)]);
        let low = session.observe(&weak);
        assert_eq!(low.skipped, Some(SkipReason::LowConfidence));
        assert!(low.updates.iter().all(|u| u.score.is_none()));

        assert_eq!(session.totals(), before);
        assert_eq!(session.frames_observed(), 3);
        assert_eq!(session.skipped_frames(), 2);
    }

    #[test]
    fn test_missing_score_leaves_exercise_unchanged() {
        let mut session = Session::with_defaults();
        let report =
            session.observe(&FrameObservation::detected(0.9, [(Exercise::Pushup, 0.95)]));
        assert_eq!(report.skipped, None);
        let situp = report.update_for(Exercise::Situp).unwrap();
        assert_eq!(situp.transition, Transition::None);
        assert_eq!(situp.score, None);
        assert_eq!(session.snapshot_for(Exercise::Pushup).unwrap().count, 1);
    }

    #[test]
    fn test_frame_indices_increase() {
        let mut session = Session::with_defaults();
        let first = session.observe(&FrameObservation::no_pose());
        let second = session.observe(&frame(0.5, 0.5));
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn test_rejects_duplicate_exercise() {
        let table = [
            (Exercise::Pushup, CounterConfig::pushup()),
            (Exercise::Pushup, CounterConfig::situp()),
        ];
        let result = Session::new(&table, &GateConfig::default());
        assert_eq!(
            result.err(),
            Some(SessionError::DuplicateExercise {
                exercise: "pushup".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_empty_table_and_bad_thresholds() {
        assert_eq!(
            Session::new(&[], &GateConfig::default()).err(),
            Some(SessionError::NoExercises)
        );

        let table = [(
            Exercise::Situp,
            CounterConfig::new(0.8, 0.2, ResetPolicy::OnlyWhenUp),
        )];
        assert!(matches!(
            Session::new(&table, &GateConfig::default()),
            Err(SessionError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn test_configured_gate_applies() {
        let mut config = AppConfig::default();
        config.gate.min_pose_confidence = 0.8;
        let mut session = Session::from_config(&config).unwrap();

        let report = session.observe(&FrameObservation::detected(0.7, [(Exercise::Pushup, 0.95)]));
        assert_eq!(report.skipped, Some(SkipReason::LowConfidence));
        assert_eq!(session.snapshot_for(Exercise::Pushup).unwrap().count, 0);
    }

    #[test]
    fn test_report_json_shape() {
        let mut session = Session::with_defaults();
        let report = session.observe(&frame(0.95, 0.05));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["frame_index"], 0);
        assert_eq!(json["updates"][0]["exercise"], "pushup");
        assert_eq!(json["updates"][0]["stage"], "up");
        assert_eq!(json["updates"][0]["transition"], "rose");
        assert!(json.get("skipped").is_none());
    }
}
