use std::collections::VecDeque;
use std::io::Write;

use rep_counter::adapter::{
    ClassifierAdapter, Keypoint, LogisticModel, PipelineSource, PoseEstimate, PoseSource,
    MOVENET_KEYPOINT_COUNT,
};
use rep_counter::config::{AppConfig, DEFAULT_CONFIG_PATH};
use rep_counter::driver::{BroadcastSink, CollectingSink, FrameDriver, ReplaySource};
use rep_counter::error::AdapterError;
use rep_counter::fixtures::{FixtureCatalog, FixtureProcessor};
use rep_counter::{Exercise, FrameObservation, ResetPolicy, Session, Stage};

/// Pose whose first keypoint carries the signal the test model reads
fn pose(confidence: f32, signal: f32) -> PoseEstimate {
    let mut keypoints = vec![Keypoint::new(0.0, 0.0); MOVENET_KEYPOINT_COUNT];
    keypoints[0] = Keypoint::new(signal, 0.0);
    PoseEstimate::new(confidence, keypoints)
}

/// Logistic model that saturates on the sign of the first feature
fn signal_model() -> LogisticModel {
    let mut weights = vec![0.0; MOVENET_KEYPOINT_COUNT * 2];
    weights[0] = 20.0;
    LogisticModel::new(weights, 0.0).expect("valid model")
}

struct ScriptedPoses(VecDeque<Result<Option<PoseEstimate>, AdapterError>>);

impl PoseSource for ScriptedPoses {
    fn next_pose(&mut self) -> Option<Result<Option<PoseEstimate>, AdapterError>> {
        self.0.pop_front()
    }
}

#[test]
fn bundled_fixtures_meet_expectations() {
    let catalog = FixtureCatalog::default();
    let fixtures = catalog.discover().expect("discover fixtures");
    assert!(fixtures.len() >= 2);

    let processor = FixtureProcessor::new(AppConfig::default());
    for metadata in fixtures {
        let data = catalog.load(&metadata.name, None).expect("load fixture");
        let outcome = processor.run(&data).expect("replay fixture");
        if let Some(expectations) = &data.expectations {
            if let Err(diff) = expectations.verify(&outcome) {
                panic!("{} mismatch: {}", metadata.name, diff.to_json());
            }
        }
    }
}

#[test]
fn bundled_config_matches_defaults() {
    assert!(std::path::Path::new(DEFAULT_CONFIG_PATH).is_file());
    let config = AppConfig::load();
    config.validate().expect("bundled config is valid");

    assert_eq!(config.counters.pushup.reset_policy, ResetPolicy::Always);
    assert_eq!(config.counters.situp.reset_policy, ResetPolicy::OnlyWhenUp);
    assert!((config.gate.min_pose_confidence - 0.5).abs() < f32::EPSILON);
}

#[test]
fn pose_pipeline_counts_through_classifier() {
    let poses = ScriptedPoses(VecDeque::from(vec![
        Ok(Some(pose(0.9, -1.0))),
        Ok(Some(pose(0.9, 1.0))),
        Ok(None),
        Ok(Some(pose(0.9, -1.0))),
        Err(AdapterError::PoseSource {
            reason: "detector timeout".to_string(),
        }),
        Ok(Some(pose(0.9, 1.0))),
        Ok(Some(pose(0.2, -1.0))),
    ]));
    let adapter = ClassifierAdapter::new().with_model(Exercise::Pushup, signal_model());
    let mut source = PipelineSource::new(poses, adapter);

    let mut driver = FrameDriver::new(Session::with_defaults(), Default::default());
    let mut sink = CollectingSink::new();
    let summary = driver.run(&mut source, &mut sink);

    assert_eq!(summary.frames, 7);
    assert_eq!(summary.skipped_frames, 3);
    let pushups = &summary.totals[0];
    assert_eq!((pushups.count, pushups.stage), (2, Stage::Up));
    assert_eq!(source.failed_frames(), 1);
}

#[test]
fn models_load_from_config_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let model_path = dir.path().join("pushup.json");
    let mut weights = vec![0.0f32; MOVENET_KEYPOINT_COUNT * 2];
    weights[0] = 20.0;
    let mut file = std::fs::File::create(&model_path).expect("create model");
    write!(file, "{}", serde_json::json!({ "weights": weights, "bias": 0.0 })).expect("write");

    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        serde_json::json!({ "models": { "pushup": model_path } }).to_string(),
    )
    .expect("write config");

    let config = AppConfig::load_from_file(&config_path);
    let adapter = ClassifierAdapter::from_config(&config.models).expect("load models");
    let observation = adapter.observe_pose(Some(&pose(0.9, 1.0)));
    assert!(observation.score_for(Exercise::Pushup).expect("pushup score") > 0.9);
    assert_eq!(observation.score_for(Exercise::Situp), None);
}

#[tokio::test]
async fn spawned_driver_broadcasts_reports() {
    let frames = [0.05, 0.95, 0.05, 0.95]
        .into_iter()
        .map(|score| FrameObservation::detected(0.9, [(Exercise::Situp, score)]));
    let (sink, mut rx) = BroadcastSink::new(16);

    let handle = FrameDriver::new(Session::with_defaults(), Default::default())
        .spawn(ReplaySource::new(frames), sink);

    let mut last_count = 0;
    for _ in 0..4 {
        let report = rx.recv().await.expect("frame report");
        let situp = report.update_for(Exercise::Situp).expect("situp update");
        assert!(situp.count >= last_count);
        last_count = situp.count;
    }
    assert_eq!(last_count, 2);

    let summary = tokio::task::spawn_blocking(move || handle.join())
        .await
        .expect("join task")
        .expect("driver summary");
    assert!(!summary.cancelled);
    assert_eq!(summary.frames, 4);
}
