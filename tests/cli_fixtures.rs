use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rep_cli"))
}

fn fixture_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

#[test]
fn replay_fixture_succeeds() {
    let output = cli()
        .args(["replay", "--fixture", "pushup_basic"])
        .output()
        .expect("failed to run rep_cli replay");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("replay report JSON payload");
    assert_eq!(json["fixture"], "pushup_basic");
    assert_eq!(json["frames"], 12);
    assert_eq!(json["skipped_frames"], 2);
    assert_eq!(json["repetitions"], 3);
    assert_eq!(json["counters"][0]["exercise"], "pushup");
    assert_eq!(json["counters"][0]["count"], 3);
}

#[test]
fn replay_noisy_situps_succeeds() {
    let output = cli()
        .args(["replay", "--fixture", "situp_noisy"])
        .output()
        .expect("failed to run rep_cli replay");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn replay_fixture_detects_mismatch() {
    let output = cli()
        .args([
            "replay",
            "--fixture",
            "pushup_basic",
            "--expect",
            &fixture_file("pushup_basic_incorrect.expect.json"),
        ])
        .output()
        .expect("failed to run mismatch replay");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
}

#[test]
fn replay_writes_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report = dir.path().join("report.json");
    let output = cli()
        .args(["replay", "--fixture", "situp_noisy", "--output"])
        .arg(&report)
        .output()
        .expect("failed to run replay with --output");
    assert!(output.status.success());

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report written"))
            .expect("report JSON");
    let situp = json["counters"]
        .as_array()
        .and_then(|counters| counters.iter().find(|c| c["exercise"] == "situp"))
        .expect("situp counter");
    assert_eq!(situp["count"], 3);
    assert_eq!(situp["stage"], "up");
}

#[test]
fn replay_rejects_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("bad.json");
    let inverted = serde_json::json!({
        "counters": {
            "pushup": { "low_threshold": 0.9, "high_threshold": 0.1, "reset_policy": "always" }
        }
    });
    std::fs::write(&config, inverted.to_string()).expect("write config");

    let output = cli()
        .args(["replay", "--fixture", "pushup_basic", "--config"])
        .arg(&config)
        .output()
        .expect("failed to run replay with bad config");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn replay_rejects_missing_config_file() {
    let output = cli()
        .args([
            "replay",
            "--fixture",
            "pushup_basic",
            "--config",
            "/nonexistent/counter_config.json",
        ])
        .output()
        .expect("failed to run replay with missing config");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn telemetry_summarizes_published_events() {
    let output = cli()
        .args(["telemetry", "--fixture", "pushup_basic"])
        .output()
        .expect("failed to run rep_cli telemetry");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("telemetry report JSON");
    assert_eq!(json["repetitions"]["pushup"], 3);
    assert_eq!(json["stage_changes"], 6);
    assert_eq!(json["no_pose_runs"], 1);
    assert_eq!(json["low_confidence_runs"], 1);
    assert_eq!(json["lagged_events"], 0);
}

#[test]
fn telemetry_table_format() {
    let output = cli()
        .args(["telemetry", "--fixture", "situp_noisy", "--format", "table"])
        .output()
        .expect("failed to run rep_cli telemetry table");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("situp: 3"),
        "expected repetition line, got {stdout}"
    );
}

#[test]
fn unknown_fixture_fails() {
    let output = cli()
        .args(["replay", "--fixture", "does_not_exist"])
        .output()
        .expect("failed to run replay");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn stream_emits_one_report_per_frame() {
    let output = cli()
        .args(["stream", "--fixture", "pushup_basic"])
        .output()
        .expect("failed to run rep_cli stream");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let reports: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("frame report JSON"))
        .collect();
    assert_eq!(reports.len(), 12);
    assert_eq!(reports[4]["skipped"], "no_pose");
    assert_eq!(reports[7]["skipped"], "low_confidence");
    assert_eq!(reports[2]["updates"][0]["transition"], "rose");
    assert_eq!(reports[11]["updates"][0]["count"], 3);
}

#[test]
fn dump_fixtures_lists_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("pushup_basic") && stdout.contains("situp_noisy"),
        "expected fixture listing, got {stdout}"
    );
}
