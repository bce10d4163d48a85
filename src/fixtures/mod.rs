//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded observation fixtures, parses optional
//! expectation JSON, and replays the frames through a fresh counting
//! `Session`. It backs the `rep_cli` replay commands used in CI.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::counting::Stage;
use crate::driver::{CollectingSink, FrameDriver, ReplaySource};
use crate::observation::{Exercise, FrameObservation};
use crate::session::{ExerciseTotals, FrameReport, Session};

/// Default location for fixture JSONL/JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const FIXTURE_EXTENSION: &str = "jsonl";

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub frames_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded fixture data with parsed observations.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub frames: Vec<FrameObservation>,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub counters: Vec<ExpectedCounter>,
    #[serde(default)]
    pub skipped_frames: Option<u64>,
}

impl FixtureExpectations {
    pub fn verify(&self, outcome: &ReplayOutcome) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        for expected in &self.counters {
            let actual = outcome
                .totals
                .iter()
                .find(|totals| totals.exercise == expected.exercise);
            let matches = actual.is_some_and(|totals| {
                totals.count == expected.count
                    && expected.stage.map_or(true, |stage| stage == totals.stage)
            });
            if !matches {
                failures.push(ExpectationFailure::Counter {
                    expected: expected.clone(),
                    actual: actual.cloned(),
                });
            }
        }

        if let Some(expected) = self.skipped_frames {
            if expected != outcome.skipped_frames {
                failures.push(ExpectationFailure::SkippedFrames {
                    expected,
                    actual: outcome.skipped_frames,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Expected final state of one counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedCounter {
    pub exercise: Exercise,
    pub count: u32,
    #[serde(default)]
    pub stage: Option<Stage>,
}

/// Outcome of comparing replay results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| match failure {
                ExpectationFailure::Counter { expected, actual } => serde_json::json!({
                    "exercise": expected.exercise,
                    "expected": {
                        "count": expected.count,
                        "stage": expected.stage,
                    },
                    "actual": actual,
                }),
                ExpectationFailure::SkippedFrames { expected, actual } => serde_json::json!({
                    "skipped_frames": {
                        "expected": expected,
                        "actual": actual,
                    },
                }),
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub enum ExpectationFailure {
    Counter {
        expected: ExpectedCounter,
        actual: Option<ExerciseTotals>,
    },
    SkippedFrames {
        expected: u64,
        actual: u64,
    },
}

/// Result of replaying one fixture.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    pub frames: u64,
    pub skipped_frames: u64,
    pub totals: Vec<ExerciseTotals>,
    #[serde(skip)]
    pub reports: Vec<FrameReport>,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some(FIXTURE_EXTENSION) {
                    fixtures.push(self.metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture frames + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let frames_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&frames_path)?;
        let frames = read_observations(&frames_path)?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        Ok(FixtureData {
            metadata,
            frames,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.{FIXTURE_EXTENSION}"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, frames_path: &Path) -> Result<FixtureMetadata> {
        let name = frames_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", frames_path.display()))?
            .to_string();
        let expect_path = frames_path.with_extension("expect.json");
        Ok(FixtureMetadata {
            name,
            frames_path: frames_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Replays fixture frames through a fresh session.
pub struct FixtureProcessor {
    config: AppConfig,
}

impl FixtureProcessor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, data: &FixtureData) -> Result<ReplayOutcome> {
        let session = Session::from_config(&self.config)
            .with_context(|| format!("building session for {}", data.metadata.name))?;

        // Replays never pace; fixtures are processed as fast as they load.
        let mut driver_config = self.config.driver.clone();
        driver_config.frame_interval_ms = 0;

        let mut driver = FrameDriver::new(session, driver_config);
        let mut source = ReplaySource::new(data.frames.iter().cloned());
        let mut sink = CollectingSink::new();
        let summary = driver.run(&mut source, &mut sink);

        Ok(ReplayOutcome {
            frames: summary.frames,
            skipped_frames: summary.skipped_frames,
            totals: summary.totals,
            reports: sink.into_reports(),
        })
    }
}

/// Parse a JSONL observation file; blank lines and `#` comments are ignored.
pub fn read_observations(path: &Path) -> Result<Vec<FrameObservation>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_observations(&contents).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_observations(contents: &str) -> Result<Vec<FrameObservation>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line.trim()).with_context(|| format!("line {}", idx + 1))
        })
        .collect()
}
