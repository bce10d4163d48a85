//! Configuration management for counter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! so thresholds, the pose confidence gate, frame pacing and model paths can
//! be adjusted without recompilation.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::counting::{CounterConfig, PoseGate, DEFAULT_MIN_POSE_CONFIDENCE};
use crate::error::SessionError;
use crate::observation::Exercise;

/// Bundled counter configuration
pub const DEFAULT_CONFIG_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/assets/counter_config.json");

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub counters: CountersConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Pose confidence gate applied to every frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Frames whose pose confidence is at or below this are ignored
    pub min_pose_confidence: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_pose_confidence: DEFAULT_MIN_POSE_CONFIDENCE,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        self.pose_gate().validate()
    }

    pub fn pose_gate(&self) -> PoseGate {
        PoseGate::new(self.min_pose_confidence)
    }
}

/// Per-exercise counter policies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountersConfig {
    #[serde(default = "CounterConfig::pushup")]
    pub pushup: CounterConfig,
    #[serde(default = "CounterConfig::situp")]
    pub situp: CounterConfig,
}

impl Default for CountersConfig {
    fn default() -> Self {
        Self {
            pushup: CounterConfig::pushup(),
            situp: CounterConfig::situp(),
        }
    }
}

impl CountersConfig {
    pub fn for_exercise(&self, exercise: Exercise) -> CounterConfig {
        match exercise {
            Exercise::Pushup => self.pushup,
            Exercise::Situp => self.situp,
        }
    }

    /// Counter table in exercise order
    pub fn table(&self) -> Vec<(Exercise, CounterConfig)> {
        Exercise::all()
            .iter()
            .map(|exercise| (*exercise, self.for_exercise(*exercise)))
            .collect()
    }
}

/// Frame driver pacing and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Minimum time between ticks in milliseconds (0 = as fast as frames arrive)
    pub frame_interval_ms: u64,
    /// Log a progress line every N frames (0 disables)
    pub log_every_n_frames: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 0,
            log_every_n_frames: 300,
        }
    }
}

/// Classifier model files, loaded once before the frame loop starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub pushup: Option<PathBuf>,
    #[serde(default)]
    pub situp: Option<PathBuf>,
}

impl ModelsConfig {
    pub fn path_for(&self, exercise: Exercise) -> Option<&Path> {
        match exercise {
            Exercise::Pushup => self.pushup.as_deref(),
            Exercise::Situp => self.situp.as_deref(),
        }
    }
}

impl AppConfig {
    /// Read and parse a JSON config file, failing on any error
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing config JSON {}", path.display()))
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing or
    /// its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::read_from_file(&path) {
            Ok(config) => {
                log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!("[Config] {:#}. Using defaults.", err);
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset path
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Validate the gate and every counter policy
    pub fn validate(&self) -> Result<(), SessionError> {
        self.gate.validate()?;
        for (_, counter) in self.counters.table() {
            counter.validate()?;
        }
        Ok(())
    }
}
