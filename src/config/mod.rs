// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session configuration.
//!
//! This module provides the data structures for loading and saving a
//! session file: the grid to start from, auto mode settings and output
//! routing. Files are YAML, or TOML when the extension is `.toml`.

pub mod watcher;

pub use watcher::{validate_config, ConfigEvent, ConfigWatcher};

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grid::{validate_width, GridParams, DEFAULT_GRID_WIDTH};
use crate::music::{HarmonyError, Pitch, TensionLevel};
use crate::output::DEFAULT_VELOCITY;
use crate::progression::{validate_bpm, AutoDirection, AutoModeState, EngineConfig, Voicing};
use crate::timing::DEFAULT_BPM;

/// Root configuration for a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionFile {
    /// Starting grid
    #[serde(default)]
    pub grid: GridSection,
    /// Auto mode settings
    #[serde(default)]
    pub auto: AutoSection,
    /// Output routing
    #[serde(default)]
    pub output: OutputSection,
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

impl SessionFile {
    /// Load a session from a YAML or TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        if is_toml(path) {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Parse a session from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a session from TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        toml::from_str(toml).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize configuration to TOML")
    }

    /// Save the session, as TOML when the extension is `.toml`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = if is_toml(path) {
            self.to_toml()?
        } else {
            self.to_yaml()?
        };
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Every problem with the values, in file order. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = self.grid.root.parse::<Pitch>() {
            problems.push(format!("grid.root: {}", e));
        }
        if let Err(e) = validate_width(self.grid.width) {
            problems.push(format!("grid.width: {}", e));
        }
        if let Err(e) = TensionLevel::try_from(self.grid.tension) {
            problems.push(format!("grid.tension: {}", e));
        }
        if let Err(e) = validate_bpm(self.auto.bpm) {
            problems.push(format!("auto.bpm: {}", e));
        }
        if !(1..=127).contains(&self.output.velocity) {
            problems.push(format!(
                "output.velocity: must be 1-127, got {}",
                self.output.velocity
            ));
        }
        if self.output.channel > 15 {
            problems.push(format!(
                "output.channel: must be 0-15, got {}",
                self.output.channel
            ));
        }

        problems
    }

    /// Typed grid parameters
    pub fn grid_params(&self) -> Result<GridParams, HarmonyError> {
        validate_width(self.grid.width)?;
        Ok(GridParams::new(
            self.grid.root.parse()?,
            self.grid.width,
            TensionLevel::try_from(self.grid.tension)?,
        ))
    }

    /// Typed auto mode state
    pub fn auto_state(&self) -> Result<AutoModeState, HarmonyError> {
        Ok(AutoModeState {
            is_active: self.auto.active,
            bpm: validate_bpm(self.auto.bpm)?,
            direction: self.auto.direction,
        })
    }

    /// Settings for building an engine
    pub fn engine_config(&self) -> Result<EngineConfig, HarmonyError> {
        Ok(EngineConfig {
            params: self.grid_params()?,
            auto: self.auto_state()?,
            velocity: self.output.velocity,
            tempo_ramp: Duration::from_millis(self.output.tempo_ramp_ms),
            voicing: Voicing::default(),
        })
    }
}

/// Starting grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridSection {
    /// Tonal centre (e.g., "C", "F#", "Bb")
    #[serde(default = "default_root")]
    pub root: String,
    /// Number of columns
    #[serde(default = "default_width")]
    pub width: usize,
    /// Tension level 0-3
    #[serde(default)]
    pub tension: u8,
}

fn default_root() -> String {
    "C".to_string()
}
fn default_width() -> usize {
    DEFAULT_GRID_WIDTH
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            width: default_width(),
            tension: 0,
        }
    }
}

/// Auto mode settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoSection {
    /// Tempo in BPM
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Direction to walk
    #[serde(default)]
    pub direction: AutoDirection,
    /// Start playing on load
    #[serde(default)]
    pub active: bool,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

impl Default for AutoSection {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            direction: AutoDirection::default(),
            active: false,
        }
    }
}

/// Output routing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSection {
    /// Note-on velocity (1-127)
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    /// MIDI channel (0-15)
    #[serde(default)]
    pub channel: u8,
    /// External MIDI port by index or name; the synth is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_port: Option<String>,
    /// Time a running clock takes to reach a new tempo
    #[serde(default = "default_tempo_ramp_ms")]
    pub tempo_ramp_ms: u64,
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}
fn default_tempo_ramp_ms() -> u64 {
    1000
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            velocity: default_velocity(),
            channel: 0,
            midi_port: None,
            tempo_ramp_ms: default_tempo_ramp_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session() {
        let yaml = r#"
grid:
  root: "Eb"
  width: 7
  tension: 1

auto:
  bpm: 96
  direction: Sad
  active: true

output:
  velocity: 90
  channel: 2
  midi_port: "IAC"
"#;

        let config = SessionFile::from_yaml(yaml).unwrap();
        assert_eq!(config.grid.root, "Eb");
        assert_eq!(config.grid.width, 7);
        assert_eq!(config.auto.bpm, 96.0);
        assert_eq!(config.auto.direction, AutoDirection::Sad);
        assert!(config.auto.active);
        assert_eq!(config.output.midi_port, Some("IAC".to_string()));
        assert!(config.validate().is_empty());

        let params = config.grid_params().unwrap();
        assert_eq!(params.current_root, "Eb".parse().unwrap());
        assert_eq!(params.tension_level, TensionLevel::Seventh);

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.velocity, 90);
        assert!(engine.auto.is_active);
    }

    #[test]
    fn test_default_values() {
        let config = SessionFile::from_yaml("grid:\n  root: \"G\"\n").unwrap();
        assert_eq!(config.grid.width, 5);
        assert_eq!(config.grid.tension, 0);
        assert_eq!(config.auto.bpm, 120.0);
        assert_eq!(config.auto.direction, AutoDirection::Stay);
        assert!(!config.auto.active);
        assert_eq!(config.output.velocity, 100);
        assert_eq!(config.output.tempo_ramp_ms, 1000);
        assert_eq!(config.output.midi_port, None);
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = SessionFile {
            grid: GridSection {
                root: "H".to_string(),
                width: 5,
                tension: 4,
            },
            auto: AutoSection {
                bpm: 10.0,
                ..Default::default()
            },
            output: OutputSection {
                velocity: 0,
                channel: 16,
                ..Default::default()
            },
        };

        let problems = config.validate();
        assert_eq!(problems.len(), 5);
        assert!(problems[0].starts_with("grid.root"));
        assert!(problems[1].contains("tension level must be 0-3"));
        assert!(problems[2].starts_with("auto.bpm"));
        assert!(problems[3].starts_with("output.velocity"));
        assert!(problems[4].starts_with("output.channel"));

        assert!(matches!(
            config.grid_params(),
            Err(HarmonyError::InvalidPitch(_))
        ));
        assert!(config.auto_state().is_err());
    }

    #[test]
    fn test_width_out_of_range() {
        let mut config = SessionFile::from_yaml("grid:\n  width: 18446744073709551615\n").unwrap();
        let problems = config.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("grid.width"));
        assert!(matches!(
            config.grid_params(),
            Err(HarmonyError::InvalidConfiguration(_))
        ));
        assert!(config.engine_config().is_err());

        config.grid.width = 0;
        assert_eq!(config.validate().len(), 1);

        config.grid.width = 25;
        assert!(config.validate().is_empty());
        assert_eq!(config.grid_params().unwrap().grid_width, 25);
    }

    #[test]
    fn test_unknown_direction_is_parse_error() {
        assert!(SessionFile::from_yaml("auto:\n  direction: Sideways\n").is_err());
    }

    #[test]
    fn test_round_trip_yaml_and_toml() {
        let original = SessionFile {
            grid: GridSection {
                root: "F#".to_string(),
                width: 3,
                tension: 3,
            },
            auto: AutoSection {
                bpm: 140.0,
                direction: AutoDirection::Tension,
                active: false,
            },
            output: OutputSection {
                midi_port: Some("1".to_string()),
                ..Default::default()
            },
        };

        let yaml = original.to_yaml().unwrap();
        assert_eq!(SessionFile::from_yaml(&yaml).unwrap(), original);

        let toml = original.to_toml().unwrap();
        assert_eq!(SessionFile::from_toml(&toml).unwrap(), original);
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionFile::default();

        let yaml_path = dir.path().join("session.yaml");
        config.save(&yaml_path).unwrap();
        assert!(std::fs::read_to_string(&yaml_path).unwrap().contains("grid:"));
        assert_eq!(SessionFile::load(&yaml_path).unwrap(), config);

        let toml_path = dir.path().join("session.toml");
        config.save(&toml_path).unwrap();
        assert!(std::fs::read_to_string(&toml_path).unwrap().contains("[grid]"));
        assert_eq!(SessionFile::load(&toml_path).unwrap(), config);

        assert!(SessionFile::load(dir.path().join("missing.yaml")).is_err());
    }
}
