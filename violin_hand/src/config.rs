//! Application configuration.
//!
//! A single JSON file with per-section serde defaults, so a missing file
//! or a sparse one both work, followed by a small set of environment
//! overrides. The parsed sections are handed to the mapper, recognizer
//! and sinks at construction; nothing reads configuration ambiently.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use violin_gesture::GestureConfig;
use violin_model::{NoteTables, Tuning};

/// External hand-tracker bridge settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Command line of the tracker process (`--tracker` overrides it).
    pub command: Option<String>,
    /// Hands under this detector confidence are dropped.
    pub min_confidence: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig { command: None, min_confidence: 0.7 }
    }
}

/// MIDI output settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Preferred output port; also the name of the virtual port created
    /// when no port exists.
    pub port_name: String,
    pub channel: u8,
    pub velocity: u8,
    /// General MIDI program — 40 is the violin.
    pub program: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig {
            port_name: "Violin-Hand".to_string(),
            channel: 0,
            velocity: 100,
            program: 40,
        }
    }
}

/// Note-table overrides, shaped like the file format: ordered
/// `[name, base]` pairs for strings plus the two shift tables.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ViolinTablesConfig {
    pub strings: Vec<(String, u8)>,
    pub positions: [i16; 3],
    pub fingers: [i16; 5],
}

impl Default for ViolinTablesConfig {
    fn default() -> Self {
        let defaults = NoteTables::default();
        ViolinTablesConfig {
            strings: vec![
                ("E".to_string(), 76),
                ("A".to_string(), 69),
                ("D".to_string(), 62),
                ("G".to_string(), 55),
            ],
            positions: defaults.position_shift,
            fingers: defaults.finger_shift,
        }
    }
}

impl ViolinTablesConfig {
    pub fn to_tables(&self) -> NoteTables {
        NoteTables {
            tuning: Tuning::custom(self.strings.clone()),
            position_shift: self.positions,
            finger_shift: self.fingers,
        }
    }
}

/// Session-logging settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub enabled: bool,
    pub dir: String,
    pub log_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            enabled: true,
            dir: "data/sessions".to_string(),
            log_interval_ms: 100,
        }
    }
}

/// The full application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub gesture: GestureConfig,
    pub violin: ViolinTablesConfig,
    pub midi: MidiConfig,
    pub session: SessionConfig,
    pub note_debounce_ms: Option<u64>,
    pub window_title: Option<String>,
}

impl Config {
    /// Load from a JSON file; a missing file falls back to defaults with
    /// a note in the log, a malformed one is an error.
    pub fn load(path: &Path) -> Result<Config> {
        let mut config = if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {:?}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {:?}", path))?
        } else {
            log::info!("config file {:?} not found, using defaults", path);
            Config::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment overrides on top of whatever the file said.
    pub fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("MIDI_PORT_NAME") {
            self.midi.port_name = name;
        }
        if let Ok(ch) = std::env::var("MIDI_CHANNEL") {
            if let Ok(ch) = ch.parse::<u8>() {
                self.midi.channel = ch & 0x0F;
            }
        }
        if let Ok(vel) = std::env::var("MIDI_VELOCITY") {
            if let Ok(vel) = vel.parse::<u8>() {
                self.midi.velocity = vel.min(127);
            }
        }
        if let Ok(dir) = std::env::var("SESSION_LOG_DIR") {
            self.session.dir = dir;
        }
        if let Ok(enabled) = std::env::var("SESSION_LOG_ENABLED") {
            self.session.enabled = enabled.eq_ignore_ascii_case("true");
        }
    }

    pub fn debounce_ms(&self) -> u64 {
        self.note_debounce_ms
            .unwrap_or(violin_gesture::NotePolicy::DEFAULT_DEBOUNCE_MS)
    }

    pub fn window_title(&self) -> &str {
        self.window_title.as_deref().unwrap_or("Violin Hand")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_tables() {
        let config = Config::default();
        let tables = config.violin.to_tables();
        assert_eq!(tables.tuning.base(1), 76);
        assert_eq!(tables.tuning.base(4), 55);
        assert_eq!(tables.position_shift, [0, 2, 4]);
        assert_eq!(tables.finger_shift, [0, 2, 4, 6, 8]);
        assert_eq!(config.midi.program, 40);
        assert_eq!(config.debounce_ms(), 50);
    }

    #[test]
    fn sparse_json_fills_in_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "midi": { "port_name": "FluidSynth" }, "note_debounce_ms": 80 }"#,
        )
        .unwrap();
        assert_eq!(config.midi.port_name, "FluidSynth");
        assert_eq!(config.midi.velocity, 100);
        assert_eq!(config.debounce_ms(), 80);
        assert_eq!(config.gesture.pinch_engage, 0.05);
    }

    #[test]
    fn gesture_section_parses_zones() {
        let config: Config = serde_json::from_str(
            r#"{ "gesture": {
                "pinch_engage": 0.04,
                "position_zones": [
                    {"min": 0.0, "max": 0.25},
                    {"min": 0.25, "max": 0.6},
                    {"min": 0.6, "max": 1.0}
                ]
            }}"#,
        )
        .unwrap();
        assert_eq!(config.gesture.pinch_engage, 0.04);
        assert_eq!(config.gesture.position_zones[1].max, 0.6);
    }

    #[test]
    fn custom_string_table_round_trips() {
        let config: Config = serde_json::from_str(
            r#"{ "violin": { "strings": [["A", 69], ["E", 64]] } }"#,
        )
        .unwrap();
        let tables = config.violin.to_tables();
        assert_eq!(tables.tuning.len(), 2);
        assert_eq!(tables.tuning.name(2), "E");
    }
}
