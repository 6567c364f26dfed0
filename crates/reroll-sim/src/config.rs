//! The `sim` section of `reroll-config.yaml`.
//!
//! The core reads the rest of the file; this binary only adds how many slots
//! to reroll and how the frame loop is paced.

use reroll_types::IntRange;
use serde::Deserialize;

use crate::error::SimError;

/// Frame-loop settings for the reference host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimConfig {
    /// Number of candidate slots rerolled one after another.
    #[serde(default = "default_slots")]
    pub slots: usize,

    /// Interval between frames in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Frames after which a run still in progress is ended with its
    /// current candidate.
    #[serde(default = "default_max_frames_per_run")]
    pub max_frames_per_run: u32,

    /// Forced biological age range, in whole years.
    #[serde(default)]
    pub forced_age: Option<IntRange>,

    /// Print each finished candidate as JSON.
    #[serde(default)]
    pub print_candidates: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            frame_interval_ms: default_frame_interval_ms(),
            max_frames_per_run: default_max_frames_per_run(),
            forced_age: None,
            print_candidates: false,
        }
    }
}

impl SimConfig {
    /// Extract the `sim` section from a full config document. A missing
    /// section yields the defaults.
    pub fn from_document(yaml: &str) -> Result<Self, SimError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| SimError::SimConfig {
            message: format!("failed to parse config YAML: {e}"),
        })?;
        match raw.get("sim") {
            Some(section) => {
                serde_yml::from_value(section.clone()).map_err(|e| SimError::SimConfig {
                    message: format!("invalid sim section: {e}"),
                })
            }
            None => Ok(Self::default()),
        }
    }
}

const fn default_slots() -> usize {
    3
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_max_frames_per_run() -> u32 {
    600
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_section_uses_defaults() {
        let config = SimConfig::from_document("scheduler:\n  step_budget: 10\n").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn section_overrides() {
        let yaml = r"
sim:
  slots: 5
  forced_age:
    min: 18
    max: 30
";
        let config = SimConfig::from_document(yaml).unwrap();
        assert_eq!(config.slots, 5);
        assert_eq!(config.frame_interval_ms, 16);
        assert_eq!(config.forced_age, Some(IntRange::new(18, 30)));
    }
}
