//! Configuration loading and typed config structures for the reroll engine.
//!
//! The canonical configuration lives in `reroll-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a
//! loader that reads them. Every field has a default, so an empty file (or
//! no file at all) yields a working configuration.

use std::path::Path;

use reroll_types::{DEFAULT_ITERATION_LIMIT, FilterSpecification};
use serde::Deserialize;

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "REROLL_LOG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level reroll configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RerollConfig {
    /// Per-tick budgets and the default ceiling.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Pipeline thresholds.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Seed for the session RNG; drawn from the thread RNG when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Filter to run with; the unconstrained filter when absent.
    #[serde(default)]
    pub filter: Option<FilterSpecification>,
}

impl RerollConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `REROLL_LOG` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.logging.apply_env_override();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// The configured filter, or the unconstrained one with the
    /// scheduler's default ceiling.
    pub fn filter_or_default(&self) -> FilterSpecification {
        self.filter.clone().unwrap_or_else(|| {
            FilterSpecification::default().with_iteration_limit(self.scheduler.iteration_limit)
        })
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Per-tick work budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum pipeline iterations per tick.
    #[serde(default = "default_step_budget")]
    pub step_budget: u32,

    /// Wall-clock budget per tick in milliseconds.
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,

    /// Iteration ceiling used when the caller does not supply one.
    #[serde(default = "default_iteration_limit")]
    pub iteration_limit: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            time_budget_ms: default_time_budget_ms(),
            iteration_limit: default_iteration_limit(),
        }
    }
}

const fn default_step_budget() -> u32 {
    1000
}

const fn default_time_budget_ms() -> u64 {
    6
}

const fn default_iteration_limit() -> u32 {
    DEFAULT_ITERATION_LIMIT
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// How restore points use the cached background pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Restore the cached pair.
    #[default]
    Reuse,
    /// Reshuffle instead of restoring.
    Regenerate,
}

/// Escape thresholds and per-stage limits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PipelineConfig {
    /// Consecutive skill failures tolerated before a forced reshuffle.
    /// The reshuffle fires when the streak exceeds this value.
    #[serde(default = "default_skill_failure_reshuffle")]
    pub skill_failure_reshuffle: u32,

    /// No-improvement failures that trigger a reshuffle once reached.
    #[serde(default = "default_no_improvement_reshuffle")]
    pub no_improvement_reshuffle: u32,

    /// Health generation attempts per iteration before giving up.
    #[serde(default = "default_health_attempts")]
    pub health_attempts: u32,

    /// Default adulthood threshold in biological years.
    #[serde(default = "default_adulthood_age_years")]
    pub adulthood_age_years: f32,

    /// Background cache behavior.
    #[serde(default)]
    pub background_cache: CacheMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skill_failure_reshuffle: default_skill_failure_reshuffle(),
            no_improvement_reshuffle: default_no_improvement_reshuffle(),
            health_attempts: default_health_attempts(),
            adulthood_age_years: default_adulthood_age_years(),
            background_cache: CacheMode::default(),
        }
    }
}

const fn default_skill_failure_reshuffle() -> u32 {
    100
}

const fn default_no_improvement_reshuffle() -> u32 {
    50
}

const fn default_health_attempts() -> u32 {
    100
}

const fn default_adulthood_age_years() -> f32 {
    20.0
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (`info`, `reroll_core=debug`, ...).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Replace `level` with `REROLL_LOG` when it is set and non-empty.
    pub fn apply_env_override(&mut self) {
        if let Some(level) = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .filter(|level| !level.trim().is_empty())
        {
            self.level = level;
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reroll_types::{Gender, Passion};

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RerollConfig::parse("").unwrap();
        assert_eq!(config, RerollConfig::default());
        assert_eq!(config.scheduler.step_budget, 1000);
        assert_eq!(config.scheduler.time_budget_ms, 6);
        assert_eq!(config.pipeline.skill_failure_reshuffle, 100);
        assert_eq!(config.pipeline.no_improvement_reshuffle, 50);
        assert_eq!(config.pipeline.health_attempts, 100);
        assert_eq!(config.pipeline.background_cache, CacheMode::Reuse);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let yaml = r"
scheduler:
  step_budget: 250
pipeline:
  background_cache: regenerate
seed: 42
";
        let config = RerollConfig::parse(yaml).unwrap();
        assert_eq!(config.scheduler.step_budget, 250);
        assert_eq!(config.scheduler.time_budget_ms, 6);
        assert_eq!(config.pipeline.background_cache, CacheMode::Regenerate);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn filter_section_parses() {
        let yaml = r"
filter:
  gender: Female
  iteration_limit: 500
  skills:
    - skill:
        id: Shooting
        disabling_tags: [Violent]
        work_tags: [Violent, Hunting]
      min_level: 8
      min_passion: Major
";
        let config = RerollConfig::parse(yaml).unwrap();
        let filter = config.filter_or_default();
        assert_eq!(filter.gender, Some(Gender::Female));
        assert_eq!(filter.iteration_limit, 500);
        let shooting = filter.skills.first().unwrap();
        assert_eq!(shooting.min_level, 8);
        assert_eq!(shooting.min_passion, Passion::Major);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = RerollConfig::parse("scheduler: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = RerollConfig::from_file(Path::new("/nonexistent/reroll-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
