//! Error types for the reference host binary.
//!
//! [`SimError`] is the top-level error type that wraps every failure mode
//! during startup and the frame loop.

/// Top-level error for the reference host binary.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: reroll_core::config::ConfigError,
    },

    /// The `sim` section of the config file is malformed.
    #[error("sim config error: {message}")]
    SimConfig {
        /// Description of the failure.
        message: String,
    },

    /// A run could not be started.
    #[error("begin error: {source}")]
    Begin {
        /// The underlying lifecycle error.
        #[from]
        source: reroll_core::BeginError,
    },

    /// A run ended without leaving a result behind.
    #[error("run for slot {index} finished without a result")]
    MissingResult {
        /// Target slot index.
        index: usize,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },

    /// A run summary could not be serialized.
    #[error("serde error: {source}")]
    Serde {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
