//! Error types for the reroll core.
//!
//! Rejection is never an error: the pipeline reports it as a normal
//! [`IterationOutcome`](crate::pipeline::IterationOutcome). The types here
//! cover genuine faults only: an external generator failing, the host failing
//! to hand out or take back a candidate, and misuse of [`begin`].
//!
//! [`begin`]: crate::scheduler::RerollScheduler::begin

use core::fmt;

use reroll_types::{RerollState, RunId};

/// The external operation a [`GeneratorError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Age generation.
    Age,
    /// Trait generation.
    Traits,
    /// Skill generation.
    Skills,
    /// Health generation.
    Health,
    /// Body type generation.
    BodyType,
    /// Genetic variant generation.
    Genetics,
    /// Initial background and name generation.
    Background,
    /// Background reshuffle.
    Shuffle,
    /// Name synthesis.
    Name,
    /// Relationship linkage.
    Relations,
    /// Style synthesis.
    Style,
    /// Clothing and equipment.
    Redress,
    /// Final notification.
    Notify,
}

impl Operation {
    /// Lowercase name used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Traits => "traits",
            Self::Skills => "skills",
            Self::Health => "health",
            Self::BodyType => "body_type",
            Self::Genetics => "genetics",
            Self::Background => "background",
            Self::Shuffle => "shuffle",
            Self::Name => "name",
            Self::Relations => "relations",
            Self::Style => "style",
            Self::Redress => "redress",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external generator failed while mutating the candidate.
///
/// Recoverable: the scheduler discards the candidate, obtains a fresh one,
/// and continues the run from the next iteration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} generator failed: {message}")]
pub struct GeneratorError {
    /// Operation that failed.
    pub operation: Operation,
    /// Host-supplied description.
    pub message: String,
}

impl GeneratorError {
    /// Create a generator error.
    pub fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// The host failed to hand out or take back a candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// No candidate could be obtained for the slot.
    #[error("no candidate available for slot {index}: {message}")]
    Unavailable {
        /// Target slot index.
        index: usize,
        /// Host-supplied description.
        message: String,
    },

    /// The candidate could not be discarded.
    #[error("failed to discard candidate in slot {index}: {message}")]
    Discard {
        /// Target slot index.
        index: usize,
        /// Host-supplied description.
        message: String,
    },
}

/// Any fault that can end a run abnormally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunFault {
    /// An external generator failed.
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    /// The host failed to hand out or take back a candidate.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Why [`begin`](crate::scheduler::RerollScheduler::begin) did not start a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeginError {
    /// A run is already in progress. The running run is untouched.
    #[error("run {run_id} is already running")]
    AlreadyRunning {
        /// The run in progress.
        run_id: RunId,
    },

    /// The previous run's result has not been taken yet.
    #[error("scheduler is {state:?}; take the previous result first")]
    NotIdle {
        /// Current scheduler state.
        state: RerollState,
    },

    /// The iteration limit must be positive.
    #[error("iteration limit must be positive, got {limit}")]
    InvalidLimit {
        /// The rejected limit.
        limit: u32,
    },

    /// One-shot session setup failed; the scheduler is now in `Error`.
    #[error("session setup failed: {source}")]
    Setup {
        /// The underlying fault.
        #[from]
        source: RunFault,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_error_names_operation() {
        let err = GeneratorError::new(Operation::BodyType, "missing def");
        assert_eq!(err.to_string(), "body_type generator failed: missing def");
    }

    #[test]
    fn run_fault_is_transparent() {
        let fault = RunFault::from(HostError::Unavailable {
            index: 3,
            message: String::from("slot locked"),
        });
        assert_eq!(
            fault.to_string(),
            "no candidate available for slot 3: slot locked"
        );
    }

    #[test]
    fn setup_wraps_fault() {
        let err = BeginError::from(RunFault::from(GeneratorError::new(
            Operation::Background,
            "empty pool",
        )));
        assert!(matches!(err, BeginError::Setup { .. }));
        assert!(err.to_string().contains("empty pool"));
    }
}
