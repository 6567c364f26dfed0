//! Acceptance oracle, generation pipeline, and step scheduler for budgeted
//! candidate rerolls.
//!
//! A run regenerates one candidate by rejection sampling until it matches a
//! [`FilterSpecification`] or an iteration ceiling is reached. Work is
//! sliced into caller-driven ticks so that the host can keep rendering
//! frames while a run is in progress.
//!
//! # Modules
//!
//! - [`background`] -- Background category selection and the adulthood
//!   threshold.
//! - [`config`] -- Configuration loading from `reroll-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- Generator, host, and lifecycle error types.
//! - [`finalize`] -- One-shot finalization of an accepted candidate.
//! - [`forced`] -- Caller-imposed age range, traits, and conditions.
//! - [`host`] -- [`AttributeGenerators`] and [`CandidateHost`] traits.
//! - [`oracle`] -- Pure predicates deciding acceptance.
//! - [`pipeline`] -- One ordered rejection-sampling iteration.
//! - [`scheduler`] -- [`RerollScheduler`], the resumable state machine.
//! - [`scripted`] -- [`ScriptedHost`], a deterministic host.
//! - [`session`] -- Run-scoped candidate state and counters.
//!
//! [`FilterSpecification`]: reroll_types::FilterSpecification
//! [`AttributeGenerators`]: host::AttributeGenerators
//! [`CandidateHost`]: host::CandidateHost
//! [`RerollScheduler`]: scheduler::RerollScheduler
//! [`ScriptedHost`]: scripted::ScriptedHost

pub mod background;
pub mod config;
pub mod error;
pub mod finalize;
pub mod forced;
pub mod host;
pub mod oracle;
pub mod pipeline;
pub mod scheduler;
pub mod scripted;
pub mod session;

pub use config::RerollConfig;
pub use error::{BeginError, GeneratorError, HostError, Operation, RunFault};
pub use forced::ForcedConstraints;
pub use host::{AttributeGenerators, CandidateHost, RerollHost};
pub use pipeline::{AcceptanceKind, GenerationPipeline, IterationOutcome, Rejection};
pub use scheduler::{RerollScheduler, RunResult};
pub use session::{CandidateSession, RunStats};
