//! External collaborator interfaces.
//!
//! The core never knows how attributes are synthesized. A host simulation
//! implements [`AttributeGenerators`] (one operation per attribute category)
//! and [`CandidateHost`] (candidate acquisition, disposal, and the
//! finalization hooks). Every operation may be non-deterministic and may
//! fail; failures are reported as [`GeneratorError`] or [`HostError`] and
//! never as panics.
//!
//! Generators replace their category wholesale: the pipeline clears a
//! category before asking for a new one where the host should not have to.

use reroll_types::{CandidateEntity, CategoryFilter, GenerationRequest, Name, VariantId};

use crate::error::{GeneratorError, HostError};

/// One generation operation per attribute category.
pub trait AttributeGenerators {
    /// Replace the candidate's age.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn generate_age(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Replace the candidate's trait set. The set is empty on entry.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn generate_traits(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Replace the candidate's skill records. The list is empty on entry.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn generate_skills(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Replace the candidate's health conditions. The list is empty on
    /// entry. Returns whether the resulting candidate is viable (not dead,
    /// destroyed, or incapacitated).
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn generate_health(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<bool, GeneratorError>;

    /// Assign a body type.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn generate_body_type(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Assign genes for the given variant.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn generate_genetics(
        &mut self,
        candidate: &mut CandidateEntity,
        variant: Option<&VariantId>,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Assign an initial background pair (and, typically, a name).
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn generate_background(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Re-derive both background slots from the given category filters.
    /// The adult slot is filled only when `adult_eligible` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn shuffle_background(
        &mut self,
        candidate: &mut CandidateEntity,
        filters: &[CategoryFilter],
        adult_eligible: bool,
    ) -> Result<(), GeneratorError>;

    /// Synthesize a display name for the candidate's current gender.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host generator fails.
    fn synthesize_name(
        &mut self,
        candidate: &CandidateEntity,
        variant: Option<&VariantId>,
        request: &GenerationRequest,
    ) -> Result<Name, GeneratorError>;

    /// Biological age (years) at which this candidate counts as an adult.
    /// Hosts with race-specific thresholds override this.
    fn adulthood_age(&self, candidate: &CandidateEntity, default_years: f32) -> f32 {
        let _ = candidate;
        default_years
    }
}

/// Candidate lifecycle and finalization hooks.
pub trait CandidateHost {
    /// Host context for the candidate in `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unavailable`] if the slot does not exist.
    fn generation_request(&self, index: usize) -> Result<GenerationRequest, HostError>;

    /// Hand out the candidate for `index`. Called at run start and again
    /// after a generator fault, in which case a fresh candidate is expected.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unavailable`] if no candidate can be produced.
    fn obtain(&mut self, index: usize) -> Result<CandidateEntity, HostError>;

    /// Take back a candidate that must not be used.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Discard`] if disposal fails.
    fn discard(&mut self, index: usize, candidate: CandidateEntity) -> Result<(), HostError>;

    /// Link relationships to other entities.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if linkage fails.
    fn link_relations(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Assign hair, beard, and tattoos.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if style synthesis fails. Such failures
    /// are logged and ignored by finalization.
    fn synthesize_style(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Assign clothing and equipment.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if redress fails.
    fn redress(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError>;

    /// Tell the host the candidate in `index` is finished.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the host rejects the notification.
    fn notify_generated(
        &mut self,
        index: usize,
        candidate: &CandidateEntity,
    ) -> Result<(), GeneratorError>;
}

/// Everything the scheduler needs from a host.
pub trait RerollHost: AttributeGenerators + CandidateHost {}

impl<T: AttributeGenerators + CandidateHost> RerollHost for T {}
