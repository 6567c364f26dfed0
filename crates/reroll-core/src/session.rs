//! Run-scoped state: the live candidate, its caches, and its counters.
//!
//! A [`CandidateSession`] exists only while a run is in progress. It owns
//! the candidate exclusively; the pipeline mutates it through `&mut` and the
//! scheduler hands it back to the host when the run ends.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use reroll_types::{
    BackgroundPair, CandidateEntity, FilterSpecification, Gender, GenerationRequest, Name, RunId,
    VariantId, WorkTags,
};
use serde::Serialize;

use crate::background;
use crate::error::GeneratorError;
use crate::host::AttributeGenerators;
use crate::oracle;
use crate::pipeline::Rejection;

/// Consecutive-failure counters that drive background reshuffles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureStreaks {
    /// Consecutive skill rejections since the last background change or
    /// non-skill rejection.
    pub skill_failures: u32,
    /// Skill rejections for which no active constraint could gain from the
    /// current backgrounds, since the last background change.
    pub no_improvement: u32,
}

impl FailureStreaks {
    /// Zero both counters.
    pub const fn reset(&mut self) {
        self.skill_failures = 0;
        self.no_improvement = 0;
    }
}

/// Counters collected over one run and logged when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Rejections because the cached backgrounds were invalid.
    pub background_rejections: u32,
    /// Gender rejections.
    pub gender_rejections: u32,
    /// Age rejections, forced-range mismatches included.
    pub age_rejections: u32,
    /// Trait rejections.
    pub trait_rejections: u32,
    /// Skill rejections.
    pub skill_rejections: u32,
    /// Work capability rejections.
    pub work_rejections: u32,
    /// Health rejections.
    pub health_rejections: u32,
    /// Final aggregate rejections.
    pub final_rejections: u32,
    /// Fresh background pairs from the background generator.
    pub background_regenerations: u32,
    /// Background reshuffles, whatever triggered them.
    pub reshuffles: u32,
    /// Restores of the cached background pair.
    pub cache_restores: u32,
    /// Health generator faults absorbed as non-viable attempts.
    pub absorbed_health_faults: u32,
    /// Generator faults recovered by replacing the candidate.
    pub recovered_faults: u32,
}

impl RunStats {
    /// Count one rejection.
    pub const fn record(&mut self, rejection: Rejection) {
        let counter = match rejection {
            Rejection::Background => &mut self.background_rejections,
            Rejection::Gender => &mut self.gender_rejections,
            Rejection::Age | Rejection::ForcedAge => &mut self.age_rejections,
            Rejection::Traits => &mut self.trait_rejections,
            Rejection::Skills => &mut self.skill_rejections,
            Rejection::WorkCapability => &mut self.work_rejections,
            Rejection::Health => &mut self.health_rejections,
            Rejection::Final => &mut self.final_rejections,
        };
        *counter = counter.saturating_add(1);
    }

    /// Total rejections across all stages.
    pub const fn total_rejections(&self) -> u32 {
        self.background_rejections
            .saturating_add(self.gender_rejections)
            .saturating_add(self.age_rejections)
            .saturating_add(self.trait_rejections)
            .saturating_add(self.skill_rejections)
            .saturating_add(self.work_rejections)
            .saturating_add(self.health_rejections)
            .saturating_add(self.final_rejections)
    }
}

/// Key of the name cache.
type NameKey = (Option<VariantId>, Gender);

/// The live candidate plus everything scoped to one run.
#[derive(Debug)]
pub struct CandidateSession {
    pub(crate) run_id: RunId,
    pub(crate) index: usize,
    pub(crate) limit: u32,
    pub(crate) candidate: CandidateEntity,
    pub(crate) request: GenerationRequest,
    pub(crate) filter: FilterSpecification,
    pub(crate) required_tags: WorkTags,
    pub(crate) cached_background: BackgroundPair,
    pub(crate) names: BTreeMap<NameKey, Name>,
    pub(crate) streaks: FailureStreaks,
    pub(crate) iteration: u32,
    pub(crate) adult_eligible: bool,
    pub(crate) rng: SmallRng,
    pub(crate) stats: RunStats,
}

impl CandidateSession {
    /// Create a session around a freshly obtained candidate. The filter is
    /// snapshotted; its iteration limit is replaced by `limit`.
    pub fn new(
        index: usize,
        limit: u32,
        candidate: CandidateEntity,
        request: GenerationRequest,
        filter: &FilterSpecification,
        rng: SmallRng,
    ) -> Self {
        let filter = filter.clone().with_iteration_limit(limit);
        Self {
            run_id: RunId::new(),
            index,
            limit,
            candidate,
            request,
            required_tags: filter.required_work_tags(),
            filter,
            cached_background: BackgroundPair::default(),
            names: BTreeMap::new(),
            streaks: FailureStreaks::default(),
            iteration: 0,
            adult_eligible: false,
            rng,
            stats: RunStats::default(),
        }
    }

    /// One-shot setup before the first iteration: clear previously
    /// generated state, synthesize the initial background (and a name if
    /// the host did not assign one), seed both caches, and compute the
    /// adulthood flag.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if background or name generation fails.
    pub fn setup<H: AttributeGenerators + ?Sized>(
        &mut self,
        host: &mut H,
        adulthood_default: f32,
    ) -> Result<(), GeneratorError> {
        self.candidate.reset_generated_state();
        host.generate_background(&mut self.candidate, &self.request)?;
        if self.candidate.name.is_none() {
            let name =
                host.synthesize_name(&self.candidate, self.request.variant.as_ref(), &self.request)?;
            self.candidate.name = Some(name);
        }
        if let Some(name) = &self.candidate.name {
            self.names
                .insert((self.request.variant.clone(), self.candidate.gender), name.clone());
        }
        self.cached_background = self.candidate.background.clone();
        self.refresh_adult_flag(host, adulthood_default);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Observables
    // -----------------------------------------------------------------------

    /// Identifier of this run.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Target slot index.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Iteration ceiling.
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Iterations started so far.
    pub const fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Whether the ceiling has been reached.
    pub const fn ceiling_reached(&self) -> bool {
        self.iteration >= self.limit
    }

    /// The live candidate.
    pub const fn candidate(&self) -> &CandidateEntity {
        &self.candidate
    }

    /// Host context for the candidate.
    pub const fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// The filter snapshot.
    pub const fn filter(&self) -> &FilterSpecification {
        &self.filter
    }

    /// Work tags the filter needs enabled.
    pub const fn required_tags(&self) -> WorkTags {
        self.required_tags
    }

    /// The last background pair accepted at background level.
    pub const fn cached_background(&self) -> &BackgroundPair {
        &self.cached_background
    }

    /// Current failure streaks.
    pub const fn streaks(&self) -> FailureStreaks {
        self.streaks
    }

    /// Whether the candidate's age places it past the adulthood threshold.
    pub const fn adult_eligible(&self) -> bool {
        self.adult_eligible
    }

    /// Counters collected so far.
    pub const fn stats(&self) -> RunStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Mutation helpers used by the pipeline and scheduler
    // -----------------------------------------------------------------------

    pub(crate) fn refresh_adult_flag<H: AttributeGenerators + ?Sized>(
        &mut self,
        host: &H,
        adulthood_default: f32,
    ) {
        let threshold = host.adulthood_age(&self.candidate, adulthood_default);
        self.adult_eligible = background::is_adult(&self.candidate, threshold);
    }

    /// Whether `pair` passes the background predicate for this run.
    pub(crate) fn background_ok(&self, pair: &BackgroundPair) -> bool {
        oracle::background_satisfied(pair, self.required_tags, self.filter.work_capability_policy)
    }

    /// Cache the live pair if it passes the background predicate.
    pub(crate) fn recache_if_satisfied(&mut self) -> bool {
        let ok = self.background_ok(&self.candidate.background);
        if ok {
            self.cached_background = self.candidate.background.clone();
        }
        ok
    }

    /// Restore the cached pair onto the live candidate.
    pub(crate) fn restore_cached_background(&mut self) {
        self.candidate.background = self.cached_background.clone();
        self.stats.cache_restores = self.stats.cache_restores.saturating_add(1);
    }

    /// Assign the cached name for the current gender, synthesizing and
    /// caching one on a miss.
    pub(crate) fn assign_name<H: AttributeGenerators + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Result<(), GeneratorError> {
        let key = (self.request.variant.clone(), self.candidate.gender);
        if let Some(name) = self.names.get(&key) {
            self.candidate.name = Some(name.clone());
            return Ok(());
        }
        let name =
            host.synthesize_name(&self.candidate, self.request.variant.as_ref(), &self.request)?;
        self.names.insert(key, name.clone());
        self.candidate.name = Some(name);
        Ok(())
    }

    /// Move the live candidate out, leaving an empty one in its place.
    pub(crate) fn take_candidate(&mut self) -> CandidateEntity {
        core::mem::take(&mut self.candidate)
    }

    /// Install a fresh candidate after a fault, carrying over the cached
    /// backgrounds and name.
    pub(crate) fn adopt(&mut self, mut fresh: CandidateEntity) {
        fresh.reset_generated_state();
        fresh.background = self.cached_background.clone();
        let key = (self.request.variant.clone(), fresh.gender);
        if let Some(name) = self.names.get(&key) {
            fresh.name = Some(name.clone());
        }
        self.candidate = fresh;
    }

    /// Take the candidate out of the session.
    pub(crate) fn into_candidate(self) -> CandidateEntity {
        self.candidate
    }
}
