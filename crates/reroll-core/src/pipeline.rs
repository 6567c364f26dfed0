//! One rejection-sampling iteration.
//!
//! Stages run in a fixed order. A stage either advances or rejects; every
//! rejection ends the iteration and the next iteration starts again from
//! the top. Only genuine generator faults travel the `Err` path.
//!
//! 1. Background consistency (cache validation, restore, slot reconciliation)
//! 2. Gender
//! 3. Age
//! 4. Traits
//! 5. Skills (with the reshuffle escape heuristics)
//! 6. Work capability
//! 7. Health
//! 8. Passion and genetics reconciliation, then the aggregate check

use core::fmt;

use rand::Rng;
use rand::rngs::SmallRng;
use reroll_types::{
    Age, CandidateEntity, Gender, GenerationRequest, Genetics, IntRange, Passion, TICKS_PER_YEAR,
    WorkCapability,
};
use tracing::{debug, warn};

use crate::background;
use crate::config::{CacheMode, PipelineConfig};
use crate::error::GeneratorError;
use crate::forced::ForcedConstraints;
use crate::host::AttributeGenerators;
use crate::oracle;
use crate::session::CandidateSession;

/// Stage at which an iteration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The cached backgrounds were invalid and have been regenerated.
    Background,
    /// Gender predicate failed.
    Gender,
    /// Age predicate failed.
    Age,
    /// The drawn age fell outside the forced age range.
    ForcedAge,
    /// Trait predicate (or required-tag check) failed.
    Traits,
    /// Skill predicate failed.
    Skills,
    /// Work capability predicate failed.
    WorkCapability,
    /// No viable health outcome, or health predicate failed.
    Health,
    /// Aggregate check failed.
    Final,
}

impl Rejection {
    /// Lowercase stage name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::ForcedAge => "forced_age",
            Self::Traits => "traits",
            Self::Skills => "skills",
            Self::WorkCapability => "work_capability",
            Self::Health => "health",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run's candidate was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum AcceptanceKind {
    /// Every predicate held.
    Satisfied,
    /// The iteration ceiling was reached; best-effort candidate.
    CeilingReached,
    /// The caller ended the run before either of the above.
    Ended,
}

/// Result of one pipeline iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The candidate is accepted.
    Accepted(AcceptanceKind),
    /// The iteration was rejected at the given stage.
    Rejected(Rejection),
}

type StageResult = Result<Option<Rejection>, GeneratorError>;

/// The ordered stage sequence, parameterized by thresholds and forced
/// constraints. Holds no run state of its own.
#[derive(Debug, Clone, Copy)]
pub struct GenerationPipeline<'a> {
    config: &'a PipelineConfig,
    forced: &'a ForcedConstraints,
}

impl<'a> GenerationPipeline<'a> {
    /// Create a pipeline.
    pub const fn new(config: &'a PipelineConfig, forced: &'a ForcedConstraints) -> Self {
        Self { config, forced }
    }

    /// Run one iteration against the session's candidate.
    ///
    /// The iteration counter is incremented before any stage runs, so a
    /// faulted iteration still counts toward the ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if an external generator fails outside the
    /// health stage's own retry loop.
    pub fn run_iteration<H: AttributeGenerators + ?Sized>(
        &self,
        session: &mut CandidateSession,
        host: &mut H,
    ) -> Result<IterationOutcome, GeneratorError> {
        session.iteration = session.iteration.saturating_add(1);
        let outcome = self.run_stages(session, host)?;
        if let IterationOutcome::Rejected(rejection) = outcome {
            session.stats.record(rejection);
            debug!(
                run_id = %session.run_id,
                iteration = session.iteration,
                stage = %rejection,
                skill_streak = session.streaks.skill_failures,
                no_improvement = session.streaks.no_improvement,
                "Iteration rejected"
            );
        }
        Ok(outcome)
    }

    fn run_stages<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> Result<IterationOutcome, GeneratorError> {
        if let Some(r) = self.background_stage(s, host)? {
            return Ok(IterationOutcome::Rejected(r));
        }
        if let Some(r) = Self::gender_stage(s, host)? {
            return Ok(IterationOutcome::Rejected(r));
        }
        if let Some(r) = self.age_stage(s, host)? {
            return Ok(IterationOutcome::Rejected(r));
        }
        if let Some(r) = self.trait_stage(s, host)? {
            return Ok(IterationOutcome::Rejected(r));
        }
        if let Some(r) = self.skill_stage(s, host)? {
            return Ok(IterationOutcome::Rejected(r));
        }
        if let Some(r) = Self::work_stage(s) {
            return Ok(IterationOutcome::Rejected(r));
        }
        if let Some(r) = self.health_stage(s, host) {
            return Ok(IterationOutcome::Rejected(r));
        }
        Self::final_stage(s, host)
    }

    // -----------------------------------------------------------------------
    // Stage 1: background consistency
    // -----------------------------------------------------------------------

    fn background_stage<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> StageResult {
        if !s.background_ok(&s.cached_background) {
            host.generate_background(&mut s.candidate, &s.request)?;
            s.cached_background = s.candidate.background.clone();
            s.streaks.reset();
            s.stats.background_regenerations = s.stats.background_regenerations.saturating_add(1);
            return Ok(Some(Rejection::Background));
        }

        let live = &s.candidate.background;
        if *live != s.cached_background && (live.juvenile.is_none() || !s.background_ok(live)) {
            self.restore_background(s, host)?;
        }

        self.reconcile_slots(s, host)?;
        Ok(None)
    }

    /// Put a valid pair back on the candidate. In `Regenerate` mode a fresh
    /// shuffle is tried first and kept only if it passes the background
    /// predicate; otherwise the cached pair is restored. Restores never
    /// touch the streaks.
    fn restore_background<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> Result<(), GeneratorError> {
        if self.config.background_cache == CacheMode::Regenerate {
            Self::shuffle(s, host, "restore")?;
            let fresh = &s.candidate.background;
            let slots_ok = fresh.juvenile.is_some() && (!s.adult_eligible || fresh.adult.is_some());
            if slots_ok && s.recache_if_satisfied() {
                return Ok(());
            }
        }
        s.restore_cached_background();
        Ok(())
    }

    /// Make slot population agree with the adulthood flag.
    fn reconcile_slots<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> Result<(), GeneratorError> {
        let has_adult = s.candidate.background.adult.is_some();
        if s.adult_eligible && !has_adult {
            if s.cached_background.is_complete() {
                self.restore_background(s, host)?;
            } else {
                Self::reshuffle(s, host, "missing_adult_slot")?;
                if s.candidate.background.adult.is_some() {
                    s.recache_if_satisfied();
                }
            }
        } else if !s.adult_eligible && has_adult {
            s.candidate.background.adult = None;
        }
        Ok(())
    }

    /// Re-derive both slots from the stage-appropriate categories.
    fn shuffle<H: AttributeGenerators + ?Sized>(
        s: &mut CandidateSession,
        host: &mut H,
        reason: &'static str,
    ) -> Result<(), GeneratorError> {
        let filters = background::background_filters(&s.candidate, &s.request);
        host.shuffle_background(&mut s.candidate, &filters, s.adult_eligible)?;
        s.stats.reshuffles = s.stats.reshuffles.saturating_add(1);
        debug!(
            run_id = %s.run_id,
            iteration = s.iteration,
            reason,
            "Background reshuffled"
        );
        Ok(())
    }

    /// Escape-hatch reshuffle. A background change zeroes both streaks.
    fn reshuffle<H: AttributeGenerators + ?Sized>(
        s: &mut CandidateSession,
        host: &mut H,
        reason: &'static str,
    ) -> Result<(), GeneratorError> {
        Self::shuffle(s, host, reason)?;
        s.streaks.reset();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stage 2: gender
    // -----------------------------------------------------------------------

    fn gender_stage<H: AttributeGenerators + ?Sized>(
        s: &mut CandidateSession,
        host: &mut H,
    ) -> StageResult {
        let previous = s.candidate.gender;
        s.candidate.gender = derive_gender(&s.request, &mut s.rng);
        if s.candidate.gender != previous {
            s.assign_name(host)?;
        }

        if !oracle::gender_satisfied(&s.candidate, &s.filter) {
            s.streaks.reset();
            return Ok(Some(Rejection::Gender));
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Stage 3: age
    // -----------------------------------------------------------------------

    fn age_stage<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> StageResult {
        s.candidate.age = Age::default();
        match self.forced.age_range {
            Some(range) => {
                s.candidate.age = draw_age(&mut s.rng, range);
                let years = s.candidate.age.biological_years();
                if years < u64::from(range.min) || years > u64::from(range.max) {
                    warn!(
                        run_id = %s.run_id,
                        iteration = s.iteration,
                        biological_years = years,
                        chronological_years = s.candidate.age.chronological_years(),
                        min = range.min,
                        max = range.max,
                        "Generated age is outside the forced range"
                    );
                    return Ok(Some(Rejection::ForcedAge));
                }
            }
            None => host.generate_age(&mut s.candidate, &s.request)?,
        }

        s.refresh_adult_flag(host, self.config.adulthood_age_years);
        self.reconcile_slots(s, host)?;

        if !oracle::age_satisfied(&s.candidate, &s.filter) {
            s.streaks.skill_failures = 0;
            return Ok(Some(Rejection::Age));
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Stage 4: traits
    // -----------------------------------------------------------------------

    fn trait_stage<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> StageResult {
        s.candidate.traits.clear();
        host.generate_traits(&mut s.candidate, &s.request)?;
        self.forced.apply_traits(&mut s.candidate);

        if !oracle::traits_satisfied_with_required(&s.candidate, &s.filter, s.required_tags) {
            s.streaks.skill_failures = 0;
            return Ok(Some(Rejection::Traits));
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Stage 5: skills
    // -----------------------------------------------------------------------

    fn skill_stage<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> StageResult {
        s.candidate.skills.clear();
        host.generate_skills(&mut s.candidate, &s.request)?;
        if oracle::skills_satisfied(&s.candidate, &s.filter) {
            return Ok(None);
        }

        s.streaks.skill_failures = s.streaks.skill_failures.saturating_add(1);
        if s.streaks.skill_failures > self.config.skill_failure_reshuffle {
            Self::reshuffle(s, host, "skill_streak")?;
            return Ok(Some(Rejection::Skills));
        }

        // The conflict reshuffle runs first; the no-gain check then sees
        // whichever pair is live afterwards.
        if background_defeats_skills(s) {
            Self::reshuffle(s, host, "background_conflict")?;
            s.recache_if_satisfied();
        }
        if backgrounds_offer_no_gain(s) {
            s.streaks.no_improvement = s.streaks.no_improvement.saturating_add(1);
            if s.streaks.no_improvement >= self.config.no_improvement_reshuffle {
                Self::reshuffle(s, host, "no_improvement")?;
                s.recache_if_satisfied();
            }
        }
        Ok(Some(Rejection::Skills))
    }

    // -----------------------------------------------------------------------
    // Stage 6: work capability
    // -----------------------------------------------------------------------

    fn work_stage(s: &mut CandidateSession) -> Option<Rejection> {
        s.candidate.work = WorkCapability {
            disabled: s.candidate.disabled_work_tags(),
            derived: true,
        };
        if !oracle::work_capability_satisfied(&s.candidate, s.filter.work_capability_policy) {
            s.streaks.skill_failures = 0;
            return Some(Rejection::WorkCapability);
        }
        None
    }

    // -----------------------------------------------------------------------
    // Stage 7: health
    // -----------------------------------------------------------------------

    fn health_stage<H: AttributeGenerators + ?Sized>(
        &self,
        s: &mut CandidateSession,
        host: &mut H,
    ) -> Option<Rejection> {
        let mut viable = false;
        for attempt in 1..=self.config.health_attempts {
            s.candidate.health.clear();
            match host.generate_health(&mut s.candidate, &s.request) {
                Ok(result) => viable = result,
                Err(err) => {
                    s.stats.absorbed_health_faults =
                        s.stats.absorbed_health_faults.saturating_add(1);
                    debug!(run_id = %s.run_id, attempt, error = %err, "Health attempt faulted");
                }
            }
            if viable {
                break;
            }
        }
        self.forced.apply_conditions(&mut s.candidate);

        if !viable || !oracle::health_satisfied(&s.candidate, s.filter.health_policy) {
            s.streaks.skill_failures = 0;
            return Some(Rejection::Health);
        }
        None
    }

    // -----------------------------------------------------------------------
    // Stage 8: passion and genetics reconciliation, aggregate check
    // -----------------------------------------------------------------------

    fn final_stage<H: AttributeGenerators + ?Sized>(
        s: &mut CandidateSession,
        host: &mut H,
    ) -> Result<IterationOutcome, GeneratorError> {
        reconcile_passions(&mut s.candidate);

        s.candidate.genetics = Genetics {
            variant: s.request.variant.clone(),
            genes: Vec::new(),
        };
        host.generate_genetics(&mut s.candidate, s.request.variant.as_ref(), &s.request)?;

        if oracle::satisfies_all(&s.candidate, &s.filter) {
            return Ok(IterationOutcome::Accepted(AcceptanceKind::Satisfied));
        }
        if oracle::all_satisfied(&s.candidate, &s.filter, s.iteration, s.limit) {
            return Ok(IterationOutcome::Accepted(AcceptanceKind::CeilingReached));
        }
        s.streaks.skill_failures = 0;
        Ok(IterationOutcome::Rejected(Rejection::Final))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Gender from the request, then the entity kind, then the race, else a
/// fair coin.
pub fn derive_gender(request: &GenerationRequest, rng: &mut SmallRng) -> Gender {
    if let Some(gender) = request.fixed_gender.or(request.kind.default_gender) {
        return gender;
    }
    if !request.race.has_genders {
        return Gender::None;
    }
    match request.race.forced_gender {
        Some(gender) if gender != Gender::None => gender,
        _ if rng.random_bool(0.5) => Gender::Female,
        _ => Gender::Male,
    }
}

/// Uniform age inside `range` (whole years, upper bound exclusive at tick
/// resolution). An empty or inverted range yields its minimum.
pub fn draw_age(rng: &mut SmallRng, range: IntRange) -> Age {
    let min_ticks = u64::from(range.min).saturating_mul(TICKS_PER_YEAR);
    let max_ticks = u64::from(range.max).saturating_mul(TICKS_PER_YEAR);
    let ticks = if min_ticks < max_ticks {
        rng.random_range(min_ticks..max_ticks)
    } else {
        min_ticks
    };
    Age::from_ticks(ticks)
}

/// Promote passions demanded by traits, then zero every skill the
/// candidate is disabled from.
pub fn reconcile_passions(candidate: &mut CandidateEntity) {
    let disabled = candidate.disabled_work_tags();
    let traits = &candidate.traits;
    for record in &mut candidate.skills {
        if record.passion == Passion::None
            && traits.iter().any(|t| t.requires_passion(&record.skill))
        {
            record.passion = if traits.iter().any(|t| t.forces_major_passion(&record.skill)) {
                Passion::Major
            } else {
                Passion::Minor
            };
        }
        if record.is_disabled(disabled) {
            record.passion = Passion::None;
            record.level = 0;
        }
    }
}

/// Whether some active constraint is defeated by the current backgrounds:
/// its skill is disabled, or either entry carries a negative gain for it.
fn background_defeats_skills(s: &CandidateSession) -> bool {
    let disabled = s.candidate.disabled_work_tags();
    let pair = &s.candidate.background;
    s.filter.active_skill_constraints().any(|constraint| {
        let Some(record) = s.candidate.skill(&constraint.skill.id) else {
            return false;
        };
        record.is_disabled(disabled)
            || pair
                .entries()
                .any(|bg| bg.gain_for(&constraint.skill.id) < 0)
    })
}

/// Whether no active constraint can gain from either current background.
/// False when no constraint is active.
fn backgrounds_offer_no_gain(s: &CandidateSession) -> bool {
    let pair = &s.candidate.background;
    let mut active = s.filter.active_skill_constraints().peekable();
    active.peek().is_some()
        && active.all(|constraint| {
            !pair
                .entries()
                .any(|bg| bg.gain_for(&constraint.skill.id) > 0)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use reroll_types::{
        Background, BackgroundPair, BackgroundSlot, FilterSpecification, RaceProfile, SkillDef,
        SkillRecord, TraitDef, WorkTags,
    };

    use super::*;

    #[test]
    fn gender_precedence() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut request = GenerationRequest::default();
        request.race = RaceProfile {
            has_genders: true,
            forced_gender: Some(Gender::Male),
        };
        assert_eq!(derive_gender(&request, &mut rng), Gender::Male);

        request.kind.default_gender = Some(Gender::Female);
        assert_eq!(derive_gender(&request, &mut rng), Gender::Female);

        request.fixed_gender = Some(Gender::Male);
        assert_eq!(derive_gender(&request, &mut rng), Gender::Male);
    }

    #[test]
    fn genderless_race() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut request = GenerationRequest::default();
        request.race.has_genders = false;
        assert_eq!(derive_gender(&request, &mut rng), Gender::None);
    }

    #[test]
    fn coin_flip_yields_both_genders() {
        let mut rng = SmallRng::seed_from_u64(99);
        let request = GenerationRequest::default();
        let draws: Vec<Gender> = (0..64).map(|_| derive_gender(&request, &mut rng)).collect();
        assert!(draws.contains(&Gender::Male));
        assert!(draws.contains(&Gender::Female));
        assert!(!draws.contains(&Gender::None));
    }

    #[test]
    fn drawn_age_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..200 {
            let years = draw_age(&mut rng, IntRange::new(18, 30)).biological_years();
            assert!((18..30).contains(&years));
        }
        assert_eq!(
            draw_age(&mut rng, IntRange::new(40, 20)).biological_years(),
            40
        );
    }

    #[test]
    fn passions_promoted_then_disabled_zeroed() {
        let mut candidate = CandidateEntity::new();
        let mut brawler = TraitDef::new("Brawler");
        brawler.forced_passion_skills.push("Melee".into());
        let mut artist = TraitDef::new("Creative");
        artist.passion_skills.push("Artistic".into());
        candidate.traits.push(brawler);
        candidate.traits.push(artist);
        candidate
            .traits
            .push(TraitDef::new("Pacifist").with_disabled_tags(WorkTags::VIOLENT));
        candidate.skills.push(SkillRecord::new("Artistic", 5, Passion::None));
        candidate.skills.push(
            SkillRecord::for_def(
                &SkillDef::new("Melee").with_disabling_tags(WorkTags::VIOLENT),
                9,
                Passion::None,
            ),
        );
        candidate.skills.push(SkillRecord::new("Cooking", 3, Passion::Minor));

        reconcile_passions(&mut candidate);

        let artistic = candidate.skill(&"Artistic".into()).unwrap();
        assert_eq!(artistic.passion, Passion::Minor);
        let melee = candidate.skill(&"Melee".into()).unwrap();
        assert_eq!((melee.level, melee.passion), (0, Passion::None));
        let cooking = candidate.skill(&"Cooking".into()).unwrap();
        assert_eq!(cooking.passion, Passion::Minor);
    }

    #[test]
    fn forced_major_passion() {
        let mut candidate = CandidateEntity::new();
        let mut brawler = TraitDef::new("Brawler");
        brawler.forced_passion_skills.push("Melee".into());
        candidate.traits.push(brawler);
        candidate.skills.push(SkillRecord::new("Melee", 6, Passion::None));
        reconcile_passions(&mut candidate);
        assert_eq!(
            candidate.skill(&"Melee".into()).unwrap().passion,
            Passion::Major
        );
    }

    fn session_with_background(pair: BackgroundPair) -> CandidateSession {
        let mut filter = FilterSpecification::default();
        filter.skills.push(reroll_types::SkillConstraint::new(
            SkillDef::new("Shooting").with_disabling_tags(WorkTags::VIOLENT),
            8,
            Passion::None,
        ));
        let mut candidate = CandidateEntity::new();
        candidate.background = pair;
        candidate
            .skills
            .push(SkillRecord::new("Shooting", 2, Passion::None));
        CandidateSession::new(
            0,
            100,
            candidate,
            GenerationRequest::default(),
            &filter,
            SmallRng::seed_from_u64(3),
        )
    }

    #[test]
    fn negative_gain_is_background_attributable() {
        let session = session_with_background(BackgroundPair::new(
            Some(Background::new("scared_kid", BackgroundSlot::Juvenile).with_gain("Shooting", -3)),
            None,
        ));
        assert!(background_defeats_skills(&session));
        assert!(backgrounds_offer_no_gain(&session));
    }

    #[test]
    fn positive_gain_counts_as_improvement() {
        let session = session_with_background(BackgroundPair::new(
            Some(Background::new("hunter_kid", BackgroundSlot::Juvenile).with_gain("Shooting", 4)),
            None,
        ));
        assert!(!background_defeats_skills(&session));
        assert!(!backgrounds_offer_no_gain(&session));
    }

    #[test]
    fn rejection_names() {
        assert_eq!(Rejection::WorkCapability.to_string(), "work_capability");
        assert_eq!(Rejection::ForcedAge.as_str(), "forced_age");
    }
}
