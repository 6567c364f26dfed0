//! Acceptance predicates.
//!
//! Every predicate is pure with respect to the candidate and the filter.
//! The pipeline calls them stage by stage; [`all_satisfied`] is the
//! aggregate used as the final gate and degrades to "accept" once the
//! iteration ceiling is reached.

use reroll_types::{
    AGE_MAX_DEFAULT, AggregationMode, BackgroundPair, CandidateEntity, ConditionKind,
    FilterSpecification, HealthPolicy, Passion, STARTING_CONDITIONS, SkillRecord, TraitMode,
    WorkCapabilityPolicy, WorkTags,
};

// ---------------------------------------------------------------------------
// Per-category predicates
// ---------------------------------------------------------------------------

/// True iff the filter leaves gender open or the candidate matches it.
pub fn gender_satisfied(candidate: &CandidateEntity, filter: &FilterSpecification) -> bool {
    filter.gender.is_none_or(|gender| candidate.gender == gender)
}

/// True iff the age range is the unconstrained sentinel or the biological
/// age in whole years lies inside it. A maximum at the sentinel value means
/// no upper bound.
pub fn age_satisfied(candidate: &CandidateEntity, filter: &FilterSpecification) -> bool {
    if filter.age_unconstrained() {
        return true;
    }
    let years = candidate.age.biological_years();
    let range = filter.age_range;
    u64::from(range.min) <= years && (range.max == AGE_MAX_DEFAULT || years <= u64::from(range.max))
}

/// True iff the pair's disabled tags leave every `required` tag enabled
/// and the policy tolerates what the pair does disable.
pub fn background_satisfied(
    pair: &BackgroundPair,
    required: WorkTags,
    policy: WorkCapabilityPolicy,
) -> bool {
    let disabled = pair.disabled_tags();
    !disabled.intersects(required) && policy_allows(disabled, policy)
}

/// True iff every active skill constraint is met and both aggregate ranges
/// (when narrowed from their defaults) hold.
pub fn skills_satisfied(candidate: &CandidateEntity, filter: &FilterSpecification) -> bool {
    let disabled = candidate.disabled_work_tags();

    for constraint in filter.active_skill_constraints() {
        let Some(record) = candidate.skill(&constraint.skill.id) else {
            return false;
        };
        if record.level < constraint.min_level
            || effective_passion(record, disabled) < constraint.min_passion
        {
            return false;
        }
    }

    if filter.passion_range_active() {
        let count = candidate
            .skills
            .iter()
            .filter(|r| effective_passion(r, disabled) > Passion::None)
            .count();
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        if !filter.passion_range.contains(count) {
            return false;
        }
    }

    if filter.skill_range_active() {
        let total = aggregate_level(&candidate.skills, filter.aggregation, disabled);
        if !filter.skill_range.contains(total) {
            return false;
        }
    }

    true
}

/// True iff every `Required` trait is present, every `Excluded` trait is
/// absent, and at least `required_optional_count` `Optional` traits are
/// present.
pub fn traits_satisfied(candidate: &CandidateEntity, filter: &FilterSpecification) -> bool {
    let mut optional_present: u32 = 0;
    for constraint in &filter.traits {
        let present = candidate.has_trait(&constraint.trait_def);
        match constraint.mode {
            TraitMode::Required if !present => return false,
            TraitMode::Excluded if present => return false,
            TraitMode::Optional if present => {
                optional_present = optional_present.saturating_add(1);
            }
            _ => {}
        }
    }
    optional_present >= filter.required_optional_count
}

/// [`traits_satisfied`], additionally rejecting a candidate whose
/// backgrounds and traits disable any `required` tag.
pub fn traits_satisfied_with_required(
    candidate: &CandidateEntity,
    filter: &FilterSpecification,
    required: WorkTags,
) -> bool {
    !candidate.disabled_work_tags().intersects(required) && traits_satisfied(candidate, filter)
}

/// True iff no condition violates the policy. Genetically linked
/// conditions are never grounds for rejection.
pub fn health_satisfied(candidate: &CandidateEntity, policy: HealthPolicy) -> bool {
    candidate
        .health
        .iter()
        .filter(|condition| !condition.genetic_link)
        .all(|condition| match policy {
            HealthPolicy::AllowAll => true,
            HealthPolicy::OnlyStartingCondition => {
                STARTING_CONDITIONS.contains(&condition.name.as_str())
            }
            HealthPolicy::NoPain => !condition.causes_pain(),
            HealthPolicy::NoAddiction => condition.kind != ConditionKind::Addiction,
            HealthPolicy::AllowNone => false,
        })
}

/// True iff the policy tolerates the candidate's derived disabled tags.
pub fn work_capability_satisfied(candidate: &CandidateEntity, policy: WorkCapabilityPolicy) -> bool {
    policy_allows(derived_disabled(candidate), policy)
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Result of every per-candidate predicate, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Verdict {
    /// [`gender_satisfied`].
    pub gender: bool,
    /// [`age_satisfied`].
    pub age: bool,
    /// [`background_satisfied`] for the live pair, the filter's required
    /// tags and its work capability policy.
    pub background: bool,
    /// [`skills_satisfied`].
    pub skills: bool,
    /// [`traits_satisfied`].
    pub traits: bool,
    /// [`health_satisfied`].
    pub health: bool,
    /// [`work_capability_satisfied`].
    pub work: bool,
}

impl Verdict {
    /// Whether every predicate holds.
    pub const fn all(&self) -> bool {
        self.gender
            && self.age
            && self.background
            && self.skills
            && self.traits
            && self.health
            && self.work
    }
}

/// Evaluate every per-candidate predicate.
pub fn evaluate(candidate: &CandidateEntity, filter: &FilterSpecification) -> Verdict {
    Verdict {
        gender: gender_satisfied(candidate, filter),
        age: age_satisfied(candidate, filter),
        background: background_satisfied(
            &candidate.background,
            filter.required_work_tags(),
            filter.work_capability_policy,
        ),
        skills: skills_satisfied(candidate, filter),
        traits: traits_satisfied(candidate, filter),
        health: health_satisfied(candidate, filter.health_policy),
        work: work_capability_satisfied(candidate, filter.work_capability_policy),
    }
}

/// True iff every per-candidate predicate holds, ignoring the ceiling.
pub fn satisfies_all(candidate: &CandidateEntity, filter: &FilterSpecification) -> bool {
    evaluate(candidate, filter).all()
}

/// True iff the ceiling has been reached or [`satisfies_all`] holds.
pub fn all_satisfied(
    candidate: &CandidateEntity,
    filter: &FilterSpecification,
    iteration: u32,
    limit: u32,
) -> bool {
    iteration >= limit || satisfies_all(candidate, filter)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Passion as it counts for acceptance: `None` for a disabled skill.
pub fn effective_passion(record: &SkillRecord, disabled: WorkTags) -> Passion {
    if record.is_disabled(disabled) {
        Passion::None
    } else {
        record.passion
    }
}

/// Aggregate skill level per the selected mode.
pub fn aggregate_level(records: &[SkillRecord], mode: AggregationMode, disabled: WorkTags) -> u32 {
    match mode {
        AggregationMode::SumAll => records
            .iter()
            .fold(0_u32, |acc, r| acc.saturating_add(r.level)),
        AggregationMode::SumPassionate => records
            .iter()
            .filter(|r| effective_passion(r, disabled) > Passion::None)
            .fold(0_u32, |acc, r| acc.saturating_add(r.level)),
        // The larger of the two highest levels is the highest level.
        AggregationMode::MaxOfTopTwo => records.iter().map(|r| r.level).max().unwrap_or(0),
    }
}

fn policy_allows(disabled: WorkTags, policy: WorkCapabilityPolicy) -> bool {
    match policy {
        WorkCapabilityPolicy::AllowAll => true,
        WorkCapabilityPolicy::NoHeavyLaborDisabled => !disabled.intersects(WorkTags::HEAVY_LABOR),
        WorkCapabilityPolicy::AllowNoDisabled => disabled.is_empty(),
    }
}

fn derived_disabled(candidate: &CandidateEntity) -> WorkTags {
    if candidate.work.derived {
        candidate.work.disabled
    } else {
        candidate.disabled_work_tags()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reroll_types::{
        Age, Background, BackgroundSlot, Gender, HealthCondition, IntRange, SkillConstraint,
        SkillDef, TraitConstraint, TraitDef,
    };

    use super::*;

    fn shooting() -> SkillDef {
        SkillDef::new("Shooting")
            .with_disabling_tags(WorkTags::VIOLENT)
            .with_work_tags(WorkTags::VIOLENT)
    }

    fn shooter(level: u32, passion: Passion) -> CandidateEntity {
        let mut candidate = CandidateEntity::new();
        candidate
            .skills
            .push(SkillRecord::for_def(&shooting(), level, passion));
        candidate
            .skills
            .push(SkillRecord::new("Cooking", 4, Passion::Minor));
        candidate
    }

    fn shooting_filter(min_level: u32, min_passion: Passion) -> FilterSpecification {
        let mut filter = FilterSpecification::default();
        filter
            .skills
            .push(SkillConstraint::new(shooting(), min_level, min_passion));
        filter
    }

    #[test]
    fn gender_open_or_exact() {
        let mut candidate = CandidateEntity::new();
        candidate.gender = Gender::Male;
        let mut filter = FilterSpecification::default();
        assert!(gender_satisfied(&candidate, &filter));
        filter.gender = Some(Gender::Female);
        assert!(!gender_satisfied(&candidate, &filter));
        filter.gender = Some(Gender::Male);
        assert!(gender_satisfied(&candidate, &filter));
    }

    #[test]
    fn age_sentinel_max_is_unbounded() {
        let mut candidate = CandidateEntity::new();
        candidate.age = Age::from_years(140);
        let mut filter = FilterSpecification::default();
        assert!(age_satisfied(&candidate, &filter));

        filter.age_range = IntRange::new(30, AGE_MAX_DEFAULT);
        assert!(age_satisfied(&candidate, &filter));

        filter.age_range = IntRange::new(30, 60);
        assert!(!age_satisfied(&candidate, &filter));

        candidate.age = Age::from_years(60);
        assert!(age_satisfied(&candidate, &filter));
        candidate.age = Age::from_years(29);
        assert!(!age_satisfied(&candidate, &filter));
    }

    #[test]
    fn background_required_tags_always_reject() {
        let pair = BackgroundPair::new(
            Some(
                Background::new("pacifist_child", BackgroundSlot::Juvenile)
                    .with_disabled_tags(WorkTags::VIOLENT),
            ),
            None,
        );
        assert!(!background_satisfied(
            &pair,
            WorkTags::VIOLENT,
            WorkCapabilityPolicy::AllowAll
        ));
        assert!(background_satisfied(
            &pair,
            WorkTags::CARING,
            WorkCapabilityPolicy::AllowAll
        ));
        assert!(background_satisfied(
            &pair,
            WorkTags::CARING,
            WorkCapabilityPolicy::NoHeavyLaborDisabled
        ));
        assert!(!background_satisfied(
            &pair,
            WorkTags::NONE,
            WorkCapabilityPolicy::AllowNoDisabled
        ));
    }

    #[test]
    fn background_heavy_labor_policy() {
        let pair = BackgroundPair::new(
            None,
            Some(
                Background::new("noble", BackgroundSlot::Adult)
                    .with_disabled_tags(WorkTags::MANUAL_DUMB),
            ),
        );
        assert!(!background_satisfied(
            &pair,
            WorkTags::NONE,
            WorkCapabilityPolicy::NoHeavyLaborDisabled
        ));
        assert!(background_satisfied(
            &pair,
            WorkTags::NONE,
            WorkCapabilityPolicy::AllowAll
        ));
    }

    #[test]
    fn skill_constraint_level_and_passion() {
        let filter = shooting_filter(8, Passion::Major);
        assert!(skills_satisfied(&shooter(8, Passion::Major), &filter));
        assert!(!skills_satisfied(&shooter(7, Passion::Major), &filter));
        assert!(!skills_satisfied(&shooter(12, Passion::Minor), &filter));
    }

    #[test]
    fn missing_record_fails_active_constraint() {
        let filter = shooting_filter(1, Passion::None);
        assert!(!skills_satisfied(&CandidateEntity::new(), &filter));
        assert!(skills_satisfied(
            &CandidateEntity::new(),
            &FilterSpecification::default()
        ));
    }

    #[test]
    fn disabled_skill_has_no_effective_passion() {
        let filter = shooting_filter(0, Passion::Minor);
        let mut candidate = shooter(10, Passion::Major);
        assert!(skills_satisfied(&candidate, &filter));
        candidate
            .traits
            .push(TraitDef::new("Pacifist").with_disabled_tags(WorkTags::VIOLENT));
        assert!(!skills_satisfied(&candidate, &filter));
    }

    #[test]
    fn passion_count_range() {
        let mut filter = FilterSpecification::default();
        filter.passion_range = IntRange::new(2, 12);
        assert!(skills_satisfied(&shooter(3, Passion::Minor), &filter));
        assert!(!skills_satisfied(&shooter(3, Passion::None), &filter));
    }

    #[test]
    fn aggregation_modes() {
        let records = vec![
            SkillRecord::new("A", 10, Passion::None),
            SkillRecord::new("B", 6, Passion::Minor),
            SkillRecord::new("C", 3, Passion::Major),
        ];
        assert_eq!(
            aggregate_level(&records, AggregationMode::SumAll, WorkTags::NONE),
            19
        );
        assert_eq!(
            aggregate_level(&records, AggregationMode::SumPassionate, WorkTags::NONE),
            9
        );
        assert_eq!(
            aggregate_level(&records, AggregationMode::MaxOfTopTwo, WorkTags::NONE),
            10
        );
        assert_eq!(
            aggregate_level(&[], AggregationMode::MaxOfTopTwo, WorkTags::NONE),
            0
        );
    }

    #[test]
    fn skill_sum_range() {
        let mut filter = FilterSpecification::default();
        filter.skill_range = IntRange::new(0, 10);
        assert!(!skills_satisfied(&shooter(8, Passion::None), &filter));
        assert!(skills_satisfied(&shooter(5, Passion::None), &filter));
    }

    #[test]
    fn trait_modes_and_optional_count() {
        let mut filter = FilterSpecification::default();
        filter
            .traits
            .push(TraitConstraint::new(TraitDef::new("Tough"), TraitMode::Required));
        filter
            .traits
            .push(TraitConstraint::new(TraitDef::new("Wimp"), TraitMode::Excluded));
        filter
            .traits
            .push(TraitConstraint::new(TraitDef::new("Kind"), TraitMode::Optional));
        filter.traits.push(TraitConstraint::new(
            TraitDef::new("Industrious"),
            TraitMode::Optional,
        ));
        filter.required_optional_count = 1;

        let mut candidate = CandidateEntity::new();
        candidate.traits.push(TraitDef::new("Tough"));
        assert!(!traits_satisfied(&candidate, &filter));

        candidate.traits.push(TraitDef::new("Kind"));
        assert!(traits_satisfied(&candidate, &filter));

        candidate.traits.push(TraitDef::new("Wimp"));
        assert!(!traits_satisfied(&candidate, &filter));
    }

    #[test]
    fn required_tags_gate_trait_stage() {
        let filter = FilterSpecification::default();
        let mut candidate = CandidateEntity::new();
        candidate
            .traits
            .push(TraitDef::new("Pacifist").with_disabled_tags(WorkTags::VIOLENT));
        assert!(traits_satisfied(&candidate, &filter));
        assert!(!traits_satisfied_with_required(
            &candidate,
            &filter,
            WorkTags::VIOLENT
        ));
    }

    #[test]
    fn health_policies() {
        let mut candidate = CandidateEntity::new();
        candidate
            .health
            .push(HealthCondition::new("Malnutrition", ConditionKind::Other));
        assert!(health_satisfied(
            &candidate,
            HealthPolicy::OnlyStartingCondition
        ));
        assert!(!health_satisfied(&candidate, HealthPolicy::AllowNone));

        candidate
            .health
            .push(HealthCondition::new("Bad back", ConditionKind::Chronic).with_pain(0.2));
        assert!(!health_satisfied(&candidate, HealthPolicy::NoPain));
        assert!(health_satisfied(&candidate, HealthPolicy::NoAddiction));
        assert!(health_satisfied(&candidate, HealthPolicy::AllowAll));
    }

    #[test]
    fn genetic_conditions_are_exempt() {
        let mut candidate = CandidateEntity::new();
        candidate.health.push(
            HealthCondition::new("Chemical dependency", ConditionKind::Addiction)
                .genetically_linked(),
        );
        assert!(health_satisfied(&candidate, HealthPolicy::NoAddiction));
        assert!(health_satisfied(&candidate, HealthPolicy::AllowNone));
    }

    #[test]
    fn work_uses_derived_value() {
        let mut candidate = CandidateEntity::new();
        candidate.work.disabled = WorkTags::MANUAL_DUMB;
        candidate.work.derived = true;
        assert!(!work_capability_satisfied(
            &candidate,
            WorkCapabilityPolicy::NoHeavyLaborDisabled
        ));
        assert!(work_capability_satisfied(
            &candidate,
            WorkCapabilityPolicy::AllowAll
        ));
    }

    #[test]
    fn ceiling_forces_acceptance() {
        let filter = shooting_filter(8, Passion::Major);
        let candidate = shooter(2, Passion::None);
        assert!(!all_satisfied(&candidate, &filter, 9, 10));
        assert!(all_satisfied(&candidate, &filter, 10, 10));
        assert!(!evaluate(&candidate, &filter).all());
        assert!(!evaluate(&candidate, &filter).skills);
    }

    #[test]
    fn verdict_covers_background_pair() {
        let filter = shooting_filter(1, Passion::None);
        let mut candidate = shooter(5, Passion::None);
        assert!(evaluate(&candidate, &filter).background);
        assert!(evaluate(&candidate, &filter).all());

        candidate.background = BackgroundPair::new(
            Some(
                Background::new("pacifist_child", BackgroundSlot::Juvenile)
                    .with_disabled_tags(WorkTags::VIOLENT),
            ),
            None,
        );
        let verdict = evaluate(&candidate, &filter);
        assert!(!verdict.background);
        assert!(!verdict.all());
        assert!(!satisfies_all(&candidate, &filter));
    }
}
