//! Declarative acceptance criteria for one reroll run.
//!
//! A [`FilterSpecification`] is snapshotted when a run begins and stays
//! read-only for the rest of the run. Each range carries a default pair
//! that means "unconstrained"; a constraint whose thresholds are all at
//! their defaults is inactive.

use serde::{Deserialize, Serialize};

use crate::candidate::{SkillDef, TraitDef};
use crate::enums::{
    AggregationMode, Gender, HealthPolicy, Passion, TraitMode, WorkCapabilityPolicy,
};
use crate::work_tags::WorkTags;

/// Default lower bound of the age range.
pub const AGE_MIN_DEFAULT: u32 = 0;
/// Default upper bound of the age range; as a maximum it means "no limit".
pub const AGE_MAX_DEFAULT: u32 = 100;
/// Default lower bound of the passion-count range.
pub const PASSION_MIN_DEFAULT: u32 = 0;
/// Default upper bound of the passion-count range.
pub const PASSION_MAX_DEFAULT: u32 = 12;
/// Default lower bound of the skill-sum range (also the inactive skill level).
pub const SKILL_MIN_DEFAULT: u32 = 0;
/// Default upper bound of the skill-sum range.
pub const SKILL_MAX_DEFAULT: u32 = 240;
/// Iteration ceiling used when none is configured.
pub const DEFAULT_ITERATION_LIMIT: u32 = 1000;

/// An inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRange {
    /// Inclusive lower bound.
    pub min: u32,
    /// Inclusive upper bound.
    pub max: u32,
}

impl IntRange {
    /// Create a range.
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range, bounds included.
    pub const fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// A constraint on one skill attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillConstraint {
    /// The constrained skill.
    pub skill: SkillDef,
    /// Minimum level; [`SKILL_MIN_DEFAULT`] means no level requirement.
    #[serde(default)]
    pub min_level: u32,
    /// Minimum effective passion; `None` means no passion requirement.
    #[serde(default)]
    pub min_passion: Passion,
}

impl SkillConstraint {
    /// Create a skill constraint.
    pub const fn new(skill: SkillDef, min_level: u32, min_passion: Passion) -> Self {
        Self {
            skill,
            min_level,
            min_passion,
        }
    }

    /// Whether any threshold departs from its default.
    pub fn is_active(&self) -> bool {
        self.min_level > SKILL_MIN_DEFAULT || self.min_passion > Passion::None
    }
}

/// A constraint on one trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitConstraint {
    /// The constrained trait.
    #[serde(rename = "trait")]
    pub trait_def: TraitDef,
    /// How the trait participates.
    pub mode: TraitMode,
}

impl TraitConstraint {
    /// Create a trait constraint.
    pub const fn new(trait_def: TraitDef, mode: TraitMode) -> Self {
        Self { trait_def, mode }
    }
}

/// Acceptance criteria for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpecification {
    /// Required gender, if constrained.
    pub gender: Option<Gender>,
    /// Biological age range in whole years.
    pub age_range: IntRange,
    /// Per-skill constraints, in display order.
    pub skills: Vec<SkillConstraint>,
    /// Allowed number of skills with an effective passion.
    pub passion_range: IntRange,
    /// Allowed aggregate skill level.
    pub skill_range: IntRange,
    /// How `skill_range` aggregates levels.
    pub aggregation: AggregationMode,
    /// Per-trait constraints.
    pub traits: Vec<TraitConstraint>,
    /// Minimum number of `Optional` traits that must be present.
    pub required_optional_count: u32,
    /// Health condition policy.
    pub health_policy: HealthPolicy,
    /// Work capability policy.
    pub work_capability_policy: WorkCapabilityPolicy,
    /// Ceiling on pipeline iterations; reaching it force-accepts.
    pub iteration_limit: u32,
}

impl Default for FilterSpecification {
    fn default() -> Self {
        Self {
            gender: None,
            age_range: IntRange::new(AGE_MIN_DEFAULT, AGE_MAX_DEFAULT),
            skills: Vec::new(),
            passion_range: IntRange::new(PASSION_MIN_DEFAULT, PASSION_MAX_DEFAULT),
            skill_range: IntRange::new(SKILL_MIN_DEFAULT, SKILL_MAX_DEFAULT),
            aggregation: AggregationMode::SumAll,
            traits: Vec::new(),
            required_optional_count: 0,
            health_policy: HealthPolicy::AllowAll,
            work_capability_policy: WorkCapabilityPolicy::AllowAll,
            iteration_limit: DEFAULT_ITERATION_LIMIT,
        }
    }
}

impl FilterSpecification {
    /// Builder: replace the iteration ceiling.
    #[must_use]
    pub const fn with_iteration_limit(mut self, limit: u32) -> Self {
        self.iteration_limit = limit;
        self
    }

    /// Skill constraints whose thresholds are not all at their defaults.
    pub fn active_skill_constraints(&self) -> impl Iterator<Item = &SkillConstraint> {
        self.skills.iter().filter(|c| c.is_active())
    }

    /// Whether the age range is the unconstrained sentinel pair.
    pub const fn age_unconstrained(&self) -> bool {
        self.age_range.min == AGE_MIN_DEFAULT && self.age_range.max == AGE_MAX_DEFAULT
    }

    /// Whether the passion-count range narrows its default.
    pub const fn passion_range_active(&self) -> bool {
        self.passion_range.min > PASSION_MIN_DEFAULT || self.passion_range.max < PASSION_MAX_DEFAULT
    }

    /// Whether the skill-sum range departs from its default.
    pub const fn skill_range_active(&self) -> bool {
        self.skill_range.min != SKILL_MIN_DEFAULT || self.skill_range.max != SKILL_MAX_DEFAULT
    }

    /// Work tags that must stay enabled for the filter to be satisfiable:
    /// the required tags of every trait constraint plus the work tags of
    /// every active skill constraint.
    pub fn required_work_tags(&self) -> WorkTags {
        let from_traits = self
            .traits
            .iter()
            .map(|c| c.trait_def.required_tags)
            .collect::<WorkTags>();
        self.active_skill_constraints()
            .map(|c| c.skill.work_tags)
            .fold(from_traits, WorkTags::union)
    }

    /// Trait constraints with the given mode.
    pub fn traits_with_mode(&self, mode: TraitMode) -> impl Iterator<Item = &TraitDef> {
        self.traits
            .iter()
            .filter(move |c| c.mode == mode)
            .map(|c| &c.trait_def)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shooting() -> SkillDef {
        SkillDef::new("Shooting")
            .with_disabling_tags(WorkTags::VIOLENT)
            .with_work_tags(WorkTags::VIOLENT | WorkTags::HUNTING)
    }

    #[test]
    fn default_filter_is_unconstrained() {
        let filter = FilterSpecification::default();
        assert!(filter.age_unconstrained());
        assert!(!filter.passion_range_active());
        assert!(!filter.skill_range_active());
        assert_eq!(filter.active_skill_constraints().count(), 0);
        assert!(filter.required_work_tags().is_empty());
        assert_eq!(filter.iteration_limit, DEFAULT_ITERATION_LIMIT);
    }

    #[test]
    fn inactive_skill_constraints_are_ignored() {
        let mut filter = FilterSpecification::default();
        filter
            .skills
            .push(SkillConstraint::new(SkillDef::new("Cooking"), 0, Passion::None));
        filter
            .skills
            .push(SkillConstraint::new(shooting(), 0, Passion::Minor));
        let active: Vec<_> = filter.active_skill_constraints().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().unwrap().skill.id.as_str(), "Shooting");
    }

    #[test]
    fn required_tags_union_traits_and_active_skills() {
        let mut filter = FilterSpecification::default();
        filter.skills.push(SkillConstraint::new(shooting(), 8, Passion::None));
        filter.skills.push(SkillConstraint::new(
            SkillDef::new("Medicine").with_work_tags(WorkTags::CARING),
            0,
            Passion::None,
        ));
        let mut kind = TraitDef::new("Kind");
        kind.required_tags = WorkTags::SOCIAL;
        filter.traits.push(TraitConstraint::new(kind, TraitMode::Excluded));

        let required = filter.required_work_tags();
        assert!(required.contains(WorkTags::VIOLENT | WorkTags::HUNTING));
        assert!(required.contains(WorkTags::SOCIAL));
        assert!(!required.intersects(WorkTags::CARING));
    }

    #[test]
    fn narrowed_ranges_are_active() {
        let mut filter = FilterSpecification::default();
        filter.passion_range = IntRange::new(2, PASSION_MAX_DEFAULT);
        filter.skill_range = IntRange::new(SKILL_MIN_DEFAULT, 100);
        filter.age_range = IntRange::new(20, AGE_MAX_DEFAULT);
        assert!(filter.passion_range_active());
        assert!(filter.skill_range_active());
        assert!(!filter.age_unconstrained());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let filter: FilterSpecification =
            serde_json::from_str(r#"{ "gender": "Female", "iteration_limit": 50 }"#).unwrap();
        assert_eq!(filter.gender, Some(Gender::Female));
        assert_eq!(filter.iteration_limit, 50);
        assert!(filter.age_unconstrained());
    }
}
