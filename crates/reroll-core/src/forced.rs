//! Externally forced constraints.
//!
//! A host scenario can pin parts of a candidate regardless of what the
//! generators produce: an allowed age range, traits every candidate must
//! carry, and conditions every candidate starts with. Appliers run at the
//! matching pipeline stage, after the generator for that category.

use core::fmt;

use reroll_types::{CandidateEntity, HealthCondition, IntRange, TraitDef};

/// Applies a forced trait after trait generation.
pub trait ForcedTraitApplier: fmt::Debug {
    /// Mutate the freshly generated trait set.
    fn apply(&self, candidate: &mut CandidateEntity);
}

/// Applies a forced condition after health generation.
pub trait ForcedConditionApplier: fmt::Debug {
    /// Mutate the freshly generated condition list.
    fn apply(&self, candidate: &mut CandidateEntity);
}

/// Adds a trait unless one with the same label is already present.
#[derive(Debug, Clone)]
pub struct ForcedTrait(pub TraitDef);

impl ForcedTraitApplier for ForcedTrait {
    fn apply(&self, candidate: &mut CandidateEntity) {
        if !candidate.has_trait(&self.0) {
            candidate.traits.push(self.0.clone());
        }
    }
}

/// Adds a condition unconditionally.
#[derive(Debug, Clone)]
pub struct ForcedCondition(pub HealthCondition);

impl ForcedConditionApplier for ForcedCondition {
    fn apply(&self, candidate: &mut CandidateEntity) {
        candidate.health.push(self.0.clone());
    }
}

/// Every forced constraint a host scenario supplies.
#[derive(Debug, Default)]
pub struct ForcedConstraints {
    /// Allowed biological age in whole years. When set, age is drawn
    /// uniformly inside this range instead of calling the age generator.
    pub age_range: Option<IntRange>,
    /// Trait appliers, run in order.
    pub traits: Vec<Box<dyn ForcedTraitApplier>>,
    /// Condition appliers, run in order.
    pub conditions: Vec<Box<dyn ForcedConditionApplier>>,
}

impl ForcedConstraints {
    /// No forced constraints.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builder: force an age range.
    #[must_use]
    pub const fn with_age_range(mut self, range: IntRange) -> Self {
        self.age_range = Some(range);
        self
    }

    /// Builder: add a trait applier.
    #[must_use]
    pub fn with_trait(mut self, applier: impl ForcedTraitApplier + 'static) -> Self {
        self.traits.push(Box::new(applier));
        self
    }

    /// Builder: add a condition applier.
    #[must_use]
    pub fn with_condition(mut self, applier: impl ForcedConditionApplier + 'static) -> Self {
        self.conditions.push(Box::new(applier));
        self
    }

    pub(crate) fn apply_traits(&self, candidate: &mut CandidateEntity) {
        for applier in &self.traits {
            applier.apply(candidate);
        }
    }

    pub(crate) fn apply_conditions(&self, candidate: &mut CandidateEntity) {
        for applier in &self.conditions {
            applier.apply(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use reroll_types::ConditionKind;

    use super::*;

    #[test]
    fn forced_trait_is_not_duplicated() {
        let forced = ForcedConstraints::none().with_trait(ForcedTrait(TraitDef::new("Tough")));
        let mut candidate = CandidateEntity::new();
        forced.apply_traits(&mut candidate);
        forced.apply_traits(&mut candidate);
        assert_eq!(candidate.traits.len(), 1);
    }

    #[test]
    fn forced_conditions_append() {
        let forced = ForcedConstraints::none().with_condition(ForcedCondition(
            HealthCondition::new("Malnutrition", ConditionKind::Other),
        ));
        let mut candidate = CandidateEntity::new();
        candidate
            .health
            .push(HealthCondition::new("Scar", ConditionKind::Injury));
        forced.apply_conditions(&mut candidate);
        assert_eq!(candidate.health.len(), 2);
    }
}
