//! Enumeration types for candidates, filters, and the reroll lifecycle.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

/// Gender of a candidate. `None` is used for races without genders.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Gender {
    /// No gender (genderless race).
    #[default]
    None,
    /// Male.
    Male,
    /// Female.
    Female,
}

/// Coarse life stage derived from biological age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DevelopmentalStage {
    /// Younger than [`crate::BABY_STAGE_END_YEARS`].
    Baby,
    /// Younger than [`crate::CHILD_STAGE_END_YEARS`].
    Child,
    /// Everything older.
    Adult,
}

impl DevelopmentalStage {
    /// Whether this stage is a juvenile one (baby or child).
    pub const fn is_juvenile(self) -> bool {
        matches!(self, Self::Baby | Self::Child)
    }
}

// ---------------------------------------------------------------------------
// Skills and traits
// ---------------------------------------------------------------------------

/// Engagement tier with a skill attribute. Ordered `None < Minor < Major`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Passion {
    /// No passion.
    #[default]
    None,
    /// Minor passion.
    Minor,
    /// Major passion ("burning").
    Major,
}

/// How a trait constraint participates in acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitMode {
    /// The trait must be present.
    Required,
    /// The trait must be absent.
    Excluded,
    /// The trait counts toward the optional-pool quota.
    Optional,
}

/// How the skill-sum range aggregates skill levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationMode {
    /// Sum of every skill level.
    #[default]
    SumAll,
    /// Sum of levels of skills with an effective passion.
    SumPassionate,
    /// The larger of the two highest skill levels.
    MaxOfTopTwo,
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Which health conditions a candidate may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthPolicy {
    /// Any condition is accepted.
    #[default]
    AllowAll,
    /// Only conditions on the starting allow-list are accepted.
    OnlyStartingCondition,
    /// Conditions with a positive pain contribution are rejected.
    NoPain,
    /// Addiction conditions are rejected.
    NoAddiction,
    /// No condition is accepted.
    AllowNone,
}

/// Which work-disabling tags a candidate may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkCapabilityPolicy {
    /// Disabled work is ignored.
    #[default]
    AllowAll,
    /// Only the heavy-labor subset is rejected.
    NoHeavyLaborDisabled,
    /// Any disabled work is rejected.
    AllowNoDisabled,
}

// ---------------------------------------------------------------------------
// Candidate parts
// ---------------------------------------------------------------------------

/// The two narrative background slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BackgroundSlot {
    /// Childhood background, always populated once generation has started.
    Juvenile,
    /// Adulthood background, populated only for adult-eligible candidates.
    Adult,
}

/// Broad classification of a health condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    /// Physical injury or scar.
    Injury,
    /// Infection or illness.
    Disease,
    /// Chemical addiction.
    Addiction,
    /// Long-term chronic condition.
    Chronic,
    /// Anything else.
    #[default]
    Other,
}

/// Body shape assigned during finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyType {
    /// Gendered male body.
    Male,
    /// Gendered female body.
    Female,
    /// Thin body.
    Thin,
    /// Fat body.
    Fat,
    /// Hulking body.
    Hulk,
    /// Child body.
    Child,
    /// Baby body.
    Baby,
}

impl BodyType {
    /// Whether this body type is tied to a specific gender.
    pub const fn is_gendered(self) -> bool {
        matches!(self, Self::Male | Self::Female)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// State of the step scheduler.
///
/// `Idle` is both the initial state and the only state from which a new run
/// may begin. `Completed`, `Cancelled`, and `Error` are terminal until the
/// caller takes the run result, which returns the scheduler to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RerollState {
    /// No run in progress.
    #[default]
    Idle,
    /// A run is in progress; `tick` advances it.
    Running,
    /// The run finished and its candidate was finalized.
    Completed,
    /// The run was cancelled and its candidate discarded.
    Cancelled,
    /// The run aborted on a fatal host fault.
    Error,
}

impl RerollState {
    /// Whether the state is one of the three terminal states.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passion_is_ordered() {
        assert!(Passion::None < Passion::Minor);
        assert!(Passion::Minor < Passion::Major);
        assert_eq!(Passion::default(), Passion::None);
    }

    #[test]
    fn terminal_states() {
        assert!(!RerollState::Idle.is_terminal());
        assert!(!RerollState::Running.is_terminal());
        assert!(RerollState::Completed.is_terminal());
        assert!(RerollState::Cancelled.is_terminal());
        assert!(RerollState::Error.is_terminal());
    }

    #[test]
    fn gendered_body_types() {
        assert!(BodyType::Male.is_gendered());
        assert!(BodyType::Female.is_gendered());
        assert!(!BodyType::Hulk.is_gendered());
    }
}
