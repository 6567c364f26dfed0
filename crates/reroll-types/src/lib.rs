//! Shared type definitions for the budgeted candidate reroll engine.
//!
//! This crate holds plain data only: the candidate being regenerated, the
//! filter it is tested against, the host context used to generate it, and
//! the lifecycle enums exposed by the scheduler. Behavior lives in
//! `reroll-core`.
//!
//! # Modules
//!
//! - [`ids`] -- Run identifiers and string-backed skill/variant names
//! - [`enums`] -- Demographic, policy, and lifecycle enumerations
//! - [`work_tags`] -- The [`WorkTags`] capability bit set
//! - [`candidate`] -- [`CandidateEntity`] and its attribute categories
//! - [`filter`] -- [`FilterSpecification`] and its constraint types
//! - [`request`] -- [`GenerationRequest`] host context

pub mod candidate;
pub mod enums;
pub mod filter;
pub mod ids;
pub mod request;
pub mod work_tags;

// Re-export all public types at crate root for convenience.
pub use candidate::{
    Age, BABY_STAGE_END_YEARS, Background, BackgroundPair, CHILD_STAGE_END_YEARS,
    CandidateEntity, Genetics, HealthCondition, Name, STARTING_CONDITIONS, SkillDef, SkillRecord,
    Style, TICKS_PER_YEAR, TraitDef, WorkCapability,
};
pub use enums::{
    AggregationMode, BackgroundSlot, BodyType, ConditionKind, DevelopmentalStage, Gender,
    HealthPolicy, Passion, RerollState, TraitMode, WorkCapabilityPolicy,
};
pub use filter::{
    AGE_MAX_DEFAULT, AGE_MIN_DEFAULT, DEFAULT_ITERATION_LIMIT, FilterSpecification, IntRange,
    PASSION_MAX_DEFAULT, PASSION_MIN_DEFAULT, SKILL_MAX_DEFAULT, SKILL_MIN_DEFAULT,
    SkillConstraint, TraitConstraint,
};
pub use ids::{RunId, SkillId, VariantId};
pub use request::{CategoryFilter, FactionProfile, GenerationRequest, KindProfile, RaceProfile};
pub use work_tags::{UnknownWorkTag, WorkTags};
