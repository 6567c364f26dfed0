//! The candidate entity and its attribute categories.
//!
//! A [`CandidateEntity`] is the single mutable object a reroll run
//! regenerates in place. Each attribute category (age, backgrounds, traits,
//! skills, health, genetics) is replaced wholesale by the external
//! generators; everything here is plain data plus derived queries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{
    BackgroundSlot, BodyType, ConditionKind, DevelopmentalStage, Gender, Passion,
};
use crate::ids::{SkillId, VariantId};
use crate::work_tags::WorkTags;

/// Simulation ticks in one year of age.
pub const TICKS_PER_YEAR: u64 = 3_600_000;

/// Biological age (years) at which the baby stage ends.
pub const BABY_STAGE_END_YEARS: u64 = 3;

/// Biological age (years) at which the child stage ends.
pub const CHILD_STAGE_END_YEARS: u64 = 13;

/// Condition names allowed by
/// [`HealthPolicy::OnlyStartingCondition`](crate::HealthPolicy::OnlyStartingCondition).
pub const STARTING_CONDITIONS: &[&str] = &["CryptosleepSickness", "Malnutrition"];

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// Static definition of a skill attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillDef {
    /// Skill identifier.
    pub id: SkillId,
    /// Tags that, when disabled on the candidate, disable this skill.
    #[serde(default)]
    pub disabling_tags: WorkTags,
    /// Tags of the work types this skill feeds. A constraint on this skill
    /// requires these tags to stay enabled.
    #[serde(default)]
    pub work_tags: WorkTags,
}

impl SkillDef {
    /// Create a skill definition with no tag associations.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: SkillId::new(id),
            disabling_tags: WorkTags::NONE,
            work_tags: WorkTags::NONE,
        }
    }

    /// Builder: set the disabling tags.
    #[must_use]
    pub fn with_disabling_tags(mut self, tags: WorkTags) -> Self {
        self.disabling_tags = tags;
        self
    }

    /// Builder: set the work tags.
    #[must_use]
    pub fn with_work_tags(mut self, tags: WorkTags) -> Self {
        self.work_tags = tags;
        self
    }
}

/// One skill on a candidate: level plus raw passion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Skill identifier.
    pub skill: SkillId,
    /// Skill level (0..=20 in the reference generators).
    pub level: u32,
    /// Raw passion as generated, before work-capability masking.
    pub passion: Passion,
    /// Tags that disable this skill when the candidate has them disabled.
    #[serde(default)]
    pub disabling_tags: WorkTags,
}

impl SkillRecord {
    /// Create a skill record with no disabling tags.
    pub fn new(skill: impl Into<String>, level: u32, passion: Passion) -> Self {
        Self {
            skill: SkillId::new(skill),
            level,
            passion,
            disabling_tags: WorkTags::NONE,
        }
    }

    /// Create a record for a known skill definition.
    pub fn for_def(def: &SkillDef, level: u32, passion: Passion) -> Self {
        Self {
            skill: def.id.clone(),
            level,
            passion,
            disabling_tags: def.disabling_tags,
        }
    }

    /// Whether the record is disabled by the given set of disabled tags.
    pub fn is_disabled(&self, disabled: WorkTags) -> bool {
        disabled.intersects(self.disabling_tags)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A personality trait. Trait identity is its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraitDef {
    /// Display label; two traits are the same trait iff labels match.
    pub label: String,
    /// Work tags this trait disables.
    #[serde(default)]
    pub disabled_tags: WorkTags,
    /// Work tags a trait constraint on this trait requires to stay enabled.
    #[serde(default)]
    pub required_tags: WorkTags,
    /// Skills for which this trait guarantees at least a minor passion.
    #[serde(default)]
    pub passion_skills: Vec<SkillId>,
    /// Skills for which this trait guarantees a major passion.
    #[serde(default)]
    pub forced_passion_skills: Vec<SkillId>,
}

impl TraitDef {
    /// Create a trait with no effects.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled_tags: WorkTags::NONE,
            required_tags: WorkTags::NONE,
            passion_skills: Vec::new(),
            forced_passion_skills: Vec::new(),
        }
    }

    /// Builder: set the tags this trait disables.
    #[must_use]
    pub fn with_disabled_tags(mut self, tags: WorkTags) -> Self {
        self.disabled_tags = tags;
        self
    }

    /// Whether this trait demands a passion for `skill`.
    pub fn requires_passion(&self, skill: &SkillId) -> bool {
        self.passion_skills.contains(skill) || self.forced_passion_skills.contains(skill)
    }

    /// Whether this trait forces a major passion for `skill`.
    pub fn forces_major_passion(&self, skill: &SkillId) -> bool {
        self.forced_passion_skills.contains(skill)
    }
}

// ---------------------------------------------------------------------------
// Backgrounds
// ---------------------------------------------------------------------------

/// A narrative background entry filling one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Background {
    /// Stable identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Slot this entry belongs to.
    pub slot: BackgroundSlot,
    /// Work tags this background disables.
    #[serde(default)]
    pub disabled_tags: WorkTags,
    /// Skill level adjustments granted by this background.
    #[serde(default)]
    pub skill_gains: BTreeMap<SkillId, i32>,
}

impl Background {
    /// Create a background with no disables and no gains.
    pub fn new(id: impl Into<String>, slot: BackgroundSlot) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            slot,
            disabled_tags: WorkTags::NONE,
            skill_gains: BTreeMap::new(),
        }
    }

    /// Builder: set the disabled tags.
    #[must_use]
    pub fn with_disabled_tags(mut self, tags: WorkTags) -> Self {
        self.disabled_tags = tags;
        self
    }

    /// Builder: add a skill gain.
    #[must_use]
    pub fn with_gain(mut self, skill: impl Into<String>, amount: i32) -> Self {
        self.skill_gains.insert(SkillId::new(skill), amount);
        self
    }

    /// Gain granted for `skill` (0 when absent).
    pub fn gain_for(&self, skill: &SkillId) -> i32 {
        self.skill_gains.get(skill).copied().unwrap_or(0)
    }
}

/// The (juvenile, adult) background pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackgroundPair {
    /// Juvenile slot.
    pub juvenile: Option<Background>,
    /// Adult slot.
    pub adult: Option<Background>,
}

impl BackgroundPair {
    /// Create a pair from its two slots.
    pub const fn new(juvenile: Option<Background>, adult: Option<Background>) -> Self {
        Self { juvenile, adult }
    }

    /// Union of the work tags disabled by both entries.
    pub fn disabled_tags(&self) -> WorkTags {
        self.entries().map(|bg| bg.disabled_tags).collect()
    }

    /// Iterate over the populated entries.
    pub fn entries(&self) -> impl Iterator<Item = &Background> {
        self.juvenile.iter().chain(self.adult.iter())
    }

    /// Whether both slots are populated.
    pub const fn is_complete(&self) -> bool {
        self.juvenile.is_some() && self.adult.is_some()
    }

    /// Whether neither slot is populated.
    pub const fn is_empty(&self) -> bool {
        self.juvenile.is_none() && self.adult.is_none()
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// A health condition carried by the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCondition {
    /// Condition name (matched against [`STARTING_CONDITIONS`]).
    pub name: String,
    /// Classification.
    #[serde(default)]
    pub kind: ConditionKind,
    /// Pain contribution; positive values hurt.
    #[serde(default)]
    pub pain_offset: f32,
    /// Whether the condition stems from an inherent genetic trait. Such
    /// conditions are never grounds for rejection.
    #[serde(default)]
    pub genetic_link: bool,
}

impl HealthCondition {
    /// Create a painless condition of the given kind.
    pub fn new(name: impl Into<String>, kind: ConditionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            pain_offset: 0.0,
            genetic_link: false,
        }
    }

    /// Builder: set the pain contribution.
    #[must_use]
    pub fn with_pain(mut self, pain_offset: f32) -> Self {
        self.pain_offset = pain_offset;
        self
    }

    /// Builder: mark the condition as genetically linked.
    #[must_use]
    pub fn genetically_linked(mut self) -> Self {
        self.genetic_link = true;
        self
    }

    /// Whether the condition hurts.
    pub fn causes_pain(&self) -> bool {
        self.pain_offset > 0.0
    }
}

// ---------------------------------------------------------------------------
// Identity, age, genetics, appearance
// ---------------------------------------------------------------------------

/// Display name of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    /// Given name.
    pub first: String,
    /// Nickname shown in compact views.
    pub nick: String,
    /// Family name.
    pub last: String,
}

impl Name {
    /// Create a name whose nickname is the given name.
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        let first = first.into();
        Self {
            nick: first.clone(),
            first,
            last: last.into(),
        }
    }
}

impl core::fmt::Display for Name {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} '{}' {}", self.first, self.nick, self.last)
    }
}

/// Biological and chronological age in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Age {
    /// Biological age in ticks.
    pub biological_ticks: u64,
    /// Chronological age in ticks (biological plus time spent in stasis).
    pub chronological_ticks: u64,
}

impl Age {
    /// Age with equal biological and chronological values.
    pub const fn from_ticks(ticks: u64) -> Self {
        Self {
            biological_ticks: ticks,
            chronological_ticks: ticks,
        }
    }

    /// Age of exactly `years` whole years.
    pub const fn from_years(years: u64) -> Self {
        Self::from_ticks(years.saturating_mul(TICKS_PER_YEAR))
    }

    /// Whole biological years.
    pub const fn biological_years(&self) -> u64 {
        self.biological_ticks / TICKS_PER_YEAR
    }

    /// Whole chronological years.
    pub const fn chronological_years(&self) -> u64 {
        self.chronological_ticks / TICKS_PER_YEAR
    }

    /// Fractional biological years.
    #[allow(clippy::cast_precision_loss)]
    pub fn biological_years_f32(&self) -> f32 {
        self.biological_ticks as f32 / TICKS_PER_YEAR as f32
    }

    /// Life stage implied by biological age.
    pub const fn stage(&self) -> DevelopmentalStage {
        let years = self.biological_years();
        if years < BABY_STAGE_END_YEARS {
            DevelopmentalStage::Baby
        } else if years < CHILD_STAGE_END_YEARS {
            DevelopmentalStage::Child
        } else {
            DevelopmentalStage::Adult
        }
    }
}

/// Genetic lineage and the genes expressed by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genetics {
    /// Assigned variant, if the host models variants.
    pub variant: Option<VariantId>,
    /// Expressed gene names.
    pub genes: Vec<String>,
}

/// Cosmetic style assigned during finalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    /// Hair style.
    pub hair: Option<String>,
    /// Beard style; only male candidates carry one.
    pub beard: Option<String>,
    /// Face tattoo.
    pub face_tattoo: Option<String>,
    /// Body tattoo.
    pub body_tattoo: Option<String>,
}

/// Derived work capability, refreshed by the work-capability stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkCapability {
    /// Tags the candidate cannot perform.
    pub disabled: WorkTags,
    /// Whether the value has been derived at least once in this run.
    pub derived: bool,
}

// ---------------------------------------------------------------------------
// CandidateEntity
// ---------------------------------------------------------------------------

/// The mutable entity regenerated by a reroll run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntity {
    /// Gender.
    pub gender: Gender,
    /// Display name, if one has been assigned.
    pub name: Option<Name>,
    /// Biological and chronological age.
    pub age: Age,
    /// Juvenile and adult background slots.
    pub background: BackgroundPair,
    /// Trait set.
    pub traits: Vec<TraitDef>,
    /// Skill records, one per attribute.
    pub skills: Vec<SkillRecord>,
    /// Health conditions.
    pub health: Vec<HealthCondition>,
    /// Derived work capability.
    pub work: WorkCapability,
    /// Genetic variant and genes.
    pub genetics: Genetics,
    /// Body type, assigned during finalization.
    pub body_type: Option<BodyType>,
    /// Cosmetic style, assigned during finalization.
    pub style: Style,
    /// Clothing and equipment, assigned during finalization.
    pub apparel: Vec<String>,
    /// Whether relationships to other entities were linked.
    pub relations_linked: bool,
    /// Whether the host was notified that generation finished.
    pub notified: bool,
}

impl CandidateEntity {
    /// Create an empty candidate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Work tags disabled by the current backgrounds and traits.
    pub fn disabled_work_tags(&self) -> WorkTags {
        self.traits
            .iter()
            .map(|t| t.disabled_tags)
            .fold(self.background.disabled_tags(), WorkTags::union)
    }

    /// Find the record for `skill`.
    pub fn skill(&self, skill: &SkillId) -> Option<&SkillRecord> {
        self.skills.iter().find(|r| &r.skill == skill)
    }

    /// Whether a trait with the same label is present.
    pub fn has_trait(&self, trait_def: &TraitDef) -> bool {
        self.traits.iter().any(|t| t.label == trait_def.label)
    }

    /// Replace both background slots.
    pub fn set_background(&mut self, pair: BackgroundPair) {
        self.background = pair;
    }

    /// Clear everything a previous run generated: relations, health,
    /// traits, skills, genetics, derived work capability, and finalization
    /// products. Identity, age, and backgrounds are kept.
    pub fn reset_generated_state(&mut self) {
        self.relations_linked = false;
        self.notified = false;
        self.health.clear();
        self.traits.clear();
        self.skills.clear();
        self.genetics = Genetics::default();
        self.work = WorkCapability::default();
        self.body_type = None;
        self.style = Style::default();
        self.apparel.clear();
    }

    /// Whether any finalization product is present.
    pub fn is_finalized(&self) -> bool {
        self.relations_linked || self.notified || !self.apparel.is_empty()
    }
}
