//! Host context describing how the candidate in one slot is generated.
//!
//! The [`GenerationRequest`] is obtained from the host once per run and
//! handed, read-only, to every external generator call. The pipeline reads
//! it directly for gender derivation, name synthesis, and background
//! category filters.

use serde::{Deserialize, Serialize};

use crate::enums::Gender;
use crate::ids::VariantId;

/// A weighted group of background categories a shuffle may draw from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    /// Category names.
    pub categories: Vec<String>,
    /// Relative weight of this group.
    #[serde(default = "default_commonality")]
    pub commonality: f32,
}

impl CategoryFilter {
    /// A single-category group with weight 1.
    pub fn single(category: impl Into<String>) -> Self {
        Self {
            categories: vec![category.into()],
            commonality: default_commonality(),
        }
    }
}

const fn default_commonality() -> f32 {
    1.0
}

/// Entity-kind level generation hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindProfile {
    /// Gender every entity of this kind has, if fixed.
    pub default_gender: Option<Gender>,
    /// Background categories added to the faction's categories.
    pub background_filters: Vec<CategoryFilter>,
    /// Background categories replacing every other source when non-empty.
    pub background_filters_override: Vec<CategoryFilter>,
}

/// Race level generation capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceProfile {
    /// Whether the race has genders at all.
    pub has_genders: bool,
    /// Gender forced by the race, if any.
    pub forced_gender: Option<Gender>,
}

impl Default for RaceProfile {
    fn default() -> Self {
        Self {
            has_genders: true,
            forced_gender: None,
        }
    }
}

/// Faction level generation hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionProfile {
    /// Faction display name.
    pub name: String,
    /// Whether the faction is tribal (selects tribal child categories).
    pub tribal: bool,
    /// Background categories contributed by the faction.
    pub background_filters: Vec<CategoryFilter>,
}

/// Everything the host knows about how one candidate slot is generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    /// Gender fixed by the request itself.
    pub fixed_gender: Option<Gender>,
    /// Entity-kind hints.
    pub kind: KindProfile,
    /// Race capabilities.
    pub race: RaceProfile,
    /// Faction hints.
    pub faction: FactionProfile,
    /// Family name every synthesized name must carry.
    pub fixed_last_name: Option<String>,
    /// Genetic variant the candidate should be generated with.
    pub variant: Option<VariantId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_gendered_race() {
        let request: GenerationRequest = serde_json::from_str("{}").unwrap();
        assert!(request.race.has_genders);
        assert!(request.fixed_gender.is_none());
        assert!(request.kind.background_filters.is_empty());
    }

    #[test]
    fn category_filter_weight_defaults_to_one() {
        let filter: CategoryFilter =
            serde_json::from_str(r#"{ "categories": ["Outlander"] }"#).unwrap();
        assert_eq!(filter.categories, vec![String::from("Outlander")]);
        assert!(filter.commonality > 0.99 && filter.commonality < 1.01);
    }
}
