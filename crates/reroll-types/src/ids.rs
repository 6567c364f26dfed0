//! Type-safe identifier wrappers.
//!
//! A reroll run is identified by a [`RunId`] (UUID v7, time-ordered) so log
//! lines from interleaved ticks of the same run can be correlated. Genetic
//! variants are host-defined names wrapped in [`VariantId`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one reroll run (one `Begin` .. `End`/`Cancel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Name of a genetic variant (a host-defined lineage such as a xenotype).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub String);

impl VariantId {
    /// Create a variant identifier from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the variant name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariantId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl core::fmt::Display for VariantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a skill attribute (e.g. `"Shooting"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub String);

impl SkillId {
    /// Create a skill identifier from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the skill name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SkillId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl core::fmt::Display for SkillId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique() {
        let first = RunId::new();
        let second = RunId::new();
        assert_ne!(first, second);
        assert_ne!(first.into_inner(), Uuid::nil());
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let skill = SkillId::new("Shooting");
        let json = serde_json::to_string(&skill).unwrap_or_default();
        assert_eq!(json, "\"Shooting\"");
        assert_eq!(VariantId::new("Baseliner").to_string(), "Baseliner");
    }
}
