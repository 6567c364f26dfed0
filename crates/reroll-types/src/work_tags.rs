//! Work-capability tags.
//!
//! [`WorkTags`] is a small bit set. Backgrounds and traits carry the tags
//! they disable; skills carry the tags that disable them and the tags of the
//! work types they feed. The set serializes as a list of tag names so that
//! configuration files stay readable.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// A set of work-capability tags.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct WorkTags(u32);

/// Tag names paired with their bit, in declaration order.
const NAMED_TAGS: &[(&str, WorkTags)] = &[
    ("ManualDumb", WorkTags::MANUAL_DUMB),
    ("ManualSkilled", WorkTags::MANUAL_SKILLED),
    ("Violent", WorkTags::VIOLENT),
    ("Caring", WorkTags::CARING),
    ("Social", WorkTags::SOCIAL),
    ("Intellectual", WorkTags::INTELLECTUAL),
    ("Animals", WorkTags::ANIMALS),
    ("Artistic", WorkTags::ARTISTIC),
    ("Crafting", WorkTags::CRAFTING),
    ("Cooking", WorkTags::COOKING),
    ("Firefighting", WorkTags::FIREFIGHTING),
    ("Cleaning", WorkTags::CLEANING),
    ("Hauling", WorkTags::HAULING),
    ("PlantWork", WorkTags::PLANT_WORK),
    ("Mining", WorkTags::MINING),
    ("Hunting", WorkTags::HUNTING),
    ("Constructing", WorkTags::CONSTRUCTING),
];

impl WorkTags {
    /// The empty set.
    pub const NONE: Self = Self(0);
    /// Unskilled manual labor.
    pub const MANUAL_DUMB: Self = Self(1 << 0);
    /// Skilled manual labor.
    pub const MANUAL_SKILLED: Self = Self(1 << 1);
    /// Violence (shooting, melee, hunting).
    pub const VIOLENT: Self = Self(1 << 2);
    /// Caring for others (doctoring, childcare).
    pub const CARING: Self = Self(1 << 3);
    /// Social work (warden, negotiation).
    pub const SOCIAL: Self = Self(1 << 4);
    /// Intellectual work (research).
    pub const INTELLECTUAL: Self = Self(1 << 5);
    /// Handling animals.
    pub const ANIMALS: Self = Self(1 << 6);
    /// Art.
    pub const ARTISTIC: Self = Self(1 << 7);
    /// Crafting.
    pub const CRAFTING: Self = Self(1 << 8);
    /// Cooking.
    pub const COOKING: Self = Self(1 << 9);
    /// Firefighting.
    pub const FIREFIGHTING: Self = Self(1 << 10);
    /// Cleaning.
    pub const CLEANING: Self = Self(1 << 11);
    /// Hauling.
    pub const HAULING: Self = Self(1 << 12);
    /// Growing and harvesting plants.
    pub const PLANT_WORK: Self = Self(1 << 13);
    /// Mining.
    pub const MINING: Self = Self(1 << 14);
    /// Hunting.
    pub const HUNTING: Self = Self(1 << 15);
    /// Construction.
    pub const CONSTRUCTING: Self = Self(1 << 16);

    /// The heavy-labor subset checked by
    /// [`WorkCapabilityPolicy::NoHeavyLaborDisabled`](crate::WorkCapabilityPolicy::NoHeavyLaborDisabled).
    pub const HEAVY_LABOR: Self = Self::MANUAL_DUMB;

    /// Raw bit representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether no tag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether any tag is shared with `other`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every tag of `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set intersection.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Names of the tags in this set, in declaration order.
    pub fn names(self) -> Vec<&'static str> {
        NAMED_TAGS
            .iter()
            .filter(|(_, tag)| self.contains(*tag))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Look up a single tag by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_TAGS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, tag)| *tag)
    }
}

impl BitOr for WorkTags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for WorkTags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl BitAnd for WorkTags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl Not for WorkTags {
    type Output = Self;

    fn not(self) -> Self {
        let all = NAMED_TAGS
            .iter()
            .fold(Self::NONE, |acc, (_, tag)| acc.union(*tag));
        Self(!self.0 & all.0)
    }
}

impl core::iter::FromIterator<Self> for WorkTags {
    fn from_iter<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::union)
    }
}

impl core::fmt::Debug for WorkTags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return f.write_str("WorkTags(None)");
        }
        write!(f, "WorkTags({})", self.names().join(" | "))
    }
}

/// Error returned when a tag name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWorkTag(pub String);

impl core::fmt::Display for UnknownWorkTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown work tag: {}", self.0)
    }
}

impl std::error::Error for UnknownWorkTag {}

impl TryFrom<Vec<String>> for WorkTags {
    type Error = UnknownWorkTag;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(Self::NONE, |acc, name| {
            Self::from_name(name)
                .map(|tag| acc.union(tag))
                .ok_or_else(|| UnknownWorkTag(name.clone()))
        })
    }
}

impl From<WorkTags> for Vec<String> {
    fn from(tags: WorkTags) -> Self {
        tags.names().into_iter().map(str::to_owned).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let tags = WorkTags::VIOLENT | WorkTags::MINING;
        assert!(tags.intersects(WorkTags::VIOLENT));
        assert!(!tags.intersects(WorkTags::CARING));
        assert!(tags.contains(WorkTags::MINING));
        assert!(!tags.contains(WorkTags::MINING | WorkTags::CARING));
        assert_eq!(tags & WorkTags::MINING, WorkTags::MINING);
        assert!(WorkTags::NONE.is_empty());
    }

    #[test]
    fn complement_stays_within_known_tags() {
        let rest = !WorkTags::VIOLENT;
        assert!(!rest.intersects(WorkTags::VIOLENT));
        assert!(rest.contains(WorkTags::CONSTRUCTING));
        assert!((!WorkTags::NONE).contains(WorkTags::HEAVY_LABOR));
    }

    #[test]
    fn serializes_as_names() {
        let tags = WorkTags::MANUAL_DUMB | WorkTags::CARING;
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"["ManualDumb","Caring"]"#);
        let back: WorkTags = serde_json::from_str(r#"["caring","ManualDumb"]"#).unwrap();
        assert_eq!(back, tags);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let result: Result<WorkTags, _> = serde_json::from_str(r#"["Juggling"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn debug_lists_names() {
        assert_eq!(format!("{:?}", WorkTags::NONE), "WorkTags(None)");
        assert_eq!(
            format!("{:?}", WorkTags::VIOLENT | WorkTags::SOCIAL),
            "WorkTags(Violent | Social)"
        );
    }
}
