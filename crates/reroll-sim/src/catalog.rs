//! Built-in content the reference host draws from.

use std::collections::BTreeMap;

use reroll_types::{
    Background, BackgroundSlot, ConditionKind, HealthCondition, SkillDef, TraitDef, WorkTags,
};

/// Everything the random host can generate.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Skill definitions, one record per skill is generated.
    pub skills: Vec<SkillDef>,
    /// Traits a candidate may roll.
    pub traits: Vec<TraitDef>,
    /// Backgrounds by category name.
    pub backgrounds: BTreeMap<String, Vec<Background>>,
    /// Conditions a candidate may start with.
    pub conditions: Vec<HealthCondition>,
    /// Given names for male candidates.
    pub male_names: Vec<&'static str>,
    /// Given names for female candidates.
    pub female_names: Vec<&'static str>,
    /// Given names for genderless candidates.
    pub neutral_names: Vec<&'static str>,
    /// Family names.
    pub last_names: Vec<&'static str>,
    /// Hair styles.
    pub hair: Vec<&'static str>,
    /// Beard styles.
    pub beards: Vec<&'static str>,
    /// Tattoos.
    pub tattoos: Vec<&'static str>,
    /// Apparel items.
    pub apparel: Vec<&'static str>,
    /// Cosmetic genes.
    pub genes: Vec<&'static str>,
}

impl Catalog {
    /// The built-in catalog.
    pub fn builtin() -> Self {
        Self {
            skills: builtin_skills(),
            traits: builtin_traits(),
            backgrounds: builtin_backgrounds(),
            conditions: vec![
                HealthCondition::new("Malnutrition", ConditionKind::Chronic),
                HealthCondition::new("CryptosleepSickness", ConditionKind::Disease),
                HealthCondition::new("GunshotScar", ConditionKind::Injury).with_pain(0.1),
                HealthCondition::new("BadBack", ConditionKind::Chronic).with_pain(0.15),
                HealthCondition::new("Asthma", ConditionKind::Chronic).genetically_linked(),
                HealthCondition::new("SmokeleafAddiction", ConditionKind::Addiction),
                HealthCondition::new("Flu", ConditionKind::Disease).with_pain(0.05),
            ],
            male_names: vec!["Aldo", "Boris", "Corin", "Dmitri", "Emil", "Faro"],
            female_names: vec!["Anya", "Bea", "Cleo", "Dara", "Elin", "Fenna"],
            neutral_names: vec!["Ash", "Quill", "Sable", "Tern"],
            last_names: vec!["Marsh", "Holloway", "Reyes", "Okafor", "Lindqvist", "Tanaka"],
            hair: vec!["Shaved", "Bob", "Braids", "Mohawk", "Long", "Messy"],
            beards: vec!["Stubble", "Full", "Goatee", "Mutton"],
            tattoos: vec!["Tribal", "Anchor", "Skull", "Spiral"],
            apparel: vec!["Parka", "Duster", "Tribalwear", "FlakVest", "Cowboy hat", "Pants"],
            genes: vec!["HairRed", "SkinPale", "EyesBlue", "Robust", "NightVision"],
        }
    }

    /// Backgrounds in `category` for `slot`.
    pub fn backgrounds_in(&self, category: &str, slot: BackgroundSlot) -> Vec<&Background> {
        self.backgrounds
            .get(category)
            .map(|entries| entries.iter().filter(|bg| bg.slot == slot).collect())
            .unwrap_or_default()
    }
}

fn builtin_skills() -> Vec<SkillDef> {
    vec![
        SkillDef::new("Shooting")
            .with_disabling_tags(WorkTags::VIOLENT)
            .with_work_tags(WorkTags::VIOLENT.union(WorkTags::HUNTING)),
        SkillDef::new("Melee").with_disabling_tags(WorkTags::VIOLENT),
        SkillDef::new("Construction")
            .with_disabling_tags(WorkTags::MANUAL_SKILLED)
            .with_work_tags(WorkTags::CONSTRUCTING),
        SkillDef::new("Mining")
            .with_disabling_tags(WorkTags::MANUAL_DUMB)
            .with_work_tags(WorkTags::MINING),
        SkillDef::new("Cooking")
            .with_disabling_tags(WorkTags::COOKING)
            .with_work_tags(WorkTags::COOKING),
        SkillDef::new("Plants")
            .with_disabling_tags(WorkTags::MANUAL_DUMB)
            .with_work_tags(WorkTags::PLANT_WORK),
        SkillDef::new("Animals")
            .with_disabling_tags(WorkTags::ANIMALS)
            .with_work_tags(WorkTags::ANIMALS),
        SkillDef::new("Crafting")
            .with_disabling_tags(WorkTags::CRAFTING)
            .with_work_tags(WorkTags::CRAFTING),
        SkillDef::new("Artistic")
            .with_disabling_tags(WorkTags::ARTISTIC)
            .with_work_tags(WorkTags::ARTISTIC),
        SkillDef::new("Medicine")
            .with_disabling_tags(WorkTags::CARING)
            .with_work_tags(WorkTags::CARING),
        SkillDef::new("Social")
            .with_disabling_tags(WorkTags::SOCIAL)
            .with_work_tags(WorkTags::SOCIAL),
        SkillDef::new("Intellectual")
            .with_disabling_tags(WorkTags::INTELLECTUAL)
            .with_work_tags(WorkTags::INTELLECTUAL),
    ]
}

fn builtin_traits() -> Vec<TraitDef> {
    let mut brawler = TraitDef::new("Brawler");
    brawler.forced_passion_skills.push("Melee".into());
    let mut too_smart = TraitDef::new("TooSmart");
    too_smart.passion_skills.push("Intellectual".into());
    let mut builder = TraitDef::new("Builder");
    builder.required_tags = WorkTags::CONSTRUCTING;

    vec![
        brawler,
        too_smart,
        builder,
        TraitDef::new("Pacifist").with_disabled_tags(WorkTags::VIOLENT),
        TraitDef::new("Aristocrat").with_disabled_tags(WorkTags::MANUAL_DUMB),
        TraitDef::new("Abrasive").with_disabled_tags(WorkTags::SOCIAL),
        TraitDef::new("Tough"),
        TraitDef::new("Industrious"),
        TraitDef::new("Kind"),
        TraitDef::new("Nimble"),
        TraitDef::new("Pyromaniac").with_disabled_tags(WorkTags::FIREFIGHTING),
    ]
}

fn builtin_backgrounds() -> BTreeMap<String, Vec<Background>> {
    use BackgroundSlot::{Adult, Juvenile};

    let mut map = BTreeMap::new();
    map.insert(
        String::from("Newborn"),
        vec![Background::new("newborn", Juvenile)],
    );
    map.insert(
        String::from("Child"),
        vec![
            Background::new("bookworm", Juvenile)
                .with_gain("Intellectual", 4)
                .with_gain("Melee", -2),
            Background::new("farm_kid", Juvenile)
                .with_gain("Plants", 4)
                .with_gain("Animals", 2),
            Background::new("sheltered_child", Juvenile)
                .with_disabled_tags(WorkTags::MANUAL_DUMB)
                .with_gain("Artistic", 3),
            Background::new("street_urchin", Juvenile)
                .with_gain("Melee", 3)
                .with_gain("Social", 2),
        ],
    );
    map.insert(
        String::from("ChildTribal"),
        vec![
            Background::new("tribe_child", Juvenile)
                .with_gain("Plants", 2)
                .with_gain("Shooting", 2),
            Background::new("vengeful_child", Juvenile)
                .with_gain("Melee", 4)
                .with_disabled_tags(WorkTags::CARING),
        ],
    );
    map.insert(
        String::from("Civil"),
        vec![
            Background::new("colony_child", Juvenile)
                .with_gain("Construction", 2)
                .with_gain("Cooking", 2),
            Background::new("medical_student", Juvenile).with_gain("Medicine", 4),
            Background::new("chemist", Adult)
                .with_gain("Intellectual", 5)
                .with_gain("Medicine", 3),
            Background::new("line_cook", Adult)
                .with_gain("Cooking", 6)
                .with_gain("Social", -2),
            Background::new("noble", Adult)
                .with_disabled_tags(WorkTags::MANUAL_DUMB.union(WorkTags::CLEANING))
                .with_gain("Social", 6),
            Background::new("mechanic", Adult)
                .with_gain("Construction", 4)
                .with_gain("Crafting", 4),
        ],
    );
    map.insert(
        String::from("Outlander"),
        vec![
            Background::new("ranch_hand", Juvenile).with_gain("Animals", 4),
            Background::new("mercenary", Adult)
                .with_gain("Shooting", 6)
                .with_gain("Melee", 4),
            Background::new("hunter", Adult)
                .with_gain("Shooting", 5)
                .with_gain("Animals", 2),
            Background::new("pacifist_monk", Adult)
                .with_disabled_tags(WorkTags::VIOLENT)
                .with_gain("Social", 4),
        ],
    );
    map.insert(
        String::from("Tribal"),
        vec![
            Background::new("tribe_child", Juvenile).with_gain("Plants", 2),
            Background::new("hunter_gatherer", Adult)
                .with_gain("Shooting", 4)
                .with_gain("Plants", 3),
            Background::new("shaman", Adult)
                .with_gain("Medicine", 4)
                .with_disabled_tags(WorkTags::INTELLECTUAL),
        ],
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_juvenile_entry() {
        let catalog = Catalog::builtin();
        for category in catalog.backgrounds.keys() {
            assert!(
                !catalog
                    .backgrounds_in(category, BackgroundSlot::Juvenile)
                    .is_empty(),
                "{category} has no juvenile background"
            );
        }
    }

    #[test]
    fn adult_categories_have_adult_entries() {
        let catalog = Catalog::builtin();
        for category in ["Civil", "Outlander", "Tribal"] {
            assert!(!catalog.backgrounds_in(category, BackgroundSlot::Adult).is_empty());
        }
        assert!(catalog.backgrounds_in("Missing", BackgroundSlot::Adult).is_empty());
    }
}
