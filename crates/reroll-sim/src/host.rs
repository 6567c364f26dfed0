//! A randomized host backed by the built-in [`Catalog`].
//!
//! Every generator draws from a seeded [`SmallRng`], so a fixed seed
//! replays the same runs. Slots alternate between an outlander colony and a
//! tribal faction to exercise both background category paths.

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use reroll_core::background;
use reroll_core::error::{GeneratorError, HostError, Operation};
use reroll_core::{AttributeGenerators, CandidateHost};
use reroll_types::{
    Age, BackgroundPair, BackgroundSlot, BodyType, CandidateEntity, CategoryFilter,
    FactionProfile, Gender, GenerationRequest, Name, Passion, SkillRecord, TICKS_PER_YEAR,
    VariantId,
};
use tracing::{debug, info};

use crate::catalog::Catalog;

/// Highest generated skill level.
const MAX_LEVEL: i64 = 20;

/// Chance that a health roll produces a non-viable candidate.
const NON_VIABLE_CHANCE: f64 = 0.02;

/// Randomized host over a fixed number of slots.
#[derive(Debug)]
pub struct RandomHost {
    catalog: Catalog,
    rng: SmallRng,
    requests: Vec<GenerationRequest>,
    finished: Vec<Option<CandidateEntity>>,
    adulthood_years: f32,
    discards: u32,
}

impl RandomHost {
    /// Create a host with `slots` candidate slots.
    pub fn new(catalog: Catalog, slots: usize, seed: Option<u64>, adulthood_years: f32) -> Self {
        let rng = seed.map_or_else(|| SmallRng::from_rng(&mut rand::rng()), SmallRng::seed_from_u64);
        let requests = (0..slots).map(slot_request).collect();
        Self {
            catalog,
            rng,
            requests,
            finished: vec![None; slots],
            adulthood_years,
            discards: 0,
        }
    }

    /// The finished candidate in `index`, if its run completed.
    pub fn finished(&self, index: usize) -> Option<&CandidateEntity> {
        self.finished.get(index).and_then(Option::as_ref)
    }

    /// Candidates discarded so far.
    pub const fn discards(&self) -> u32 {
        self.discards
    }

    /// Draw a pair from the weighted category groups.
    fn draw_pair(&mut self, filters: &[CategoryFilter], adult_eligible: bool) -> BackgroundPair {
        let Some(group) = filters
            .choose_weighted(&mut self.rng, |f| f.commonality.max(0.0))
            .ok()
        else {
            return BackgroundPair::default();
        };
        let Some(category) = group.categories.choose(&mut self.rng) else {
            return BackgroundPair::default();
        };

        let juvenile = self
            .catalog
            .backgrounds_in(category, BackgroundSlot::Juvenile)
            .choose(&mut self.rng)
            .map(|bg| (*bg).clone());
        let adult = if adult_eligible {
            self.catalog
                .backgrounds_in(category, BackgroundSlot::Adult)
                .choose(&mut self.rng)
                .map(|bg| (*bg).clone())
        } else {
            None
        };
        BackgroundPair::new(juvenile, adult)
    }
}

fn pick(rng: &mut SmallRng, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn roll_passion(rng: &mut SmallRng) -> Passion {
    let roll = rng.random_range(0..100u32);
    if roll < 60 {
        Passion::None
    } else if roll < 90 {
        Passion::Minor
    } else {
        Passion::Major
    }
}

/// Even slots are outlander colonists, odd slots tribal.
fn slot_request(index: usize) -> GenerationRequest {
    let mut request = GenerationRequest::default();
    if index % 2 == 0 {
        request.faction = FactionProfile {
            name: String::from("New Arrivals"),
            tribal: false,
            background_filters: vec![
                CategoryFilter::single("Outlander"),
                CategoryFilter::single("Civil"),
            ],
        };
    } else {
        request.faction = FactionProfile {
            name: String::from("Tribe of the Reeds"),
            tribal: true,
            background_filters: vec![CategoryFilter::single("Tribal")],
        };
        request.variant = Some(VariantId::new("Reedfolk"));
    }
    request
}

impl AttributeGenerators for RandomHost {
    fn generate_age(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        let years = if self.rng.random_bool(0.1) {
            self.rng.random_range(3..13u64)
        } else {
            self.rng.random_range(14..70u64)
        };
        let jitter = self.rng.random_range(0..TICKS_PER_YEAR);
        let mut age = Age::from_ticks(
            years
                .saturating_mul(TICKS_PER_YEAR)
                .saturating_add(jitter),
        );
        if self.rng.random_bool(0.2) {
            let stasis = self.rng.random_range(1..60u64);
            age.chronological_ticks = age
                .chronological_ticks
                .saturating_add(stasis.saturating_mul(TICKS_PER_YEAR));
        }
        candidate.age = age;
        Ok(())
    }

    fn generate_traits(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        let count = self.rng.random_range(0..=3usize);
        candidate.traits = self
            .catalog
            .traits
            .choose_multiple(&mut self.rng, count)
            .cloned()
            .collect();
        Ok(())
    }

    fn generate_skills(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        let mut records = Vec::with_capacity(self.catalog.skills.len());
        for def in &self.catalog.skills {
            let base = i64::from(self.rng.random_range(0..=10u32));
            let gain: i64 = candidate
                .background
                .entries()
                .map(|bg| i64::from(bg.gain_for(&def.id)))
                .sum();
            let level = u32::try_from(base.saturating_add(gain).clamp(0, MAX_LEVEL)).unwrap_or(0);
            let passion = roll_passion(&mut self.rng);
            records.push(SkillRecord::for_def(def, level, passion));
        }
        candidate.skills = records;
        Ok(())
    }

    fn generate_health(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<bool, GeneratorError> {
        if self.rng.random_bool(NON_VIABLE_CHANCE) {
            return Ok(false);
        }
        let condition = if self.rng.random_bool(0.3) {
            self.catalog.conditions.choose(&mut self.rng).cloned()
        } else {
            None
        };
        candidate.health.extend(condition);
        Ok(true)
    }

    fn generate_body_type(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        let options = [
            BodyType::Male,
            BodyType::Female,
            BodyType::Thin,
            BodyType::Fat,
            BodyType::Hulk,
        ];
        candidate.body_type = options.choose(&mut self.rng).copied();
        Ok(())
    }

    fn generate_genetics(
        &mut self,
        candidate: &mut CandidateEntity,
        variant: Option<&VariantId>,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        candidate.genetics.variant = variant.cloned();
        candidate.genetics.genes = self
            .catalog
            .genes
            .choose_multiple(&mut self.rng, 2)
            .map(|gene| (*gene).to_owned())
            .collect();
        Ok(())
    }

    fn generate_background(
        &mut self,
        candidate: &mut CandidateEntity,
        request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        if candidate.age == Age::default() {
            self.generate_age(candidate, request)?;
        }
        let filters = background::background_filters(candidate, request);
        let adult = background::is_adult(candidate, self.adulthood_age(candidate, self.adulthood_years));
        let pair = self.draw_pair(&filters, adult);
        if pair.juvenile.is_none() {
            return Err(GeneratorError::new(
                Operation::Background,
                "no juvenile background in the selected categories",
            ));
        }
        candidate.set_background(pair);
        Ok(())
    }

    fn shuffle_background(
        &mut self,
        candidate: &mut CandidateEntity,
        filters: &[CategoryFilter],
        adult_eligible: bool,
    ) -> Result<(), GeneratorError> {
        let pair = self.draw_pair(filters, adult_eligible);
        if pair.juvenile.is_none() {
            return Err(GeneratorError::new(
                Operation::Shuffle,
                "no juvenile background in the selected categories",
            ));
        }
        candidate.set_background(pair);
        Ok(())
    }

    fn synthesize_name(
        &mut self,
        candidate: &CandidateEntity,
        _variant: Option<&VariantId>,
        request: &GenerationRequest,
    ) -> Result<Name, GeneratorError> {
        let pool = match candidate.gender {
            Gender::Male => &self.catalog.male_names,
            Gender::Female => &self.catalog.female_names,
            Gender::None => &self.catalog.neutral_names,
        };
        let first = pick(&mut self.rng, pool);
        let last = request
            .fixed_last_name
            .clone()
            .unwrap_or_else(|| pick(&mut self.rng, &self.catalog.last_names).to_owned());
        if first.is_empty() {
            return Err(GeneratorError::new(Operation::Name, "empty name pool"));
        }
        Ok(Name::new(first, last))
    }
}

impl CandidateHost for RandomHost {
    fn generation_request(&self, index: usize) -> Result<GenerationRequest, HostError> {
        self.requests
            .get(index)
            .cloned()
            .ok_or_else(|| HostError::Unavailable {
                index,
                message: format!("only {} slots exist", self.requests.len()),
            })
    }

    fn obtain(&mut self, index: usize) -> Result<CandidateEntity, HostError> {
        if index >= self.requests.len() {
            return Err(HostError::Unavailable {
                index,
                message: String::from("slot out of range"),
            });
        }
        Ok(CandidateEntity::new())
    }

    fn discard(&mut self, index: usize, candidate: CandidateEntity) -> Result<(), HostError> {
        self.discards = self.discards.saturating_add(1);
        debug!(
            index,
            name = candidate.name.as_ref().map(ToString::to_string),
            "Candidate discarded"
        );
        Ok(())
    }

    fn link_relations(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        debug!(name = ?candidate.name, "Relations linked");
        Ok(())
    }

    fn synthesize_style(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        let rng = &mut self.rng;
        let catalog = &self.catalog;
        candidate.style.hair = Some(pick(rng, &catalog.hair).to_owned());
        candidate.style.beard = Some(pick(rng, &catalog.beards).to_owned());
        candidate.style.face_tattoo = rng
            .random_bool(0.1)
            .then(|| pick(rng, &catalog.tattoos).to_owned());
        candidate.style.body_tattoo = rng
            .random_bool(0.25)
            .then(|| pick(rng, &catalog.tattoos).to_owned());
        Ok(())
    }

    fn redress(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        let count = self.rng.random_range(2..=3usize);
        candidate.apparel = self
            .catalog
            .apparel
            .choose_multiple(&mut self.rng, count)
            .map(|item| (*item).to_owned())
            .collect();
        Ok(())
    }

    fn notify_generated(
        &mut self,
        index: usize,
        candidate: &CandidateEntity,
    ) -> Result<(), GeneratorError> {
        let Some(slot) = self.finished.get_mut(index) else {
            return Err(GeneratorError::new(
                Operation::Notify,
                format!("slot {index} out of range"),
            ));
        };
        *slot = Some(candidate.clone());
        info!(
            index,
            name = candidate.name.as_ref().map(ToString::to_string),
            "Candidate ready"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn host() -> RandomHost {
        RandomHost::new(Catalog::builtin(), 2, Some(17), 20.0)
    }

    #[test]
    fn slots_alternate_factions() {
        let host = host();
        assert!(!host.generation_request(0).unwrap().faction.tribal);
        assert!(host.generation_request(1).unwrap().faction.tribal);
        assert!(matches!(
            host.generation_request(2),
            Err(HostError::Unavailable { index: 2, .. })
        ));
    }

    #[test]
    fn skills_cover_the_catalog_within_bounds() {
        let mut host = host();
        let mut candidate = CandidateEntity::new();
        let request = host.generation_request(0).unwrap();
        host.generate_background(&mut candidate, &request).unwrap();
        host.generate_skills(&mut candidate, &request).unwrap();
        assert_eq!(candidate.skills.len(), host.catalog.skills.len());
        assert!(candidate.skills.iter().all(|r| r.level <= 20));
    }

    #[test]
    fn shuffle_honors_adult_eligibility() {
        let mut host = host();
        let mut candidate = CandidateEntity::new();
        let filters = [CategoryFilter::single("Civil")];
        host.shuffle_background(&mut candidate, &filters, false).unwrap();
        assert!(candidate.background.juvenile.is_some());
        assert!(candidate.background.adult.is_none());
        host.shuffle_background(&mut candidate, &filters, true).unwrap();
        assert!(candidate.background.is_complete());
    }

    #[test]
    fn unknown_category_fails_shuffle() {
        let mut host = host();
        let mut candidate = CandidateEntity::new();
        let err = host
            .shuffle_background(&mut candidate, &[CategoryFilter::single("Nowhere")], true)
            .unwrap_err();
        assert_eq!(err.operation, Operation::Shuffle);
    }

    #[test]
    fn fixed_last_name_is_used() {
        let mut host = host();
        let mut request = GenerationRequest::default();
        request.fixed_last_name = Some(String::from("Vance"));
        let mut candidate = CandidateEntity::new();
        candidate.gender = Gender::Female;
        let name = host.synthesize_name(&candidate, None, &request).unwrap();
        assert_eq!(name.last, "Vance");
        assert!(host.catalog.female_names.contains(&name.first.as_str()));
    }

    #[test]
    fn notify_stores_finished_candidate() {
        let mut host = host();
        let candidate = CandidateEntity::new();
        host.notify_generated(1, &candidate).unwrap();
        assert!(host.finished(1).is_some());
        assert!(host.finished(0).is_none());
        assert!(host.notify_generated(5, &candidate).is_err());
    }
}
