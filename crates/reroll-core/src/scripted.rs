//! A deterministic host driven by pre-recorded outputs.
//!
//! [`ScriptedHost`] replays a fixed sequence of outputs per attribute
//! category, cycling when a sequence runs out, and counts every call it
//! receives. Faults are injected by call number. It backs the crate's own
//! tests and is useful for exercising a scheduler without a simulation.

use reroll_types::{
    Age, Background, BackgroundPair, BackgroundSlot, BodyType, CandidateEntity, CategoryFilter,
    GenerationRequest, HealthCondition, Name, SkillRecord, TraitDef, VariantId,
};

use crate::error::{GeneratorError, HostError, Operation};
use crate::host::{AttributeGenerators, CandidateHost};

/// Age assigned when no age script is installed.
pub const DEFAULT_SCRIPTED_AGE_YEARS: u64 = 30;

/// A cycling sequence of outputs.
#[derive(Debug, Clone)]
struct Script<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }
}

impl<T: Clone> Script<T> {
    fn new(items: Vec<T>) -> Self {
        Self { items, cursor: 0 }
    }

    /// The next item, or `None` for an empty script.
    fn next(&mut self) -> Option<T> {
        let position = self.cursor.checked_rem(self.items.len())?;
        let item = self.items.get(position)?.clone();
        self.cursor = self.cursor.saturating_add(1);
        Some(item)
    }
}

/// One scripted health outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthOutcome {
    /// Conditions assigned.
    pub conditions: Vec<HealthCondition>,
    /// Whether the result is viable.
    pub viable: bool,
}

impl HealthOutcome {
    /// A viable outcome with the given conditions.
    pub const fn viable(conditions: Vec<HealthCondition>) -> Self {
        Self {
            conditions,
            viable: true,
        }
    }

    /// A non-viable outcome.
    pub const fn dead() -> Self {
        Self {
            conditions: Vec::new(),
            viable: false,
        }
    }
}

/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `generate_age` calls.
    pub ages: u32,
    /// `generate_traits` calls.
    pub traits: u32,
    /// `generate_skills` calls.
    pub skills: u32,
    /// `generate_health` calls.
    pub health: u32,
    /// `generate_body_type` calls.
    pub body_types: u32,
    /// `generate_genetics` calls.
    pub genetics: u32,
    /// `generate_background` calls.
    pub backgrounds: u32,
    /// `shuffle_background` calls.
    pub shuffles: u32,
    /// `synthesize_name` calls.
    pub names: u32,
    /// `link_relations` calls.
    pub relations: u32,
    /// `synthesize_style` calls.
    pub styles: u32,
    /// `redress` calls.
    pub redresses: u32,
    /// `notify_generated` calls.
    pub notifications: u32,
    /// `obtain` calls.
    pub obtains: u32,
    /// `discard` calls.
    pub discards: u32,
}

impl CallCounts {
    const fn counter_mut(&mut self, operation: Operation) -> &mut u32 {
        match operation {
            Operation::Age => &mut self.ages,
            Operation::Traits => &mut self.traits,
            Operation::Skills => &mut self.skills,
            Operation::Health => &mut self.health,
            Operation::BodyType => &mut self.body_types,
            Operation::Genetics => &mut self.genetics,
            Operation::Background => &mut self.backgrounds,
            Operation::Shuffle => &mut self.shuffles,
            Operation::Name => &mut self.names,
            Operation::Relations => &mut self.relations,
            Operation::Style => &mut self.styles,
            Operation::Redress => &mut self.redresses,
            Operation::Notify => &mut self.notifications,
        }
    }
}

/// The default background pair: a juvenile and an adult entry with no
/// disabled tags or skill gains.
pub fn default_background_pair() -> BackgroundPair {
    BackgroundPair::new(
        Some(Background::new("scripted_child", BackgroundSlot::Juvenile)),
        Some(Background::new("scripted_adult", BackgroundSlot::Adult)),
    )
}

/// Deterministic host replaying scripted outputs.
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    ages: Script<Age>,
    traits: Script<Vec<TraitDef>>,
    skills: Script<Vec<SkillRecord>>,
    health: Script<HealthOutcome>,
    backgrounds: Script<BackgroundPair>,
    shuffles: Script<BackgroundPair>,
    body_type: BodyType,
    adulthood_years: Option<f32>,
    template: CandidateEntity,
    request: GenerationRequest,
    faults: Vec<(Operation, u32)>,
    obtain_limit: Option<u32>,
    fail_discard: bool,
    calls: CallCounts,
    discarded: Vec<CandidateEntity>,
    notified: Vec<usize>,
    last_shuffle_filters: Vec<CategoryFilter>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHost {
    /// A host producing adult candidates with no traits, no skills, viable
    /// health, and the [`default_background_pair`].
    pub fn new() -> Self {
        Self {
            ages: Script::default(),
            traits: Script::default(),
            skills: Script::default(),
            health: Script::default(),
            backgrounds: Script::default(),
            shuffles: Script::default(),
            body_type: BodyType::Thin,
            adulthood_years: None,
            template: CandidateEntity::new(),
            request: GenerationRequest::default(),
            faults: Vec::new(),
            obtain_limit: None,
            fail_discard: false,
            calls: CallCounts::default(),
            discarded: Vec::new(),
            notified: Vec::new(),
            last_shuffle_filters: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Cycle through these ages.
    #[must_use]
    pub fn with_ages(mut self, ages: Vec<Age>) -> Self {
        self.ages = Script::new(ages);
        self
    }

    /// Cycle through these trait sets.
    #[must_use]
    pub fn with_traits(mut self, traits: Vec<Vec<TraitDef>>) -> Self {
        self.traits = Script::new(traits);
        self
    }

    /// Cycle through these skill sets.
    #[must_use]
    pub fn with_skills(mut self, skills: Vec<Vec<SkillRecord>>) -> Self {
        self.skills = Script::new(skills);
        self
    }

    /// Cycle through these health outcomes.
    #[must_use]
    pub fn with_health(mut self, health: Vec<HealthOutcome>) -> Self {
        self.health = Script::new(health);
        self
    }

    /// Cycle through these pairs on `generate_background`.
    #[must_use]
    pub fn with_backgrounds(mut self, pairs: Vec<BackgroundPair>) -> Self {
        self.backgrounds = Script::new(pairs);
        self
    }

    /// Cycle through these pairs on `shuffle_background`.
    #[must_use]
    pub fn with_shuffles(mut self, pairs: Vec<BackgroundPair>) -> Self {
        self.shuffles = Script::new(pairs);
        self
    }

    /// Body type assigned by `generate_body_type`.
    #[must_use]
    pub const fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    /// Override the adulthood threshold.
    #[must_use]
    pub const fn with_adulthood_age(mut self, years: f32) -> Self {
        self.adulthood_years = Some(years);
        self
    }

    /// Candidate handed out by `obtain`.
    #[must_use]
    pub fn with_template(mut self, template: CandidateEntity) -> Self {
        self.template = template;
        self
    }

    /// Context returned by `generation_request`.
    #[must_use]
    pub fn with_request(mut self, request: GenerationRequest) -> Self {
        self.request = request;
        self
    }

    /// Fail the `call_number`-th call (1-based) of `operation`.
    #[must_use]
    pub fn fail_on(mut self, operation: Operation, call_number: u32) -> Self {
        self.faults.push((operation, call_number));
        self
    }

    /// Refuse every `obtain` after the first `successes`.
    #[must_use]
    pub const fn fail_obtain_after(mut self, successes: u32) -> Self {
        self.obtain_limit = Some(successes);
        self
    }

    /// Make every `discard` fail.
    #[must_use]
    pub const fn fail_discard(mut self) -> Self {
        self.fail_discard = true;
        self
    }

    // -----------------------------------------------------------------------
    // Observables
    // -----------------------------------------------------------------------

    /// Calls received so far.
    pub const fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Candidates taken back through `discard`, oldest first.
    pub fn discarded(&self) -> &[CandidateEntity] {
        &self.discarded
    }

    /// Slot indices passed to `notify_generated`.
    pub fn notified(&self) -> &[usize] {
        &self.notified
    }

    /// Category filters passed to the most recent `shuffle_background`.
    pub fn last_shuffle_filters(&self) -> &[CategoryFilter] {
        &self.last_shuffle_filters
    }

    /// Count a call and fail it if a fault is scheduled for it.
    fn record(&mut self, operation: Operation) -> Result<(), GeneratorError> {
        let counter = self.calls.counter_mut(operation);
        *counter = counter.saturating_add(1);
        let call = *counter;
        if self.faults.contains(&(operation, call)) {
            return Err(GeneratorError::new(
                operation,
                format!("scripted fault on call {call}"),
            ));
        }
        Ok(())
    }
}

impl AttributeGenerators for ScriptedHost {
    fn generate_age(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Age)?;
        candidate.age = self
            .ages
            .next()
            .unwrap_or_else(|| Age::from_years(DEFAULT_SCRIPTED_AGE_YEARS));
        Ok(())
    }

    fn generate_traits(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Traits)?;
        candidate.traits = self.traits.next().unwrap_or_default();
        Ok(())
    }

    fn generate_skills(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Skills)?;
        candidate.skills = self.skills.next().unwrap_or_default();
        Ok(())
    }

    fn generate_health(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<bool, GeneratorError> {
        self.record(Operation::Health)?;
        let outcome = self
            .health
            .next()
            .unwrap_or_else(|| HealthOutcome::viable(Vec::new()));
        candidate.health = outcome.conditions;
        Ok(outcome.viable)
    }

    fn generate_body_type(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::BodyType)?;
        candidate.body_type = Some(self.body_type);
        Ok(())
    }

    fn generate_genetics(
        &mut self,
        candidate: &mut CandidateEntity,
        variant: Option<&VariantId>,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Genetics)?;
        candidate.genetics.variant = variant.cloned();
        candidate.genetics.genes = vec![String::from("scripted_gene")];
        Ok(())
    }

    fn generate_background(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Background)?;
        let pair = self
            .backgrounds
            .next()
            .unwrap_or_else(default_background_pair);
        candidate.set_background(pair);
        Ok(())
    }

    fn shuffle_background(
        &mut self,
        candidate: &mut CandidateEntity,
        filters: &[CategoryFilter],
        adult_eligible: bool,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Shuffle)?;
        self.last_shuffle_filters = filters.to_vec();
        let mut pair = self.shuffles.next().unwrap_or_else(default_background_pair);
        if !adult_eligible {
            pair.adult = None;
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
        self.record(Operation::Name)?;
        let first = format!("{:?}{}", candidate.gender, self.calls.names);
        let last = request
            .fixed_last_name
            .clone()
            .unwrap_or_else(|| String::from("Scripted"));
        Ok(Name::new(first, last))
    }

    fn adulthood_age(&self, _candidate: &CandidateEntity, default_years: f32) -> f32 {
        self.adulthood_years.unwrap_or(default_years)
    }
}

impl CandidateHost for ScriptedHost {
    fn generation_request(&self, _index: usize) -> Result<GenerationRequest, HostError> {
        Ok(self.request.clone())
    }

    fn obtain(&mut self, index: usize) -> Result<CandidateEntity, HostError> {
        self.calls.obtains = self.calls.obtains.saturating_add(1);
        if self
            .obtain_limit
            .is_some_and(|limit| self.calls.obtains > limit)
        {
            return Err(HostError::Unavailable {
                index,
                message: String::from("scripted obtain limit reached"),
            });
        }
        Ok(self.template.clone())
    }

    fn discard(&mut self, index: usize, candidate: CandidateEntity) -> Result<(), HostError> {
        self.calls.discards = self.calls.discards.saturating_add(1);
        if self.fail_discard {
            return Err(HostError::Discard {
                index,
                message: String::from("scripted discard failure"),
            });
        }
        self.discarded.push(candidate);
        Ok(())
    }

    fn link_relations(
        &mut self,
        _candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Relations)
    }

    fn synthesize_style(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Style)?;
        candidate.style.hair = Some(String::from("scripted_hair"));
        candidate.style.beard = Some(String::from("scripted_beard"));
        Ok(())
    }

    fn redress(
        &mut self,
        candidate: &mut CandidateEntity,
        _request: &GenerationRequest,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Redress)?;
        candidate.apparel = vec![String::from("scripted_outfit")];
        Ok(())
    }

    fn notify_generated(
        &mut self,
        index: usize,
        _candidate: &CandidateEntity,
    ) -> Result<(), GeneratorError> {
        self.record(Operation::Notify)?;
        self.notified.push(index);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reroll_types::Passion;

    use super::*;

    #[test]
    fn scripts_cycle() {
        let mut script = Script::new(vec![1, 2, 3]);
        let drawn: Vec<i32> = (0..7).filter_map(|_| script.next()).collect();
        assert_eq!(drawn, vec![1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(Script::<i32>::default().next(), None);
    }

    #[test]
    fn faults_fire_on_the_scheduled_call() {
        let mut host = ScriptedHost::new()
            .with_skills(vec![vec![SkillRecord::new("Cooking", 4, Passion::Minor)]])
            .fail_on(Operation::Skills, 2);
        let mut candidate = CandidateEntity::new();
        let request = GenerationRequest::default();

        host.generate_skills(&mut candidate, &request).unwrap();
        let err = host.generate_skills(&mut candidate, &request).unwrap_err();
        assert_eq!(err.operation, Operation::Skills);
        host.generate_skills(&mut candidate, &request).unwrap();
        assert_eq!(host.calls().skills, 3);
        assert_eq!(candidate.skills.len(), 1);
    }

    #[test]
    fn shuffle_respects_adult_eligibility() {
        let mut host = ScriptedHost::new();
        let mut candidate = CandidateEntity::new();
        host.shuffle_background(&mut candidate, &[CategoryFilter::single("Child")], false)
            .unwrap();
        assert!(candidate.background.juvenile.is_some());
        assert!(candidate.background.adult.is_none());
        assert_eq!(host.last_shuffle_filters().len(), 1);
    }

    #[test]
    fn obtain_limit_and_discard_failures() {
        let mut host = ScriptedHost::new().fail_obtain_after(1).fail_discard();
        let candidate = host.obtain(3).unwrap();
        assert!(matches!(
            host.obtain(3),
            Err(HostError::Unavailable { index: 3, .. })
        ));
        assert!(matches!(
            host.discard(3, candidate),
            Err(HostError::Discard { index: 3, .. })
        ));
        assert!(host.discarded().is_empty());
    }
}
