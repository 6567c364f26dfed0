//! Background category selection and adulthood.
//!
//! A reshuffle draws both background slots from category groups chosen by
//! the candidate's life stage: babies get newborn backgrounds, children get
//! child (or tribal child) backgrounds, and adults get the entity kind's
//! override, else the kind and faction groups combined, else a civil
//! fallback.

use reroll_types::{CandidateEntity, CategoryFilter, DevelopmentalStage, GenerationRequest};

/// Category used for babies.
pub const NEWBORN_CATEGORY: &str = "Newborn";
/// Category used for children.
pub const CHILD_CATEGORY: &str = "Child";
/// Category used for children of tribal factions.
pub const TRIBAL_CHILD_CATEGORY: &str = "ChildTribal";
/// Category used when no other source supplies one.
pub const FALLBACK_CATEGORY: &str = "Civil";

/// Category groups a reshuffle of `candidate` should draw from.
pub fn background_filters(
    candidate: &CandidateEntity,
    request: &GenerationRequest,
) -> Vec<CategoryFilter> {
    match candidate.age.stage() {
        DevelopmentalStage::Baby => vec![CategoryFilter::single(NEWBORN_CATEGORY)],
        DevelopmentalStage::Child if request.faction.tribal => {
            vec![CategoryFilter::single(TRIBAL_CHILD_CATEGORY)]
        }
        DevelopmentalStage::Child => vec![CategoryFilter::single(CHILD_CATEGORY)],
        DevelopmentalStage::Adult => adult_filters(request),
    }
}

fn adult_filters(request: &GenerationRequest) -> Vec<CategoryFilter> {
    if !request.kind.background_filters_override.is_empty() {
        return request.kind.background_filters_override.clone();
    }

    let mut filters = request.kind.background_filters.clone();
    for filter in &request.faction.background_filters {
        if !filters.contains(filter) {
            filters.push(filter.clone());
        }
    }

    if filters.is_empty() {
        filters.push(CategoryFilter::single(FALLBACK_CATEGORY));
    }
    filters
}

/// Whether the candidate's biological age reaches `threshold_years`.
pub fn is_adult(candidate: &CandidateEntity, threshold_years: f32) -> bool {
    candidate.age.biological_years_f32() >= threshold_years
}
