//! One-shot finalization of an accepted candidate.
//!
//! Runs exactly once per completed run, in order: relationship linkage,
//! body type with a gender consistency fixup, style, redress, and the final
//! notification. Style failures are cosmetic and only logged; any other
//! failure aborts the run.

use reroll_types::{BodyType, CandidateEntity, DevelopmentalStage, Gender};
use tracing::{debug, warn};

use crate::error::RunFault;
use crate::host::RerollHost;
use crate::pipeline::{AcceptanceKind, reconcile_passions};
use crate::session::CandidateSession;

/// Finalize the session's candidate.
///
/// A candidate accepted only because the ceiling was reached gets one more
/// skill pass (with passions reconciled) before anything else runs.
///
/// # Errors
///
/// Returns [`RunFault`] if skill generation, relationship linkage, body
/// type generation, redress, or notification fails.
pub fn finalize<H: RerollHost + ?Sized>(
    session: &mut CandidateSession,
    host: &mut H,
    kind: AcceptanceKind,
) -> Result<(), RunFault> {
    let s = session;

    if kind == AcceptanceKind::CeilingReached {
        s.candidate.skills.clear();
        host.generate_skills(&mut s.candidate, &s.request)?;
        reconcile_passions(&mut s.candidate);
        debug!(run_id = %s.run_id, "Skills refreshed after reaching the ceiling");
    }

    host.link_relations(&mut s.candidate, &s.request)?;
    s.candidate.relations_linked = true;

    host.generate_body_type(&mut s.candidate, &s.request)?;
    let body = consistent_body_type(
        s.candidate.gender,
        s.candidate.age.stage(),
        s.candidate.body_type,
    );
    s.candidate.body_type = Some(body);

    if let Err(err) = host.synthesize_style(&mut s.candidate, &s.request) {
        warn!(run_id = %s.run_id, error = %err, "Style synthesis failed; keeping previous style");
    }
    if s.candidate.gender != Gender::Male {
        s.candidate.style.beard = None;
    }

    host.redress(&mut s.candidate, &s.request)?;

    host.notify_generated(s.index, &s.candidate)?;
    s.candidate.notified = true;
    Ok(())
}

/// Body type consistent with gender and life stage. Juveniles always get
/// their stage's body; adults keep a non-gendered body and otherwise get the
/// body matching their gender.
pub const fn consistent_body_type(
    gender: Gender,
    stage: DevelopmentalStage,
    current: Option<BodyType>,
) -> BodyType {
    match stage {
        DevelopmentalStage::Baby => BodyType::Baby,
        DevelopmentalStage::Child => BodyType::Child,
        DevelopmentalStage::Adult => match current {
            Some(body @ (BodyType::Thin | BodyType::Fat | BodyType::Hulk)) => body,
            _ => gendered_body(gender),
        },
    }
}

const fn gendered_body(gender: Gender) -> BodyType {
    match gender {
        Gender::Male => BodyType::Male,
        Gender::Female => BodyType::Female,
        Gender::None => BodyType::Thin,
    }
}

/// Whether every finalization product is present on `candidate`.
pub const fn is_fully_finalized(candidate: &CandidateEntity) -> bool {
    candidate.relations_linked && candidate.notified && candidate.body_type.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn juveniles_get_stage_bodies() {
        assert_eq!(
            consistent_body_type(Gender::Male, DevelopmentalStage::Baby, Some(BodyType::Hulk)),
            BodyType::Baby
        );
        assert_eq!(
            consistent_body_type(Gender::Female, DevelopmentalStage::Child, None),
            BodyType::Child
        );
    }

    #[test]
    fn mismatched_gendered_body_is_fixed() {
        assert_eq!(
            consistent_body_type(
                Gender::Female,
                DevelopmentalStage::Adult,
                Some(BodyType::Male)
            ),
            BodyType::Female
        );
        assert_eq!(
            consistent_body_type(Gender::Male, DevelopmentalStage::Adult, Some(BodyType::Child)),
            BodyType::Male
        );
        assert_eq!(
            consistent_body_type(Gender::None, DevelopmentalStage::Adult, Some(BodyType::Female)),
            BodyType::Thin
        );
    }

    #[test]
    fn neutral_adult_bodies_are_kept() {
        assert_eq!(
            consistent_body_type(Gender::Female, DevelopmentalStage::Adult, Some(BodyType::Fat)),
            BodyType::Fat
        );
    }
}
