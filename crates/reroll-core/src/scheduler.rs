//! The resumable step scheduler.
//!
//! [`RerollScheduler`] is the state machine callers drive:
//!
//! ```text
//! Idle --begin--> Running --tick/end--> Completed
//!                    |   \--cancel----> Cancelled
//!                    \------fault-----> Error
//! ```
//!
//! A terminal state holds the [`RunResult`] until [`take_result`] returns
//! the scheduler to `Idle`. Work is done only inside [`tick`], in whole
//! pipeline iterations; budgets are checked between iterations, never
//! inside one. Misuse (ticking while idle, cancelling twice, ...) is a
//! no-op.
//!
//! [`take_result`]: RerollScheduler::take_result
//! [`tick`]: RerollScheduler::tick

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use reroll_types::{CandidateEntity, FilterSpecification, RerollState, RunId};
use tracing::{error, info, warn};

use crate::config::{PipelineConfig, RerollConfig, SchedulerConfig};
use crate::error::{BeginError, HostError, RunFault};
use crate::finalize;
use crate::forced::ForcedConstraints;
use crate::host::RerollHost;
use crate::pipeline::{AcceptanceKind, GenerationPipeline, IterationOutcome};
use crate::session::{CandidateSession, RunStats};

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Identifier of the run.
    pub run_id: RunId,
    /// Target slot index.
    pub index: usize,
    /// Terminal state the run reached.
    pub state: RerollState,
    /// The finalized candidate; only present for `Completed` runs.
    pub candidate: Option<CandidateEntity>,
    /// Pipeline iterations executed.
    pub iterations: u32,
    /// Iteration ceiling of the run.
    pub limit: u32,
    /// Why the candidate was accepted, for `Completed` runs.
    pub acceptance: Option<AcceptanceKind>,
    /// Counters collected during the run.
    pub stats: RunStats,
    /// When the run began.
    pub started_at: DateTime<Utc>,
    /// When the run reached its terminal state.
    pub finished_at: DateTime<Utc>,
    /// Wall-clock time between begin and the terminal state.
    pub elapsed: Duration,
    /// The fault that ended an `Error` run.
    pub error: Option<RunFault>,
}

#[derive(Debug, Clone, Copy)]
struct RunClock {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl RunClock {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }
}

/// Drives one reroll run at a time against a host.
#[derive(Debug)]
pub struct RerollScheduler<H> {
    host: H,
    filter: FilterSpecification,
    forced: ForcedConstraints,
    pipeline: PipelineConfig,
    budgets: SchedulerConfig,
    rng: SmallRng,
    state: RerollState,
    session: Option<CandidateSession>,
    clock: Option<RunClock>,
    result: Option<RunResult>,
}

impl<H: RerollHost> RerollScheduler<H> {
    /// Create an idle scheduler.
    pub fn new(host: H, filter: FilterSpecification, config: &RerollConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(|| SmallRng::from_rng(&mut rand::rng()), SmallRng::seed_from_u64);
        Self {
            host,
            filter,
            forced: ForcedConstraints::none(),
            pipeline: config.pipeline,
            budgets: config.scheduler,
            rng,
            state: RerollState::Idle,
            session: None,
            clock: None,
            result: None,
        }
    }

    /// Builder: install forced constraints.
    #[must_use]
    pub fn with_forced(mut self, forced: ForcedConstraints) -> Self {
        self.forced = forced;
        self
    }

    /// Replace the filter used by subsequent runs. A running run keeps its
    /// snapshot.
    pub fn set_filter(&mut self, filter: FilterSpecification) {
        self.filter = filter;
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a run for slot `index` with the given iteration ceiling.
    ///
    /// # Errors
    ///
    /// - [`BeginError::AlreadyRunning`] if a run is in progress; it is left
    ///   untouched.
    /// - [`BeginError::NotIdle`] if a finished run's result was not taken.
    /// - [`BeginError::InvalidLimit`] if `limit` is zero.
    /// - [`BeginError::Setup`] if obtaining the candidate or the initial
    ///   background synthesis failed; the scheduler is then in `Error`.
    pub fn begin(&mut self, index: usize, limit: u32) -> Result<RunId, BeginError> {
        if self.state == RerollState::Running {
            let run_id = self
                .session
                .as_ref()
                .map_or_else(RunId::new, CandidateSession::run_id);
            return Err(BeginError::AlreadyRunning { run_id });
        }
        if self.state != RerollState::Idle {
            return Err(BeginError::NotIdle { state: self.state });
        }
        if limit == 0 {
            return Err(BeginError::InvalidLimit { limit });
        }

        let clock = RunClock::start();
        self.clock = Some(clock);
        match self.start_session(index, limit) {
            Ok(session) => {
                let run_id = session.run_id();
                info!(
                    run_id = %run_id,
                    index,
                    limit,
                    adult_eligible = session.adult_eligible(),
                    "Reroll run started"
                );
                self.session = Some(session);
                self.state = RerollState::Running;
                Ok(run_id)
            }
            Err(fault) => {
                error!(index, error = %fault, "Reroll session setup failed");
                let run_id = RunId::new();
                self.result = Some(RunResult {
                    run_id,
                    index,
                    state: RerollState::Error,
                    candidate: None,
                    iterations: 0,
                    limit,
                    acceptance: None,
                    stats: RunStats::default(),
                    started_at: clock.started_at,
                    finished_at: Utc::now(),
                    elapsed: clock.started.elapsed(),
                    error: Some(fault.clone()),
                });
                self.state = RerollState::Error;
                Err(BeginError::Setup { source: fault })
            }
        }
    }

    fn start_session(&mut self, index: usize, limit: u32) -> Result<CandidateSession, RunFault> {
        let request = self.host.generation_request(index)?;
        let candidate = self.host.obtain(index)?;
        let rng = SmallRng::from_rng(&mut self.rng);
        let mut session = CandidateSession::new(index, limit, candidate, request, &self.filter, rng);

        if let Err(err) = session.setup(&mut self.host, self.pipeline.adulthood_age_years) {
            if let Err(discard_err) = self.host.discard(index, session.into_candidate()) {
                warn!(index, error = %discard_err, "Discarding candidate after failed setup failed");
            }
            return Err(err.into());
        }
        Ok(session)
    }

    /// Run up to `max_iterations` pipeline iterations, stopping early once
    /// `max_elapsed` has passed or the run ends. Returns the state after
    /// the call. A no-op unless `Running`.
    ///
    /// At least one iteration runs when `max_iterations` is positive, even
    /// with a zero time budget.
    pub fn tick(&mut self, max_iterations: u32, max_elapsed: Duration) -> RerollState {
        if self.state != RerollState::Running {
            return self.state;
        }
        let Some(mut session) = self.session.take() else {
            return self.state;
        };

        let started = Instant::now();
        let pipeline = GenerationPipeline::new(&self.pipeline, &self.forced);
        let mut finished: Option<AcceptanceKind> = None;
        let mut fatal: Option<RunFault> = None;
        let mut ran: u32 = 0;

        while ran < max_iterations {
            ran = ran.saturating_add(1);
            match pipeline.run_iteration(&mut session, &mut self.host) {
                Ok(IterationOutcome::Accepted(kind)) => {
                    finished = Some(kind);
                    break;
                }
                Ok(IterationOutcome::Rejected(_)) => {}
                Err(err) => {
                    warn!(
                        run_id = %session.run_id(),
                        iteration = session.iteration(),
                        error = %err,
                        "Generator fault; replacing candidate"
                    );
                    if let Err(host_err) = Self::recover(&mut session, &mut self.host) {
                        fatal = Some(host_err.into());
                        break;
                    }
                }
            }
            if session.ceiling_reached() {
                finished = Some(AcceptanceKind::CeilingReached);
                break;
            }
            if started.elapsed() >= max_elapsed {
                break;
            }
        }

        if let Some(fault) = fatal {
            self.fail(session, fault, false);
        } else if let Some(kind) = finished {
            self.complete(session, kind);
        } else {
            self.session = Some(session);
        }
        self.state
    }

    /// [`tick`](Self::tick) with the configured per-tick budgets.
    pub fn tick_budgeted(&mut self) -> RerollState {
        self.tick(
            self.budgets.step_budget,
            Duration::from_millis(self.budgets.time_budget_ms),
        )
    }

    /// Discard the faulted candidate and adopt a fresh one.
    fn recover(session: &mut CandidateSession, host: &mut H) -> Result<(), HostError> {
        let index = session.index();
        host.discard(index, session.take_candidate())?;
        let fresh = host.obtain(index)?;
        session.adopt(fresh);
        session.stats.recovered_faults = session.stats.recovered_faults.saturating_add(1);
        Ok(())
    }

    /// Abandon the running run: discard its candidate without finalizing.
    /// Returns whether a run was cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.state != RerollState::Running {
            return false;
        }
        let Some(session) = self.session.take() else {
            return false;
        };

        let result = self.result_for(&session, RerollState::Cancelled, None, None);
        let index = session.index();
        if let Err(err) = self.host.discard(index, session.into_candidate()) {
            warn!(run_id = %result.run_id, error = %err, "Discarding cancelled candidate failed");
        }
        info!(
            run_id = %result.run_id,
            index,
            iterations = result.iterations,
            "Reroll run cancelled"
        );
        self.result = Some(result);
        self.state = RerollState::Cancelled;
        true
    }

    /// Finalize the running run's current candidate as-is. Returns whether
    /// a run was ended.
    pub fn end(&mut self) -> bool {
        if self.state != RerollState::Running {
            return false;
        }
        let Some(session) = self.session.take() else {
            return false;
        };
        self.complete(session, AcceptanceKind::Ended);
        true
    }

    /// Take the finished run's result, returning the scheduler to `Idle`.
    /// `None` unless the scheduler is in a terminal state.
    pub fn take_result(&mut self) -> Option<RunResult> {
        if !self.state.is_terminal() {
            return None;
        }
        self.state = RerollState::Idle;
        self.clock = None;
        self.result.take()
    }

    fn complete(&mut self, mut session: CandidateSession, kind: AcceptanceKind) {
        if let Err(fault) = finalize::finalize(&mut session, &mut self.host, kind) {
            self.fail(session, fault, true);
            return;
        }

        let mut result = self.result_for(&session, RerollState::Completed, Some(kind), None);
        info!(
            run_id = %result.run_id,
            index = result.index,
            iterations = result.iterations,
            limit = result.limit,
            acceptance = ?kind,
            elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
            rejections = result.stats.total_rejections(),
            reshuffles = result.stats.reshuffles,
            cache_restores = result.stats.cache_restores,
            recovered_faults = result.stats.recovered_faults,
            "Reroll run completed"
        );
        result.candidate = Some(session.into_candidate());
        self.result = Some(result);
        self.state = RerollState::Completed;
    }

    fn fail(&mut self, session: CandidateSession, fault: RunFault, discard: bool) {
        let result = self.result_for(&session, RerollState::Error, None, Some(fault));
        error!(
            run_id = %result.run_id,
            index = result.index,
            iterations = result.iterations,
            error = ?result.error,
            "Reroll run aborted"
        );
        if discard {
            if let Err(err) = self.host.discard(result.index, session.into_candidate()) {
                warn!(run_id = %result.run_id, error = %err, "Discarding aborted candidate failed");
            }
        }
        self.result = Some(result);
        self.state = RerollState::Error;
    }

    fn result_for(
        &self,
        session: &CandidateSession,
        state: RerollState,
        acceptance: Option<AcceptanceKind>,
        error: Option<RunFault>,
    ) -> RunResult {
        let clock = self.clock.unwrap_or_else(RunClock::start);
        RunResult {
            run_id: session.run_id(),
            index: session.index(),
            state,
            candidate: None,
            iterations: session.iteration(),
            limit: session.limit(),
            acceptance,
            stats: session.stats(),
            started_at: clock.started_at,
            finished_at: Utc::now(),
            elapsed: clock.started.elapsed(),
            error,
        }
    }

    // -----------------------------------------------------------------------
    // Observables
    // -----------------------------------------------------------------------

    /// Current state.
    pub const fn state(&self) -> RerollState {
        self.state
    }

    /// Iterations executed by the current or most recent run.
    pub fn iteration(&self) -> u32 {
        self.session.as_ref().map_or_else(
            || self.result.as_ref().map_or(0, |r| r.iterations),
            CandidateSession::iteration,
        )
    }

    /// Target slot of the current or most recent run.
    pub fn target_index(&self) -> Option<usize> {
        self.session
            .as_ref()
            .map(CandidateSession::index)
            .or_else(|| self.result.as_ref().map(|r| r.index))
    }

    /// Iteration ceiling of the current or most recent run.
    pub fn limit(&self) -> Option<u32> {
        self.session
            .as_ref()
            .map(CandidateSession::limit)
            .or_else(|| self.result.as_ref().map(|r| r.limit))
    }

    /// The session of the running run.
    pub const fn session(&self) -> Option<&CandidateSession> {
        self.session.as_ref()
    }

    /// The live candidate of the running run.
    pub fn candidate(&self) -> Option<&CandidateEntity> {
        self.session.as_ref().map(CandidateSession::candidate)
    }

    /// The held result of a finished run.
    pub const fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    /// The filter used by the next run.
    pub const fn filter(&self) -> &FilterSpecification {
        &self.filter
    }

    /// The host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably. Only meaningful between runs.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the scheduler, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reroll_types::{Passion, SkillConstraint, SkillDef, SkillRecord};

    use super::*;
    use crate::error::Operation;
    use crate::scripted::ScriptedHost;

    fn seeded() -> RerollConfig {
        RerollConfig {
            seed: Some(11),
            ..RerollConfig::default()
        }
    }

    fn unreachable_filter() -> FilterSpecification {
        let mut filter = FilterSpecification::default();
        filter
            .skills
            .push(SkillConstraint::new(SkillDef::new("Shooting"), 20, Passion::Major));
        filter
    }

    fn shooter_host(level: u32) -> ScriptedHost {
        ScriptedHost::new().with_skills(vec![vec![SkillRecord::new(
            "Shooting",
            level,
            Passion::None,
        )]])
    }

    #[test]
    fn misuse_is_ignored() {
        let mut scheduler =
            RerollScheduler::new(ScriptedHost::new(), FilterSpecification::default(), &seeded());
        assert_eq!(scheduler.tick(10, Duration::from_millis(5)), RerollState::Idle);
        assert!(!scheduler.cancel());
        assert!(!scheduler.end());
        assert!(scheduler.take_result().is_none());
        assert_eq!(scheduler.iteration(), 0);
    }

    #[test]
    fn begin_rejects_zero_limit() {
        let mut scheduler =
            RerollScheduler::new(ScriptedHost::new(), FilterSpecification::default(), &seeded());
        assert!(matches!(
            scheduler.begin(0, 0),
            Err(BeginError::InvalidLimit { limit: 0 })
        ));
        assert_eq!(scheduler.state(), RerollState::Idle);
    }

    #[test]
    fn begin_while_running_is_signalled() {
        let mut scheduler =
            RerollScheduler::new(shooter_host(1), unreachable_filter(), &seeded());
        let run_id = scheduler.begin(2, 50).unwrap();
        let again = scheduler.begin(2, 50);
        assert!(matches!(again, Err(BeginError::AlreadyRunning { run_id: id }) if id == run_id));
        assert_eq!(scheduler.state(), RerollState::Running);
        assert_eq!(scheduler.target_index(), Some(2));
        assert_eq!(scheduler.limit(), Some(50));
    }

    #[test]
    fn unconstrained_filter_accepts_first_iteration() {
        let mut scheduler =
            RerollScheduler::new(ScriptedHost::new(), FilterSpecification::default(), &seeded());
        scheduler.begin(0, 10).unwrap();
        let state = scheduler.tick(100, Duration::from_secs(1));
        assert_eq!(state, RerollState::Completed);

        let result = scheduler.take_result().unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.acceptance, Some(AcceptanceKind::Satisfied));
        let candidate = result.candidate.unwrap();
        assert!(candidate.relations_linked);
        assert!(candidate.notified);
        assert!(finalize::is_fully_finalized(&candidate));
        assert_eq!(scheduler.state(), RerollState::Idle);
    }

    #[test]
    fn tick_respects_iteration_budget() {
        let mut scheduler =
            RerollScheduler::new(shooter_host(1), unreachable_filter(), &seeded());
        scheduler.begin(0, 100).unwrap();
        assert_eq!(scheduler.tick(7, Duration::from_secs(5)), RerollState::Running);
        assert_eq!(scheduler.iteration(), 7);
        assert_eq!(scheduler.tick(0, Duration::from_secs(5)), RerollState::Running);
        assert_eq!(scheduler.iteration(), 7);
    }

    #[test]
    fn zero_time_budget_still_runs_one_iteration() {
        let mut scheduler =
            RerollScheduler::new(shooter_host(1), unreachable_filter(), &seeded());
        scheduler.begin(0, 100).unwrap();
        scheduler.tick(50, Duration::ZERO);
        assert_eq!(scheduler.iteration(), 1);
    }

    #[test]
    fn ceiling_completes_best_effort() {
        let mut scheduler =
            RerollScheduler::new(shooter_host(1), unreachable_filter(), &seeded());
        scheduler.begin(0, 12).unwrap();
        let state = scheduler.tick(1000, Duration::from_secs(5));
        assert_eq!(state, RerollState::Completed);
        let result = scheduler.take_result().unwrap();
        assert_eq!(result.iterations, 12);
        assert_eq!(result.acceptance, Some(AcceptanceKind::CeilingReached));
        assert!(result.candidate.is_some());
    }

    #[test]
    fn terminal_state_blocks_begin_until_taken() {
        let mut scheduler =
            RerollScheduler::new(ScriptedHost::new(), FilterSpecification::default(), &seeded());
        scheduler.begin(0, 5).unwrap();
        scheduler.tick(5, Duration::from_secs(1));
        assert!(matches!(
            scheduler.begin(1, 5),
            Err(BeginError::NotIdle {
                state: RerollState::Completed
            })
        ));
        scheduler.take_result();
        assert!(scheduler.begin(1, 5).is_ok());
    }

    #[test]
    fn setup_failure_enters_error() {
        let host = ScriptedHost::new().fail_on(Operation::Background, 1);
        let mut scheduler = RerollScheduler::new(host, FilterSpecification::default(), &seeded());
        let err = scheduler.begin(0, 5).unwrap_err();
        assert!(matches!(err, BeginError::Setup { .. }));
        assert_eq!(scheduler.state(), RerollState::Error);
        assert_eq!(scheduler.host().discarded().len(), 1);
        let result = scheduler.take_result().unwrap();
        assert!(result.error.is_some());
    }

    #[test]
    fn generator_fault_replaces_candidate() {
        let host = ScriptedHost::new().fail_on(Operation::Traits, 1);
        let mut scheduler = RerollScheduler::new(host, FilterSpecification::default(), &seeded());
        scheduler.begin(0, 10).unwrap();
        let state = scheduler.tick(10, Duration::from_secs(1));
        assert_eq!(state, RerollState::Completed);

        let result = scheduler.take_result().unwrap();
        assert_eq!(result.iterations, 2);
        assert_eq!(result.stats.recovered_faults, 1);
        assert_eq!(scheduler.host().discarded().len(), 1);
        assert_eq!(scheduler.host().calls().obtains, 2);
    }

    #[test]
    fn failed_reacquisition_is_fatal() {
        let host = ScriptedHost::new()
            .fail_on(Operation::Skills, 1)
            .fail_obtain_after(1);
        let mut scheduler = RerollScheduler::new(host, FilterSpecification::default(), &seeded());
        scheduler.begin(0, 10).unwrap();
        assert_eq!(scheduler.tick(10, Duration::from_secs(1)), RerollState::Error);
        let result = scheduler.take_result().unwrap();
        assert!(matches!(result.error, Some(RunFault::Host(_))));
        assert!(result.candidate.is_none());
    }

    #[test]
    fn finalization_failure_enters_error() {
        let host = ScriptedHost::new().fail_on(Operation::Redress, 1);
        let mut scheduler = RerollScheduler::new(host, FilterSpecification::default(), &seeded());
        scheduler.begin(0, 10).unwrap();
        assert_eq!(scheduler.tick(10, Duration::from_secs(1)), RerollState::Error);
        assert_eq!(scheduler.host().discarded().len(), 1);
    }

    #[test]
    fn style_failure_is_not_fatal() {
        let host = ScriptedHost::new().fail_on(Operation::Style, 1);
        let mut scheduler = RerollScheduler::new(host, FilterSpecification::default(), &seeded());
        scheduler.begin(0, 10).unwrap();
        assert_eq!(
            scheduler.tick(10, Duration::from_secs(1)),
            RerollState::Completed
        );
    }

    #[test]
    fn external_end_finalizes_current_candidate() {
        let mut scheduler =
            RerollScheduler::new(shooter_host(1), unreachable_filter(), &seeded());
        scheduler.begin(0, 100).unwrap();
        scheduler.tick(3, Duration::from_secs(1));
        assert!(scheduler.end());
        assert!(!scheduler.end());
        let result = scheduler.take_result().unwrap();
        assert_eq!(result.acceptance, Some(AcceptanceKind::Ended));
        assert_eq!(result.iterations, 3);
        assert!(result.candidate.unwrap().notified);
    }
}
