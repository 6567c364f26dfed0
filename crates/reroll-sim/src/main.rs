//! Reference host binary for the reroll engine.
//!
//! Rerolls each configured slot in turn, driving the scheduler from a paced
//! frame loop the way an interactive host would: one budgeted tick per
//! frame, so a long run never stalls the frame it is sliced into.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `reroll-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the random host and the scheduler
//! 4. Run every slot, one budgeted tick per frame
//! 5. Log the per-run summaries

mod catalog;
mod config;
mod error;
mod host;

use std::path::Path;
use std::time::Duration;

use reroll_core::config::LoggingConfig;
use reroll_core::forced::ForcedConstraints;
use reroll_core::{BeginError, RerollConfig, RerollHost, RerollScheduler, RunResult};
use reroll_types::{RerollState, RunId};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::host::RandomHost;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "reroll-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, or a run start fails.
#[tokio::main]
async fn main() -> Result<(), SimError> {
    // 1. Load configuration.
    let (config, sim) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        slots = sim.slots,
        frame_interval_ms = sim.frame_interval_ms,
        step_budget = config.scheduler.step_budget,
        time_budget_ms = config.scheduler.time_budget_ms,
        iteration_limit = config.scheduler.iteration_limit,
        seed = ?config.seed,
        "reroll-sim starting"
    );

    // 3. Build the host and scheduler.
    let host = RandomHost::new(
        Catalog::builtin(),
        sim.slots,
        config.seed,
        config.pipeline.adulthood_age_years,
    );
    let mut forced = ForcedConstraints::none();
    if let Some(range) = sim.forced_age {
        forced = forced.with_age_range(range);
    }
    let mut scheduler =
        RerollScheduler::new(host, config.filter_or_default(), &config).with_forced(forced);

    // 4. Run every slot.
    let mut results = Vec::with_capacity(sim.slots);
    for index in 0..sim.slots {
        let result = run_slot(&mut scheduler, &sim, index, config.scheduler.iteration_limit).await?;
        let interrupted = result.state == RerollState::Cancelled;
        results.push(result);
        if interrupted {
            break;
        }
    }

    // 5. Log the summaries.
    for result in &results {
        log_result(result);
        let printed = result.candidate.as_ref().filter(|_| sim.print_candidates);
        if let Some(candidate) = printed {
            println!("{}", serde_json::to_string_pretty(candidate)?);
        }
    }
    info!(
        runs = results.len(),
        discards = scheduler.host().discards(),
        "reroll-sim shutdown complete"
    );
    Ok(())
}

/// Drive one run to a terminal state, one tick per frame. Ctrl-C cancels
/// the run; exceeding the frame cap ends it with the current candidate.
async fn run_slot(
    scheduler: &mut RerollScheduler<RandomHost>,
    sim: &SimConfig,
    index: usize,
    limit: u32,
) -> Result<RunResult, SimError> {
    let run_id = match scheduler.begin(index, limit) {
        Ok(run_id) => run_id,
        Err(BeginError::Setup { source }) => {
            warn!(index, error = %source, "Run failed during setup");
            return scheduler
                .take_result()
                .ok_or(SimError::MissingResult { index });
        }
        Err(err) => return Err(err.into()),
    };

    let frame_count = drive_frames(scheduler, sim, run_id, tokio::signal::ctrl_c()).await;

    info!(run_id = %run_id, index, frames = frame_count, "Run finished");
    scheduler
        .take_result()
        .ok_or(SimError::MissingResult { index })
}

/// Tick once per frame until the run leaves `Running`. `interrupt` is
/// polled before each frame and cancels the run once it resolves; exceeding the frame cap ends it with the
/// current candidate. Returns the number of frames ticked.
async fn drive_frames<H, F>(
    scheduler: &mut RerollScheduler<H>,
    sim: &SimConfig,
    run_id: RunId,
    interrupt: F,
) -> u32
where
    H: RerollHost,
    F: Future,
{
    let mut frames = tokio::time::interval(Duration::from_millis(sim.frame_interval_ms.max(1)));
    let mut frame_count: u32 = 0;
    tokio::pin!(interrupt);
    loop {
        tokio::select! {
            biased;
            _ = &mut interrupt => {
                warn!(run_id = %run_id, "Interrupted; cancelling run");
                scheduler.cancel();
            }
            _ = frames.tick() => {
                frame_count = frame_count.saturating_add(1);
                if scheduler.tick_budgeted() == RerollState::Running
                    && frame_count >= sim.max_frames_per_run
                {
                    warn!(
                        run_id = %run_id,
                        frames = frame_count,
                        iterations = scheduler.iteration(),
                        "Frame cap reached; ending run with current candidate"
                    );
                    scheduler.end();
                }
            }
        }
        if scheduler.state() != RerollState::Running {
            return frame_count;
        }
    }
}

fn log_result(result: &RunResult) {
    let name = result
        .candidate
        .as_ref()
        .and_then(|c| c.name.as_ref())
        .map(ToString::to_string);
    info!(
        run_id = %result.run_id,
        index = result.index,
        state = ?result.state,
        acceptance = ?result.acceptance,
        iterations = result.iterations,
        limit = result.limit,
        elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
        started_at = %result.started_at,
        rejections = result.stats.total_rejections(),
        reshuffles = result.stats.reshuffles,
        name = ?name,
        error = ?result.error,
        "Run summary"
    );
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) -> Result<(), SimError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| SimError::Logging {
        message: format!("{e}"),
    })
}

/// Load configuration from `reroll-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
/// If it does not exist, defaults are used.
fn load_config() -> Result<(RerollConfig, SimConfig), SimError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = RerollConfig::from_file(config_path)?;
        let contents = std::fs::read_to_string(config_path).map_err(|e| SimError::SimConfig {
            message: format!("failed to read config file: {e}"),
        })?;
        let sim = SimConfig::from_document(&contents)?;
        Ok((config, sim))
    } else {
        let mut config = RerollConfig::default();
        config.logging.apply_env_override();
        Ok((config, SimConfig::default()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reroll_core::AcceptanceKind;
    use reroll_core::scripted::ScriptedHost;
    use reroll_types::{FilterSpecification, Passion, SkillConstraint, SkillDef};

    use super::*;

    /// No scripted skill draw ever reaches level 20.
    fn unreachable_filter() -> FilterSpecification {
        let mut filter = FilterSpecification::default();
        filter
            .skills
            .push(SkillConstraint::new(SkillDef::new("Shooting"), 20, Passion::None));
        filter
    }

    fn paced(max_frames_per_run: u32) -> SimConfig {
        SimConfig {
            frame_interval_ms: 1,
            max_frames_per_run,
            ..SimConfig::default()
        }
    }

    #[tokio::test]
    async fn resolved_interrupt_cancels_before_any_frame() {
        let mut scheduler = RerollScheduler::new(
            ScriptedHost::new(),
            unreachable_filter(),
            &RerollConfig::default(),
        );
        let run_id = scheduler.begin(0, 1_000_000).unwrap();

        let frames = drive_frames(&mut scheduler, &paced(600), run_id, std::future::ready(())).await;
        assert_eq!(frames, 0);

        let result = scheduler.take_result().unwrap();
        assert_eq!(result.state, RerollState::Cancelled);
        assert_eq!(scheduler.host().calls().notifications, 0);
        assert_eq!(scheduler.host().discarded().len(), 1);
    }

    #[tokio::test]
    async fn frame_cap_ends_run_with_current_candidate() {
        let mut scheduler = RerollScheduler::new(
            ScriptedHost::new(),
            unreachable_filter(),
            &RerollConfig::default(),
        );
        let run_id = scheduler.begin(0, 1_000_000).unwrap();

        let frames =
            drive_frames(&mut scheduler, &paced(2), run_id, std::future::pending::<()>()).await;
        assert_eq!(frames, 2);

        let result = scheduler.take_result().unwrap();
        assert_eq!(result.state, RerollState::Completed);
        assert_eq!(result.acceptance, Some(AcceptanceKind::Ended));
        assert!(result.candidate.unwrap().notified);
    }
}
