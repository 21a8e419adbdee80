//! Solver Driver: invokes the CP-SAT solver with a time and
//! parallelism budget, classifies the termination status.

use std::sync::atomic::{AtomicBool, Ordering};

use cp_sat::proto::{CpSolverResponse, CpSolverStatus, SatParameters};
use log::info;

use crate::config::SchedulerConfig;
use crate::model::{ModuleVars, SolverModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

pub struct SolveOutput {
    pub outcome: SolveOutcome,
    pub response: CpSolverResponse,
    pub(crate) vars: Vec<ModuleVars>,
}

/// Runs the blocking CP-SAT solve on a dedicated thread so the async runtime
/// is not starved for the duration of the (up to `max_solver_seconds`) call.
///
/// `cancelled` is polled immediately before the blocking call is spawned; a
/// solve already in flight cannot be interrupted (the `cp_sat` surface used
/// here exposes no callback hook), so a signal raised mid-solve is honoured
/// only after the call returns, by discarding its result.
pub async fn solve(
    model: SolverModel,
    config: &SchedulerConfig,
    cancelled: &AtomicBool,
) -> Result<Option<SolveOutput>, anyhow::Error> {
    if cancelled.load(Ordering::SeqCst) {
        return Ok(None);
    }

    let mut params = SatParameters::default();
    params.max_time_in_seconds = Some(config.max_solver_seconds);
    params.num_search_workers = Some(config.workers);
    params.log_search_progress = Some(config.log_progress);
    params.linearization_level = Some(0);
    params.cp_model_presolve = Some(true);

    let SolverModel { model: builder, vars } = model;

    let response = tokio::task::spawn_blocking(move || builder.solve_with_parameters(&params))
        .await
        .map_err(|e| anyhow::anyhow!("solver task panicked: {e}"))?;

    if cancelled.load(Ordering::SeqCst) {
        info!("solve completed but a cancellation signal arrived meanwhile; discarding result");
        return Ok(None);
    }

    let outcome = match response.status() {
        CpSolverStatus::Optimal => SolveOutcome::Optimal,
        CpSolverStatus::Feasible => SolveOutcome::Feasible,
        CpSolverStatus::Infeasible => SolveOutcome::Infeasible,
        _ => SolveOutcome::Unknown,
    };
    info!("solve finished with status {:?}", outcome);

    Ok(Some(SolveOutput {
        outcome,
        response,
        vars,
    }))
}
