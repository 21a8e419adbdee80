//! Scheduler Façade: the single entry point called by the admin
//! interface. Orchestrates Loader -> Builder -> Solver -> Extractor -> Detector
//! and returns a structured result. Never lets a `SchedulerError` escape:
//! every failure is downgraded to `SchedulerResult { success: false, .. }`
//! naming the stage and the corrective action.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use crate::conflicts::{self, ConflictReport};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::extractor;
use crate::loader;
use crate::model;
use crate::repository::Repository;
use crate::solver::{self, SolveOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStats {
    pub days_used: usize,
    pub rooms_used: usize,
    pub proctors_used: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerResult {
    pub success: bool,
    pub elapsed_seconds: f64,
    pub nb_exams: usize,
    pub stats: Option<ScheduleStats>,
    pub message: String,
    #[serde(skip)]
    pub residual_conflicts: Option<ConflictReport>,
}

impl SchedulerResult {
    fn failure(elapsed: f64, message: impl Into<String>) -> Self {
        SchedulerResult {
            success: false,
            elapsed_seconds: elapsed,
            nb_exams: 0,
            stats: None,
            message: message.into(),
            residual_conflicts: None,
        }
    }
}

/// `optimizeSchedule(sessionId, startDate, nbDays) -> Result`.
pub async fn optimize_schedule(
    repo: &dyn Repository,
    session_id: i32,
    start_date: NaiveDate,
    nb_days: i32,
    config: &SchedulerConfig,
    cancelled: &AtomicBool,
) -> SchedulerResult {
    let started = Instant::now();

    if !(5..=30).contains(&nb_days) {
        return SchedulerResult::failure(
            started.elapsed().as_secs_f64(),
            format!("nb_days must be in [5, 30], got {nb_days}"),
        );
    }

    let input = match loader::load(repo, session_id, config).await {
        Ok(input) => input,
        Err(SchedulerError::InputEmpty(_)) => {
            return SchedulerResult::failure(started.elapsed().as_secs_f64(), "no modules to schedule");
        }
        Err(e) => {
            return SchedulerResult::failure(
                started.elapsed().as_secs_f64(),
                format!("loading stage failed: {e}"),
            );
        }
    };

    let solver_model = match model::build(&input, nb_days, config) {
        Ok(m) => m,
        Err(SchedulerError::CapacityInfeasible(module_id)) => {
            let code = input
                .modules
                .iter()
                .find(|m| m.id == module_id)
                .map(|m| m.code.as_str())
                .unwrap_or("?");
            return SchedulerResult::failure(
                started.elapsed().as_secs_f64(),
                format!(
                    "model-building stage failed: module {code} (id {module_id}) has no room with sufficient exam capacity"
                ),
            );
        }
        Err(e) => {
            return SchedulerResult::failure(
                started.elapsed().as_secs_f64(),
                format!("model-building stage failed: {e}"),
            );
        }
    };

    let solved = match solver::solve(solver_model, config, cancelled).await {
        Ok(None) => {
            return SchedulerResult::failure(started.elapsed().as_secs_f64(), "cancelled");
        }
        Ok(Some(out)) => out,
        Err(e) => {
            return SchedulerResult::failure(
                started.elapsed().as_secs_f64(),
                format!("solver stage failed: {e}"),
            );
        }
    };

    let elapsed = started.elapsed().as_secs_f64();
    match solved.outcome {
        SolveOutcome::Optimal | SolveOutcome::Feasible => {}
        SolveOutcome::Infeasible => {
            return SchedulerResult::failure(
                elapsed,
                "no feasible schedule exists within the posted constraints -- try increasing nb_days or widening room availability",
            );
        }
        SolveOutcome::Unknown => {
            return SchedulerResult::failure(
                elapsed,
                "solver exceeded its time budget without finding a solution -- try increasing nb_days",
            );
        }
    }

    let exams = extractor::extract(&solved, &input, session_id, start_date);
    let stats = ScheduleStats {
        days_used: exams.iter().map(|e| e.date).collect::<HashSet<_>>().len(),
        rooms_used: exams.iter().map(|e| e.room_id).collect::<HashSet<_>>().len(),
        proctors_used: exams.iter().map(|e| e.proctor_id).collect::<HashSet<_>>().len(),
    };
    let nb_exams = exams.len();

    if let Err(e) = extractor::persist(repo, session_id, exams).await {
        return SchedulerResult::failure(
            started.elapsed().as_secs_f64(),
            format!("persistence stage failed, prior schedule left intact: {e}"),
        );
    }

    let residual = match conflicts::run(repo, session_id, true).await {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("conflict detection failed after a successful schedule: {e}");
            None
        }
    };

    let elapsed = started.elapsed().as_secs_f64();
    info!(
        "session {}: scheduled {} exams in {:.2}s ({:?})",
        session_id, nb_exams, elapsed, solved.outcome
    );

    SchedulerResult {
        success: true,
        elapsed_seconds: elapsed,
        nb_exams,
        stats: Some(stats),
        message: format!("schedule generated successfully in {elapsed:.2}s"),
        residual_conflicts: residual,
    }
}
