//! Error kinds surfaced by the scheduler.
//!
//! The Façade never lets these escape as an `Err`: every error is downgraded
//! to `Result { success: false, message, .. }` naming the stage at which the
//! failure occurred. Internal plumbing still threads `SchedulerError` through
//! `Result`/`anyhow::Result`.

#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("no examinable modules for session {0}")]
    InputEmpty(i32),

    #[error("module {0} has no room with sufficient exam capacity")]
    CapacityInfeasible(i32),

    #[error("no feasible schedule exists within the posted constraints")]
    SolverInfeasible,

    #[error("solver exceeded its time budget without finding a solution")]
    SolverTimeout,

    #[error("failed to persist schedule: {0}")]
    PersistenceFailure(String),

    #[error("scheduling run was cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(String),
}
