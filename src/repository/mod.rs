//! Typed query surface consumed by the rest of the system.
//!
//! The scheduler never talks to the store directly: the Loader reads through
//! a `Repository`, the Extractor writes exam rows through it, and the
//! Conflict Detector's aggregations are likewise routed through it. Tests
//! substitute [`memory::InMemoryRepository`] for a real database, so the
//! pipeline can be exercised without a live connection.

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

use crate::domain::{Conflict, Enrolment, Exam, Module, Proctor, Room};
use crate::error::SchedulerError;
use async_trait::async_trait;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Modules with at least one enrolment in `session_id`, ordered by
    /// enrolment count descending, truncated to `limit`. Returns the
    /// module alongside its enrolment count (`sizeOf[moduleIdx]`).
    async fn examinable_modules(
        &self,
        session_id: i32,
        limit: usize,
    ) -> Result<Vec<(Module, i32)>, SchedulerError>;

    /// Enrolment edges for `session_id`, restricted to `module_ids`.
    async fn enrolments_for_modules(
        &self,
        session_id: i32,
        module_ids: &[i32],
    ) -> Result<Vec<Enrolment>, SchedulerError>;

    /// All rooms with `available = true`, ordered by exam-mode capacity
    /// descending.
    async fn available_rooms(&self) -> Result<Vec<Room>, SchedulerError>;

    /// All proctors, ordered by department.
    async fn proctors(&self) -> Result<Vec<Proctor>, SchedulerError>;

    /// Rooms referenced by a persisted schedule, by id (used by the Conflict
    /// Detector for capacity checks; a room may have since been marked
    /// unavailable without invalidating an already-persisted exam).
    async fn rooms_by_ids(&self, ids: &[i32]) -> Result<Vec<Room>, SchedulerError>;

    /// Proctors referenced by a persisted schedule, by id.
    async fn proctors_by_ids(&self, ids: &[i32]) -> Result<Vec<Proctor>, SchedulerError>;

    /// Atomically replace `session_id`'s Exam rows with `exams`:
    /// delete then insert inside a single transaction, under an
    /// exclusive session-scoped lock. On any failure the prior
    /// schedule must remain intact.
    async fn replace_exams(&self, session_id: i32, exams: Vec<Exam>) -> Result<(), SchedulerError>;

    /// All Exam rows persisted for `session_id`.
    async fn exams_for_session(&self, session_id: i32) -> Result<Vec<Exam>, SchedulerError>;

    /// Append newly detected conflicts to the `conflicts` log. Never
    /// deletes or mutates existing rows.
    async fn insert_conflicts(&self, conflicts: Vec<Conflict>) -> Result<(), SchedulerError>;
}
