//! Conflict-minimising examination timetable scheduler.
//!
//! Given a population of students, their module enrolments, a pool of rooms
//! and a pool of proctor-eligible instructors, [`facade::optimize_schedule`]
//! assigns each examined module a (day, time-slot, room, proctor) tuple that
//! respects hard feasibility constraints and optimises soft preferences,
//! then persists the result and validates it with [`conflicts`].

pub mod conflicts;
pub mod config;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod facade;
pub mod loader;
pub mod model;
pub mod repository;
pub mod solver;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use facade::{optimize_schedule, ScheduleStats, SchedulerResult};
