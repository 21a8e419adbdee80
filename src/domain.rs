//! Core domain entities shared by the loader, model builder, extractor and
//! conflict detector. These mirror the persisted schemas of `repository`
//! one-to-one; the scheduler never invents fields beyond what can be
//! round-tripped through the store.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Fixed daily exam start times. Order matters: it is the canonical slot
    /// index used throughout the model (`slot[m] ∈ [0, SLOTS.len())`).
    /// Changing this enumeration is a schema migration, not a config knob.
    pub static ref SLOTS: [NaiveTime; 4] = [
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
    ];
}

pub const EXAM_DURATION_MINUTES: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Future,
    Planning,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i32,
    pub label: String,
    pub academic_year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i32,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    pub id: i32,
    pub department_id: i32,
    pub declared_module_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub formation_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i32,
    pub matricule: String,
    pub formation_id: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Enrolment {
    pub student_id: i32,
    pub module_id: i32,
    pub session_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proctor {
    pub id: i32,
    pub department_id: i32,
    /// Per-day surveillance cap. Defaults to 3.
    pub max_surveillance_per_day: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    Amphi,
    Salle,
    Labo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i32,
    pub room_type: RoomType,
    pub capacity: i32,
    pub exam_capacity: i32,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamStatus {
    Planifie,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: i32,
    pub module_id: i32,
    pub session_id: i32,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub room_id: i32,
    pub proctor_id: i32,
    pub enrolled_count: i32,
    pub status: ExamStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    StudentCollision,
    ProctorOverload,
    CapacityOverflow,
}

impl ConflictKind {
    /// Relative severity used when ranking conflicts for review.
    pub fn severity(self) -> i32 {
        match self {
            ConflictKind::StudentCollision => 4,
            ConflictKind::ProctorOverload => 3,
            ConflictKind::CapacityOverflow => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub id: i32,
    pub exam_id: i32,
    pub kind: ConflictKind,
    pub description: String,
    pub severity: i32,
    pub resolved: bool,
    pub detected_at: chrono::NaiveDateTime,
}
