//! Conflict Detector: recomputes student-collision, proctor-overload
//! and room-capacity violations directly from the persisted schedule. Acts
//! both as the Model Builder's validation oracle and the user-facing
//! quality report.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};

use crate::domain::{Conflict, ConflictKind};
use crate::error::SchedulerError;
use crate::repository::Repository;

#[derive(Debug, Clone)]
pub struct StudentCollision {
    pub student_id: i32,
    pub date: NaiveDate,
    pub count: usize,
    pub module_ids: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct ProctorOverload {
    pub proctor_id: i32,
    pub date: NaiveDate,
    pub count: usize,
    pub cap: i32,
}

#[derive(Debug, Clone)]
pub struct CapacityOverflow {
    pub exam_id: i32,
    pub module_id: i32,
    pub enrolled_count: i32,
    pub exam_capacity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    pub student_collisions: Vec<StudentCollision>,
    pub proctor_overloads: Vec<ProctorOverload>,
    pub capacity_overflows: Vec<CapacityOverflow>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.student_collisions.is_empty()
            && self.proctor_overloads.is_empty()
            && self.capacity_overflows.is_empty()
    }
}

pub async fn student_collisions(
    repo: &dyn Repository,
    session_id: i32,
) -> Result<Vec<StudentCollision>, SchedulerError> {
    let exams = repo.exams_for_session(session_id).await?;
    let module_ids: Vec<i32> = exams.iter().map(|e| e.module_id).collect();
    let enrolments = repo.enrolments_for_modules(session_id, &module_ids).await?;

    let date_of_module: HashMap<i32, NaiveDate> =
        exams.iter().map(|e| (e.module_id, e.date)).collect();

    // student -> date -> module ids examined that day
    let mut per_student: HashMap<i32, HashMap<NaiveDate, Vec<i32>>> = HashMap::new();
    for e in &enrolments {
        if let Some(&date) = date_of_module.get(&e.module_id) {
            per_student
                .entry(e.student_id)
                .or_default()
                .entry(date)
                .or_default()
                .push(e.module_id);
        }
    }

    let mut collisions = Vec::new();
    for (student_id, by_date) in per_student {
        for (date, module_ids) in by_date {
            if module_ids.len() >= 2 {
                collisions.push(StudentCollision {
                    student_id,
                    date,
                    count: module_ids.len(),
                    module_ids,
                });
            }
        }
    }
    collisions.sort_by(|a, b| a.student_id.cmp(&b.student_id).then(a.date.cmp(&b.date)));
    Ok(collisions)
}

pub async fn proctor_overloads(
    repo: &dyn Repository,
    session_id: i32,
) -> Result<Vec<ProctorOverload>, SchedulerError> {
    let exams = repo.exams_for_session(session_id).await?;
    let proctor_ids: Vec<i32> = exams.iter().map(|e| e.proctor_id).collect();
    let proctors = repo.proctors_by_ids(&proctor_ids).await?;
    let cap_of: HashMap<i32, i32> = proctors
        .iter()
        .map(|p| (p.id, p.max_surveillance_per_day))
        .collect();

    let mut counts: HashMap<(i32, NaiveDate), usize> = HashMap::new();
    for e in &exams {
        *counts.entry((e.proctor_id, e.date)).or_insert(0) += 1;
    }

    let mut overloads: Vec<ProctorOverload> = counts
        .into_iter()
        .filter_map(|((proctor_id, date), count)| {
            let cap = *cap_of.get(&proctor_id).unwrap_or(&3);
            (count as i32 > cap).then_some(ProctorOverload {
                proctor_id,
                date,
                count,
                cap,
            })
        })
        .collect();
    overloads.sort_by(|a, b| a.proctor_id.cmp(&b.proctor_id).then(a.date.cmp(&b.date)));
    Ok(overloads)
}

pub async fn capacity_overflows(
    repo: &dyn Repository,
    session_id: i32,
) -> Result<Vec<CapacityOverflow>, SchedulerError> {
    let exams = repo.exams_for_session(session_id).await?;
    let room_ids: Vec<i32> = exams.iter().map(|e| e.room_id).collect();
    let rooms = repo.rooms_by_ids(&room_ids).await?;
    let capacity_of: HashMap<i32, i32> = rooms.iter().map(|r| (r.id, r.exam_capacity)).collect();

    let overflows = exams
        .into_iter()
        .filter_map(|e| {
            let exam_capacity = *capacity_of.get(&e.room_id).unwrap_or(&0);
            (e.enrolled_count > exam_capacity).then_some(CapacityOverflow {
                exam_id: e.id,
                module_id: e.module_id,
                enrolled_count: e.enrolled_count,
                exam_capacity,
            })
        })
        .collect();
    Ok(overflows)
}

/// Runs all three checks and, when `persist` is true, appends the findings
/// to the `conflicts` log -- a log, never a derived view: rows are
/// never deleted here, only appended.
pub async fn run(
    repo: &dyn Repository,
    session_id: i32,
    persist: bool,
) -> Result<ConflictReport, SchedulerError> {
    let report = ConflictReport {
        student_collisions: student_collisions(repo, session_id).await?,
        proctor_overloads: proctor_overloads(repo, session_id).await?,
        capacity_overflows: capacity_overflows(repo, session_id).await?,
    };

    if persist && !report.is_empty() {
        let mut rows = Vec::new();
        let now = Utc::now().naive_utc();
        for c in &report.student_collisions {
            rows.push(new_conflict(
                0,
                ConflictKind::StudentCollision,
                format!(
                    "student {} has {} exams on {}",
                    c.student_id, c.count, c.date
                ),
                now,
            ));
        }
        for o in &report.proctor_overloads {
            rows.push(new_conflict(
                0,
                ConflictKind::ProctorOverload,
                format!(
                    "proctor {} assigned {} exams on {} (cap {})",
                    o.proctor_id, o.count, o.date, o.cap
                ),
                now,
            ));
        }
        for o in &report.capacity_overflows {
            rows.push(new_conflict(
                o.exam_id,
                ConflictKind::CapacityOverflow,
                format!(
                    "exam {} for module {} has {} enrolled against capacity {}",
                    o.exam_id, o.module_id, o.enrolled_count, o.exam_capacity
                ),
                now,
            ));
        }
        repo.insert_conflicts(rows).await?;
    }

    Ok(report)
}

fn new_conflict(
    exam_id: i32,
    kind: ConflictKind,
    description: String,
    detected_at: chrono::NaiveDateTime,
) -> Conflict {
    Conflict {
        id: 0,
        exam_id,
        kind,
        severity: kind.severity(),
        description,
        resolved: false,
        detected_at,
    }
}
