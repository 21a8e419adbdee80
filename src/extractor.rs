//! Solution Extractor: reads the solver's variable assignments,
//! converts indices back to domain entities, and atomically replaces the
//! session's persisted exam records.

use chrono::NaiveDate;
use log::info;

use crate::domain::{Exam, ExamStatus, EXAM_DURATION_MINUTES, SLOTS};
use crate::error::SchedulerError;
use crate::loader::InputModel;
use crate::repository::Repository;
use crate::solver::SolveOutput;

pub fn extract(solved: &SolveOutput, input: &InputModel, session_id: i32, start_date: NaiveDate) -> Vec<Exam> {
    let mut exams = Vec::with_capacity(solved.vars.len());
    for (m, mv) in solved.vars.iter().enumerate() {
        let day = mv.day.solution_value(&solved.response);
        let slot = mv.slot.solution_value(&solved.response);
        let room_idx = mv.room.solution_value(&solved.response) as usize;
        let proctor_idx = mv.proctor.solution_value(&solved.response) as usize;

        exams.push(Exam {
            id: 0,
            module_id: input.module_ids[m],
            session_id,
            date: start_date + chrono::Duration::days(day),
            start_time: SLOTS[slot as usize],
            duration_minutes: EXAM_DURATION_MINUTES,
            room_id: input.rooms[room_idx].id,
            proctor_id: input.proctors[proctor_idx].id,
            enrolled_count: input.size_of[m],
            status: ExamStatus::Planifie,
        });
    }
    exams
}

/// Persists `exams` per the transactional contract: delete then
/// insert within a single transaction, rolling back entirely on failure so
/// the prior schedule remains intact. `Repository::replace_exams` owns the
/// transaction boundary; this function only translates its failure into the
/// scheduler's error vocabulary.
pub async fn persist(
    repo: &dyn Repository,
    session_id: i32,
    exams: Vec<Exam>,
) -> Result<usize, SchedulerError> {
    let count = exams.len();
    repo.replace_exams(session_id, exams).await?;
    info!("session {}: persisted {} exams", session_id, count);
    Ok(count)
}
