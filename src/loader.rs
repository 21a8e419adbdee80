//! Data Loader: pulls the scheduling input from the Repository and
//! normalises it into dense, 0-based-indexed in-memory tables.

use std::collections::HashMap;

use log::{info, warn};

use crate::config::SchedulerConfig;
use crate::domain::{Module, Proctor, Room};
use crate::error::SchedulerError;
use crate::repository::Repository;

/// Dense, solver-ready view of a session's scheduling input. Indices
/// (`moduleIdx`, `roomIdx`, `proctorIdx`) are contiguous `0..len` and are
/// what the Model Builder's decision variables range over; the `*_ids`
/// vectors map each index back to its persistent identifier.
pub struct InputModel {
    pub modules: Vec<Module>,
    pub module_ids: Vec<i32>,
    /// `sizeOf[moduleIdx] = |enrolments for that module|`.
    pub size_of: Vec<i32>,

    pub rooms: Vec<Room>,
    pub proctors: Vec<Proctor>,

    /// `modulesOfStudent[studentId] -> list of moduleIdx` (only for modules
    /// retained after truncation).
    pub modules_of_student: HashMap<i32, Vec<usize>>,
}

impl InputModel {
    pub fn module_idx(&self, module_id: i32) -> Option<usize> {
        self.module_ids.iter().position(|&id| id == module_id)
    }
}

pub async fn load(
    repo: &dyn Repository,
    session_id: i32,
    config: &SchedulerConfig,
) -> Result<InputModel, SchedulerError> {
    let ranked = repo.examinable_modules(session_id, config.module_limit).await?;
    if ranked.is_empty() {
        return Err(SchedulerError::InputEmpty(session_id));
    }
    if ranked.len() == config.module_limit {
        warn!(
            "session {}: module list truncated to the top {} by enrolment count",
            session_id, config.module_limit
        );
    }

    let modules: Vec<Module> = ranked.iter().map(|(m, _)| m.clone()).collect();
    let module_ids: Vec<i32> = modules.iter().map(|m| m.id).collect();
    let size_of: Vec<i32> = ranked.iter().map(|(_, n)| *n).collect();
    let id_to_idx: HashMap<i32, usize> =
        module_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let enrolments = repo.enrolments_for_modules(session_id, &module_ids).await?;
    let mut modules_of_student: HashMap<i32, Vec<usize>> = HashMap::new();
    for e in &enrolments {
        if let Some(&idx) = id_to_idx.get(&e.module_id) {
            modules_of_student.entry(e.student_id).or_default().push(idx);
        }
    }

    let rooms = repo.available_rooms().await?;
    let proctors = repo.proctors().await?;

    info!(
        "session {}: loaded {} modules, {} rooms, {} proctors, {} enrolments",
        session_id,
        modules.len(),
        rooms.len(),
        proctors.len(),
        enrolments.len()
    );

    Ok(InputModel {
        modules,
        module_ids,
        size_of,
        rooms,
        proctors,
        modules_of_student,
    })
}
