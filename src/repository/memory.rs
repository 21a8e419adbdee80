//! In-memory [`Repository`] used by tests, so the scheduler can be exercised
//! without touching a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::Repository;
use crate::domain::{Conflict, Enrolment, Exam, Module, Proctor, Room};
use crate::error::SchedulerError;

#[derive(Default)]
struct State {
    modules: Vec<Module>,
    enrolments: Vec<Enrolment>,
    rooms: Vec<Room>,
    proctors: Vec<Proctor>,
    exams: HashMap<i32, Vec<Exam>>,
    conflicts: Vec<Conflict>,
    next_conflict_id: i32,
}

/// A single-process, `Mutex`-guarded stand-in for a relational store.
///
/// Seeded directly via its `seed_*` helpers rather than through SQL, since
/// it exists purely to drive the scheduler's pipeline in tests.
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        InMemoryRepository {
            state: Mutex::new(State::default()),
        }
    }

    pub fn seed_modules(&self, modules: Vec<Module>) {
        self.state.lock().unwrap().modules = modules;
    }

    pub fn seed_enrolments(&self, enrolments: Vec<Enrolment>) {
        self.state.lock().unwrap().enrolments = enrolments;
    }

    pub fn seed_rooms(&self, rooms: Vec<Room>) {
        self.state.lock().unwrap().rooms = rooms;
    }

    pub fn seed_proctors(&self, proctors: Vec<Proctor>) {
        self.state.lock().unwrap().proctors = proctors;
    }

    pub fn seed_exams(&self, session_id: i32, exams: Vec<Exam>) {
        self.state.lock().unwrap().exams.insert(session_id, exams);
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        self.state.lock().unwrap().conflicts.clone()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn examinable_modules(
        &self,
        session_id: i32,
        limit: usize,
    ) -> Result<Vec<(Module, i32)>, SchedulerError> {
        let state = self.state.lock().unwrap();
        let mut counts: HashMap<i32, i32> = HashMap::new();
        for e in state.enrolments.iter().filter(|e| e.session_id == session_id) {
            *counts.entry(e.module_id).or_insert(0) += 1;
        }
        let mut rows: Vec<(Module, i32)> = state
            .modules
            .iter()
            .filter_map(|m| counts.get(&m.id).map(|&c| (m.clone(), c)))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn enrolments_for_modules(
        &self,
        session_id: i32,
        module_ids: &[i32],
    ) -> Result<Vec<Enrolment>, SchedulerError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrolments
            .iter()
            .filter(|e| e.session_id == session_id && module_ids.contains(&e.module_id))
            .copied()
            .collect())
    }

    async fn available_rooms(&self) -> Result<Vec<Room>, SchedulerError> {
        let state = self.state.lock().unwrap();
        let mut rooms: Vec<Room> = state.rooms.iter().filter(|r| r.available).cloned().collect();
        rooms.sort_by(|a, b| b.exam_capacity.cmp(&a.exam_capacity).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }

    async fn proctors(&self) -> Result<Vec<Proctor>, SchedulerError> {
        let state = self.state.lock().unwrap();
        let mut proctors = state.proctors.clone();
        proctors.sort_by(|a, b| a.department_id.cmp(&b.department_id).then(a.id.cmp(&b.id)));
        Ok(proctors)
    }

    async fn rooms_by_ids(&self, ids: &[i32]) -> Result<Vec<Room>, SchedulerError> {
        let state = self.state.lock().unwrap();
        Ok(state.rooms.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
    }

    async fn proctors_by_ids(&self, ids: &[i32]) -> Result<Vec<Proctor>, SchedulerError> {
        let state = self.state.lock().unwrap();
        Ok(state.proctors.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn replace_exams(&self, session_id: i32, exams: Vec<Exam>) -> Result<(), SchedulerError> {
        let mut state = self.state.lock().unwrap();
        state.exams.insert(session_id, exams);
        Ok(())
    }

    async fn exams_for_session(&self, session_id: i32) -> Result<Vec<Exam>, SchedulerError> {
        let state = self.state.lock().unwrap();
        Ok(state.exams.get(&session_id).cloned().unwrap_or_default())
    }

    async fn insert_conflicts(&self, mut conflicts: Vec<Conflict>) -> Result<(), SchedulerError> {
        let mut state = self.state.lock().unwrap();
        for c in conflicts.iter_mut() {
            state.next_conflict_id += 1;
            c.id = state.next_conflict_id;
        }
        state.conflicts.extend(conflicts);
        Ok(())
    }
}
