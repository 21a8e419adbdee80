//! `sqlx`-backed [`Repository`] over the scheduler's Postgres schema.
//!
//! Queries are issued as plain runtime-checked SQL (`sqlx::query_as`) rather
//! than the `sqlx::query!` compile-time macros, since this crate does not
//! assume a live database is reachable while building.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;

use super::Repository;
use crate::domain::*;
use crate::error::SchedulerError;

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub async fn connect(database_url: &str) -> Result<Self, SchedulerError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| SchedulerError::Database(e.to_string()))?;
        Ok(PgRepository { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PgRepository { pool }
    }
}

fn db_err(e: sqlx::Error) -> SchedulerError {
    SchedulerError::Database(e.to_string())
}

#[derive(sqlx::FromRow)]
struct ModuleRow {
    id: i32,
    code: String,
    name: String,
    formation_id: i32,
    nb_inscrits: i64,
}

#[derive(sqlx::FromRow)]
struct EnrolmentRow {
    student_id: i32,
    module_id: i32,
    session_id: i32,
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: i32,
    #[sqlx(rename = "type")]
    room_type: String,
    capacity: i32,
    exam_capacity: i32,
    available: bool,
}

#[derive(sqlx::FromRow)]
struct ProctorRow {
    id: i32,
    dept_id: i32,
    max_surveillance_per_day: i32,
}

#[derive(sqlx::FromRow)]
struct ExamRow {
    id: i32,
    module_id: i32,
    session_id: i32,
    date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: i32,
    room_id: i32,
    proctor_id: i32,
    enrolled_count: i32,
    status: String,
}

fn parse_room_type(s: &str) -> RoomType {
    match s {
        "amphi" => RoomType::Amphi,
        "labo" => RoomType::Labo,
        _ => RoomType::Salle,
    }
}

fn parse_exam_status(_s: &str) -> ExamStatus {
    ExamStatus::Planifie
}

fn exam_status_str(s: ExamStatus) -> &'static str {
    match s {
        ExamStatus::Planifie => "planifie",
    }
}

fn conflict_kind_str(k: ConflictKind) -> &'static str {
    match k {
        ConflictKind::StudentCollision => "student-collision",
        ConflictKind::ProctorOverload => "proctor-overload",
        ConflictKind::CapacityOverflow => "capacity-overflow",
    }
}

impl From<ExamRow> for Exam {
    fn from(r: ExamRow) -> Self {
        Exam {
            id: r.id,
            module_id: r.module_id,
            session_id: r.session_id,
            date: r.date,
            start_time: r.start_time,
            duration_minutes: r.duration_minutes,
            room_id: r.room_id,
            proctor_id: r.proctor_id,
            enrolled_count: r.enrolled_count,
            status: parse_exam_status(&r.status),
        }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn examinable_modules(
        &self,
        session_id: i32,
        limit: usize,
    ) -> Result<Vec<(Module, i32)>, SchedulerError> {
        let rows: Vec<ModuleRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.code, m.name, m.formation_id, COUNT(e.student_id) AS nb_inscrits
            FROM modules m
            JOIN enrolments e ON e.module_id = m.id
            WHERE e.session_id = $1
            GROUP BY m.id, m.code, m.name, m.formation_id
            ORDER BY nb_inscrits DESC, m.id ASC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    Module {
                        id: r.id,
                        code: r.code,
                        name: r.name,
                        formation_id: r.formation_id,
                    },
                    r.nb_inscrits as i32,
                )
            })
            .collect())
    }

    async fn enrolments_for_modules(
        &self,
        session_id: i32,
        module_ids: &[i32],
    ) -> Result<Vec<Enrolment>, SchedulerError> {
        let rows: Vec<EnrolmentRow> = sqlx::query_as(
            r#"
            SELECT student_id, module_id, session_id
            FROM enrolments
            WHERE session_id = $1 AND module_id = ANY($2)
            "#,
        )
        .bind(session_id)
        .bind(module_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Enrolment {
                student_id: r.student_id,
                module_id: r.module_id,
                session_id: r.session_id,
            })
            .collect())
    }

    async fn available_rooms(&self) -> Result<Vec<Room>, SchedulerError> {
        let rows: Vec<RoomRow> = sqlx::query_as(
            r#"
            SELECT id, type, capacity, exam_capacity, available
            FROM rooms
            WHERE available = TRUE
            ORDER BY exam_capacity DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Room {
                id: r.id,
                room_type: parse_room_type(&r.room_type),
                capacity: r.capacity,
                exam_capacity: r.exam_capacity,
                available: r.available,
            })
            .collect())
    }

    async fn proctors(&self) -> Result<Vec<Proctor>, SchedulerError> {
        let rows: Vec<ProctorRow> = sqlx::query_as(
            r#"
            SELECT id, dept_id, max_surveillance_per_day
            FROM proctors
            ORDER BY dept_id ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Proctor {
                id: r.id,
                department_id: r.dept_id,
                max_surveillance_per_day: r.max_surveillance_per_day,
            })
            .collect())
    }

    async fn rooms_by_ids(&self, ids: &[i32]) -> Result<Vec<Room>, SchedulerError> {
        let rows: Vec<RoomRow> = sqlx::query_as(
            r#"SELECT id, type, capacity, exam_capacity, available FROM rooms WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Room {
                id: r.id,
                room_type: parse_room_type(&r.room_type),
                capacity: r.capacity,
                exam_capacity: r.exam_capacity,
                available: r.available,
            })
            .collect())
    }

    async fn proctors_by_ids(&self, ids: &[i32]) -> Result<Vec<Proctor>, SchedulerError> {
        let rows: Vec<ProctorRow> = sqlx::query_as(
            r#"SELECT id, dept_id, max_surveillance_per_day FROM proctors WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Proctor {
                id: r.id,
                department_id: r.dept_id,
                max_surveillance_per_day: r.max_surveillance_per_day,
            })
            .collect())
    }

    async fn replace_exams(&self, session_id: i32, exams: Vec<Exam>) -> Result<(), SchedulerError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Exclusive session-scoped lock for the duration of the transaction.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(session_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| SchedulerError::PersistenceFailure(e.to_string()))?;

        sqlx::query("DELETE FROM exams WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| SchedulerError::PersistenceFailure(e.to_string()))?;

        for exam in &exams {
            sqlx::query(
                r#"
                INSERT INTO exams
                    (module_id, session_id, date, start_time, duration_minutes,
                     room_id, proctor_id, enrolled_count, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(exam.module_id)
            .bind(exam.session_id)
            .bind(exam.date)
            .bind(exam.start_time)
            .bind(exam.duration_minutes)
            .bind(exam.room_id)
            .bind(exam.proctor_id)
            .bind(exam.enrolled_count)
            .bind(exam_status_str(exam.status))
            .execute(&mut *tx)
            .await
            .map_err(|e| SchedulerError::PersistenceFailure(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| SchedulerError::PersistenceFailure(e.to_string()))?;
        Ok(())
    }

    async fn exams_for_session(&self, session_id: i32) -> Result<Vec<Exam>, SchedulerError> {
        let rows: Vec<ExamRow> = sqlx::query_as(
            r#"
            SELECT id, module_id, session_id, date, start_time, duration_minutes,
                   room_id, proctor_id, enrolled_count, status
            FROM exams
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Exam::from).collect())
    }

    async fn insert_conflicts(&self, conflicts: Vec<Conflict>) -> Result<(), SchedulerError> {
        for c in &conflicts {
            sqlx::query(
                r#"
                INSERT INTO conflicts (exam_id, kind, description, severity, resolved, detected_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(c.exam_id)
            .bind(conflict_kind_str(c.kind))
            .bind(&c.description)
            .bind(c.severity)
            .bind(c.resolved)
            .bind(c.detected_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        }
        Ok(())
    }
}
