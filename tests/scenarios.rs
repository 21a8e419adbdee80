//! End-to-end scheduling scenarios, run against an in-memory repository so
//! no database is required.

use std::sync::atomic::AtomicBool;

use chrono::NaiveDate;
use exam_scheduler::domain::*;
use exam_scheduler::repository::InMemoryRepository;
use exam_scheduler::{optimize_schedule, SchedulerConfig};

fn room(id: i32, room_type: RoomType, exam_capacity: i32) -> Room {
    Room {
        id,
        room_type,
        capacity: exam_capacity,
        exam_capacity,
        available: true,
    }
}

fn proctor(id: i32, dept_id: i32) -> Proctor {
    Proctor {
        id,
        department_id: dept_id,
        max_surveillance_per_day: 3,
    }
}

fn module(id: i32, formation_id: i32) -> Module {
    Module {
        id,
        code: format!("MOD{id}"),
        name: format!("Module {id}"),
        formation_id,
    }
}

#[tokio::test]
async fn e1_trivial_feasibility() {
    let repo = InMemoryRepository::new();
    repo.seed_modules(vec![module(1, 1), module(2, 1), module(3, 1)]);
    let enrolments: Vec<Enrolment> = [(1, 0), (2, 100), (3, 200)]
        .iter()
        .flat_map(|&(module_id, base)| {
            (0..10).map(move |i| Enrolment {
                student_id: base + i,
                module_id,
                session_id: 1,
            })
        })
        .collect();
    repo.seed_enrolments(enrolments);
    repo.seed_rooms(vec![room(1, RoomType::Salle, 20), room(2, RoomType::Salle, 20)]);
    repo.seed_proctors(vec![proctor(1, 1), proctor(2, 1)]);

    let config = SchedulerConfig::default();
    let cancelled = AtomicBool::new(false);
    let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let result = optimize_schedule(&repo, 1, start, 3, &config, &cancelled).await;

    assert!(result.success, "expected success, got: {}", result.message);
    assert_eq!(result.nb_exams, 3);
    let exams = repo.exams_for_session(1).await.unwrap();
    assert_eq!(exams.len(), 3);
    let distinct_modules: std::collections::HashSet<i32> = exams.iter().map(|e| e.module_id).collect();
    assert_eq!(distinct_modules.len(), 3, "at most one exam per module (P2)");
    for e in &exams {
        assert!(e.enrolled_count <= 20);
        assert!(e.date >= start && e.date < start + chrono::Duration::days(3));
        assert!(SLOTS.contains(&e.start_time));
    }
    for i in 0..exams.len() {
        for j in (i + 1)..exams.len() {
            let same_room_day_slot = exams[i].room_id == exams[j].room_id
                && exams[i].date == exams[j].date
                && exams[i].start_time == exams[j].start_time;
            assert!(!same_room_day_slot);
        }
    }
    let report = result.residual_conflicts.expect("conflict report");
    assert!(report.is_empty());
}

#[tokio::test]
async fn e2_capacity_infeasibility() {
    let repo = InMemoryRepository::new();
    repo.seed_modules(vec![module(1, 1)]);
    let enrolments: Vec<Enrolment> = (0..500)
        .map(|i| Enrolment {
            student_id: i,
            module_id: 1,
            session_id: 1,
        })
        .collect();
    repo.seed_enrolments(enrolments);
    repo.seed_rooms(vec![room(1, RoomType::Amphi, 300), room(2, RoomType::Amphi, 250)]);
    repo.seed_proctors(vec![proctor(1, 1)]);

    let config = SchedulerConfig::default();
    let cancelled = AtomicBool::new(false);
    let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let result = optimize_schedule(&repo, 1, start, 5, &config, &cancelled).await;

    assert!(!result.success);
    assert!(result.message.contains("capacity"), "message: {}", result.message);
    assert_eq!(result.nb_exams, 0);
    assert!(repo.exams_for_session(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn e3_schedule_horizon_infeasibility() {
    // One student enrolled in 6 modules but only 5 days to spread them over:
    // H2 posts pairwise day[i] != day[j] for all 15 pairs, which cannot be
    // satisfied by 6 variables ranging over a 5-value domain. The solver
    // proves this infeasible quickly regardless of its time budget.
    let repo = InMemoryRepository::new();
    let modules: Vec<Module> = (1..=6).map(|id| module(id, 1)).collect();
    repo.seed_modules(modules);
    let enrolments: Vec<Enrolment> = (1..=6)
        .map(|module_id| Enrolment {
            student_id: 1,
            module_id,
            session_id: 1,
        })
        .collect();
    repo.seed_enrolments(enrolments);
    repo.seed_rooms(vec![room(1, RoomType::Salle, 20), room(2, RoomType::Salle, 20)]);
    repo.seed_proctors(vec![proctor(1, 1)]);

    let config = SchedulerConfig::default();
    let cancelled = AtomicBool::new(false);
    let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let result = optimize_schedule(&repo, 1, start, 5, &config, &cancelled).await;

    assert!(!result.success);
    assert!(
        result.message.contains("no feasible schedule"),
        "message: {}",
        result.message
    );
    assert_eq!(result.nb_exams, 0);
    assert!(repo.exams_for_session(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn e4_replacement_atomicity_on_load_failure() {
    // A prior, already-persisted schedule must survive a run that fails
    // before it ever reaches the persist stage (here: no modules enrolled
    // for the session, so load() returns InputEmpty).
    let repo = InMemoryRepository::new();
    let prior = vec![Exam {
        id: 99,
        module_id: 1,
        session_id: 1,
        date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        start_time: SLOTS[0],
        duration_minutes: 90,
        room_id: 1,
        proctor_id: 1,
        enrolled_count: 10,
        status: ExamStatus::Planifie,
    }];
    repo.seed_exams(1, prior.clone());
    repo.seed_rooms(vec![room(1, RoomType::Salle, 20)]);
    repo.seed_proctors(vec![proctor(1, 1)]);

    let config = SchedulerConfig::default();
    let cancelled = AtomicBool::new(false);
    let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let result = optimize_schedule(&repo, 1, start, 5, &config, &cancelled).await;

    assert!(!result.success);
    let after = repo.exams_for_session(1).await.unwrap();
    assert_eq!(after.len(), prior.len());
    assert_eq!(after[0].id, prior[0].id);
}

#[tokio::test]
async fn e5_proctor_overload_reporting() {
    let repo = InMemoryRepository::new();
    let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    // Four exams on the same day, same proctor, whose cap is 3.
    let exams: Vec<Exam> = (0..4)
        .map(|i| Exam {
            id: i + 1,
            module_id: i + 1,
            session_id: 1,
            date,
            start_time: SLOTS[i as usize % SLOTS.len()],
            duration_minutes: 90,
            room_id: 1,
            proctor_id: 1,
            enrolled_count: 10,
            status: ExamStatus::Planifie,
        })
        .collect();
    repo.seed_exams(1, exams);
    repo.seed_rooms(vec![room(1, RoomType::Salle, 20)]);
    repo.seed_proctors(vec![proctor(1, 1)]);

    let report = exam_scheduler::conflicts::run(&repo, 1, false).await.unwrap();
    assert_eq!(report.proctor_overloads.len(), 1);
    let overload = &report.proctor_overloads[0];
    assert_eq!(overload.proctor_id, 1);
    assert_eq!(overload.count, 4);
    assert_eq!(overload.cap, 3);
    assert_eq!(ConflictKind::ProctorOverload.severity(), 3);
}

#[tokio::test]
async fn e6_amphi_bias_for_large_cohorts() {
    // A single module with a cohort over the amphi-bias threshold (50) can
    // go to either an amphitheatre or an ordinary room of equal-or-greater
    // capacity; the objective's amphi bonus should break the tie in favour
    // of the amphitheatre.
    let repo = InMemoryRepository::new();
    repo.seed_modules(vec![module(1, 1)]);
    let enrolments: Vec<Enrolment> = (0..60)
        .map(|i| Enrolment {
            student_id: i,
            module_id: 1,
            session_id: 1,
        })
        .collect();
    repo.seed_enrolments(enrolments);
    repo.seed_rooms(vec![room(1, RoomType::Amphi, 100), room(2, RoomType::Salle, 80)]);
    repo.seed_proctors(vec![proctor(1, 1)]);

    let config = SchedulerConfig::default();
    let cancelled = AtomicBool::new(false);
    let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let result = optimize_schedule(&repo, 1, start, 5, &config, &cancelled).await;

    assert!(result.success, "expected success, got: {}", result.message);
    let exams = repo.exams_for_session(1).await.unwrap();
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].room_id, 1, "large cohort should prefer the amphitheatre");
}

#[tokio::test]
async fn detector_is_idempotent() {
    let repo = InMemoryRepository::new();
    let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    repo.seed_exams(
        1,
        vec![Exam {
            id: 1,
            module_id: 1,
            session_id: 1,
            date,
            start_time: SLOTS[0],
            duration_minutes: 90,
            room_id: 1,
            proctor_id: 1,
            enrolled_count: 999,
            status: ExamStatus::Planifie,
        }],
    );
    repo.seed_rooms(vec![room(1, RoomType::Salle, 20)]);
    repo.seed_proctors(vec![proctor(1, 1)]);

    let first = exam_scheduler::conflicts::capacity_overflows(&repo, 1).await.unwrap();
    let second = exam_scheduler::conflicts::capacity_overflows(&repo, 1).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].exam_id, second[0].exam_id);
}

#[tokio::test]
async fn rejects_out_of_range_nb_days() {
    let repo = InMemoryRepository::new();
    let config = SchedulerConfig::default();
    let cancelled = AtomicBool::new(false);
    let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

    let too_short = optimize_schedule(&repo, 1, start, 1, &config, &cancelled).await;
    assert!(!too_short.success);

    let too_long = optimize_schedule(&repo, 1, start, 45, &config, &cancelled).await;
    assert!(!too_long.success);
}
