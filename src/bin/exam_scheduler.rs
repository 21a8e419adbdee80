//! CLI entry point: wires a Postgres-backed [`Repository`] to the Scheduler
//! Façade. `env_logger` is initialised from the environment and the process
//! exits with a specific `exitcode` on failure.

use std::sync::atomic::AtomicBool;

use chrono::NaiveDate;
use clap::Parser;
use log::{error, info};

use exam_scheduler::repository::PgRepository;
use exam_scheduler::{optimize_schedule, SchedulerConfig};

#[derive(Parser, Debug)]
#[command(name = "exam-scheduler", about = "Generate a conflict-minimising exam timetable")]
struct Cli {
    /// Examination session to schedule.
    #[arg(long)]
    session_id: i32,

    /// First day of the schedule, e.g. 2026-06-01.
    #[arg(long)]
    start_date: String,

    /// Number of days to spread exams over (5-30).
    #[arg(long, default_value_t = 10)]
    nb_days: i32,

    /// Postgres connection string. Falls back to $DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    #[arg(long, default_value_t = 25.0)]
    max_solver_seconds: f64,

    #[arg(long, default_value_t = 4)]
    workers: i32,

    #[arg(long, default_value_t = 500)]
    module_limit: usize,

    #[arg(long, default_value_t = 3000)]
    student_constraint_limit: usize,

    #[arg(long, default_value_t = 30)]
    pair_neighbourhood: usize,

    #[arg(long, default_value_t = 1000)]
    max_students_for_h2: usize,

    /// Promote the proctor day cap to a posted hard constraint instead of
    /// leaving it to post-hoc detection.
    #[arg(long, default_value_t = false)]
    promote_proctor_cap: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let start_date = match NaiveDate::parse_from_str(&cli.start_date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(e) => {
            error!("could not parse --start-date {}: {}", cli.start_date, e);
            std::process::exit(exitcode::DATAERR);
        }
    };

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| {
            error!("no --database-url given and $DATABASE_URL is unset");
            std::process::exit(exitcode::CONFIG);
        });

    let repo = match PgRepository::connect(&database_url).await {
        Ok(repo) => repo,
        Err(e) => {
            error!("could not connect to the database: {}", e);
            std::process::exit(exitcode::UNAVAILABLE);
        }
    };

    let config = SchedulerConfig {
        max_solver_seconds: cli.max_solver_seconds,
        workers: cli.workers,
        module_limit: cli.module_limit,
        student_constraint_limit: cli.student_constraint_limit,
        pair_neighbourhood: cli.pair_neighbourhood,
        max_students_for_h2: cli.max_students_for_h2,
        promote_proctor_cap: cli.promote_proctor_cap,
        log_progress: false,
    };

    let cancelled = AtomicBool::new(false);
    let result = optimize_schedule(&repo, cli.session_id, start_date, cli.nb_days, &config, &cancelled).await;

    info!("{}", result.message);
    if result.success {
        info!(
            "{} exams scheduled in {:.2}s",
            result.nb_exams, result.elapsed_seconds
        );
        if let Some(report) = &result.residual_conflicts {
            if !report.is_empty() {
                info!(
                    "residual conflicts: {} student collisions, {} proctor overloads, {} capacity overflows",
                    report.student_collisions.len(),
                    report.proctor_overloads.len(),
                    report.capacity_overflows.len()
                );
            }
        }
        std::process::exit(exitcode::OK);
    } else {
        error!("scheduling failed: {}", result.message);
        std::process::exit(exitcode::SOFTWARE);
    }
}
