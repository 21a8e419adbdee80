//! Tunables recognised by the scheduler.

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wall-clock cap passed to the solver, in seconds.
    pub max_solver_seconds: f64,
    /// Parallel search threads handed to the solver.
    pub workers: i32,
    /// Cap on modules retained by the Loader.
    pub module_limit: usize,
    /// Cap on H2 (student non-collision) pairs emitted.
    pub student_constraint_limit: usize,
    /// Window size for H3 (room slot exclusivity) pair enumeration.
    pub pair_neighbourhood: usize,
    /// Top-K students (by module count) considered for H2.
    pub max_students_for_h2: usize,
    /// Promote H4 (proctor day cap) from post-hoc detection to a posted
    /// hard constraint, off by default so the baseline behaviour is
    /// detection-only.
    pub promote_proctor_cap: bool,
    /// Log solver search progress (forwarded to `SatParameters`).
    pub log_progress: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            max_solver_seconds: 25.0,
            workers: 4,
            module_limit: 500,
            student_constraint_limit: 3000,
            pair_neighbourhood: 30,
            max_students_for_h2: 1000,
            promote_proctor_cap: false,
            log_progress: false,
        }
    }
}
