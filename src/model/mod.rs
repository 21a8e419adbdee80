//! Model building and constraint logic for the exam scheduling solver.

mod builder;

pub(crate) use builder::ModuleVars;
pub use builder::{build, SolverModel};
