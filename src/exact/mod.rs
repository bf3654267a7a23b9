//! Exact solver module.
//!
//! The relaxation is a linear assignment problem solved combinatorially, so
//! the crate proves optimality without an external MIP solver.

pub mod assignment;
pub mod branch_and_bound;

pub use assignment::solve_assignment;
pub use branch_and_bound::{BranchAndBoundSolver, ExactResult, SolveStatus, SolverConfig};
