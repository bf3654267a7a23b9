//! Exact TSP Solver Library
//!
//! An exact solver for small asymmetric Traveling Salesman Problem instances.
//! The MTZ integer-programming model is built in-crate and solved by
//! branch-and-bound over a linear assignment relaxation, with no external MIP
//! solver. Point 1 is the fixed tour anchor: every tour starts and ends there.
//!
//! # Features
//!
//! - MTZ model construction with CPLEX LP export and constraint auditing
//! - Branch-and-bound with a Hungarian assignment relaxation
//! - Nearest-neighbour construction and 2-opt / Or-opt warm starts
//! - Tour extraction that defends against subtours and degree violations
//! - Benchmarking with CSV export and plain-text reports
//!
//! # Example
//!
//! ```no_run
//! use tsp_exact_solver::exact::{BranchAndBoundSolver, SolverConfig};
//! use tsp_exact_solver::instance::CostMatrix;
//! use tsp_exact_solver::report;
//!
//! // Load instance
//! let matrix = CostMatrix::from_file("instance.tsp").unwrap();
//!
//! // Solve to proven optimality
//! let solver = BranchAndBoundSolver::new(SolverConfig::default());
//! let result = solver.solve(&matrix).unwrap();
//!
//! println!("{}", report::format_summary(matrix.name(), &result));
//! ```

pub mod benchmark;
pub mod error;
pub mod exact;
pub mod heuristics;
pub mod instance;
pub mod model;
pub mod report;
pub mod solution;

pub use error::{Result, SolverError};
pub use instance::CostMatrix;
pub use solution::Tour;
