//! MTZ integer-programming model of the TSP.
//!
//! This module assembles the constraint matrix behind the solver: it is used
//! to audit candidate tours and to export the model as a CPLEX LP file.
//!
//! The formulation uses:
//! - Binary variables h[i][j] for directed arcs
//! - Continuous variables u[i] for MTZ subtour elimination
//!
//! Points are 0-indexed internally; variable and constraint names in LP
//! output carry the 1-indexed external ids.

use std::io::Write;

use crate::error::{Result, SolverError};
use crate::instance::CostMatrix;
use crate::solution::{AssignmentMatrix, Tour};

/// Comparison operator of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Le,
}

/// A single linear constraint over the model columns.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub name: String,
    /// (column, coefficient) pairs with non-zero coefficients.
    pub terms: Vec<(usize, f64)>,
    pub relation: Relation,
    pub rhs: f64,
}

/// The assembled model for one instance.
///
/// Column layout: the n(n-1) arc variables first (row-major, diagonal
/// skipped), then the n-1 order variables for points 2..=n.
pub struct TspModel {
    name: String,
    n: usize,
    objective: Vec<f64>,
    constraints: Vec<LinearConstraint>,
}

fn h_column(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i != j && i < n && j < n);
    i * (n - 1) + if j < i { j } else { j - 1 }
}

fn u_column(n: usize, i: usize) -> usize {
    debug_assert!(i != 0 && i < n);
    n * (n - 1) + (i - 1)
}

impl TspModel {
    /// Assemble objective and constraints for the given cost matrix.
    pub fn build(matrix: &CostMatrix) -> Result<Self> {
        let n = matrix.dimension();
        if n < 2 {
            return Err(SolverError::InvalidInput(format!(
                "need at least 2 points, got {}",
                n
            )));
        }

        let num_vars = n * (n - 1) + (n - 1);
        let mut objective = vec![0.0; num_vars];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    objective[h_column(n, i, j)] = matrix.cost(i, j);
                }
            }
        }

        let mut constraints = Vec::with_capacity(2 * n + (n - 1) * (n - 2));

        // Each point has exactly one outgoing and one incoming arc.
        for i in 0..n {
            let terms: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (h_column(n, i, j), 1.0))
                .collect();
            constraints.push(LinearConstraint {
                name: format!("out_{}", i + 1),
                terms,
                relation: Relation::Eq,
                rhs: 1.0,
            });
        }
        for j in 0..n {
            let terms: Vec<(usize, f64)> = (0..n)
                .filter(|&i| i != j)
                .map(|i| (h_column(n, i, j), 1.0))
                .collect();
            constraints.push(LinearConstraint {
                name: format!("in_{}", j + 1),
                terms,
                relation: Relation::Eq,
                rhs: 1.0,
            });
        }

        // MTZ rows over every ordered pair of non-start points:
        // u[i] - u[j] + n h[i][j] <= n - 1.
        for i in 1..n {
            for j in 1..n {
                if i != j {
                    constraints.push(LinearConstraint {
                        name: format!("mtz_{}_{}", i + 1, j + 1),
                        terms: vec![
                            (u_column(n, i), 1.0),
                            (u_column(n, j), -1.0),
                            (h_column(n, i, j), n as f64),
                        ],
                        relation: Relation::Le,
                        rhs: (n - 1) as f64,
                    });
                }
            }
        }

        Ok(TspModel {
            name: matrix.name().to_string(),
            n,
            objective,
            constraints,
        })
    }

    /// Number of points in the underlying instance.
    pub fn num_points(&self) -> usize {
        self.n
    }

    /// Number of model columns.
    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    /// Number of constraint rows.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Column of the arc variable h[i][j].
    pub fn arc_column(&self, i: usize, j: usize) -> usize {
        h_column(self.n, i, j)
    }

    /// Column of the order variable u[i] (i != 0).
    pub fn order_column(&self, i: usize) -> usize {
        u_column(self.n, i)
    }

    /// Objective value of a full column-value vector.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(values.iter())
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Assemble the column-value vector encoding an assignment together with
    /// the order variables implied by the tour's visiting positions.
    pub fn solution_values(&self, assignment: &AssignmentMatrix, tour: &Tour) -> Vec<f64> {
        let mut values = vec![0.0; self.num_variables()];
        for i in 0..self.n {
            for j in 0..self.n {
                if i != j {
                    values[self.arc_column(i, j)] = assignment.value(i, j);
                }
            }
        }
        for (position, &point) in tour.open_order().iter().enumerate() {
            if point != 0 {
                values[self.order_column(point)] = position as f64;
            }
        }
        values
    }

    /// Check an assignment and tour pair against every constraint row.
    pub fn check_solution(&self, assignment: &AssignmentMatrix, tour: &Tour, eps: f64) -> bool {
        if assignment.n() != self.n || tour.num_points() != self.n {
            return false;
        }
        let values = self.solution_values(assignment, tour);
        self.constraints.iter().all(|c| {
            let lhs: f64 = c.terms.iter().map(|&(col, coef)| coef * values[col]).sum();
            match c.relation {
                Relation::Eq => (lhs - c.rhs).abs() <= eps,
                Relation::Le => lhs <= c.rhs + eps,
            }
        })
    }

    fn var_name(&self, col: usize) -> String {
        let n = self.n;
        if col < n * (n - 1) {
            let i = col / (n - 1);
            let r = col % (n - 1);
            let j = if r < i { r } else { r + 1 };
            format!("h_{}_{}", i + 1, j + 1)
        } else {
            format!("u_{}", col - n * (n - 1) + 2)
        }
    }

    fn term_text(&self, col: usize, magnitude: f64) -> String {
        if (magnitude - 1.0).abs() < 1e-12 {
            self.var_name(col)
        } else {
            format!("{} {}", magnitude, self.var_name(col))
        }
    }

    fn terms_text(&self, terms: &[(usize, f64)]) -> String {
        let mut out = String::new();
        for (k, &(col, coef)) in terms.iter().enumerate() {
            if coef < 0.0 {
                out.push_str(" - ");
            } else if k > 0 {
                out.push_str(" + ");
            }
            out.push_str(&self.term_text(col, coef.abs()));
        }
        out
    }

    /// Write the model in CPLEX LP format.
    pub fn write_lp<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "\\ {}: {}-point TSP, MTZ formulation", self.name, self.n)?;

        writeln!(writer, "Minimize")?;
        let obj_terms: Vec<(usize, f64)> = self
            .objective
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0.0)
            .map(|(col, &c)| (col, c))
            .collect();
        let mut first = true;
        for chunk in obj_terms.chunks(8) {
            let prefix = if first { " obj:" } else { "     " };
            let body = if first {
                self.terms_text(chunk)
            } else {
                format!("+ {}", self.terms_text(chunk))
            };
            writeln!(writer, "{} {}", prefix, body)?;
            first = false;
        }

        writeln!(writer, "Subject To")?;
        for constraint in &self.constraints {
            let op = match constraint.relation {
                Relation::Eq => "=",
                Relation::Le => "<=",
            };
            writeln!(
                writer,
                " {}: {} {} {}",
                constraint.name,
                self.terms_text(&constraint.terms),
                op,
                constraint.rhs
            )?;
        }

        writeln!(writer, "Bounds")?;
        for i in 1..self.n {
            writeln!(writer, " 0 <= u_{} <= {}", i + 1, self.n - 1)?;
        }

        writeln!(writer, "Binaries")?;
        let arc_names: Vec<String> = (0..self.n * (self.n - 1))
            .map(|col| self.var_name(col))
            .collect();
        for chunk in arc_names.chunks(10) {
            writeln!(writer, " {}", chunk.join(" "))?;
        }

        writeln!(writer, "End")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::TourExtractor;

    fn square_matrix() -> CostMatrix {
        let s = 2.0f64.sqrt();
        let rows = vec![
            vec![0.0, 1.0, s, 1.0],
            vec![1.0, 0.0, 1.0, s],
            vec![s, 1.0, 0.0, 1.0],
            vec![1.0, s, 1.0, 0.0],
        ];
        CostMatrix::from_rows("square", rows).unwrap()
    }

    #[test]
    fn test_model_dimensions() {
        let matrix = CostMatrix::random_asymmetric(5, 7).unwrap();
        let model = TspModel::build(&matrix).unwrap();
        // 5*4 arc variables plus 4 order variables.
        assert_eq!(model.num_variables(), 24);
        // 10 degree rows plus 4*3 MTZ rows.
        assert_eq!(model.num_constraints(), 22);
    }

    #[test]
    fn test_column_layout_round_trip() {
        let matrix = CostMatrix::random_asymmetric(6, 7).unwrap();
        let model = TspModel::build(&matrix).unwrap();
        let mut seen = vec![false; model.num_variables()];
        for i in 0..6 {
            for j in 0..6 {
                if i != j {
                    let col = model.arc_column(i, j);
                    assert!(!seen[col], "column reused");
                    seen[col] = true;
                    assert_eq!(model.var_name(col), format!("h_{}_{}", i + 1, j + 1));
                }
            }
        }
        for i in 1..6 {
            let col = model.order_column(i);
            assert!(!seen[col]);
            seen[col] = true;
            assert_eq!(model.var_name(col), format!("u_{}", i + 1));
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_check_solution_accepts_valid_tour() {
        let matrix = square_matrix();
        let model = TspModel::build(&matrix).unwrap();
        let assignment = AssignmentMatrix::from_successors(&[1, 2, 3, 0]);
        let tour = TourExtractor::new(&matrix).extract(&assignment).unwrap();
        assert!(model.check_solution(&assignment, &tour, 1e-6));
        // Objective of the assembled values equals the tour cost.
        let values = model.solution_values(&assignment, &tour);
        assert!((model.objective_value(&values) - tour.cost()).abs() < 1e-9);
    }

    #[test]
    fn test_check_solution_rejects_subtour_assignment() {
        let matrix = square_matrix();
        let model = TspModel::build(&matrix).unwrap();
        // Two 2-cycles satisfy the degree rows but violate MTZ whatever the
        // order values are.
        let assignment = AssignmentMatrix::from_successors(&[1, 0, 3, 2]);
        let tour = Tour::from_order(&matrix, &[0, 1, 2, 3]);
        assert!(!model.check_solution(&assignment, &tour, 1e-6));
    }

    #[test]
    fn test_check_solution_rejects_degree_violation() {
        let matrix = square_matrix();
        let model = TspModel::build(&matrix).unwrap();
        let assignment = AssignmentMatrix::from_values(&vec![vec![0.0; 4]; 4]);
        let tour = Tour::from_order(&matrix, &[0, 1, 2, 3]);
        assert!(!model.check_solution(&assignment, &tour, 1e-6));
    }

    #[test]
    fn test_write_lp_sections() {
        let matrix = square_matrix();
        let model = TspModel::build(&matrix).unwrap();
        let mut buffer = Vec::new();
        model.write_lp(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("Minimize"));
        assert!(text.contains("Subject To"));
        assert!(text.contains("out_1:"));
        assert!(text.contains("in_4:"));
        assert!(text.contains("mtz_2_3: u_2 - u_3 + 4 h_2_3 <= 3"));
        assert!(text.contains("0 <= u_2 <= 3"));
        assert!(text.contains("Binaries"));
        assert!(text.trim_end().ends_with("End"));
    }
}
