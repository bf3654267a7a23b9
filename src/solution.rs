//! Tour representation and assignment decoding.
//!
//! This module provides the closed-tour data structure, the 0/1 assignment
//! matrix produced by the solver, and the extractor that turns an assignment
//! back into a tour while defending against subtours and degree violations.

use crate::error::{Result, SolverError};
use crate::instance::CostMatrix;

/// A closed tour: starts at point 0, visits every other point exactly once
/// and returns to point 0. The stored sequence has N + 1 entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    sequence: Vec<usize>,
    cost: f64,
}

impl Tour {
    /// Build a tour from an open visiting order (each point once, point 0
    /// first). Callers constructing orders programmatically use this; orders
    /// coming from user input go through [`Tour::try_from_order`].
    pub fn from_order(matrix: &CostMatrix, order: &[usize]) -> Self {
        debug_assert_eq!(order.len(), matrix.dimension());
        debug_assert_eq!(order.first(), Some(&0));

        let mut sequence = order.to_vec();
        sequence.push(order[0]);
        let cost = matrix.cycle_cost(order);
        Tour { sequence, cost }
    }

    /// Validate an externally supplied visiting order and build a tour from
    /// it. The order lists every point exactly once and starts at point 1
    /// (internal index 0).
    pub fn try_from_order(matrix: &CostMatrix, order: &[usize]) -> Result<Self> {
        let n = matrix.dimension();
        if order.len() != n {
            return Err(SolverError::InvalidInput(format!(
                "tour visits {} points, instance has {}",
                order.len(),
                n
            )));
        }
        if order[0] != 0 {
            return Err(SolverError::InvalidInput(
                "tour must start at point 1".to_string(),
            ));
        }
        let mut seen = vec![false; n];
        for &point in order {
            if point >= n {
                return Err(SolverError::InvalidInput(format!(
                    "unknown point {}",
                    point + 1
                )));
            }
            if seen[point] {
                return Err(SolverError::InvalidInput(format!(
                    "point {} appears twice",
                    point + 1
                )));
            }
            seen[point] = true;
        }
        Ok(Self::from_order(matrix, order))
    }

    /// The closed sequence, point 0 first and last (0-indexed).
    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    /// The open visiting order (closed sequence without the final return).
    pub fn open_order(&self) -> &[usize] {
        &self.sequence[..self.sequence.len() - 1]
    }

    /// The closed sequence as 1-indexed point ids, as printed in reports.
    pub fn point_ids(&self) -> Vec<usize> {
        self.sequence.iter().map(|&p| p + 1).collect()
    }

    /// Number of distinct points visited.
    pub fn num_points(&self) -> usize {
        self.sequence.len() - 1
    }

    /// Total cost of the closed tour.
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.point_ids().iter().map(|p| p.to_string()).collect();
        writeln!(f, "Tour: {}", ids.join(" -> "))?;
        write!(f, "Cost: {:.2}", self.cost)
    }
}

/// The resolved 0/1 values of the arc decision variables for one solve.
#[derive(Debug, Clone)]
pub struct AssignmentMatrix {
    n: usize,
    selected: Vec<Vec<bool>>,
}

impl AssignmentMatrix {
    /// Build the matrix from a successor list (`next[i]` = point after `i`).
    pub fn from_successors(next: &[usize]) -> Self {
        let n = next.len();
        let mut selected = vec![vec![false; n]; n];
        for (i, &j) in next.iter().enumerate() {
            debug_assert!(j < n && j != i);
            selected[i][j] = true;
        }
        AssignmentMatrix { n, selected }
    }

    /// Build the matrix from fractional values, rounding each entry to the
    /// nearest of 0 and 1.
    pub fn from_values(values: &[Vec<f64>]) -> Self {
        let n = values.len();
        let selected = values
            .iter()
            .map(|row| row.iter().map(|&v| v > 0.5).collect())
            .collect();
        AssignmentMatrix { n, selected }
    }

    /// Number of points.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Whether arc (i, j) is selected.
    #[inline]
    pub fn is_selected(&self, i: usize, j: usize) -> bool {
        self.selected[i][j]
    }

    /// Value of arc (i, j) as 0.0 or 1.0.
    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        if self.selected[i][j] {
            1.0
        } else {
            0.0
        }
    }

    /// The unique selected successor of point `i`. Fails when the row selects
    /// no arc or more than one.
    pub fn successor_of(&self, i: usize) -> Result<usize> {
        let mut found = None;
        for j in 0..self.n {
            if self.selected[i][j] {
                if found.is_some() {
                    return Err(SolverError::MalformedSolution(format!(
                        "point {} has more than one outgoing arc",
                        i + 1
                    )));
                }
                found = Some(j);
            }
        }
        found.ok_or_else(|| {
            SolverError::MalformedSolution(format!("point {} has no outgoing arc", i + 1))
        })
    }
}

/// Reconstructs the closed tour selected by a 0/1 assignment.
///
/// Walks successors starting from point 0 and fails with
/// [`SolverError::MalformedSolution`] when the assignment encodes subtours,
/// repeated visits or degree violations instead of a single closed tour.
pub struct TourExtractor<'a> {
    matrix: &'a CostMatrix,
}

impl<'a> TourExtractor<'a> {
    pub fn new(matrix: &'a CostMatrix) -> Self {
        TourExtractor { matrix }
    }

    /// Follow the selected arcs from point 0 and rebuild the tour.
    pub fn extract(&self, assignment: &AssignmentMatrix) -> Result<Tour> {
        let n = self.matrix.dimension();
        if assignment.n() != n {
            return Err(SolverError::MalformedSolution(format!(
                "assignment covers {} points, instance has {}",
                assignment.n(),
                n
            )));
        }

        let mut sequence = Vec::with_capacity(n + 1);
        sequence.push(0);
        let mut visited = vec![false; n];
        visited[0] = true;
        let mut current = 0;

        for step in 1..=n {
            let next = assignment.successor_of(current)?;
            if next == 0 {
                if step == n {
                    sequence.push(0);
                    let mut cost = 0.0;
                    for k in 0..n {
                        cost += self.matrix.cost(sequence[k], sequence[k + 1]);
                    }
                    return Ok(Tour { sequence, cost });
                }
                return Err(SolverError::MalformedSolution(format!(
                    "returned to point 1 after {} of {} arcs (subtour)",
                    step, n
                )));
            }
            if visited[next] {
                return Err(SolverError::MalformedSolution(format!(
                    "point {} visited twice",
                    next + 1
                )));
            }
            visited[next] = true;
            sequence.push(next);
            current = next;
        }

        Err(SolverError::MalformedSolution(
            "no closed tour through point 1".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_matrix() -> CostMatrix {
        // Four corners of a unit square: 0=(0,0), 1=(1,0), 2=(1,1), 3=(0,1).
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
    fn test_tour_from_order() {
        let matrix = square_matrix();
        let tour = Tour::from_order(&matrix, &[0, 1, 2, 3]);
        assert_eq!(tour.sequence(), &[0, 1, 2, 3, 0]);
        assert_eq!(tour.point_ids(), vec![1, 2, 3, 4, 1]);
        assert_eq!(tour.num_points(), 4);
        assert!((tour.cost() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_try_from_order_validation() {
        let matrix = square_matrix();
        assert!(Tour::try_from_order(&matrix, &[0, 1, 2, 3]).is_ok());
        // Wrong start.
        assert!(Tour::try_from_order(&matrix, &[1, 0, 2, 3]).is_err());
        // Wrong length.
        assert!(Tour::try_from_order(&matrix, &[0, 1, 2]).is_err());
        // Repeated point.
        assert!(Tour::try_from_order(&matrix, &[0, 1, 1, 3]).is_err());
        // Out of range.
        assert!(Tour::try_from_order(&matrix, &[0, 1, 2, 9]).is_err());
    }

    #[test]
    fn test_extract_valid_assignment() {
        let matrix = square_matrix();
        let assignment = AssignmentMatrix::from_successors(&[1, 2, 3, 0]);
        let tour = TourExtractor::new(&matrix).extract(&assignment).unwrap();
        assert_eq!(tour.sequence(), &[0, 1, 2, 3, 0]);
        assert!((tour.cost() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_rejects_subtours() {
        let matrix = square_matrix();
        // Two 2-cycles: 0 <-> 1 and 2 <-> 3. Degree-feasible but not a tour.
        let assignment = AssignmentMatrix::from_successors(&[1, 0, 3, 2]);
        let result = TourExtractor::new(&matrix).extract(&assignment);
        assert!(matches!(result, Err(SolverError::MalformedSolution(_))));
    }

    #[test]
    fn test_extract_rejects_degree_violations() {
        let matrix = square_matrix();

        // Row 0 selects two outgoing arcs.
        let mut values = vec![vec![0.0; 4]; 4];
        values[0][1] = 1.0;
        values[0][2] = 1.0;
        values[1][3] = 1.0;
        values[2][0] = 1.0;
        values[3][0] = 1.0;
        let doubled = AssignmentMatrix::from_values(&values);
        assert!(matches!(
            TourExtractor::new(&matrix).extract(&doubled),
            Err(SolverError::MalformedSolution(_))
        ));

        // Row 1 selects nothing.
        let empty = AssignmentMatrix::from_values(&vec![vec![0.0; 4]; 4]);
        assert!(matches!(
            TourExtractor::new(&matrix).extract(&empty),
            Err(SolverError::MalformedSolution(_))
        ));
    }

    #[test]
    fn test_extract_rejects_dimension_mismatch() {
        let matrix = square_matrix();
        let assignment = AssignmentMatrix::from_successors(&[1, 2, 0]);
        assert!(matches!(
            TourExtractor::new(&matrix).extract(&assignment),
            Err(SolverError::MalformedSolution(_))
        ));
    }

    #[test]
    fn test_two_point_tour() {
        let rows = vec![vec![0.0, 4.0], vec![6.0, 0.0]];
        let matrix = CostMatrix::from_rows("pair", rows).unwrap();
        let assignment = AssignmentMatrix::from_successors(&[1, 0]);
        let tour = TourExtractor::new(&matrix).extract(&assignment).unwrap();
        assert_eq!(tour.point_ids(), vec![1, 2, 1]);
        assert!((tour.cost() - 10.0).abs() < 1e-9);
    }
}
