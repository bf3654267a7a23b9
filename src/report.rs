//! Formatting of solve results.
//!
//! Pure text assembly: the tour as 1-indexed point ids, the 0/1 arc matrix
//! with two-digit row labels for auditing, and a summary block. Nothing here
//! does I/O; callers print or write the returned strings.

use serde::Serialize;

use crate::exact::ExactResult;
use crate::solution::{AssignmentMatrix, Tour};

/// The tour as a chain of 1-indexed point ids.
pub fn format_tour(tour: &Tour) -> String {
    let ids: Vec<String> = tour.point_ids().iter().map(|p| p.to_string()).collect();
    ids.join(" -> ")
}

/// The 0/1 arc matrix, one line per origin with a two-digit row label.
pub fn format_assignment(assignment: &AssignmentMatrix) -> String {
    let n = assignment.n();
    let mut out = String::new();
    for i in 0..n {
        out.push_str(&format!("{:02}: ", i + 1));
        let row: Vec<String> = (0..n)
            .map(|j| format!("{}", assignment.value(i, j) as u8))
            .collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}

/// Human-readable summary of a solve.
pub fn format_summary(instance: &str, result: &ExactResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Instance: {}\n", instance));
    out.push_str(&format!("Status: {}\n", result.status));
    match &result.tour {
        Some(tour) => {
            out.push_str(&format!("Tour: {}\n", format_tour(tour)));
            out.push_str(&format!("Cost: {:.2}\n", tour.cost()));
        }
        None => out.push_str("Tour: none found within budget\n"),
    }
    out.push_str(&format!(
        "Bounds: [{:.2}, {:.2}], gap {:.2}%\n",
        result.lower_bound,
        result.upper_bound,
        result.gap * 100.0
    ));
    out.push_str(&format!("Optimal: {}\n", result.optimal));
    out.push_str(&format!("Nodes explored: {}\n", result.nodes_explored));
    out.push_str(&format!("Time: {:.4}s", result.computation_time));
    out
}

/// Machine-readable record of a solve, for JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionRecord {
    pub instance: String,
    /// Closed tour as 1-indexed point ids, when an incumbent exists.
    pub points: Option<Vec<usize>>,
    pub cost: Option<f64>,
    pub lower_bound: f64,
    pub gap: f64,
    pub optimal: bool,
    pub status: String,
    pub nodes_explored: u64,
    pub computation_time: f64,
}

pub fn solution_record(instance: &str, result: &ExactResult) -> SolutionRecord {
    SolutionRecord {
        instance: instance.to_string(),
        points: result.tour.as_ref().map(|t| t.point_ids()),
        cost: result.tour.as_ref().map(|t| t.cost()),
        lower_bound: result.lower_bound,
        gap: result.gap,
        optimal: result.optimal,
        status: result.status.to_string(),
        nodes_explored: result.nodes_explored,
        computation_time: result.computation_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::{BranchAndBoundSolver, SolveStatus};
    use crate::instance::CostMatrix;
    use crate::solution::AssignmentMatrix;

    #[test]
    fn test_format_tour_uses_external_ids() {
        let rows = vec![vec![0.0, 4.0], vec![6.0, 0.0]];
        let matrix = CostMatrix::from_rows("pair", rows).unwrap();
        let tour = crate::solution::Tour::from_order(&matrix, &[0, 1]);
        assert_eq!(format_tour(&tour), "1 -> 2 -> 1");
    }

    #[test]
    fn test_format_assignment_rows() {
        let assignment = AssignmentMatrix::from_successors(&[1, 0]);
        let text = format_assignment(&assignment);
        assert_eq!(text, "01: 0 1\n02: 1 0\n");
    }

    #[test]
    fn test_format_assignment_pads_labels() {
        let next: Vec<usize> = (1..11).chain(std::iter::once(0)).collect();
        let assignment = AssignmentMatrix::from_successors(&next);
        let text = format_assignment(&assignment);
        assert!(text.contains("01: "));
        assert!(text.contains("\n10: "));
        assert!(text.contains("\n11: "));
    }

    #[test]
    fn test_summary_and_record() {
        let matrix = CostMatrix::example_eleven();
        let result = BranchAndBoundSolver::with_defaults().solve(&matrix).unwrap();

        let summary = format_summary(matrix.name(), &result);
        assert!(summary.contains("Instance: example11"));
        assert!(summary.contains("Status: Optimal"));
        assert!(summary.contains("Optimal: true"));

        let record = solution_record(matrix.name(), &result);
        assert_eq!(record.status, "Optimal");
        assert_eq!(record.points.as_ref().map(|p| p[0]), Some(1));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"instance\":\"example11\""));
        assert_eq!(result.status, SolveStatus::Optimal);
    }
}
