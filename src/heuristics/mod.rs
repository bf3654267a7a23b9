//! Heuristics module.
//!
//! This module exports the construction and improvement heuristics used to
//! warm-start the exact solver and as comparison baselines in benchmarks.

pub mod construction;
pub mod local_search;

pub use construction::*;
pub use local_search::*;

use crate::instance::CostMatrix;
use crate::solution::Tour;

/// Build a warm-start tour: multi-start nearest neighbour, then 2-opt and
/// Or-opt until neither finds an improving move.
pub fn warm_start_tour(matrix: &CostMatrix, starts: usize, seed: u64) -> Tour {
    let mut tour = MultiStartNearestNeighbor::new(starts, seed).construct(matrix);

    let two_opt = TwoOpt::new();
    let or_opt = OrOpt::new();
    loop {
        let improved_two = two_opt.improve(matrix, &mut tour);
        let improved_or = or_opt.improve(matrix, &mut tour);
        if !improved_two && !improved_or {
            break;
        }
    }

    tour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warm_start_tour_is_locally_optimal() {
        let matrix = CostMatrix::example_eleven();
        let tour = warm_start_tour(&matrix, 4, 42);

        let mut polished = tour.clone();
        assert!(!TwoOpt::new().improve(&matrix, &mut polished));
        assert!(!OrOpt::new().improve(&matrix, &mut polished));
        assert_eq!(polished.sequence(), tour.sequence());

        // Never worse than the input-order tour.
        let naive: Vec<usize> = (0..11).collect();
        assert!(tour.cost() <= matrix.cycle_cost(&naive) + 1e-9);
    }
}
