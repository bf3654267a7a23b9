//! Construction heuristics.
//!
//! These produce feasible tours quickly; the exact solver uses them as warm
//! starts so pruning has an incumbent to work against from the first node.

use crate::instance::CostMatrix;
use crate::solution::Tour;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashSet;

pub trait ConstructionHeuristic {
    fn construct(&self, matrix: &CostMatrix) -> Tour;
    fn name(&self) -> &str;
}

/// Nearest Neighbor Heuristic
///
/// Builds a tour by repeatedly moving to the cheapest unvisited point.
/// The randomized variant picks among the three cheapest candidates.
pub struct NearestNeighbor {
    pub randomized: bool,
    pub seed: u64,
}

impl NearestNeighbor {
    pub fn new() -> Self {
        NearestNeighbor {
            randomized: false,
            seed: 42,
        }
    }

    pub fn randomized(seed: u64) -> Self {
        NearestNeighbor {
            randomized: true,
            seed,
        }
    }

    fn find_nearest(
        &self,
        matrix: &CostMatrix,
        current: usize,
        visited: &HashSet<usize>,
        rng: &mut ChaCha8Rng,
    ) -> Option<usize> {
        let mut candidates: Vec<(usize, f64)> = (0..matrix.dimension())
            .filter(|&p| !visited.contains(&p))
            .map(|p| (p, matrix.cost(current, p)))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by_key(|&(_, c)| OrderedFloat(c));

        if self.randomized && candidates.len() > 1 {
            let top_k = candidates.len().min(3);
            let idx = rng.gen_range(0..top_k);
            Some(candidates[idx].0)
        } else {
            Some(candidates[0].0)
        }
    }
}

impl Default for NearestNeighbor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighbor {
    fn construct(&self, matrix: &CostMatrix) -> Tour {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut order = vec![0];
        let mut visited = HashSet::new();
        visited.insert(0);

        let mut current = 0;
        while visited.len() < matrix.dimension() {
            if let Some(next) = self.find_nearest(matrix, current, &visited, &mut rng) {
                order.push(next);
                visited.insert(next);
                current = next;
            } else {
                break;
            }
        }

        Tour::from_order(matrix, &order)
    }

    fn name(&self) -> &str {
        if self.randomized {
            "NearestNeighbor-Randomized"
        } else {
            "NearestNeighbor"
        }
    }
}

/// Multi-Start Nearest Neighbor
///
/// Runs the deterministic pass plus `starts` randomized restarts in
/// parallel and keeps the cheapest tour. Deterministic for a fixed seed.
pub struct MultiStartNearestNeighbor {
    pub starts: usize,
    pub seed: u64,
}

impl MultiStartNearestNeighbor {
    pub fn new(starts: usize, seed: u64) -> Self {
        MultiStartNearestNeighbor { starts, seed }
    }
}

impl ConstructionHeuristic for MultiStartNearestNeighbor {
    fn construct(&self, matrix: &CostMatrix) -> Tour {
        let mut heuristics = vec![NearestNeighbor::new()];
        for k in 0..self.starts {
            heuristics.push(NearestNeighbor::randomized(self.seed.wrapping_add(k as u64)));
        }

        let tours: Vec<Tour> = heuristics
            .par_iter()
            .map(|h| h.construct(matrix))
            .collect();

        // Ties resolve to the earliest start, keeping the result stable.
        match tours.into_iter().min_by_key(|t| OrderedFloat(t.cost())) {
            Some(tour) => tour,
            None => NearestNeighbor::new().construct(matrix),
        }
    }

    fn name(&self) -> &str {
        "MultiStart-NN"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn is_valid_order(order: &[usize], n: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        order[0] == 0 && sorted == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn test_nearest_neighbor_square() {
        let matrix = square_matrix();
        let tour = NearestNeighbor::new().construct(&matrix);

        assert!(is_valid_order(tour.open_order(), 4));
        // Greedy follows the perimeter here.
        assert!((tour.cost() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_randomized_is_seed_deterministic() {
        let matrix = CostMatrix::random_asymmetric(12, 31).unwrap();
        let a = NearestNeighbor::randomized(7).construct(&matrix);
        let b = NearestNeighbor::randomized(7).construct(&matrix);
        assert_eq!(a.sequence(), b.sequence());
        assert!(is_valid_order(a.open_order(), 12));
    }

    #[test]
    fn test_multi_start_never_worse_than_plain() {
        let matrix = CostMatrix::random_asymmetric(15, 8).unwrap();
        let plain = NearestNeighbor::new().construct(&matrix);
        let multi = MultiStartNearestNeighbor::new(8, 42).construct(&matrix);

        assert!(multi.cost() <= plain.cost() + 1e-9);
        assert!(is_valid_order(multi.open_order(), 15));
    }
}
