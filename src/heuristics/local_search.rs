//! Local search improvement heuristics.
//!
//! This module implements two classical moves:
//! - 2-opt (segment reversal)
//! - Or-opt (relocation of short segments)
//!
//! Candidate tours are fully re-costed instead of using symmetric delta
//! formulas, so both moves stay correct on asymmetric matrices.

use crate::instance::CostMatrix;
use crate::solution::Tour;

/// Trait for local search improvement methods.
pub trait LocalSearch {
    /// Improve the tour in place. Returns whether any move was applied.
    fn improve(&self, matrix: &CostMatrix, tour: &mut Tour) -> bool;
    fn name(&self) -> &str;
}

/// 2-Opt Local Search
///
/// Reverses segments of the visiting order while the total cost decreases.
pub struct TwoOpt {
    /// Apply the first improving move instead of the best one per round.
    pub first_improvement: bool,
    /// Maximum improvement rounds.
    pub max_rounds: usize,
}

impl TwoOpt {
    pub fn new() -> Self {
        TwoOpt {
            first_improvement: false,
            max_rounds: 50,
        }
    }

    pub fn first_improvement() -> Self {
        TwoOpt {
            first_improvement: true,
            max_rounds: 50,
        }
    }
}

impl Default for TwoOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOpt {
    fn improve(&self, matrix: &CostMatrix, tour: &mut Tour) -> bool {
        let n = tour.num_points();
        if n < 3 {
            return false;
        }

        let mut order: Vec<usize> = tour.open_order().to_vec();
        let mut best_cost = tour.cost();
        let mut improved_any = false;

        for _ in 0..self.max_rounds {
            let mut best_move: Option<(usize, usize, f64)> = None;

            'scan: for i in 1..n - 1 {
                for j in i + 1..n {
                    let mut candidate = order.clone();
                    candidate[i..=j].reverse();
                    let cost = matrix.cycle_cost(&candidate);

                    if cost < best_cost - 1e-9 {
                        let better = match best_move {
                            None => true,
                            Some((_, _, c)) => cost < c,
                        };
                        if better {
                            best_move = Some((i, j, cost));
                        }
                        if self.first_improvement {
                            break 'scan;
                        }
                    }
                }
            }

            match best_move {
                Some((i, j, cost)) => {
                    order[i..=j].reverse();
                    best_cost = cost;
                    improved_any = true;
                }
                None => break,
            }
        }

        if improved_any {
            *tour = Tour::from_order(matrix, &order);
        }
        improved_any
    }

    fn name(&self) -> &str {
        if self.first_improvement {
            "2-Opt-FI"
        } else {
            "2-Opt-BI"
        }
    }
}

/// Or-Opt Local Search
///
/// Relocates segments of 1, 2 or 3 consecutive points to other positions.
pub struct OrOpt {
    /// Maximum segment length to relocate.
    pub max_segment_length: usize,
    /// Apply the first improving move instead of the best one per round.
    pub first_improvement: bool,
}

impl OrOpt {
    pub fn new() -> Self {
        OrOpt {
            max_segment_length: 3,
            first_improvement: false,
        }
    }
}

impl Default for OrOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for OrOpt {
    fn improve(&self, matrix: &CostMatrix, tour: &mut Tour) -> bool {
        let n = tour.num_points();
        if n < 3 {
            return false;
        }

        let mut order: Vec<usize> = tour.open_order().to_vec();
        let mut best_cost = tour.cost();
        let mut improved_any = false;
        let max_rounds = 50;

        for _ in 0..max_rounds {
            let mut best_candidate: Option<(Vec<usize>, f64)> = None;

            'scan: for seg_len in 1..=self.max_segment_length.min(n - 2) {
                for seg_start in 1..=n - seg_len {
                    let mut reduced = order.clone();
                    let segment: Vec<usize> =
                        reduced.drain(seg_start..seg_start + seg_len).collect();

                    for pos in 1..=reduced.len() {
                        if pos == seg_start {
                            continue;
                        }
                        let mut candidate = reduced.clone();
                        for (k, &p) in segment.iter().enumerate() {
                            candidate.insert(pos + k, p);
                        }
                        let cost = matrix.cycle_cost(&candidate);

                        if cost < best_cost - 1e-9 {
                            let better = match &best_candidate {
                                None => true,
                                Some((_, c)) => cost < *c,
                            };
                            if better {
                                best_candidate = Some((candidate, cost));
                            }
                            if self.first_improvement {
                                break 'scan;
                            }
                        }
                    }
                }
            }

            match best_candidate {
                Some((candidate, cost)) => {
                    order = candidate;
                    best_cost = cost;
                    improved_any = true;
                }
                None => break,
            }
        }

        if improved_any {
            *tour = Tour::from_order(matrix, &order);
        }
        improved_any
    }

    fn name(&self) -> &str {
        "Or-Opt"
    }
}
