//! Linear assignment relaxation.
//!
//! Dropping the MTZ rows from the tour model leaves a linear assignment
//! problem over the directed arcs, solved here combinatorially by the O(n^3)
//! shortest-augmenting-path method with dual potentials. The solution always
//! has integral 0/1 arc values and satisfies both degree constraint families,
//! so its cost is a valid lower bound on any tour; it may decompose into
//! several subtours, which is what the search branches on.
//!
//! Arc decisions are encoded in the cost function: a forbidden arc carries
//! cost `f64::INFINITY` and is never matched while a finite completion
//! exists.

/// Solve the n x n assignment problem for the given arc cost function.
///
/// Returns the matched successor of every row together with the total cost,
/// or `None` when no complete matching of finite cost exists.
pub fn solve_assignment<F>(n: usize, cost: F) -> Option<(Vec<usize>, f64)>
where
    F: Fn(usize, usize) -> f64,
{
    // Column n is the virtual free column each augmenting search starts from.
    let mut potential_row = vec![0.0f64; n];
    let mut potential_col = vec![0.0f64; n + 1];
    let mut matched_row: Vec<usize> = vec![usize::MAX; n + 1];

    for row in 0..n {
        matched_row[n] = row;
        let mut j0 = n;
        let mut min_to = vec![f64::INFINITY; n + 1];
        let mut way = vec![n; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = matched_row[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = n;

            for j in 0..n {
                if !used[j] {
                    let reduced = cost(i0, j) - potential_row[i0] - potential_col[j];
                    if reduced < min_to[j] {
                        min_to[j] = reduced;
                        way[j] = j0;
                    }
                    if min_to[j] < delta {
                        delta = min_to[j];
                        j1 = j;
                    }
                }
            }

            if !delta.is_finite() {
                // Every column still reachable is forbidden.
                return None;
            }

            for j in 0..=n {
                if used[j] {
                    potential_row[matched_row[j]] += delta;
                    potential_col[j] -= delta;
                } else {
                    min_to[j] -= delta;
                }
            }

            j0 = j1;
            if matched_row[j0] == usize::MAX {
                break;
            }
        }

        // Augment along the alternating path back to the virtual column.
        while j0 != n {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
        }
    }

    let mut next = vec![0usize; n];
    for j in 0..n {
        next[matched_row[j]] = j;
    }
    let total = (0..n).map(|i| cost(i, next[i])).sum();
    Some((next, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: f64 = f64::INFINITY;

    fn tabular(costs: &[Vec<f64>]) -> impl Fn(usize, usize) -> f64 + '_ {
        move |i, j| costs[i][j]
    }

    fn permutations(n: usize) -> Vec<Vec<usize>> {
        fn rec(n: usize, used: &mut [bool], current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            if current.len() == n {
                out.push(current.clone());
                return;
            }
            for v in 0..n {
                if !used[v] {
                    used[v] = true;
                    current.push(v);
                    rec(n, used, current, out);
                    current.pop();
                    used[v] = false;
                }
            }
        }
        let mut out = Vec::new();
        rec(n, &mut vec![false; n], &mut Vec::new(), &mut out);
        out
    }

    #[test]
    fn test_three_points_diagonal_forbidden() {
        let costs = vec![
            vec![INF, 1.0, 4.0],
            vec![2.0, INF, 6.0],
            vec![3.0, 7.0, INF],
        ];
        let (next, total) = solve_assignment(3, tabular(&costs)).unwrap();
        // The only derangements are the two 3-cycles; 1+6+3 beats 4+2+7.
        assert_eq!(next, vec![1, 2, 0]);
        assert!((total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_prefers_subtours_when_cheaper() {
        let mut costs = vec![vec![100.0; 4]; 4];
        for i in 0..4 {
            costs[i][i] = INF;
        }
        costs[0][1] = 1.0;
        costs[1][0] = 1.0;
        costs[2][3] = 1.0;
        costs[3][2] = 1.0;
        let (next, total) = solve_assignment(4, tabular(&costs)).unwrap();
        // Two 2-cycles: degree-feasible, not a tour. The relaxation is
        // allowed to pick them; closing the gap is the search's job.
        assert_eq!(next, vec![1, 0, 3, 2]);
        assert!((total - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_forced_arc_encoding() {
        let mut costs = vec![
            vec![INF, 1.0, 1.0, 1.0],
            vec![1.0, INF, 1.0, 1.0],
            vec![1.0, 1.0, INF, 1.0],
            vec![1.0, 1.0, 1.0, INF],
        ];
        // Forcing arc (0, 2): every other arc out of 0 and into 2 is banned.
        costs[0][1] = INF;
        costs[0][3] = INF;
        costs[1][2] = INF;
        costs[3][2] = INF;
        let (next, _) = solve_assignment(4, tabular(&costs)).unwrap();
        assert_eq!(next[0], 2);
    }

    #[test]
    fn test_infeasible_when_column_blocked() {
        let costs = vec![
            vec![INF, 1.0, INF],
            vec![1.0, INF, INF],
            vec![1.0, 1.0, INF],
        ];
        assert!(solve_assignment(3, tabular(&costs)).is_none());
    }

    #[test]
    fn test_matches_brute_force() {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        for seed in 1..=3u64 {
            let n = 6;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut costs = vec![vec![INF; n]; n];
            for i in 0..n {
                for j in 0..n {
                    if i != j {
                        costs[i][j] = (rng.gen_range(1.0..50.0) * 10.0f64).round() / 10.0;
                    }
                }
            }

            let (next, total) = solve_assignment(n, tabular(&costs)).unwrap();
            assert!((0..n).all(|i| next[i] != i));

            let best = permutations(n)
                .into_iter()
                .filter(|p| (0..n).all(|i| p[i] != i))
                .map(|p| (0..n).map(|i| costs[i][p[i]]).sum::<f64>())
                .fold(INF, f64::min);
            assert!(
                (total - best).abs() < 1e-9,
                "seed {}: got {}, brute force {}",
                seed,
                total,
                best
            );
        }
    }
}
