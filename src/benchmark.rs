//! Benchmarking and experimentation module.
//!
//! Runs the heuristic baselines and the exact solver across a set of
//! instances, collects per-run records, aggregates statistics per algorithm
//! and exports everything as CSV plus a plain-text report.

use crate::exact::{BranchAndBoundSolver, SolverConfig};
use crate::heuristics::construction::{ConstructionHeuristic, MultiStartNearestNeighbor};
use crate::heuristics::local_search::{LocalSearch, TwoOpt};
use crate::instance::CostMatrix;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Result of running a single algorithm on an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Instance dimension
    pub dimension: usize,
    /// Tour cost (upper bound for the exact solver)
    pub cost: f64,
    /// Proven lower bound, when the algorithm provides one
    pub lower_bound: Option<f64>,
    /// Relative gap between bounds, when available
    pub gap: Option<f64>,
    /// Whether the cost is proven optimal
    pub optimal: bool,
    /// Computation time in seconds
    pub time: f64,
    /// Subproblems explored (exact solver only)
    pub nodes: Option<u64>,
}

/// Aggregated statistics for an algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs recorded
    pub num_runs: usize,
    /// Number of runs with proven optimality
    pub num_optimal: usize,
    /// Average cost
    pub avg_cost: f64,
    /// Best cost
    pub best_cost: f64,
    /// Worst cost
    pub worst_cost: f64,
    /// Standard deviation of cost
    pub std_cost: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
}

/// Benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per randomized algorithm
    pub num_runs: usize,
    /// Exact solver time limit per instance in seconds
    pub time_limit: f64,
    /// Multi-start width for the construction baseline
    pub starts: usize,
    /// Base seed; run k uses seed + k
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            time_limit: 60.0,
            starts: 8,
            seed: 42,
        }
    }
}

/// Benchmarking engine.
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run the seeded construction baseline on an instance.
    pub fn run_construction(&mut self, matrix: &CostMatrix) {
        for run in 0..self.config.num_runs {
            let seed = self.config.seed + run as u64;
            let heuristic = MultiStartNearestNeighbor::new(self.config.starts, seed);

            let start = Instant::now();
            let tour = heuristic.construct(matrix);
            let time = start.elapsed().as_secs_f64();

            self.results.push(AlgorithmResult {
                algorithm: format!("{}-run{}", heuristic.name(), run),
                instance: matrix.name().to_string(),
                dimension: matrix.dimension(),
                cost: tour.cost(),
                lower_bound: None,
                gap: None,
                optimal: false,
                time,
                nodes: None,
            });
        }
    }

    /// Run construction plus 2-opt on an instance.
    pub fn run_local_search(&mut self, matrix: &CostMatrix) {
        for run in 0..self.config.num_runs {
            let seed = self.config.seed + run as u64;
            let heuristic = MultiStartNearestNeighbor::new(self.config.starts, seed);
            let search = TwoOpt::new();

            let start = Instant::now();
            let mut tour = heuristic.construct(matrix);
            search.improve(matrix, &mut tour);
            let time = start.elapsed().as_secs_f64();

            self.results.push(AlgorithmResult {
                algorithm: format!("NN+{}-run{}", search.name(), run),
                instance: matrix.name().to_string(),
                dimension: matrix.dimension(),
                cost: tour.cost(),
                lower_bound: None,
                gap: None,
                optimal: false,
                time,
                nodes: None,
            });
        }
    }

    /// Run the exact solver on an instance, warm-started from the heuristics.
    pub fn run_exact(&mut self, matrix: &CostMatrix) {
        let warm =
            crate::heuristics::warm_start_tour(matrix, self.config.starts, self.config.seed);
        let config = SolverConfig {
            time_limit: self.config.time_limit,
            warm_start: Some(warm.open_order().to_vec()),
            ..SolverConfig::default()
        };

        match BranchAndBoundSolver::new(config).solve(matrix) {
            Ok(result) => {
                self.results.push(AlgorithmResult {
                    algorithm: "BranchAndBound".to_string(),
                    instance: matrix.name().to_string(),
                    dimension: matrix.dimension(),
                    cost: result.upper_bound,
                    lower_bound: Some(result.lower_bound),
                    gap: Some(result.gap),
                    optimal: result.optimal,
                    time: result.computation_time,
                    nodes: Some(result.nodes_explored),
                });
            }
            Err(e) => {
                log::error!("exact solver failed on {}: {}", matrix.name(), e);
            }
        }
    }

    /// Run everything on one instance.
    pub fn run_full_benchmark(&mut self, matrix: &CostMatrix) {
        log::info!(
            "benchmarking {} (n = {})",
            matrix.name(),
            matrix.dimension()
        );
        self.run_construction(matrix);
        self.run_local_search(matrix);
        self.run_exact(matrix);
    }

    /// Run everything on a set of instances with a progress bar.
    pub fn run_on_instances(&mut self, instances: &[CostMatrix]) {
        let bar = ProgressBar::new(instances.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for matrix in instances {
            bar.set_message(matrix.name().to_string());
            self.run_full_benchmark(matrix);
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    /// Compute per-algorithm statistics, run suffixes stripped.
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut groups: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();
        for result in &self.results {
            let base = result
                .algorithm
                .split("-run")
                .next()
                .unwrap_or(&result.algorithm)
                .to_string();
            groups.entry(base).or_default().push(result);
        }

        let mut statistics = Vec::new();
        for (algorithm, results) in groups {
            let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();

            let std_cost = if costs.len() > 1 {
                costs.as_slice().std_dev()
            } else {
                0.0
            };

            statistics.push(AlgorithmStatistics {
                algorithm,
                num_runs: results.len(),
                num_optimal: results.iter().filter(|r| r.optimal).count(),
                avg_cost: costs.as_slice().mean(),
                best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                worst_cost: costs.iter().cloned().fold(0.0, f64::max),
                std_cost,
                avg_time: times.as_slice().mean(),
                total_time: times.iter().sum(),
            });
        }

        statistics.sort_by(|a, b| {
            a.avg_cost
                .partial_cmp(&b.avg_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        statistics
    }

    /// Export per-run results to CSV.
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export aggregated statistics to CSV.
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate the summary report.
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(86).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>8} {:>12} {:>12} {:>12} {:>8} {:>10}\n",
            "Algorithm", "Runs", "Avg Cost", "Best Cost", "Std Cost", "Optimal", "Avg Time"
        ));
        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<20} {:>8} {:>12.2} {:>12.2} {:>12.2} {:>8} {:>10.4}\n",
                stat.algorithm,
                stat.num_runs,
                stat.avg_cost,
                stat.best_cost,
                stat.std_cost,
                format!("{}/{}", stat.num_optimal, stat.num_runs),
                stat.avg_time
            ));
        }
        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");
        let mut instance_best: HashMap<String, &AlgorithmResult> = HashMap::new();
        for result in &self.results {
            let entry = instance_best
                .entry(result.instance.clone())
                .or_insert(result);
            // Ties go to the proven-optimal result.
            if result.cost < entry.cost - 1e-9
                || (result.cost < entry.cost + 1e-9 && result.optimal && !entry.optimal)
            {
                *entry = result;
            }
        }
        let mut names: Vec<&String> = instance_best.keys().collect();
        names.sort();
        for name in names {
            let best = instance_best[name];
            report.push_str(&format!(
                "  {}: {:.2} ({}{})\n",
                name,
                best.cost,
                best.algorithm,
                if best.optimal { ", proven optimal" } else { "" }
            ));
        }

        report
    }

    /// All recorded per-run results.
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Load every `.tsp` instance from a directory, smallest dimension first.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<CostMatrix> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tsp").unwrap_or(false) {
                match CostMatrix::from_file(&path) {
                    Ok(matrix) => instances.push(matrix),
                    Err(e) => log::error!("skipping {:?}: {}", path, e),
                }
            }
        }
    }

    instances.sort_by_key(|m| m.dimension());
    instances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
    }

    #[test]
    fn test_records_and_statistics() {
        let matrix = CostMatrix::example_eleven();
        let config = BenchmarkConfig {
            num_runs: 2,
            time_limit: 30.0,
            ..BenchmarkConfig::default()
        };
        let mut benchmark = Benchmark::new(config);
        benchmark.run_full_benchmark(&matrix);

        // 2 construction runs, 2 local-search runs, 1 exact run.
        assert_eq!(benchmark.results().len(), 5);
        let exact = benchmark
            .results()
            .iter()
            .find(|r| r.algorithm == "BranchAndBound")
            .unwrap();
        assert!(exact.optimal);
        assert!(exact.nodes.is_some());

        // The exact optimum is never beaten by a heuristic run.
        for result in benchmark.results() {
            assert!(exact.cost <= result.cost + 1e-6);
        }

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 3);
        for stat in &stats {
            assert!(stat.best_cost <= stat.avg_cost + 1e-9);
            assert!(stat.avg_cost <= stat.worst_cost + 1e-9);
        }
        // Sorted by average cost, so the optimum leads.
        assert!((stats[0].avg_cost - exact.cost).abs() < 1e-6);
    }

    #[test]
    fn test_report_mentions_every_algorithm() {
        let matrix = CostMatrix::random_asymmetric(6, 3).unwrap();
        let config = BenchmarkConfig {
            num_runs: 1,
            ..BenchmarkConfig::default()
        };
        let mut benchmark = Benchmark::new(config);
        benchmark.run_full_benchmark(&matrix);

        let report = benchmark.generate_report();
        assert!(report.contains("BranchAndBound"));
        assert!(report.contains("MultiStart-NN"));
        assert!(report.contains("asymmetric6"));
        assert!(report.contains("proven optimal"));
    }
}
