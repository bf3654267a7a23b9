//! Exact TSP Solver - Command Line Interface
//!
//! Solves small asymmetric TSP instances to proven optimality with an
//! in-crate branch-and-bound engine.

use clap::{Parser, Subcommand, ValueEnum};
use tsp_exact_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use tsp_exact_solver::exact::{BranchAndBoundSolver, SolverConfig};
use tsp_exact_solver::heuristics::construction::{ConstructionHeuristic, NearestNeighbor};
use tsp_exact_solver::heuristics::warm_start_tour;
use tsp_exact_solver::instance::CostMatrix;
use tsp_exact_solver::model::TspModel;
use tsp_exact_solver::report;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tsp-exact-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "An exact branch-and-bound solver for small asymmetric TSP instances")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance to proven optimality
    Solve {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Time limit in seconds
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Maximum number of search nodes
        #[arg(short, long)]
        node_limit: Option<u64>,

        /// Random seed for the warm-start heuristics
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Skip the heuristic warm start
        #[arg(long)]
        no_warm_start: bool,

        /// Output solution as JSON to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the MTZ model in CPLEX LP format to file
        #[arg(long)]
        write_lp: Option<PathBuf>,

        /// Verbose output (prints the 0/1 arc matrix)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per randomized algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Exact solver time limit per instance
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Generate a random instance file
    Generate {
        /// Number of points
        #[arg(short, long)]
        points: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Instance kind
        #[arg(short, long, value_enum, default_value = "euclidean")]
        kind: InstanceKind,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum InstanceKind {
    /// Symmetric matrix of rounded planar distances
    Euclidean,
    /// Independent uniform cost per directed arc
    Asymmetric,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            time_limit,
            node_limit,
            seed,
            no_warm_start,
            output,
            write_lp,
            verbose,
        } => {
            solve_instance(
                &instance,
                time_limit,
                node_limit,
                seed,
                no_warm_start,
                output,
                write_lp,
                verbose,
            );
        }

        Commands::Benchmark {
            dir,
            output,
            runs,
            time_limit,
            max_size,
        } => {
            run_benchmark(&dir, &output, runs, time_limit, max_size);
        }

        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }

        Commands::Generate {
            points,
            seed,
            kind,
            output,
        } => {
            generate_instance(points, seed, kind, &output);
        }
    }
}

fn load_or_exit(path: &PathBuf) -> CostMatrix {
    match CostMatrix::from_file(path) {
        Ok(matrix) => matrix,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &PathBuf,
    time_limit: f64,
    node_limit: Option<u64>,
    seed: u64,
    no_warm_start: bool,
    output: Option<PathBuf>,
    write_lp: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);
    let matrix = load_or_exit(path);

    if verbose {
        println!("{}", matrix.statistics());
    }

    if let Some(lp_path) = write_lp {
        let model = match TspModel::build(&matrix) {
            Ok(model) => model,
            Err(e) => {
                eprintln!("Error building model: {}", e);
                std::process::exit(1);
            }
        };
        let result = File::create(&lp_path)
            .map(BufWriter::new)
            .and_then(|mut w| model.write_lp(&mut w));
        match result {
            Ok(()) => println!("Model written to {:?}", lp_path),
            Err(e) => {
                eprintln!("Error writing LP file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let warm_start = if no_warm_start {
        None
    } else {
        let tour = warm_start_tour(&matrix, 8, seed);
        println!("Warm start cost: {:.2}", tour.cost());
        Some(tour.open_order().to_vec())
    };

    let config = SolverConfig {
        time_limit,
        node_limit,
        warm_start,
        ..SolverConfig::default()
    };

    println!("Solving with branch-and-bound...");
    let result = match BranchAndBoundSolver::new(config).solve(&matrix) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Solver error: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n========== Results ==========");
    println!("{}", report::format_summary(matrix.name(), &result));

    if verbose {
        if let Some(assignment) = &result.assignment {
            println!("\nArc matrix:");
            print!("{}", report::format_assignment(assignment));
        }
    }

    if let Some(out_path) = output {
        let record = report::solution_record(matrix.name(), &result);
        let json = match serde_json::to_string_pretty(&record) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error serializing solution: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(&out_path, json) {
            eprintln!("Error writing solution: {}", e);
            std::process::exit(1);
        }
        println!("\nSolution saved to {:?}", out_path);
    }
}

fn run_benchmark(
    dir: &PathBuf,
    output: &PathBuf,
    runs: usize,
    time_limit: f64,
    max_size: Option<usize>,
) {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);
    if let Some(max) = max_size {
        instances.retain(|m| m.dimension() <= max);
    }

    println!("Found {} instances", instances.len());
    if instances.is_empty() {
        eprintln!("No instances found!");
        std::process::exit(1);
    }

    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        time_limit,
        ..BenchmarkConfig::default()
    };
    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(&instances);

    let results_path = output.join("results.csv");
    if let Err(e) = benchmark.export_to_csv(&results_path) {
        eprintln!("Error exporting results: {}", e);
        std::process::exit(1);
    }
    println!("Results exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    if let Err(e) = benchmark.export_statistics_csv(&stats_path) {
        eprintln!("Error exporting statistics: {}", e);
        std::process::exit(1);
    }
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    if let Err(e) = std::fs::write(&report_path, &report) {
        eprintln!("Error saving report: {}", e);
        std::process::exit(1);
    }
    println!("Report saved to {:?}", report_path);
}

fn analyze_instance(path: &PathBuf) {
    let matrix = load_or_exit(path);

    println!("========== Instance Analysis ==========\n");
    println!("{}", matrix.statistics());

    let model = match TspModel::build(&matrix) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error building model: {}", e);
            std::process::exit(1);
        }
    };
    println!("Model size:");
    println!("  Variables: {}", model.num_variables());
    println!("  Constraints: {}", model.num_constraints());

    let nn = NearestNeighbor::new().construct(&matrix);
    let warm = warm_start_tour(&matrix, 8, 42);
    let naive: Vec<usize> = (0..matrix.dimension()).collect();

    println!("\nQuick Solution Estimates:");
    println!("  Input order: {:.2}", matrix.cycle_cost(&naive));
    println!("  Nearest Neighbor: {:.2}", nn.cost());
    println!("  Multi-Start + 2-Opt/Or-Opt: {:.2}", warm.cost());
}

fn generate_instance(points: usize, seed: u64, kind: InstanceKind, output: &PathBuf) {
    let matrix = match kind {
        InstanceKind::Euclidean => CostMatrix::random_euclidean(points, seed),
        InstanceKind::Asymmetric => CostMatrix::random_asymmetric(points, seed),
    };
    let matrix = match matrix {
        Ok(matrix) => matrix,
        Err(e) => {
            eprintln!("Error generating instance: {}", e);
            std::process::exit(1);
        }
    };

    match matrix.write_file(output) {
        Ok(()) => println!(
            "Generated {} ({} points) at {:?}",
            matrix.name(),
            matrix.dimension(),
            output
        ),
        Err(e) => {
            eprintln!("Error writing instance: {}", e);
            std::process::exit(1);
        }
    }
}
