//! Module for loading and representing TSP cost matrices.
//!
//! Instances are dense N x N matrices of non-negative arc costs, read and
//! written in the TSP-LIB explicit-matrix format (EDGE_WEIGHT_TYPE: EXPLICIT,
//! EDGE_WEIGHT_FORMAT: FULL_MATRIX). Costs may be asymmetric. Points are
//! 0-indexed internally and 1-indexed in files and printed output; point 0
//! is the fixed start and end of every tour.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SolverError};

/// A complete directed cost matrix over N points.
///
/// Immutable once constructed: every constructor validates that the matrix is
/// square, has at least two points and carries only finite, non-negative
/// entries. Diagonal entries are never read; an arc from a point to itself is
/// excluded by the model rather than priced here.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    name: String,
    costs: Vec<Vec<f64>>,
}

impl CostMatrix {
    /// Build a matrix from explicit rows, validating shape and entries.
    pub fn from_rows(name: &str, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        if n < 2 {
            return Err(SolverError::InvalidInput(format!(
                "need at least 2 points, got {}",
                n
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SolverError::InvalidInput(format!(
                    "row {} has {} entries, expected {}",
                    i + 1,
                    row.len(),
                    n
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(SolverError::InvalidInput(format!(
                        "cost [{},{}] = {} must be finite and non-negative",
                        i + 1,
                        j + 1,
                        value
                    )));
                }
            }
        }
        Ok(CostMatrix {
            name: name.to_string(),
            costs: rows,
        })
    }

    /// Parse an instance from a TSP-LIB explicit-matrix file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let fallback = path
            .as_ref()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();
        let file = File::open(&path)?;
        Self::parse(BufReader::new(file), &fallback)
    }

    /// Parse an instance from any buffered reader.
    pub fn parse<R: BufRead>(reader: R, fallback_name: &str) -> Result<Self> {
        let mut name = String::new();
        let mut dimension = 0usize;
        let mut values: Vec<f64> = Vec::new();

        let mut section = String::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if line.starts_with("NAME:") {
                name = line.replace("NAME:", "").trim().to_string();
                continue;
            }
            if line.starts_with("TYPE:") || line.starts_with("COMMENT:") {
                continue;
            }
            if line.starts_with("DIMENSION:") {
                dimension = line
                    .replace("DIMENSION:", "")
                    .trim()
                    .parse()
                    .map_err(|_| SolverError::InvalidInput("invalid DIMENSION".to_string()))?;
                continue;
            }
            if line.starts_with("EDGE_WEIGHT_TYPE:") {
                let kind = line.replace("EDGE_WEIGHT_TYPE:", "").trim().to_string();
                if kind != "EXPLICIT" {
                    return Err(SolverError::InvalidInput(format!(
                        "unsupported EDGE_WEIGHT_TYPE: {}",
                        kind
                    )));
                }
                continue;
            }
            if line.starts_with("EDGE_WEIGHT_FORMAT:") {
                let format = line.replace("EDGE_WEIGHT_FORMAT:", "").trim().to_string();
                if format != "FULL_MATRIX" {
                    return Err(SolverError::InvalidInput(format!(
                        "unsupported EDGE_WEIGHT_FORMAT: {}",
                        format
                    )));
                }
                continue;
            }

            if line.starts_with("EDGE_WEIGHT_SECTION") {
                section = "weights".to_string();
                continue;
            }
            if line.starts_with("DISPLAY_DATA_SECTION") {
                section = "display".to_string();
                continue;
            }

            if section == "weights" {
                for token in line.split_whitespace() {
                    let value: f64 = token.parse().map_err(|_| {
                        SolverError::InvalidInput(format!("invalid matrix entry: {}", token))
                    })?;
                    values.push(value);
                }
            }
        }

        if dimension == 0 {
            return Err(SolverError::InvalidInput(
                "missing DIMENSION header".to_string(),
            ));
        }
        if values.len() != dimension * dimension {
            return Err(SolverError::InvalidInput(format!(
                "expected {} matrix entries for dimension {}, found {}",
                dimension * dimension,
                dimension,
                values.len()
            )));
        }

        let rows: Vec<Vec<f64>> = values.chunks(dimension).map(|c| c.to_vec()).collect();
        let name = if name.is_empty() {
            fallback_name.to_string()
        } else {
            name
        };
        Self::from_rows(&name, rows)
    }

    /// Write the instance to a TSP-LIB explicit-matrix file.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        Ok(())
    }

    /// Write the instance in TSP-LIB explicit-matrix form to any writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "NAME: {}", self.name)?;
        writeln!(writer, "TYPE: ATSP")?;
        writeln!(writer, "DIMENSION: {}", self.dimension())?;
        writeln!(writer, "EDGE_WEIGHT_TYPE: EXPLICIT")?;
        writeln!(writer, "EDGE_WEIGHT_FORMAT: FULL_MATRIX")?;
        writeln!(writer, "EDGE_WEIGHT_SECTION")?;
        for row in &self.costs {
            let formatted: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{}", formatted.join(" "))?;
        }
        writeln!(writer, "EOF")
    }

    /// Generate a random symmetric instance from points drawn uniformly in a
    /// 100 x 100 square, with distances rounded to one decimal. Deterministic
    /// for a fixed seed.
    pub fn random_euclidean(n: usize, seed: u64) -> Result<Self> {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        if n < 2 {
            return Err(SolverError::InvalidInput(format!(
                "need at least 2 points, got {}",
                n
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();

        let mut rows = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = points[i].0 - points[j].0;
                    let dy = points[i].1 - points[j].1;
                    let d = (dx * dx + dy * dy).sqrt();
                    rows[i][j] = (d * 10.0).round() / 10.0;
                }
            }
        }
        Self::from_rows(&format!("euclidean{}", n), rows)
    }

    /// Generate a random asymmetric instance with arc costs drawn uniformly
    /// in [1, 100), rounded to one decimal. Deterministic for a fixed seed.
    pub fn random_asymmetric(n: usize, seed: u64) -> Result<Self> {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        if n < 2 {
            return Err(SolverError::InvalidInput(format!(
                "need at least 2 points, got {}",
                n
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut rows = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let d: f64 = rng.gen_range(1.0..100.0);
                    rows[i][j] = (d * 10.0).round() / 10.0;
                }
            }
        }
        Self::from_rows(&format!("asymmetric{}", n), rows)
    }

    /// The 11-point instance bundled for demos and tests. Mostly symmetric
    /// with one asymmetric pair, so it exercises the directed model.
    pub fn example_eleven() -> Self {
        let rows = vec![
            vec![0.0, 1.4, 6.0, 6.5, 6.8, 5.9, 3.8, 9.2, 5.5, 2.7, 3.0],
            vec![1.4, 0.0, 4.6, 6.2, 7.2, 5.3, 4.2, 9.6, 5.9, 2.1, 2.9],
            vec![6.0, 4.6, 0.0, 4.5, 3.0, 7.9, 6.0, 4.5, 7.1, 7.0, 7.1],
            vec![6.5, 6.2, 4.5, 0.0, 3.0, 9.1, 6.6, 6.2, 8.3, 6.3, 6.5],
            vec![6.8, 7.2, 3.0, 3.9, 0.0, 9.5, 6.8, 2.4, 8.5, 6.3, 6.4],
            vec![5.9, 5.3, 7.9, 9.1, 9.5, 0.0, 2.2, 14.1, 1.8, 4.7, 4.8],
            vec![3.8, 4.2, 6.0, 6.6, 6.8, 2.2, 0.0, 11.8, 2.6, 5.6, 6.7],
            vec![9.2, 9.6, 4.5, 6.2, 2.4, 14.1, 11.8, 0.0, 11.1, 8.6, 9.5],
            vec![5.5, 5.9, 7.1, 8.3, 8.5, 1.8, 2.6, 11.1, 0.0, 6.0, 6.1],
            vec![2.7, 2.1, 7.0, 6.3, 6.3, 4.7, 5.6, 8.6, 6.0, 0.0, 3.5],
            vec![3.0, 2.9, 7.1, 6.5, 6.4, 4.8, 6.7, 9.5, 6.1, 3.5, 0.0],
        ];
        CostMatrix {
            name: "example11".to_string(),
            costs: rows,
        }
    }

    /// Name of the instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of points.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.costs.len()
    }

    /// Cost of the directed arc from `i` to `j`.
    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.costs[i][j]
    }

    /// Whether cost(i, j) == cost(j, i) for every pair.
    pub fn is_symmetric(&self) -> bool {
        let n = self.dimension();
        for i in 0..n {
            for j in i + 1..n {
                if self.costs[i][j] != self.costs[j][i] {
                    return false;
                }
            }
        }
        true
    }

    /// Total cost of visiting `order` in sequence and returning to the first
    /// point. `order` lists each point exactly once.
    pub fn cycle_cost(&self, order: &[usize]) -> f64 {
        if order.len() < 2 {
            return 0.0;
        }

        let mut cost = 0.0;
        for i in 0..order.len() - 1 {
            cost += self.cost(order[i], order[i + 1]);
        }
        cost += self.cost(order[order.len() - 1], order[0]);

        cost
    }

    /// Get statistics about the instance.
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension();
        let mut min_cost = f64::INFINITY;
        let mut max_cost = 0.0f64;
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let c = self.costs[i][j];
                    min_cost = min_cost.min(c);
                    max_cost = max_cost.max(c);
                    sum += c;
                    count += 1;
                }
            }
        }

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            symmetric: self.is_symmetric(),
            min_cost,
            avg_cost: sum / count as f64,
            max_cost,
        }
    }
}

/// Statistics about a cost matrix, for the analyze command and logs.
#[derive(Debug, Clone)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub symmetric: bool,
    pub min_cost: f64,
    pub avg_cost: f64,
    pub max_cost: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Points: {}", self.dimension)?;
        writeln!(
            f,
            "  Costs: {}",
            if self.symmetric {
                "symmetric"
            } else {
                "asymmetric"
            }
        )?;
        writeln!(f, "  Min arc cost: {:.2}", self.min_cost)?;
        writeln!(f, "  Avg arc cost: {:.2}", self.avg_cost)?;
        writeln!(f, "  Max arc cost: {:.2}", self.max_cost)
    }
}
