//! Two-way contingency tables and stratification

use std::collections::BTreeMap;

/// One joint observation of `x`, `y` and the conditioning values `z`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Treatment value
    pub x: i64,

    /// Outcome value
    pub y: i64,

    /// Conditioning values, in conditioning-set order
    pub z: Vec<i64>,
}

/// Cross-tabulated counts of two categorical variables
///
/// Only observed categories get a row or column, so no margin is ever zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    counts: Vec<Vec<f64>>,
    total: f64,
}

impl ContingencyTable {
    /// Tabulate `(x, y)` pairs
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        let mut cells: BTreeMap<(i64, i64), f64> = BTreeMap::new();
        for (x, y) in pairs {
            *cells.entry((x, y)).or_insert(0.0) += 1.0;
        }

        let row_index: BTreeMap<i64, usize> = index_of(cells.keys().map(|(x, _)| *x));
        let col_index: BTreeMap<i64, usize> = index_of(cells.keys().map(|(_, y)| *y));

        let mut counts = vec![vec![0.0; col_index.len()]; row_index.len()];
        let mut total = 0.0;
        for ((x, y), n) in cells {
            counts[row_index[&x]][col_index[&y]] = n;
            total += n;
        }
        Self { counts, total }
    }

    /// Number of observed `x` categories
    pub fn rows(&self) -> usize {
        self.counts.len()
    }

    /// Number of observed `y` categories
    pub fn cols(&self) -> usize {
        self.counts.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Number of observations
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Count in one cell
    pub fn count(&self, row: usize, col: usize) -> f64 {
        self.counts[row][col]
    }

    /// Row margins
    pub fn row_totals(&self) -> Vec<f64> {
        self.counts.iter().map(|r| r.iter().sum()).collect()
    }

    /// Column margins
    pub fn col_totals(&self) -> Vec<f64> {
        (0..self.cols())
            .map(|c| self.counts.iter().map(|r| r[c]).sum())
            .collect()
    }

    /// A table with fewer than two rows or columns carries no information
    /// about association
    pub fn is_degenerate(&self) -> bool {
        self.rows() < 2 || self.cols() < 2
    }
}

fn index_of(values: impl Iterator<Item = i64>) -> BTreeMap<i64, usize> {
    let mut distinct: Vec<i64> = values.collect();
    distinct.sort_unstable();
    distinct.dedup();
    distinct.into_iter().enumerate().map(|(i, v)| (v, i)).collect()
}

/// Split observations into one table per distinct conditioning value
///
/// Strata are returned in ascending order of their conditioning key.
pub fn stratify(observations: &[Observation]) -> Vec<ContingencyTable> {
    let mut strata: BTreeMap<&[i64], Vec<(i64, i64)>> = BTreeMap::new();
    for obs in observations {
        strata.entry(obs.z.as_slice()).or_default().push((obs.x, obs.y));
    }
    strata.into_values().map(ContingencyTable::from_pairs).collect()
}
