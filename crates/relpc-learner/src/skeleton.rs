//! Level-wise search for separating sets

use crate::IndependenceTest;
use relpc_domain::Variable;
use relpc_stats::TestResult;
use serde::Serialize;

/// Test outcomes recorded for one candidate pair during skeleton search
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PairLog {
    /// Result of the marginal test
    pub marginal: Option<TestResult>,

    /// Result of the last conditional test run on the pair
    pub conditional: Option<TestResult>,
}

impl PairLog {
    pub(crate) fn record(&mut self, depth: usize, result: TestResult) {
        if depth == 0 {
            self.marginal = Some(result);
        } else {
            self.conditional = Some(result);
        }
    }
}

/// Every `k`-subset of `items`, in lexicographic order of positions
pub fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    let n = items.len();
    if k > n {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i].clone()).collect());

        // Rightmost position that can still advance
        let Some(pos) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// The most dependent-looking of a set of per-perspective results: smallest
/// p-value, then largest effect
pub(crate) fn strongest(results: &[TestResult]) -> Option<TestResult> {
    results.iter().copied().reduce(|best, r| {
        if r.p_value < best.p_value || (r.p_value == best.p_value && r.effect_size > best.effect_size) {
            r
        } else {
            best
        }
    })
}

/// What one depth level decided for one pair
#[derive(Debug, Clone)]
pub(crate) struct PairOutcome {
    /// Number of tests run
    pub tests: usize,

    /// Last result seen
    pub last: Option<TestResult>,

    /// Separating set and its result, if the pair was found independent
    pub separated_by: Option<(Vec<Variable>, TestResult)>,
}

/// Try every conditioning set of size `depth` from `pool` until one separates
/// `x` and `y`
pub(crate) fn search_pair<T: IndependenceTest + ?Sized>(
    test: &T,
    x: &Variable,
    y: &Variable,
    pool: &[Variable],
    depth: usize,
    alpha: f64,
    strength: f64,
) -> PairOutcome {
    let mut outcome = PairOutcome {
        tests: 0,
        last: None,
        separated_by: None,
    };

    for z in combinations(pool, depth) {
        let results = test.test(x, y, &z);
        outcome.tests += 1;
        let summary = strongest(&results).unwrap_or_else(|| TestResult::degenerate(0));
        outcome.last = Some(summary);

        if results.iter().all(|r| r.is_independent(alpha, strength)) {
            outcome.separated_by = Some((z, summary));
            break;
        }
    }
    outcome
}
