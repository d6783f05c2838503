//! Metrics collection for structure learning

use relpc_domain::OrientationRule;
use std::collections::BTreeMap;

/// Metrics collected during a Relational PC run
///
/// Tracks tests and removals per depth level, rule firings and background
/// edges added during orientation.
#[derive(Debug, Clone, Default)]
pub struct LearnerMetrics {
    /// Independence tests run per depth level
    pub tests: BTreeMap<usize, usize>,

    /// Edges removed per depth level
    pub removals: BTreeMap<usize, usize>,

    /// Constraints found by the out-of-range check
    pub out_of_range_constraints: usize,

    /// Edges oriented per rule
    pub orientations: BTreeMap<OrientationRule, usize>,

    /// Background edges added during orientation
    pub background_edges: usize,

    /// Passes of the orientation pipeline
    pub passes: usize,
}

impl LearnerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` tests at a depth level
    pub fn record_tests(&mut self, depth: usize, count: usize) {
        *self.tests.entry(depth).or_insert(0) += count;
    }

    /// Record an edge removal
    pub fn record_removal(&mut self, depth: usize) {
        *self.removals.entry(depth).or_insert(0) += 1;
    }

    /// Record an out-of-range constraint
    pub fn record_out_of_range(&mut self) {
        self.out_of_range_constraints += 1;
    }

    /// Record an orientation
    pub fn record_orientation(&mut self, rule: OrientationRule) {
        *self.orientations.entry(rule).or_insert(0) += 1;
    }

    /// Record a background edge
    pub fn record_background(&mut self) {
        self.background_edges += 1;
    }

    /// Record an orientation pass
    pub fn record_pass(&mut self) {
        self.passes += 1;
    }

    /// Total tests across all depths
    pub fn total_tests(&self) -> usize {
        self.tests.values().sum()
    }

    /// Total removals across all depths
    pub fn total_removals(&self) -> usize {
        self.removals.values().sum()
    }

    /// Total orientations across all rules
    pub fn total_orientations(&self) -> usize {
        self.orientations.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Learner Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Tests: {}", self.total_tests()),
            format!("Removals: {}", self.total_removals()),
            format!("Out-of-range constraints: {}", self.out_of_range_constraints),
            String::new(),
        ];

        if !self.tests.is_empty() {
            lines.push("Tests by depth:".to_string());
            for (depth, count) in &self.tests {
                let removed = self.removals.get(depth).copied().unwrap_or(0);
                lines.push(format!("  {}: {} tests, {} removed", depth, count, removed));
            }
            lines.push(String::new());
        }

        if self.passes > 0 {
            lines.push(format!("Orientation passes: {}", self.passes));
            for rule in OrientationRule::ALL {
                let count = self.orientations.get(&rule).copied().unwrap_or(0);
                lines.push(format!("  {}: {}", rule.code(), count));
            }
            lines.push(format!("  Total: {}", self.total_orientations()));
            lines.push(format!("  Background edges: {}", self.background_edges));
        }

        lines.join("\n")
    }
}
