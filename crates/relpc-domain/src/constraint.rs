//! Independence constraints - the audit trail of skeleton identification

use crate::unit::Variable;
use std::fmt;

/// A recorded conditional independence `first _||_ second | conditioning`
#[derive(Debug, Clone, PartialEq)]
pub struct IndependenceConstraint {
    /// First variable of the pair
    pub first: Variable,

    /// Second variable of the pair
    pub second: Variable,

    /// The witnessing conditioning set
    pub conditioning: Vec<Variable>,

    /// Test statistic of the witnessing test
    pub statistic: f64,

    /// p-value of the witnessing test
    pub p_value: f64,

    /// Effect size of the witnessing test
    pub effect_size: f64,
}

impl IndependenceConstraint {
    /// Whether the constraint concerns the unordered pair `(a, b)`
    pub fn separates(&self, a: &Variable, b: &Variable) -> bool {
        (&self.first == a && &self.second == b) || (&self.first == b && &self.second == a)
    }
}

impl fmt::Display for IndependenceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditioning: Vec<String> = self.conditioning.iter().map(|v| v.to_string()).collect();
        write!(
            f,
            "{} _||_ {} | {{{}}}",
            self.first,
            self.second,
            conditioning.join(", ")
        )
    }
}
