//! Dependencies between variables and the rules that orient them

use crate::unit::Variable;
use std::fmt;
use std::str::FromStr;

/// Orientation rules, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrientationRule {
    /// Collider detection (v-structures)
    ColliderDetection,

    /// Restricted existence models
    RestrictedExistence,

    /// Known non-colliders
    KnownNonCollider,

    /// Cycle avoidance
    CycleAvoidance,
}

impl OrientationRule {
    /// All rules in the order they are evaluated
    pub const ALL: [OrientationRule; 4] = [
        OrientationRule::ColliderDetection,
        OrientationRule::RestrictedExistence,
        OrientationRule::KnownNonCollider,
        OrientationRule::CycleAvoidance,
    ];

    /// Short tag used in reports
    pub fn code(&self) -> &'static str {
        match self {
            OrientationRule::ColliderDetection => "CD",
            OrientationRule::RestrictedExistence => "REM",
            OrientationRule::KnownNonCollider => "KNC",
            OrientationRule::CycleAvoidance => "CA",
        }
    }
}

impl fmt::Display for OrientationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrientationRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CD" => Ok(OrientationRule::ColliderDetection),
            "REM" => Ok(OrientationRule::RestrictedExistence),
            "KNC" => Ok(OrientationRule::KnownNonCollider),
            "CA" => Ok(OrientationRule::CycleAvoidance),
            _ => Err(format!("Unknown orientation rule: {}", s)),
        }
    }
}

/// Direction of a dependency relative to its (source, target) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// No direction established
    Undirected,

    /// source --> target
    Forward,

    /// target --> source
    Backward,
}

/// An edge of the model
///
/// Undirected dependencies keep their endpoints in canonical (sorted) order;
/// orienting one never changes the endpoints, only the orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// First endpoint
    pub source: Variable,

    /// Second endpoint
    pub target: Variable,

    /// Current orientation
    pub orientation: Orientation,

    /// Rule that oriented the edge, if any
    pub rule: Option<OrientationRule>,
}

impl Dependency {
    /// Create an undirected dependency
    pub fn undirected(a: Variable, b: Variable) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source,
            target,
            orientation: Orientation::Undirected,
            rule: None,
        }
    }

    /// Create a directed dependency with no rule tag (used for ground truth)
    pub fn directed(cause: Variable, effect: Variable) -> Self {
        Self {
            source: cause,
            target: effect,
            orientation: Orientation::Forward,
            rule: None,
        }
    }

    /// Whether the edge has a direction
    pub fn is_directed(&self) -> bool {
        self.orientation != Orientation::Undirected
    }

    /// The cause endpoint of a directed edge
    pub fn cause(&self) -> Option<&Variable> {
        match self.orientation {
            Orientation::Forward => Some(&self.source),
            Orientation::Backward => Some(&self.target),
            Orientation::Undirected => None,
        }
    }

    /// The effect endpoint of a directed edge
    pub fn effect(&self) -> Option<&Variable> {
        match self.orientation {
            Orientation::Forward => Some(&self.target),
            Orientation::Backward => Some(&self.source),
            Orientation::Undirected => None,
        }
    }

    /// Whether the edge joins `a` and `b` in either order
    pub fn connects(&self, a: &Variable, b: &Variable) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }

    /// Whether the edge is directed `from --> to`
    pub fn points(&self, from: &Variable, to: &Variable) -> bool {
        self.cause() == Some(from) && self.effect() == Some(to)
    }

    /// The endpoint opposite `v`
    pub fn other(&self, v: &Variable) -> Option<&Variable> {
        if &self.source == v {
            Some(&self.target)
        } else if &self.target == v {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Endpoints in sorted order, used as the edge's identity
    pub fn key(&self) -> (Variable, Variable) {
        if self.source <= self.target {
            (self.source.clone(), self.target.clone())
        } else {
            (self.target.clone(), self.source.clone())
        }
    }

    /// Orient an undirected edge as `cause --> other`
    ///
    /// Returns false and leaves the edge untouched if it is already directed or
    /// `cause` is not an endpoint.
    pub fn orient(&mut self, cause: &Variable, rule: OrientationRule) -> bool {
        if self.is_directed() {
            return false;
        }
        self.orientation = if &self.source == cause {
            Orientation::Forward
        } else if &self.target == cause {
            Orientation::Backward
        } else {
            return false;
        };
        self.rule = Some(rule);
        true
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.cause(), self.effect()) {
            (Some(cause), Some(effect)) => {
                write!(f, "{} --> {}", cause, effect)?;
                if let Some(rule) = self.rule {
                    write!(f, " [{}]", rule)?;
                }
                Ok(())
            }
            _ => write!(f, "{} --- {}", self.source, self.target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Variable {
        Variable::value("a", "value")
    }

    fn b() -> Variable {
        Variable::value("b", "value")
    }

    #[test]
    fn test_undirected_is_canonical() {
        let dep = Dependency::undirected(b(), a());
        assert_eq!(dep.source, a());
        assert_eq!(dep.target, b());
        assert_eq!(dep.to_string(), "a.value --- b.value");
    }

    #[test]
    fn test_orient_backward_keeps_endpoints() {
        let mut dep = Dependency::undirected(a(), b());
        assert!(dep.orient(&b(), OrientationRule::KnownNonCollider));
        assert_eq!(dep.orientation, Orientation::Backward);
        assert!(dep.points(&b(), &a()));
        assert_eq!(dep.to_string(), "b.value --> a.value [KNC]");
    }

    #[test]
    fn test_orient_never_flips() {
        let mut dep = Dependency::undirected(a(), b());
        assert!(dep.orient(&a(), OrientationRule::ColliderDetection));
        assert!(!dep.orient(&b(), OrientationRule::CycleAvoidance));
        assert!(dep.points(&a(), &b()));
        assert_eq!(dep.rule, Some(OrientationRule::ColliderDetection));
    }

    #[test]
    fn test_orient_rejects_foreign_variable() {
        let mut dep = Dependency::undirected(a(), b());
        assert!(!dep.orient(&Variable::existence("AB"), OrientationRule::RestrictedExistence));
        assert!(!dep.is_directed());
    }

    #[test]
    fn test_rule_codes_round_trip() {
        for rule in OrientationRule::ALL {
            assert_eq!(rule.code().parse::<OrientationRule>().unwrap(), rule);
        }
        assert!("XYZ".parse::<OrientationRule>().is_err());
    }
}
