//! Units and variables - the atomic quantities of relational causal models

use std::fmt;
use std::str::FromStr;

/// Identifier of an item, unique within its item type
pub type ItemId = u64;

/// Reference to a single item (entity or relationship instance)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemRef {
    /// Name of the item type
    pub item_type: String,

    /// Identifier within the type
    pub id: ItemId,
}

impl ItemRef {
    /// Create a new item reference
    pub fn new(item_type: impl Into<String>, id: ItemId) -> Self {
        Self {
            item_type: item_type.into(),
            id,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.item_type, self.id)
    }
}

/// The attribute half of a unit
///
/// Relationship items carry an implicit `Existence` attribute in addition to
/// their declared value attributes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    /// Existence of a relationship instance
    Existence,

    /// A named, discretely valued attribute
    Value(String),
}

impl Attribute {
    /// Create a value attribute
    pub fn value(name: impl Into<String>) -> Self {
        Attribute::Value(name.into())
    }
}

/// An (item, attribute) pair
///
/// # Examples
///
/// ```
/// use relpc_domain::{ItemRef, Unit};
///
/// let unit = Unit::value(ItemRef::new("a", 1), "value");
/// assert_eq!(unit.to_string(), "a#1.value");
/// assert_eq!(unit.variable().to_string(), "a.value");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unit {
    /// The item
    pub item: ItemRef,

    /// The attribute measured on the item
    pub attribute: Attribute,
}

impl Unit {
    /// Create a unit for a named attribute
    pub fn value(item: ItemRef, attribute: impl Into<String>) -> Self {
        Self {
            item,
            attribute: Attribute::value(attribute),
        }
    }

    /// Create an existence unit for a relationship instance
    pub fn existence(item: ItemRef) -> Self {
        Self {
            item,
            attribute: Attribute::Existence,
        }
    }

    /// Name of the unit's item type
    pub fn item_type(&self) -> &str {
        &self.item.item_type
    }

    /// Project the unit onto its type-level variable
    pub fn variable(&self) -> Variable {
        Variable {
            item_type: self.item.item_type.clone(),
            attribute: self.attribute.clone(),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Attribute::Existence => write!(f, "{}.exists", self.item),
            Attribute::Value(name) => write!(f, "{}.{}", self.item, name),
        }
    }
}

/// A type-level (item type, attribute) pair - the node of a causal model
///
/// Displays as `type.attr` for value attributes and as the bare relationship
/// name for existence variables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    /// Name of the item type
    pub item_type: String,

    /// The attribute
    pub attribute: Attribute,
}

impl Variable {
    /// Create a value variable
    pub fn value(item_type: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            attribute: Attribute::value(attribute),
        }
    }

    /// Create the existence variable of a relationship type
    pub fn existence(relationship: impl Into<String>) -> Self {
        Self {
            item_type: relationship.into(),
            attribute: Attribute::Existence,
        }
    }

    /// Whether this is a relationship existence variable
    pub fn is_existence(&self) -> bool {
        matches!(self.attribute, Attribute::Existence)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Attribute::Existence => write!(f, "{}", self.item_type),
            Attribute::Value(name) => write!(f, "{}.{}", self.item_type, name),
        }
    }
}

impl FromStr for Variable {
    type Err = String;

    /// Parse `type.attr` or a bare relationship name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty variable name".to_string());
        }
        match s.split_once('.') {
            Some((item_type, attr)) if !item_type.is_empty() && !attr.is_empty() => {
                Ok(Variable::value(item_type, attr))
            }
            Some(_) => Err(format!("Invalid variable name: {}", s)),
            None => Ok(Variable::existence(s)),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: display and parse round-trip for value variables
        #[test]
        fn test_variable_name_round_trip(t in "[a-z][a-z0-9_]{0,8}", a in "[a-z][a-z0-9_]{0,8}") {
            let variable = Variable::value(t, a);
            let parsed: Variable = variable.to_string().parse().unwrap();
            prop_assert_eq!(parsed, variable);
        }
    }
}
