//! Relational schema - entity and relationship item types

use crate::unit::Variable;
use std::collections::BTreeMap;

/// Whether an item type is an entity or a relationship between entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// A free-standing entity type
    Entity,

    /// A relationship type connecting two entity types
    Relationship {
        /// Entity type on the first end
        from: String,
        /// Entity type on the second end
        to: String,
    },
}

/// An item type with its declared attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemType {
    /// Type name
    pub name: String,

    /// Entity or relationship
    pub kind: ItemKind,

    /// Declared value attributes
    pub attributes: Vec<String>,
}

impl ItemType {
    /// Whether this type is a relationship
    pub fn is_relationship(&self) -> bool {
        matches!(self.kind, ItemKind::Relationship { .. })
    }

    /// Type-level variables of this item type, existence first
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::with_capacity(self.attributes.len() + 1);
        if self.is_relationship() {
            vars.push(Variable::existence(&self.name));
        }
        vars.extend(self.attributes.iter().map(|a| Variable::value(&self.name, a)));
        vars
    }
}

/// A named relational schema
///
/// # Examples
///
/// ```
/// use relpc_domain::Schema;
///
/// let schema = Schema::new("chain")
///     .with_entity("a", &["value"])
///     .with_entity("b", &["value"])
///     .with_relationship("AB", "a", "b", &[]);
///
/// assert!(schema.validate().is_ok());
/// assert_eq!(schema.adjacent_types("a"), vec!["AB"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Schema name
    pub name: String,

    types: BTreeMap<String, ItemType>,
}

impl Schema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: BTreeMap::new(),
        }
    }

    /// Add an entity type
    pub fn with_entity(mut self, name: &str, attributes: &[&str]) -> Self {
        self.insert(ItemType {
            name: name.to_string(),
            kind: ItemKind::Entity,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    /// Add a relationship type between two entity types
    pub fn with_relationship(mut self, name: &str, from: &str, to: &str, attributes: &[&str]) -> Self {
        self.insert(ItemType {
            name: name.to_string(),
            kind: ItemKind::Relationship {
                from: from.to_string(),
                to: to.to_string(),
            },
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    /// Insert or replace an item type
    pub fn insert(&mut self, item_type: ItemType) {
        self.types.insert(item_type.name.clone(), item_type);
    }

    /// Look up an item type by name
    pub fn item_type(&self, name: &str) -> Option<&ItemType> {
        self.types.get(name)
    }

    /// All item types in name order
    pub fn item_types(&self) -> impl Iterator<Item = &ItemType> {
        self.types.values()
    }

    /// Whether the named type is a relationship
    pub fn is_relationship(&self, name: &str) -> bool {
        self.types.get(name).map(|t| t.is_relationship()).unwrap_or(false)
    }

    /// Types one hop away in the schema graph
    ///
    /// Relationships are adjacent to their endpoint entities and entities to
    /// every relationship touching them. The result is sorted and deduplicated.
    pub fn adjacent_types(&self, name: &str) -> Vec<&str> {
        let mut adjacent: Vec<&str> = match self.types.get(name).map(|t| &t.kind) {
            Some(ItemKind::Relationship { from, to }) => vec![from.as_str(), to.as_str()],
            Some(ItemKind::Entity) => self
                .types
                .values()
                .filter_map(|t| match &t.kind {
                    ItemKind::Relationship { from, to } if from == name || to == name => {
                        Some(t.name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        };
        adjacent.sort_unstable();
        adjacent.dedup();
        adjacent
    }

    /// Every type-level variable declared by the schema
    pub fn variables(&self) -> Vec<Variable> {
        self.types.values().flat_map(|t| t.variables()).collect()
    }

    /// Check that every relationship connects two declared entity types
    pub fn validate(&self) -> Result<(), String> {
        for item_type in self.types.values() {
            if let ItemKind::Relationship { from, to } = &item_type.kind {
                for end in [from, to] {
                    match self.types.get(end) {
                        Some(t) if !t.is_relationship() => {}
                        Some(_) => {
                            return Err(format!(
                                "Relationship '{}' connects another relationship '{}'",
                                item_type.name, end
                            ))
                        }
                        None => {
                            return Err(format!(
                                "Relationship '{}' references unknown entity type '{}'",
                                item_type.name, end
                            ))
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_schema() -> Schema {
        Schema::new("chain")
            .with_entity("a", &["value"])
            .with_entity("b", &["value"])
            .with_entity("c", &["value"])
            .with_relationship("AB", "a", "b", &["weight"])
            .with_relationship("BC", "b", "c", &[])
    }

    #[test]
    fn test_adjacent_types() {
        let schema = chain_schema();
        assert_eq!(schema.adjacent_types("b"), vec!["AB", "BC"]);
        assert_eq!(schema.adjacent_types("AB"), vec!["a", "b"]);
        assert!(schema.adjacent_types("missing").is_empty());
    }

    #[test]
    fn test_relationship_variables_include_existence() {
        let schema = chain_schema();
        let vars = schema.item_type("AB").unwrap().variables();
        assert_eq!(vars, vec![Variable::existence("AB"), Variable::value("AB", "weight")]);

        // 3 entity attributes + 2 existence + 1 relationship attribute
        assert_eq!(schema.variables().len(), 6);
    }

    #[test]
    fn test_validate_rejects_dangling_relationship() {
        let schema = Schema::new("broken")
            .with_entity("a", &["value"])
            .with_relationship("AX", "a", "x", &[]);
        let err = schema.validate().unwrap_err();
        assert!(err.contains("unknown entity type 'x'"));
    }

    #[test]
    fn test_self_relationship_is_adjacent_once() {
        let schema = Schema::new("social")
            .with_entity("person", &["mood"])
            .with_relationship("FRIEND", "person", "person", &[]);
        assert!(schema.validate().is_ok());
        assert_eq!(schema.adjacent_types("FRIEND"), vec!["person"]);
        assert_eq!(schema.adjacent_types("person"), vec!["FRIEND"]);
    }
}
