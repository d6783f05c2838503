//! TOML schema definitions

use crate::StoreError;
use relpc_domain::{ItemKind, ItemType, Schema};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serializable description of a relational schema
///
/// ```toml
/// name = "chain"
///
/// [[entities]]
/// name = "a"
/// attributes = ["value"]
///
/// [[relationships]]
/// name = "AB"
/// from = "a"
/// to = "b"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Schema name
    pub name: String,

    /// Entity types
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,

    /// Relationship types
    #[serde(default)]
    pub relationships: Vec<RelationshipDefinition>,
}

/// An entity type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Type name
    pub name: String,

    /// Attribute names
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// A relationship type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    /// Type name
    pub name: String,

    /// First entity type
    pub from: String,

    /// Second entity type
    pub to: String,

    /// Attribute names
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl SchemaDefinition {
    /// Parse a definition from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, StoreError> {
        toml::from_str(contents).map_err(|e| StoreError::InvalidData(format!("Invalid schema definition: {}", e)))
    }

    /// Read a definition from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| StoreError::InvalidData(format!("Cannot read {}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Render the definition as TOML
    pub fn to_toml(&self) -> Result<String, StoreError> {
        toml::to_string_pretty(self).map_err(|e| StoreError::InvalidData(format!("Cannot serialize schema: {}", e)))
    }

    /// Build and validate the domain schema
    pub fn into_schema(self) -> Result<Schema, StoreError> {
        let mut schema = Schema::new(self.name);
        for entity in self.entities {
            schema.insert(ItemType {
                name: entity.name,
                kind: ItemKind::Entity,
                attributes: entity.attributes,
            });
        }
        for rel in self.relationships {
            schema.insert(ItemType {
                name: rel.name,
                kind: ItemKind::Relationship { from: rel.from, to: rel.to },
                attributes: rel.attributes,
            });
        }
        schema.validate().map_err(StoreError::InvalidData)?;
        Ok(schema)
    }
}

impl From<&Schema> for SchemaDefinition {
    fn from(schema: &Schema) -> Self {
        let mut entities = Vec::new();
        let mut relationships = Vec::new();
        for item_type in schema.item_types() {
            match &item_type.kind {
                ItemKind::Entity => entities.push(EntityDefinition {
                    name: item_type.name.clone(),
                    attributes: item_type.attributes.clone(),
                }),
                ItemKind::Relationship { from, to } => relationships.push(RelationshipDefinition {
                    name: item_type.name.clone(),
                    from: from.clone(),
                    to: to.clone(),
                    attributes: item_type.attributes.clone(),
                }),
            }
        }
        Self {
            name: schema.name.clone(),
            entities,
            relationships,
        }
    }
}
