//! In-memory snapshot of relational observational data

use crate::schema::{ItemKind, Schema};
use crate::unit::{Attribute, ItemId, ItemRef, Unit, Variable};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A fixed snapshot of items, relationship links and attribute values
///
/// The snapshot is immutable once handed to the learner; all mutators are
/// intended for loaders and generators.
#[derive(Debug, Clone, Default)]
pub struct RelationalData {
    schema: Schema,
    items: BTreeMap<String, BTreeSet<ItemId>>,
    links: BTreeMap<ItemRef, (ItemRef, ItemRef)>,
    values: HashMap<ItemRef, BTreeMap<String, i64>>,
}

impl RelationalData {
    /// Create an empty snapshot over a schema
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }

    /// The schema the data conforms to
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Add an entity item
    pub fn add_entity(&mut self, entity_type: &str, id: ItemId) -> Result<ItemRef, String> {
        match self.schema.item_type(entity_type).map(|t| &t.kind) {
            Some(ItemKind::Entity) => {}
            Some(_) => return Err(format!("'{}' is a relationship type", entity_type)),
            None => return Err(format!("Unknown item type '{}'", entity_type)),
        }
        self.insert_item(ItemRef::new(entity_type, id))
    }

    /// Add a relationship instance linking two existing entities
    pub fn add_relationship(
        &mut self,
        relationship: &str,
        id: ItemId,
        from: ItemId,
        to: ItemId,
    ) -> Result<ItemRef, String> {
        let (from_type, to_type) = match self.schema.item_type(relationship).map(|t| &t.kind) {
            Some(ItemKind::Relationship { from, to }) => (from.clone(), to.clone()),
            Some(_) => return Err(format!("'{}' is an entity type", relationship)),
            None => return Err(format!("Unknown item type '{}'", relationship)),
        };

        let from_ref = ItemRef::new(from_type, from);
        let to_ref = ItemRef::new(to_type, to);
        for end in [&from_ref, &to_ref] {
            if !self.contains(end) {
                return Err(format!("Relationship endpoint {} does not exist", end));
            }
        }

        let item = self.insert_item(ItemRef::new(relationship, id))?;
        self.links.insert(item.clone(), (from_ref, to_ref));
        Ok(item)
    }

    fn insert_item(&mut self, item: ItemRef) -> Result<ItemRef, String> {
        let ids = self.items.entry(item.item_type.clone()).or_default();
        if !ids.insert(item.id) {
            return Err(format!("Duplicate item {}", item));
        }
        Ok(item)
    }

    /// Set a declared attribute value on an existing item
    pub fn set_value(&mut self, item: &ItemRef, attribute: &str, value: i64) -> Result<(), String> {
        if !self.contains(item) {
            return Err(format!("Unknown item {}", item));
        }
        let declared = self
            .schema
            .item_type(&item.item_type)
            .map(|t| t.attributes.iter().any(|a| a == attribute))
            .unwrap_or(false);
        if !declared {
            return Err(format!("Attribute '{}' is not declared on '{}'", attribute, item.item_type));
        }
        self.values
            .entry(item.clone())
            .or_default()
            .insert(attribute.to_string(), value);
        Ok(())
    }

    /// Read an attribute value
    pub fn value(&self, item: &ItemRef, attribute: &str) -> Option<i64> {
        self.values.get(item).and_then(|v| v.get(attribute)).copied()
    }

    /// Whether the item exists
    pub fn contains(&self, item: &ItemRef) -> bool {
        self.items
            .get(&item.item_type)
            .map(|ids| ids.contains(&item.id))
            .unwrap_or(false)
    }

    /// Items of one type in id order
    pub fn items_of<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = ItemRef> + 'a {
        self.items
            .get(item_type)
            .into_iter()
            .flat_map(move |ids| ids.iter().map(move |id| ItemRef::new(item_type, *id)))
    }

    /// All items, grouped by type
    pub fn items(&self) -> impl Iterator<Item = ItemRef> + '_ {
        self.items
            .iter()
            .flat_map(|(t, ids)| ids.iter().map(move |id| ItemRef::new(t.as_str(), *id)))
    }

    /// Total number of items, relationship instances included
    pub fn item_count(&self) -> usize {
        self.items.values().map(|ids| ids.len()).sum()
    }

    /// Endpoints of a relationship instance
    pub fn endpoints(&self, relationship: &ItemRef) -> Option<(&ItemRef, &ItemRef)> {
        self.links.get(relationship).map(|(a, b)| (a, b))
    }

    /// Every relationship instance with its endpoints
    pub fn links(&self) -> impl Iterator<Item = (&ItemRef, &ItemRef, &ItemRef)> {
        self.links.iter().map(|(rel, (a, b))| (rel, a, b))
    }

    /// All units: every item paired with every attribute of its type
    pub fn units(&self) -> Vec<Unit> {
        let mut units = Vec::new();
        for item_type in self.schema.item_types() {
            for item in self.items_of(&item_type.name) {
                for variable in item_type.variables() {
                    units.push(Unit {
                        item: item.clone(),
                        attribute: variable.attribute,
                    });
                }
            }
        }
        units
    }

    /// One representative unit per (type, attribute), taken from the lowest id
    pub fn unique_units(&self) -> Vec<Unit> {
        let mut units = Vec::new();
        for item_type in self.schema.item_types() {
            if let Some(first) = self.items_of(&item_type.name).next() {
                for variable in item_type.variables() {
                    units.push(Unit {
                        item: first.clone(),
                        attribute: variable.attribute,
                    });
                }
            }
        }
        units
    }

    /// Observed values of a variable across all items of its type
    pub fn column(&self, variable: &Variable) -> Vec<(ItemRef, i64)> {
        let attr = match &variable.attribute {
            Attribute::Value(name) => name,
            Attribute::Existence => {
                return self.items_of(&variable.item_type).map(|i| (i, 1)).collect();
            }
        };
        self.items_of(&variable.item_type)
            .filter_map(|item| self.value(&item, attr).map(|v| (item, v)))
            .collect()
    }
}
