//! Relpc Storage Layer
//!
//! Implements the `DataSource` trait on top of SQLite.
//!
//! # Architecture
//!
//! - One database file holds one named schema and a data snapshot
//! - Items, relationship links and attribute values live in plain tables
//! - Synthetic data sets can also record their ground-truth dependencies
//!
//! The learner reads everything once, up front, through [`DataSource::snapshot`].
//!
//! # Examples
//!
//! ```no_run
//! use relpc_store::SqliteSource;
//! use relpc_domain::traits::DataSource;
//!
//! let mut source = SqliteSource::open("chain.db").unwrap();
//! source.load_schema("chain").unwrap();
//! let units = source.units().unwrap();
//! println!("{} units", units.len());
//! source.close().unwrap();
//! ```

#![warn(missing_docs)]

mod definition;

pub use definition::{EntityDefinition, RelationshipDefinition, SchemaDefinition};

use relpc_domain::traits::DataSource;
use relpc_domain::{
    Dependency, ItemId, ItemKind, ItemRef, ItemType, Model, RelationalData, Schema, Unit, Variable,
};
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Schema not found
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// No schema has been loaded yet
    #[error("No schema loaded; call load_schema first")]
    NoSchema,

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of `DataSource`
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Load a snapshot and share that
/// instead of the source.
pub struct SqliteSource {
    conn: Connection,
    schema: Option<Schema>,
}

impl SqliteSource {
    /// Open (or create) a database at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn, schema: None };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Close the connection, surfacing any error from SQLite
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Database(e))
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Names of the schemas stored in the database
    pub fn schema_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT schema_name FROM item_types ORDER BY schema_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Load a named schema and make it the active one
    pub fn load_schema(&mut self, name: &str) -> Result<Schema, StoreError> {
        let mut schema = Schema::new(name);

        let mut stmt = self.conn.prepare(
            "SELECT name, kind, from_type, to_type FROM item_types WHERE schema_name = ?1 ORDER BY name",
        )?;
        let rows = stmt
            .query_map(params![name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let mut attr_stmt = self
            .conn
            .prepare("SELECT name FROM attributes WHERE schema_name = ?1 AND item_type = ?2 ORDER BY name")?;
        for (type_name, kind, from, to) in rows {
            let attributes = attr_stmt
                .query_map(params![name, &type_name], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            let kind = match (kind.as_str(), from, to) {
                ("entity", _, _) => ItemKind::Entity,
                ("relationship", Some(from), Some(to)) => ItemKind::Relationship { from, to },
                _ => {
                    return Err(StoreError::InvalidData(format!(
                        "Malformed item type '{}' in schema '{}'",
                        type_name, name
                    )))
                }
            };
            schema.insert(ItemType {
                name: type_name,
                kind,
                attributes,
            });
        }

        schema.validate().map_err(StoreError::InvalidData)?;
        debug!("Loaded schema '{}' with {} item types", name, schema.item_types().count());
        self.schema = Some(schema.clone());
        Ok(schema)
    }

    fn active_schema(&self) -> Result<&Schema, StoreError> {
        self.schema.as_ref().ok_or(StoreError::NoSchema)
    }

    /// Replace the database contents with a data snapshot
    ///
    /// The snapshot's schema becomes the active schema.
    pub fn save(&mut self, data: &RelationalData) -> Result<(), StoreError> {
        let schema = data.schema();
        let tx = self.conn.transaction()?;
        for table in ["item_types", "attributes", "items", "links", "attribute_values"] {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }

        for item_type in schema.item_types() {
            let (kind, from, to) = match &item_type.kind {
                ItemKind::Entity => ("entity", None, None),
                ItemKind::Relationship { from, to } => ("relationship", Some(from), Some(to)),
            };
            tx.execute(
                "INSERT INTO item_types (schema_name, name, kind, from_type, to_type) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![&schema.name, &item_type.name, kind, from, to],
            )?;
            for attr in &item_type.attributes {
                tx.execute(
                    "INSERT INTO attributes (schema_name, item_type, name) VALUES (?1, ?2, ?3)",
                    params![&schema.name, &item_type.name, attr],
                )?;
            }
        }

        {
            let mut item_stmt = tx.prepare("INSERT INTO items (item_type, id) VALUES (?1, ?2)")?;
            let mut value_stmt = tx.prepare(
                "INSERT INTO attribute_values (item_type, item_id, attribute, value) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for item in data.items() {
                let id = sql_id(item.id)?;
                item_stmt.execute(params![&item.item_type, id])?;
                let attributes = schema
                    .item_type(&item.item_type)
                    .map(|t| t.attributes.as_slice())
                    .unwrap_or_default();
                for attr in attributes {
                    if let Some(value) = data.value(&item, attr) {
                        value_stmt.execute(params![&item.item_type, id, attr, value])?;
                    }
                }
            }

            let mut link_stmt =
                tx.prepare("INSERT INTO links (rel_type, rel_id, from_id, to_id) VALUES (?1, ?2, ?3, ?4)")?;
            for (rel, from, to) in data.links() {
                link_stmt.execute(params![&rel.item_type, sql_id(rel.id)?, sql_id(from.id)?, sql_id(to.id)?])?;
            }
        }

        tx.commit()?;
        debug!("Saved {} items for schema '{}'", data.item_count(), schema.name);
        self.schema = Some(schema.clone());
        Ok(())
    }

    /// Record the ground-truth model of a synthetic data set
    ///
    /// Only directed dependencies are stored.
    pub fn save_truth(&mut self, model: &Model) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM true_dependencies", [])?;
        for dep in model.dependencies() {
            if let (Some(cause), Some(effect)) = (dep.cause(), dep.effect()) {
                tx.execute(
                    "INSERT INTO true_dependencies (cause, effect) VALUES (?1, ?2)",
                    params![cause.to_string(), effect.to_string()],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// The recorded ground-truth model, if any
    pub fn truth(&self) -> Result<Option<Model>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT cause, effect FROM true_dependencies ORDER BY cause, effect")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut model = Model::new();
        for (cause, effect) in rows {
            let cause: Variable = cause.parse().map_err(StoreError::InvalidData)?;
            let effect: Variable = effect.parse().map_err(StoreError::InvalidData)?;
            model.add_dependency(Dependency::directed(cause, effect));
        }
        Ok(Some(model))
    }

    fn unit_query(&self, sql: &str, schema: &Schema) -> Result<Vec<Unit>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let items = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut units = Vec::new();
        for (item_type, id) in items {
            let Some(declared) = schema.item_type(&item_type) else {
                continue;
            };
            let item = ItemRef::new(item_type, item_id(id)?);
            for variable in declared.variables() {
                units.push(Unit {
                    item: item.clone(),
                    attribute: variable.attribute,
                });
            }
        }
        Ok(units)
    }
}

impl DataSource for SqliteSource {
    type Error = StoreError;

    fn schema(&self) -> Result<Schema, Self::Error> {
        self.active_schema().cloned()
    }

    fn units(&self) -> Result<Vec<Unit>, Self::Error> {
        let schema = self.active_schema()?;
        self.unit_query("SELECT item_type, id FROM items ORDER BY item_type, id", schema)
    }

    fn unique_units(&self) -> Result<Vec<Unit>, Self::Error> {
        let schema = self.active_schema()?;
        self.unit_query(
            "SELECT item_type, MIN(id) FROM items GROUP BY item_type ORDER BY item_type",
            schema,
        )
    }

    fn snapshot(&self) -> Result<RelationalData, Self::Error> {
        let schema = self.active_schema()?.clone();
        let mut data = RelationalData::new(schema.clone());

        // Entities first so relationship endpoints resolve
        let mut stmt = self.conn.prepare("SELECT item_type, id FROM items ORDER BY item_type, id")?;
        let items = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        for (item_type, id) in &items {
            if !schema.is_relationship(item_type) {
                data.add_entity(item_type, item_id(*id)?).map_err(StoreError::InvalidData)?;
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT rel_type, rel_id, from_id, to_id FROM links ORDER BY rel_type, rel_id")?;
        let links = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (rel_type, rel_id, from, to) in links {
            data.add_relationship(&rel_type, item_id(rel_id)?, item_id(from)?, item_id(to)?)
                .map_err(StoreError::InvalidData)?;
        }

        let mut stmt = self
            .conn
            .prepare("SELECT item_type, item_id, attribute, value FROM attribute_values")?;
        let values = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (item_type, id, attribute, value) in values {
            data.set_value(&ItemRef::new(item_type, item_id(id)?), &attribute, value)
                .map_err(StoreError::InvalidData)?;
        }

        debug!("Loaded snapshot with {} items", data.item_count());
        Ok(data)
    }
}

/// Item ids are stored as SQLite's signed integers
fn sql_id(id: ItemId) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::InvalidData(format!("Item id {} is out of range for SQLite", id)))
}

fn item_id(id: i64) -> Result<ItemId, StoreError> {
    ItemId::try_from(id).map_err(|_| StoreError::InvalidData(format!("Negative item id {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_conversion_bounds() {
        assert_eq!(sql_id(42).unwrap(), 42);
        assert_eq!(sql_id(i64::MAX as u64).unwrap(), i64::MAX);
        assert!(matches!(sql_id(u64::MAX), Err(StoreError::InvalidData(_))));

        assert_eq!(item_id(7).unwrap(), 7);
        assert!(matches!(item_id(-1), Err(StoreError::InvalidData(_))));
    }
}
