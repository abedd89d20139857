//! [`MemoryStore`]: an in-process implementation of both store ports.
//!
//! Holds each database as maps keyed by qualified name, so re-ingesting a
//! description overwrites rather than duplicates. Suitable for tests and for
//! callers that load a handful of schemas at start-up.

use std::{
  collections::{BTreeMap, BTreeSet, HashSet},
  sync::{PoisonError, RwLock},
};

use crate::{
  Error, Result,
  ingest::{ColumnDef, ForeignKeyDef, IngestSummary, NormalizedSchema, SchemaDescription, TableDef},
  schema::{ColumnRecord, GraphSnapshot},
  store::{SchemaGraphStore, SchemaIngest},
};

#[derive(Debug, Default, Clone)]
struct Database {
  tables:       BTreeMap<String, TableDef>,
  columns:      BTreeMap<String, ColumnDef>,
  foreign_keys: BTreeSet<(String, String)>,
}

impl Database {
  fn merge(&mut self, schema: &NormalizedSchema) {
    for table in &schema.tables {
      self.tables.insert(table.key.clone(), table.clone());
    }
    for column in &schema.columns {
      self.columns.insert(column.key.clone(), column.clone());
    }
    for fk in &schema.foreign_keys {
      self.foreign_keys.insert((fk.from.clone(), fk.to.clone()));
    }
  }

  fn table_ordinal(&self, table: &str) -> usize {
    self.tables.get(table).map_or(usize::MAX, |t| t.ordinal)
  }

  /// Columns in declaration order: by owning table, then by column.
  fn ordered_columns(&self) -> Vec<&ColumnDef> {
    let mut columns: Vec<&ColumnDef> = self.columns.values().collect();
    columns.sort_by_key(|c| (self.table_ordinal(&c.table), c.ordinal));
    columns
  }

  fn to_schema(&self, db_id: &str) -> NormalizedSchema {
    let mut tables: Vec<TableDef> = self.tables.values().cloned().collect();
    tables.sort_by_key(|t| t.ordinal);
    NormalizedSchema {
      db_id: db_id.to_owned(),
      tables,
      columns: self.ordered_columns().into_iter().cloned().collect(),
      foreign_keys: self
        .foreign_keys
        .iter()
        .map(|(from, to)| ForeignKeyDef { from: from.clone(), to: to.clone() })
        .collect(),
    }
  }
}

/// A schema graph store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
  databases: RwLock<BTreeMap<String, Database>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Build a store pre-loaded with `schemas`.
  pub fn from_descriptions(
    schemas: impl IntoIterator<Item = SchemaDescription>,
  ) -> Result<Self> {
    let store = Self::new();
    for schema in schemas {
      store.merge(&schema.normalize()?);
    }
    Ok(store)
  }

  fn merge(&self, schema: &NormalizedSchema) {
    self
      .databases
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(schema.db_id.clone())
      .or_default()
      .merge(schema);
  }

  fn read<T>(&self, db_id: &str, f: impl FnOnce(&Database) -> T) -> Option<T> {
    let databases = self.databases.read().unwrap_or_else(PoisonError::into_inner);
    databases.get(db_id).map(f)
  }
}

// ─── Ports ───────────────────────────────────────────────────────────────────

impl SchemaGraphStore for MemoryStore {
  type Error = Error;

  async fn list_databases(&self) -> Result<Vec<String>> {
    let databases = self.databases.read().unwrap_or_else(PoisonError::into_inner);
    Ok(databases.keys().cloned().collect())
  }

  async fn fetch_graph(&self, db_id: &str) -> Result<GraphSnapshot> {
    Ok(self.read(db_id, |db| db.to_schema(db_id).snapshot()).unwrap_or_default())
  }

  async fn fetch_columns(&self, db_id: &str, tables: &[String]) -> Result<Vec<ColumnRecord>> {
    let wanted: HashSet<&str> = tables.iter().map(String::as_str).collect();
    let records = self.read(db_id, |db| {
      db.ordered_columns()
        .into_iter()
        .filter(|c| wanted.contains(c.table.as_str()))
        .map(|c| ColumnRecord {
          table:      c.table.clone(),
          key:        c.key.clone(),
          name:       c.name.clone(),
          data_type:  c.data_type.clone(),
          is_pk:      c.is_pk,
          fk_targets: db
            .foreign_keys
            .iter()
            .filter(|(from, _)| *from == c.key)
            .map(|(_, to)| to.clone())
            .collect(),
        })
        .collect()
    });
    Ok(records.unwrap_or_default())
  }
}

impl SchemaIngest for MemoryStore {
  async fn ingest(&self, schema: &SchemaDescription) -> Result<IngestSummary> {
    let normalized = schema.normalize()?;
    self.merge(&normalized);
    Ok(normalized.summary())
  }

  async fn delete_database(&self, db_id: &str) -> Result<bool> {
    let mut databases = self.databases.write().unwrap_or_else(PoisonError::into_inner);
    Ok(databases.remove(db_id).is_some())
  }

  async fn clear(&self) -> Result<()> {
    self.databases.write().unwrap_or_else(PoisonError::into_inner).clear();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures;

  #[tokio::test]
  async fn ingest_is_idempotent() {
    let store = MemoryStore::new();
    let desc = fixtures::sales_description(true);
    store.ingest(&desc).await.unwrap();
    let first = store.fetch_graph("sales").await.unwrap();
    store.ingest(&desc).await.unwrap();
    let second = store.fetch_graph("sales").await.unwrap();
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.edges, second.edges);
  }

  #[tokio::test]
  async fn unknown_database_is_empty() {
    let store = fixtures::sales_store();
    assert!(store.fetch_graph("nope").await.unwrap().is_empty());
    let cols = store.fetch_columns("nope", &["nope.T".to_owned()]).await.unwrap();
    assert!(cols.is_empty());
  }

  #[tokio::test]
  async fn columns_come_back_in_declaration_order() {
    let store = fixtures::sales_store();
    let tables = vec!["sales.OrderItems".to_owned(), "sales.Orders".to_owned()];
    let cols = store.fetch_columns("sales", &tables).await.unwrap();
    let keys: Vec<_> = cols.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, [
      "sales.Orders.id",
      "sales.Orders.customer_id",
      "sales.OrderItems.order_id",
      "sales.OrderItems.product_id",
    ]);
    assert_eq!(cols[1].fk_targets, ["sales.Customers.id".to_owned()]);
    assert!(cols[0].is_pk);
  }

  #[tokio::test]
  async fn delete_and_clear() {
    let store = fixtures::sales_store();
    store.ingest(&fixtures::inventory_description("depot")).await.unwrap();
    assert_eq!(store.list_databases().await.unwrap(), ["depot", "sales"]);

    assert!(store.delete_database("sales").await.unwrap());
    assert!(!store.delete_database("sales").await.unwrap());
    assert_eq!(store.list_databases().await.unwrap(), ["depot"]);

    store.clear().await.unwrap();
    assert!(store.list_databases().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn dotted_table_name_never_reaches_the_graph() {
    let store = MemoryStore::new();
    let mut desc = fixtures::sales_description(true);
    desc.table_names[3] = "Order.Items".into();
    assert!(store.ingest(&desc).await.is_err());
    assert!(store.fetch_graph("sales").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn malformed_description_is_rejected() {
    let store = MemoryStore::new();
    let mut desc = fixtures::sales_description(false);
    desc.foreign_keys.push((1, 99));
    assert!(store.ingest(&desc).await.is_err());
    assert!(store.list_databases().await.unwrap().is_empty());
  }
}
