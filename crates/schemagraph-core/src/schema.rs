//! The schema property graph: node and edge types, qualified names, and the
//! raw snapshot a store hands back for one database.
//!
//! Every node is addressed by its fully-qualified name. Tables are
//! `db_id.table`, columns are `db_id.table.column`. Graphs never span
//! databases.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Qualified names ─────────────────────────────────────────────────────────

/// `db_id.table`
pub fn table_key(db_id: &str, table: &str) -> String { format!("{db_id}.{table}") }

/// `db_id.table.column`
pub fn column_key(db_id: &str, table: &str, column: &str) -> String {
  format!("{db_id}.{table}.{column}")
}

/// What a qualified node name denotes, judged purely by its `.` separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass<'a> {
  /// One separator: the name is the table itself.
  Table(&'a str),
  /// Two separators: a column, carrying its owning table's qualified name.
  Column { table: &'a str },
}

impl<'a> NodeClass<'a> {
  /// The qualified table this node belongs to.
  pub fn table(self) -> &'a str {
    match self {
      Self::Table(t) => t,
      Self::Column { table } => table,
    }
  }
}

/// Classify a qualified node name. Names with any other number of separators
/// are not part of the model and yield `None`.
pub fn classify(node: &str) -> Option<NodeClass<'_>> {
  let dots: Vec<usize> = node.match_indices('.').map(|(i, _)| i).collect();
  match dots.as_slice() {
    [_] => Some(NodeClass::Table(node)),
    [_, second] => Some(NodeClass::Column { table: &node[..*second] }),
    _ => None,
  }
}

// ─── Node & edge kinds ───────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
  Table,
  Column,
}

/// Relationship kinds in the schema graph. The string form matches the
/// relationship labels used by graph databases (`HAS_COLUMN`, ...).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
  /// Table → non-key column.
  HasColumn,
  /// Table → primary-key column.
  HasPrimaryKey,
  /// Referencing column → referenced column.
  ForeignKeyTo,
}

impl EdgeKind {
  /// Edges whose endpoints count as "involved" when they land in a tree.
  pub fn is_key(self) -> bool { matches!(self, Self::HasPrimaryKey | Self::ForeignKeyTo) }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub key:  String,
  pub kind: NodeKind,
}

/// A directed, typed edge as stored. Path-finding treats it as undirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: String,
  pub to:   String,
  pub kind: EdgeKind,
}

/// The untrimmed node/edge view of one database, as returned by a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

impl GraphSnapshot {
  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
}

/// An unordered node pair. Construction normalises the order so `(a, b)` and
/// `(b, a)` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(String, String);

impl EdgeKey {
  pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
    let (a, b) = (a.into(), b.into());
    if a <= b { Self(a, b) } else { Self(b, a) }
  }

  pub fn endpoints(&self) -> (&str, &str) { (&self.0, &self.1) }
}

// ─── Column records ──────────────────────────────────────────────────────────

/// One declared column, as returned by
/// [`crate::store::SchemaGraphStore::fetch_columns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
  /// Qualified owning table (`db_id.table`).
  pub table:      String,
  /// Qualified column key (`db_id.table.column`).
  pub key:        String,
  pub name:       String,
  pub data_type:  String,
  pub is_pk:      bool,
  /// Qualified keys of every column this one references.
  pub fk_targets: Vec<String>,
}

// ─── Candidates ──────────────────────────────────────────────────────────────

/// One ranked table from the upstream retrieval stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
  pub db_id:      String,
  pub table_name: String,
}

impl Candidate {
  pub fn new(db_id: impl Into<String>, table_name: impl Into<String>) -> Self {
    Self { db_id: db_id.into(), table_name: table_name.into() }
  }

  pub fn qualified(&self) -> String { table_key(&self.db_id, &self.table_name) }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn classify_by_separator_count() {
    assert_eq!(classify("sales.Orders"), Some(NodeClass::Table("sales.Orders")));
    assert_eq!(
      classify("sales.Orders.customer_id"),
      Some(NodeClass::Column { table: "sales.Orders" })
    );
    assert_eq!(classify("sales"), None);
    assert_eq!(classify("a.b.c.d"), None);
  }

  #[test]
  fn column_class_reports_owning_table() {
    let class = classify("sales.Orders.id").unwrap();
    assert_eq!(class.table(), "sales.Orders");
  }

  #[test]
  fn edge_key_is_unordered() {
    assert_eq!(EdgeKey::new("x", "y"), EdgeKey::new("y", "x"));
    assert_eq!(EdgeKey::new("y", "x").endpoints(), ("x", "y"));
  }

  #[test]
  fn edge_kind_labels() {
    assert_eq!(EdgeKind::ForeignKeyTo.to_string(), "FOREIGN_KEY_TO");
    assert_eq!(EdgeKind::from_str("HAS_PRIMARY_KEY").unwrap(), EdgeKind::HasPrimaryKey);
    assert_eq!(
      serde_json::to_string(&EdgeKind::HasColumn).unwrap(),
      "\"HAS_COLUMN\""
    );
    assert!(EdgeKind::ForeignKeyTo.is_key());
    assert!(!EdgeKind::HasColumn.is_key());
  }
}
