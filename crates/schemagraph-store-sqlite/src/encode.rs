//! Conversions between core graph types and the plain-text representations
//! stored in SQLite columns.
//!
//! Node and edge kinds are stored as their label strings. Foreign-key target
//! lists come back from `json_group_array` as compact JSON.

use std::str::FromStr;

use schemagraph_core::schema::{ColumnRecord, Edge, EdgeKind, Node, NodeKind};

use crate::{Error, Result};

// ─── Kinds ───────────────────────────────────────────────────────────────────

pub fn encode_edge_kind(kind: EdgeKind) -> String { kind.to_string() }

pub fn decode_edge_kind(s: &str) -> Result<EdgeKind> {
  EdgeKind::from_str(s).map_err(|_| Error::InvalidEdgeKind(s.to_owned()))
}

pub fn encode_node_kind(kind: NodeKind) -> String { kind.to_string() }

pub fn decode_node_kind(s: &str) -> Result<NodeKind> {
  NodeKind::from_str(s).map_err(|_| Error::InvalidNodeKind(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `nodes` row.
pub struct RawNode {
  pub key:  String,
  pub kind: String,
}

impl RawNode {
  pub fn into_node(self) -> Result<Node> {
    Ok(Node { kind: decode_node_kind(&self.kind)?, key: self.key })
  }
}

/// Raw strings read from an `edges` row.
pub struct RawEdge {
  pub src:  String,
  pub dst:  String,
  pub kind: String,
}

impl RawEdge {
  pub fn into_edge(self) -> Result<Edge> {
    Ok(Edge { kind: decode_edge_kind(&self.kind)?, from: self.src, to: self.dst })
  }
}

/// A column row joined with its key flag and aggregated foreign keys.
pub struct RawColumn {
  pub table:      String,
  pub key:        String,
  pub name:       String,
  pub data_type:  String,
  pub is_pk:      bool,
  pub fk_targets: String,
}

impl RawColumn {
  /// Targets come back from SQLite in no particular order; they are sorted
  /// here.
  pub fn into_record(self) -> Result<ColumnRecord> {
    let mut fk_targets: Vec<String> = serde_json::from_str(&self.fk_targets)?;
    fk_targets.sort();
    Ok(ColumnRecord {
      fk_targets,
      table:      self.table,
      key:        self.key,
      name:       self.name,
      data_type:  self.data_type,
      is_pk:      self.is_pk,
    })
  }
}
