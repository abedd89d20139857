//! Two-tier metadata for a computed tree.
//!
//! Terminal tables (the ones asked for) get every declared column. Steiner
//! tables (connectors pulled in by the tree) get only the columns the tree
//! actually routes through, so a downstream prompt sees the join path and
//! nothing else of them.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  schema::ColumnRecord,
  steiner::{SteinerTree, steiner_tree},
  store::SchemaGraphStore,
};

// ─── Output ──────────────────────────────────────────────────────────────────

/// Foreign-key target(s) of a column, serialised as a bare string when there
/// is exactly one and as a list otherwise. No target is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FkTarget {
  Single(String),
  Multiple(Vec<String>),
}

impl FkTarget {
  pub fn collapse(mut targets: Vec<String>) -> Option<Self> {
    match targets.len() {
      0 => None,
      1 => targets.pop().map(Self::Single),
      _ => Some(Self::Multiple(targets)),
    }
  }

  pub fn targets(&self) -> &[String] {
    match self {
      Self::Single(t) => std::slice::from_ref(t),
      Self::Multiple(ts) => ts,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
  pub column_name: String,
  pub data_type:   String,
  pub is_pk:       bool,
  pub fk_target:   Option<FkTarget>,
}

/// Metadata for one database, keyed by qualified table name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
  pub terminal_tables: BTreeMap<String, Vec<ColumnMetadata>>,
  pub steiner_tables:  BTreeMap<String, Vec<ColumnMetadata>>,
}

/// The full result of a subsetting call, keyed by database id.
pub type SubsetResult = BTreeMap<String, DatabaseMetadata>;

// ─── Classification ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePartition {
  /// Every requested table, connected or not.
  pub terminal: BTreeSet<String>,
  /// Tree tables that were not requested.
  pub steiner:  BTreeSet<String>,
}

pub fn partition(requested: &BTreeSet<String>, tree: &SteinerTree) -> TablePartition {
  TablePartition {
    terminal: requested.clone(),
    steiner:  tree
      .tables()
      .into_iter()
      .filter(|t| !requested.contains(*t))
      .map(str::to_owned)
      .collect(),
  }
}

fn column_metadata(record: &ColumnRecord, keep_target: impl Fn(&str) -> bool) -> ColumnMetadata {
  ColumnMetadata {
    column_name: record.name.clone(),
    data_type:   record.data_type.clone(),
    is_pk:       record.is_pk,
    fk_target:   FkTarget::collapse(
      record
        .fk_targets
        .iter()
        .filter(|t| keep_target(t))
        .cloned()
        .collect(),
    ),
  }
}

// ─── Assembler ───────────────────────────────────────────────────────────────

pub struct MetadataAssembler<'s, S> {
  store: &'s S,
}

impl<'s, S: SchemaGraphStore> MetadataAssembler<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store } }

  /// Build the tree for `requested` (qualified table names in `db_id`) and
  /// fetch tiered metadata for it.
  pub async fn assemble(
    &self,
    db_id: &str,
    requested: &BTreeSet<String>,
  ) -> Result<DatabaseMetadata, S::Error> {
    let tree = steiner_tree(self.store, db_id, requested).await?;
    let TablePartition { terminal, steiner } = partition(requested, &tree);

    let terminal_tables = self.terminal_metadata(db_id, &terminal).await?;
    let steiner_tables = self
      .steiner_metadata(db_id, &steiner, &tree.involved_columns)
      .await?;

    tracing::info!(
      db_id,
      terminal = terminal_tables.len(),
      steiner = steiner_tables.len(),
      "assembled schema subset"
    );
    Ok(DatabaseMetadata { terminal_tables, steiner_tables })
  }

  /// Every declared column. A foreign-key target survives only when it
  /// points at a column of one of `tables`.
  pub async fn terminal_metadata(
    &self,
    db_id: &str,
    tables: &BTreeSet<String>,
  ) -> Result<BTreeMap<String, Vec<ColumnMetadata>>, S::Error> {
    let records = self.fetch(db_id, tables).await?;
    let visible: HashSet<&str> = records.iter().map(|r| r.key.as_str()).collect();

    let mut out = empty_entries(tables);
    for record in &records {
      out
        .entry(record.table.clone())
        .or_default()
        .push(column_metadata(record, |t| visible.contains(t)));
    }
    Ok(out)
  }

  /// Only columns in `involved`, and only foreign-key targets in `involved`.
  pub async fn steiner_metadata(
    &self,
    db_id: &str,
    tables: &BTreeSet<String>,
    involved: &BTreeSet<String>,
  ) -> Result<BTreeMap<String, Vec<ColumnMetadata>>, S::Error> {
    let records = self.fetch(db_id, tables).await?;

    let mut out = empty_entries(tables);
    for record in records.iter().filter(|r| involved.contains(&r.key)) {
      out
        .entry(record.table.clone())
        .or_default()
        .push(column_metadata(record, |t| involved.contains(t)));
    }
    Ok(out)
  }

  async fn fetch(
    &self,
    db_id: &str,
    tables: &BTreeSet<String>,
  ) -> Result<Vec<ColumnRecord>, S::Error> {
    if tables.is_empty() {
      return Ok(Vec::new());
    }
    let names: Vec<String> = tables.iter().cloned().collect();
    self.store.fetch_columns(db_id, &names).await
  }
}

fn empty_entries(tables: &BTreeSet<String>) -> BTreeMap<String, Vec<ColumnMetadata>> {
  tables.iter().map(|t| (t.clone(), Vec::new())).collect()
}
