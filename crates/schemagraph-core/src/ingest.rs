//! Schema descriptions accepted by the ingestion port.
//!
//! The wire shape follows the `tables.json` records of the Spider and BIRD
//! text-to-SQL benchmarks: parallel arrays addressed by index. Normalisation
//! resolves those indices into qualified names and rejects references that
//! point outside the description.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  schema::{Edge, EdgeKind, GraphSnapshot, Node, NodeKind, column_key, table_key},
};

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// One primary-key entry: a single column index or a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
  Single(usize),
  Composite(Vec<usize>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescription {
  pub db_id:        String,
  pub table_names:  Vec<String>,
  /// `(table_index, column_name)`; a table index of `-1` marks the `*`
  /// pseudo-column, which is skipped.
  pub column_names: Vec<(i64, String)>,
  /// Parallel to `column_names`.
  pub column_types: Vec<String>,
  #[serde(default)]
  pub primary_keys: Vec<PrimaryKey>,
  /// `(from_column_index, to_column_index)`
  #[serde(default)]
  pub foreign_keys: Vec<(usize, usize)>,
}

/// Parse a `tables.json` document: an array of records, or one bare record.
pub fn parse_descriptions(json: &str) -> Result<Vec<SchemaDescription>> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    Many(Vec<SchemaDescription>),
    One(SchemaDescription),
  }

  Ok(match serde_json::from_str(json)? {
    OneOrMany::Many(all) => all,
    OneOrMany::One(one) => vec![one],
  })
}

// ─── Normalised form ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
  pub key:     String,
  pub name:    String,
  pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
  pub key:       String,
  pub table:     String,
  pub name:      String,
  pub data_type: String,
  pub is_pk:     bool,
  pub ordinal:   usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
  pub from: String,
  pub to:   String,
}

/// A validated description with every index resolved to a qualified name.
#[derive(Debug, Clone)]
pub struct NormalizedSchema {
  pub db_id:        String,
  pub tables:       Vec<TableDef>,
  pub columns:      Vec<ColumnDef>,
  pub foreign_keys: Vec<ForeignKeyDef>,
}

/// Counts reported back after an ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
  pub tables:       usize,
  pub columns:      usize,
  pub foreign_keys: usize,
}

impl NormalizedSchema {
  pub fn summary(&self) -> IngestSummary {
    IngestSummary {
      tables:       self.tables.len(),
      columns:      self.columns.len(),
      foreign_keys: self.foreign_keys.len(),
    }
  }

  /// The property-graph form: table and column nodes, ownership edges, and
  /// foreign-key edges.
  pub fn snapshot(&self) -> GraphSnapshot {
    let nodes = self
      .tables
      .iter()
      .map(|t| Node { key: t.key.clone(), kind: NodeKind::Table })
      .chain(self.columns.iter().map(|c| Node { key: c.key.clone(), kind: NodeKind::Column }))
      .collect();

    let edges = self
      .columns
      .iter()
      .map(|c| Edge {
        from: c.table.clone(),
        to:   c.key.clone(),
        kind: if c.is_pk { EdgeKind::HasPrimaryKey } else { EdgeKind::HasColumn },
      })
      .chain(self.foreign_keys.iter().map(|fk| Edge {
        from: fk.from.clone(),
        to:   fk.to.clone(),
        kind: EdgeKind::ForeignKeyTo,
      }))
      .collect();

    GraphSnapshot { nodes, edges }
  }
}

impl SchemaDescription {
  /// Resolve indices into qualified names.
  ///
  /// Duplicate column names within one table collapse onto the first
  /// declaration; self-referencing foreign keys are dropped.
  pub fn normalize(&self) -> Result<NormalizedSchema> {
    let db_id = self.db_id.as_str();
    if db_id.is_empty() {
      return Err(Error::malformed(db_id, "empty db_id"));
    }
    check_identifier(db_id, "database", db_id)?;
    if self.column_types.len() != self.column_names.len() {
      return Err(Error::malformed(
        db_id,
        format!(
          "{} column types for {} columns",
          self.column_types.len(),
          self.column_names.len()
        ),
      ));
    }

    let mut seen_tables = HashSet::new();
    let mut tables = Vec::with_capacity(self.table_names.len());
    for (ordinal, name) in self.table_names.iter().enumerate() {
      check_identifier(db_id, "table", name)?;
      if !seen_tables.insert(name.as_str()) {
        return Err(Error::malformed(db_id, format!("duplicate table {name:?}")));
      }
      tables.push(TableDef { key: table_key(db_id, name), name: name.clone(), ordinal });
    }

    let pk_indices: HashSet<usize> = self
      .primary_keys
      .iter()
      .flat_map(|pk| match pk {
        PrimaryKey::Single(i) => vec![*i],
        PrimaryKey::Composite(is) => is.clone(),
      })
      .collect();
    if let Some(bad) = pk_indices.iter().find(|&&i| i >= self.column_names.len()) {
      return Err(Error::malformed(db_id, format!("primary key index {bad} out of range")));
    }

    // Column index -> qualified key, `None` for the `*` pseudo-column.
    let mut index_keys: Vec<Option<String>> = Vec::with_capacity(self.column_names.len());
    let mut seen_columns = HashSet::new();
    let mut columns = Vec::new();
    for (idx, (table_idx, name)) in self.column_names.iter().enumerate() {
      if *table_idx < 0 {
        index_keys.push(None);
        continue;
      }
      let table = usize::try_from(*table_idx)
        .ok()
        .and_then(|t| self.table_names.get(t))
        .ok_or_else(|| {
          Error::malformed(db_id, format!("column {name:?} references table {table_idx}"))
        })?;
      check_identifier(db_id, "column", name)?;
      let key = column_key(db_id, table, name);
      index_keys.push(Some(key.clone()));
      if !seen_columns.insert(key.clone()) {
        continue;
      }
      columns.push(ColumnDef {
        key,
        table: table_key(db_id, table),
        name: name.clone(),
        data_type: self.column_types[idx].clone(),
        is_pk: pk_indices.contains(&idx),
        ordinal: idx,
      });
    }

    let resolve = |idx: usize| -> Result<&String> {
      match index_keys.get(idx) {
        Some(Some(key)) => Ok(key),
        Some(None) => Err(Error::malformed(db_id, "foreign key references `*`")),
        None => Err(Error::malformed(db_id, format!("foreign key index {idx} out of range"))),
      }
    };

    let mut seen_fks = HashSet::new();
    let mut foreign_keys = Vec::new();
    for &(from, to) in &self.foreign_keys {
      let (from, to) = (resolve(from)?, resolve(to)?);
      if from == to || !seen_fks.insert((from.clone(), to.clone())) {
        continue;
      }
      foreign_keys.push(ForeignKeyDef { from: from.clone(), to: to.clone() });
    }

    Ok(NormalizedSchema { db_id: db_id.to_owned(), tables, columns, foreign_keys })
  }
}

/// Qualified names are split on `.`, so no identifier may contain one.
fn check_identifier(db_id: &str, what: &str, name: &str) -> Result<()> {
  if name.contains('.') {
    return Err(Error::malformed(db_id, format!("{what} name {name:?} contains '.'")));
  }
  Ok(())
}
