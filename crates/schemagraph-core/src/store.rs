//! The graph store ports.
//!
//! [`SchemaGraphStore`] is the read contract the subsetting engine depends on.
//! [`SchemaIngest`] is the write contract owned by ingestion. Backends (e.g.
//! `schemagraph-store-sqlite`, or [`crate::memory::MemoryStore`]) implement
//! both; the algorithms only ever see the read side.

use std::future::Future;

use crate::{
  ingest::{IngestSummary, SchemaDescription},
  schema::{ColumnRecord, GraphSnapshot},
};

// ─── Read port ───────────────────────────────────────────────────────────────

/// Read access to per-database schema graphs.
///
/// Unknown databases and tables are not errors: they produce empty results.
/// An `Err` always means the store itself could not be reached or read.
pub trait SchemaGraphStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All database ids known to the store, sorted.
  fn list_databases(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Every node and typed edge belonging to `db_id`, untrimmed.
  fn fetch_graph<'a>(
    &'a self,
    db_id: &'a str,
  ) -> impl Future<Output = Result<GraphSnapshot, Self::Error>> + Send + 'a;

  /// Declared columns of the given qualified tables, in declaration order,
  /// each with its outgoing foreign-key targets.
  fn fetch_columns<'a>(
    &'a self,
    db_id: &'a str,
    tables: &'a [String],
  ) -> impl Future<Output = Result<Vec<ColumnRecord>, Self::Error>> + Send + 'a;
}

// ─── Write port ──────────────────────────────────────────────────────────────

/// Idempotent schema loading. Writes merge by identity: ingesting the same
/// description twice leaves the store unchanged.
pub trait SchemaIngest: SchemaGraphStore {
  /// Validate and merge one database description into the store.
  fn ingest<'a>(
    &'a self,
    schema: &'a SchemaDescription,
  ) -> impl Future<Output = Result<IngestSummary, Self::Error>> + Send + 'a;

  /// Remove one database's nodes and edges. Returns `false` if it was absent.
  fn delete_database<'a>(
    &'a self,
    db_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Remove every database.
  fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
