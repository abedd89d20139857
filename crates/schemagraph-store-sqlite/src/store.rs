//! [`SqliteStore`]: the SQLite implementation of [`SchemaGraphStore`] and
//! [`SchemaIngest`].

use std::path::Path;

use schemagraph_core::{
  ingest::{IngestSummary, NormalizedSchema, SchemaDescription},
  schema::{ColumnRecord, EdgeKind, GraphSnapshot, NodeKind},
  store::{SchemaGraphStore, SchemaIngest},
};

use crate::{
  Error, Result,
  encode::{RawColumn, RawEdge, RawNode, encode_edge_kind, encode_node_kind},
  schema::{SCHEMA, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A schema graph store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let store = Self::attach(tokio_rusqlite::Connection::open(path).await?).await?;
    tracing::debug!(path = %path.display(), "opened schema graph store");
    Ok(store)
  }

  /// Open a store that lives only as long as the returned handle.
  pub async fn open_in_memory() -> Result<Self> {
    Self::attach(tokio_rusqlite::Connection::open_in_memory().await?).await
  }

  /// Apply the DDL to `conn`, refusing files written by a newer layout.
  async fn attach(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let found = conn
      .call(|conn| {
        let found: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if found <= SCHEMA_VERSION {
          conn.execute_batch(SCHEMA)?;
        }
        Ok(found)
      })
      .await?;
    if found > SCHEMA_VERSION {
      return Err(Error::UnsupportedLayout { found, supported: SCHEMA_VERSION });
    }
    Ok(Self { conn })
  }

  /// Write a normalised schema in one transaction.
  ///
  /// Nodes are upserted by key. A column's ownership edge is replaced when
  /// its primary-key flag flips; every other edge is insert-or-ignore, so
  /// repeating an ingest leaves the graph unchanged.
  async fn write_schema(&self, schema: NormalizedSchema) -> Result<()> {
    let table_kind = encode_node_kind(NodeKind::Table);
    let column_kind = encode_node_kind(NodeKind::Column);
    let has_column = encode_edge_kind(EdgeKind::HasColumn);
    let has_pk = encode_edge_kind(EdgeKind::HasPrimaryKey);
    let fk_kind = encode_edge_kind(EdgeKind::ForeignKeyTo);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut upsert_node = tx.prepare(
            "INSERT INTO nodes (key, db_id, kind, name, table_key, data_type, ordinal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(key) DO UPDATE SET
               kind      = excluded.kind,
               name      = excluded.name,
               table_key = excluded.table_key,
               data_type = excluded.data_type,
               ordinal   = excluded.ordinal",
          )?;
          let mut drop_ownership = tx.prepare(
            "DELETE FROM edges WHERE src = ?1 AND dst = ?2 AND kind = ?3",
          )?;
          let mut insert_edge = tx.prepare(
            "INSERT OR IGNORE INTO edges (db_id, src, dst, kind) VALUES (?1, ?2, ?3, ?4)",
          )?;

          for table in &schema.tables {
            upsert_node.execute(rusqlite::params![
              table.key,
              schema.db_id,
              table_kind,
              table.name,
              None::<String>,
              None::<String>,
              table.ordinal as i64,
            ])?;
          }

          for column in &schema.columns {
            upsert_node.execute(rusqlite::params![
              column.key,
              schema.db_id,
              column_kind,
              column.name,
              column.table,
              column.data_type,
              column.ordinal as i64,
            ])?;

            let (kind, stale) =
              if column.is_pk { (&has_pk, &has_column) } else { (&has_column, &has_pk) };
            drop_ownership.execute(rusqlite::params![column.table, column.key, stale])?;
            insert_edge.execute(rusqlite::params![schema.db_id, column.table, column.key, kind])?;
          }

          for fk in &schema.foreign_keys {
            insert_edge.execute(rusqlite::params![schema.db_id, fk.from, fk.to, fk_kind])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SchemaGraphStore impl ───────────────────────────────────────────────────

impl SchemaGraphStore for SqliteStore {
  type Error = Error;

  async fn list_databases(&self) -> Result<Vec<String>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT DISTINCT db_id FROM nodes ORDER BY db_id")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  async fn fetch_graph(&self, db_id: &str) -> Result<GraphSnapshot> {
    let db = db_id.to_owned();

    let (raw_nodes, raw_edges): (Vec<RawNode>, Vec<RawEdge>) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT key, kind FROM nodes WHERE db_id = ?1 ORDER BY key")?;
        let nodes = stmt
          .query_map(rusqlite::params![db], |row| {
            Ok(RawNode { key: row.get(0)?, kind: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT src, dst, kind FROM edges WHERE db_id = ?1 ORDER BY src, dst, kind",
        )?;
        let edges = stmt
          .query_map(rusqlite::params![db], |row| {
            Ok(RawEdge { src: row.get(0)?, dst: row.get(1)?, kind: row.get(2)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((nodes, edges))
      })
      .await?;

    let snapshot = GraphSnapshot {
      nodes: raw_nodes.into_iter().map(RawNode::into_node).collect::<Result<_>>()?,
      edges: raw_edges.into_iter().map(RawEdge::into_edge).collect::<Result<_>>()?,
    };
    tracing::debug!(
      db_id,
      nodes = snapshot.nodes.len(),
      edges = snapshot.edges.len(),
      "read schema graph"
    );
    Ok(snapshot)
  }

  async fn fetch_columns(&self, db_id: &str, tables: &[String]) -> Result<Vec<ColumnRecord>> {
    if tables.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders = (2..tables.len() + 2)
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "SELECT c.table_key, c.key, c.name, c.data_type,
              EXISTS (SELECT 1 FROM edges e
                       WHERE e.dst = c.key AND e.kind = 'HAS_PRIMARY_KEY'),
              (SELECT json_group_array(f.dst) FROM edges f
                WHERE f.src = c.key AND f.kind = 'FOREIGN_KEY_TO')
         FROM nodes c
         JOIN nodes t ON t.key = c.table_key
        WHERE c.db_id = ?1 AND c.kind = 'column' AND c.table_key IN ({placeholders})
        ORDER BY t.ordinal, c.ordinal"
    );
    let params: Vec<String> =
      std::iter::once(db_id.to_owned()).chain(tables.iter().cloned()).collect();

    let raws: Vec<RawColumn> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawColumn {
              table:      row.get(0)?,
              key:        row.get(1)?,
              name:       row.get(2)?,
              data_type:  row.get(3)?,
              is_pk:      row.get(4)?,
              fk_targets: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawColumn::into_record).collect()
  }
}

// ─── SchemaIngest impl ───────────────────────────────────────────────────────

impl SchemaIngest for SqliteStore {
  async fn ingest(&self, schema: &SchemaDescription) -> Result<IngestSummary> {
    let normalized = schema.normalize()?;
    let summary = normalized.summary();
    self.write_schema(normalized).await?;

    tracing::info!(
      db_id = %schema.db_id,
      tables = summary.tables,
      columns = summary.columns,
      foreign_keys = summary.foreign_keys,
      "ingested schema"
    );
    Ok(summary)
  }

  async fn delete_database(&self, db_id: &str) -> Result<bool> {
    let db = db_id.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM edges WHERE db_id = ?1", rusqlite::params![db])?;
        let nodes = tx.execute("DELETE FROM nodes WHERE db_id = ?1", rusqlite::params![db])?;
        tx.commit()?;
        Ok(nodes)
      })
      .await?;

    if removed > 0 {
      tracing::info!(db_id, nodes = removed, "deleted schema");
    }
    Ok(removed > 0)
  }

  async fn clear(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("DELETE FROM edges; DELETE FROM nodes;")?;
        Ok(())
      })
      .await?;
    tracing::warn!("cleared every stored schema");
    Ok(())
  }
}
