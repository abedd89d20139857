//! SQL schema for the schema-graph SQLite store.
//!
//! Executed once at connection startup. Files stamped with a newer
//! `PRAGMA user_version` are refused rather than rewritten.

/// Layout version stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per table or column. `key` is the fully-qualified name:
-- `db_id.table` or `db_id.table.column`.
CREATE TABLE IF NOT EXISTS nodes (
    key        TEXT PRIMARY KEY,
    db_id      TEXT NOT NULL,
    kind       TEXT NOT NULL,      -- 'table' | 'column'
    name       TEXT NOT NULL,
    table_key  TEXT,               -- owning table; NULL for tables
    data_type  TEXT,               -- NULL for tables
    ordinal    INTEGER NOT NULL    -- declaration order within the database
);

-- Typed, directed relationships. Ownership edges run table -> column;
-- foreign keys run referencing column -> referenced column.
CREATE TABLE IF NOT EXISTS edges (
    db_id  TEXT NOT NULL,
    src    TEXT NOT NULL,
    dst    TEXT NOT NULL,
    kind   TEXT NOT NULL,          -- 'HAS_COLUMN' | 'HAS_PRIMARY_KEY' | 'FOREIGN_KEY_TO'
    PRIMARY KEY (src, dst, kind)
);

CREATE INDEX IF NOT EXISTS nodes_db_idx    ON nodes(db_id);
CREATE INDEX IF NOT EXISTS nodes_table_idx ON nodes(table_key);
CREATE INDEX IF NOT EXISTS edges_db_idx    ON edges(db_id);
CREATE INDEX IF NOT EXISTS edges_dst_idx   ON edges(dst);

PRAGMA user_version = 1;
";
