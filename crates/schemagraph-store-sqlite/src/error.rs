//! Error type for `schemagraph-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The description failed validation before anything was written.
  #[error(transparent)]
  Core(#[from] schemagraph_core::Error),

  #[error("sqlite: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored foreign-key target list could not be decoded.
  #[error("corrupt foreign-key targets: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unknown edge kind in store: {0:?}")]
  InvalidEdgeKind(String),

  #[error("unknown node kind in store: {0:?}")]
  InvalidNodeKind(String),

  /// The file was written by a newer release.
  #[error("store layout version {found} is newer than supported version {supported}")]
  UnsupportedLayout { found: i64, supported: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
