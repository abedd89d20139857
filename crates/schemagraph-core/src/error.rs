//! Error types for `schemagraph-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A schema description references a table or column that does not exist,
  /// or is otherwise internally inconsistent. Raised during ingestion only.
  #[error("malformed schema {db_id:?}: {reason}")]
  MalformedSchema { db_id: String, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn malformed(db_id: &str, reason: impl Into<String>) -> Self {
    Self::MalformedSchema { db_id: db_id.to_owned(), reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
