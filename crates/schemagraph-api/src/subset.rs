//! Handlers for subsetting and tree inspection.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/subset` | Body: `[{"db_id":..,"table_name":..}]` |
//! | `GET`  | `/databases/{db_id}/tree` | `?tables=a,b` with bare table names |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
};
use schemagraph_core::{
  metadata::SubsetResult,
  schema::{Candidate, table_key},
  steiner::{TreeView, steiner_tree},
  store::SchemaGraphStore,
};
use serde::Deserialize;

use crate::error::ApiError;

/// `POST /subset`
pub async fn subset<S: SchemaGraphStore>(
  State(store): State<Arc<S>>,
  Json(candidates): Json<Vec<Candidate>>,
) -> Result<Json<SubsetResult>, ApiError> {
  let result = schemagraph_core::run(&*store, &candidates)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(result))
}

#[derive(Debug, Deserialize, Default)]
pub struct TreeParams {
  /// Comma-separated bare table names, e.g. `Orders,Products`.
  pub tables: Option<String>,
}

impl TreeParams {
  fn terminals(&self, db_id: &str) -> BTreeSet<String> {
    self
      .tables
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(|t| table_key(db_id, t))
      .collect()
  }
}

/// `GET /databases/{db_id}/tree?tables=a,b`
pub async fn tree<S: SchemaGraphStore>(
  State(store): State<Arc<S>>,
  Path(db_id): Path<String>,
  Query(params): Query<TreeParams>,
) -> Result<Json<TreeView>, ApiError> {
  let terminals = params.terminals(&db_id);
  if terminals.is_empty() {
    return Err(ApiError::BadRequest("`tables` must name at least one table".into()));
  }

  let tree = steiner_tree(&*store, &db_id, &terminals)
    .await
    .map_err(ApiError::store)?;
  if tree.nodes.is_empty() {
    return Err(ApiError::NotFound(format!(
      "none of the requested tables exist in database {db_id:?}"
    )));
  }
  Ok(Json(TreeView::from(&tree)))
}
