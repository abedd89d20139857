//! Handlers for `/databases` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/databases` | Sorted database ids |
//! | `POST`   | `/databases` | Body: one `tables.json` record; 400 if malformed |
//! | `DELETE` | `/databases/{db_id}` | 204, or 404 if unknown |
//! | `GET`    | `/databases/{db_id}/graph` | Trimmed graph; 404 if unknown |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use schemagraph_core::{
  graph::{TypedEdge, load_graph},
  ingest::SchemaDescription,
  store::{SchemaGraphStore, SchemaIngest},
};
use serde::Serialize;

use crate::error::ApiError;

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /databases`
pub async fn list<S: SchemaGraphStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
  let ids = store.list_databases().await.map_err(ApiError::store)?;
  Ok(Json(ids))
}

// ─── Ingest ──────────────────────────────────────────────────────────────────

/// `POST /databases` with one `tables.json` record as the body.
///
/// The description is validated before the store sees it, so a malformed
/// schema is a 400 and never a partial write.
pub async fn ingest<S: SchemaIngest>(
  State(store): State<Arc<S>>,
  Json(body): Json<SchemaDescription>,
) -> Result<impl IntoResponse, ApiError> {
  body
    .normalize()
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let summary = store.ingest(&body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(summary)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /databases/{db_id}`
pub async fn remove<S: SchemaIngest>(
  State(store): State<Arc<S>>,
  Path(db_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  if store.delete_database(&db_id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("database {db_id:?}")))
  }
}

// ─── Graph ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GraphView {
  pub db_id: String,
  pub nodes: Vec<String>,
  pub edges: Vec<TypedEdge>,
}

/// `GET /databases/{db_id}/graph`: the working graph after leaf-column
/// trimming.
pub async fn graph<S: SchemaGraphStore>(
  State(store): State<Arc<S>>,
  Path(db_id): Path<String>,
) -> Result<Json<GraphView>, ApiError> {
  let graph = load_graph(&*store, &db_id).await.map_err(ApiError::store)?;
  if graph.is_empty() {
    return Err(ApiError::NotFound(format!("database {db_id:?}")));
  }
  Ok(Json(GraphView {
    nodes: graph.nodes().map(str::to_owned).collect(),
    edges: graph.typed_edges(),
    db_id,
  }))
}
