//! JSON REST API for schema-graph subsetting.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`schemagraph_core::store::SchemaIngest`]. TLS and auth are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", schemagraph_api::api_router(store.clone()))
//! ```

pub mod databases;
pub mod error;
pub mod render;
pub mod subset;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use schemagraph_core::store::SchemaIngest;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCHEMAGRAPH_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_owned(),
      port:       7420,
      store_path: PathBuf::from("schemagraph.db"),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SchemaIngest + 'static,
{
  Router::new()
    // Databases
    .route("/databases", get(databases::list::<S>).post(databases::ingest::<S>))
    .route("/databases/{db_id}", delete(databases::remove::<S>))
    .route("/databases/{db_id}/graph", get(databases::graph::<S>))
    // Subsetting
    .route("/databases/{db_id}/tree", get(subset::tree::<S>))
    .route("/subset", post(subset::subset::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use schemagraph_core::memory::MemoryStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  fn sales() -> Value {
    json!({
      "db_id": "sales",
      "table_names": ["Orders", "Customers", "Products", "OrderItems"],
      "column_names": [
        [-1, "*"], [0, "id"], [0, "customer_id"], [1, "id"], [1, "name"], [2, "id"],
        [3, "order_id"], [3, "product_id"]
      ],
      "column_types": [
        "text", "integer", "integer", "integer", "text", "integer", "integer", "integer"
      ],
      "primary_keys": [1, 3, 5],
      "foreign_keys": [[2, 3], [6, 1], [7, 5]]
    })
  }

  async fn loaded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let resp = send(store.clone(), "POST", "/databases", Some(sales())).await;
    assert_eq!(resp.0, StatusCode::CREATED);
    store
  }

  async fn send(
    store:  Arc<MemoryStore>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = api_router(store).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  // ── Databases ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn ingest_returns_summary_and_lists_database() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = send(store.clone(), "POST", "/databases", Some(sales())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "tables": 4, "columns": 7, "foreign_keys": 3 }));

    let (status, body) = send(store, "GET", "/databases", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["sales"]));
  }

  #[tokio::test]
  async fn malformed_ingest_is_bad_request() {
    let store = Arc::new(MemoryStore::new());
    let mut desc = sales();
    desc["foreign_keys"] = json!([[2, 42]]);

    let (status, body) = send(store.clone(), "POST", "/databases", Some(desc)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("out of range"));

    let (_, body) = send(store, "GET", "/databases", None).await;
    assert_eq!(body, json!([]));
  }

  #[tokio::test]
  async fn dotted_table_name_is_bad_request() {
    let store = Arc::new(MemoryStore::new());
    let mut desc = sales();
    desc["table_names"][3] = json!("Order.Items");

    let (status, body) = send(store.clone(), "POST", "/databases", Some(desc)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Order.Items"));

    let (_, body) = send(store, "GET", "/databases", None).await;
    assert_eq!(body, json!([]));
  }

  #[tokio::test]
  async fn delete_then_delete_again() {
    let store = loaded_store().await;
    let (status, _) = send(store.clone(), "DELETE", "/databases/sales", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(store, "DELETE", "/databases/sales", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn graph_is_trimmed() {
    let store = loaded_store().await;
    let (status, body) = send(store.clone(), "GET", "/databases/sales/graph", None).await;
    assert_eq!(status, StatusCode::OK);

    let nodes: Vec<&str> = body["nodes"]
      .as_array()
      .unwrap()
      .iter()
      .filter_map(Value::as_str)
      .collect();
    assert!(nodes.contains(&"sales.Customers"));
    assert!(!nodes.contains(&"sales.Customers.name"));
    assert_eq!(body["edges"].as_array().unwrap().len(), 9);

    let (status, _) = send(store, "GET", "/databases/nowhere/graph", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Subsetting ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn tree_for_bridge() {
    let store = loaded_store().await;
    let (status, body) =
      send(store, "GET", "/databases/sales/tree?tables=Orders,Products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["edges"].as_array().unwrap().len(), 6);
    assert_eq!(
      body["involved_columns"],
      json!([
        "sales.OrderItems.order_id",
        "sales.OrderItems.product_id",
        "sales.Orders.id",
        "sales.Products.id"
      ])
    );
  }

  #[tokio::test]
  async fn tree_needs_tables() {
    let store = loaded_store().await;
    let (status, _) = send(store.clone(), "GET", "/databases/sales/tree", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(store.clone(), "GET", "/databases/nowhere/tree?tables=T", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(store, "GET", "/databases/sales/tree?tables=Ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn subset_returns_tiers() {
    let store = loaded_store().await;
    let candidates = json!([
      { "db_id": "sales", "table_name": "Orders" },
      { "db_id": "sales", "table_name": "Products" },
      { "db_id": "ghost", "table_name": "T" }
    ]);
    let (status, body) = send(store, "POST", "/subset", Some(candidates)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
      body["sales"]["steiner_tables"]["sales.OrderItems"],
      json!([
        {
          "column_name": "order_id",
          "data_type": "integer",
          "is_pk": false,
          "fk_target": "sales.Orders.id"
        },
        {
          "column_name": "product_id",
          "data_type": "integer",
          "is_pk": false,
          "fk_target": "sales.Products.id"
        }
      ])
    );
    assert_eq!(body["sales"]["terminal_tables"]["sales.Orders"][1]["fk_target"], Value::Null);
    assert_eq!(body["ghost"], json!({ "terminal_tables": { "ghost.T": [] }, "steiner_tables": {} }));
  }

  #[test]
  fn config_defaults() {
    let cfg: ServerConfig = serde_json::from_value(json!({ "port": 9000 })).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.address(), "127.0.0.1:9000");
    assert_eq!(cfg.store_path, PathBuf::from("schemagraph.db"));
  }
}
