//! SQLite backend for schema graphs.
//!
//! Stores the property graph as two tables, `nodes` and `edges`, and wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
