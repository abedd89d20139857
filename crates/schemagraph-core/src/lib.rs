//! Schema-graph subsetting.
//!
//! Given a database schema modelled as a property graph (tables, columns,
//! primary- and foreign-key edges) and a set of terminal tables, compute an
//! approximate minimum connecting subgraph and summarise it in two tiers:
//! full column detail for the requested tables, join-path columns only for
//! the connector tables the tree pulled in.
//!
//! This crate is free of storage and HTTP dependencies. Backends implement
//! [`store::SchemaGraphStore`] (and [`store::SchemaIngest`] to accept
//! schemas); [`memory::MemoryStore`] is the in-process implementation.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod error;
pub mod graph;
pub mod ingest;
pub mod memory;
pub mod metadata;
pub mod schema;
pub mod steiner;
pub mod store;
pub mod subset;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};
pub use subset::run;
