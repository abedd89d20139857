//! Shared schemas for unit tests.

use serde_json::json;

use crate::{ingest::SchemaDescription, memory::MemoryStore, schema::GraphSnapshot};

/// `sales`: `Orders(id PK, customer_id FK -> Customers.id)`,
/// `Customers(id PK, name)`, `Products(id PK)`, and optionally the bridge
/// `OrderItems(order_id FK -> Orders.id, product_id FK -> Products.id)`.
pub fn sales_description(with_order_items: bool) -> SchemaDescription {
  let mut desc: SchemaDescription = serde_json::from_value(json!({
    "db_id": "sales",
    "table_names": ["Orders", "Customers", "Products"],
    "column_names": [
      [-1, "*"], [0, "id"], [0, "customer_id"], [1, "id"], [1, "name"], [2, "id"]
    ],
    "column_types": ["text", "integer", "integer", "integer", "text", "integer"],
    "primary_keys": [1, 3, 5],
    "foreign_keys": [[2, 3]]
  }))
  .expect("valid fixture");

  if with_order_items {
    desc.table_names.push("OrderItems".into());
    desc.column_names.push((3, "order_id".into()));
    desc.column_names.push((3, "product_id".into()));
    desc.column_types.extend(["integer".into(), "integer".into()]);
    desc.foreign_keys.extend([(6, 1), (7, 5)]);
  }
  desc
}

pub fn sales_snapshot(with_order_items: bool) -> GraphSnapshot {
  sales_description(with_order_items)
    .normalize()
    .expect("valid fixture")
    .snapshot()
}

/// `Warehouses(id PK, city)`, `Stock(warehouse_id FK -> Warehouses.id, qty)`
pub fn inventory_description(db_id: &str) -> SchemaDescription {
  serde_json::from_value(json!({
    "db_id": db_id,
    "table_names": ["Warehouses", "Stock"],
    "column_names": [[-1, "*"], [0, "id"], [0, "city"], [1, "warehouse_id"], [1, "qty"]],
    "column_types": ["text", "integer", "text", "integer", "integer"],
    "primary_keys": [1],
    "foreign_keys": [[3, 1]]
  }))
  .expect("valid fixture")
}

pub fn inventory_snapshot_in(db_id: &str) -> GraphSnapshot {
  inventory_description(db_id)
    .normalize()
    .expect("valid fixture")
    .snapshot()
}

/// A memory store holding the full `sales` schema.
pub fn sales_store() -> MemoryStore {
  MemoryStore::from_descriptions([sales_description(true)]).expect("valid fixture")
}
