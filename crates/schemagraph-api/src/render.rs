//! Plain-text rendering of a subsetting result, one block per database.
//!
//! ```text
//! === Database: sales ===
//! Terminal tables:
//!   - sales.Orders
//!       id : integer PK
//!       customer_id : integer (FK to sales.Customers.id)
//! Steiner tables (key columns only):
//!   - sales.OrderItems
//!       order_id : integer (FK to sales.Orders.id)
//! ```

use std::collections::BTreeMap;

use schemagraph_core::metadata::{ColumnMetadata, SubsetResult};

pub fn render_subset(result: &SubsetResult) -> String {
  let mut out = String::new();
  for (db_id, metadata) in result {
    out.push_str(&format!("=== Database: {db_id} ===\n"));
    out.push_str("Terminal tables:\n");
    render_tables(&mut out, &metadata.terminal_tables);
    out.push_str("Steiner tables (key columns only):\n");
    render_tables(&mut out, &metadata.steiner_tables);
  }
  out
}

fn render_tables(out: &mut String, tables: &BTreeMap<String, Vec<ColumnMetadata>>) {
  for (table, columns) in tables {
    out.push_str(&format!("  - {table}\n"));
    for column in columns {
      out.push_str(&format!("      {}\n", column_line(column)));
    }
  }
}

/// `name : type [PK] [(FK to target, ...)]`
pub fn column_line(column: &ColumnMetadata) -> String {
  let mut line = format!("{} : {}", column.column_name, column.data_type);
  if column.is_pk {
    line.push_str(" PK");
  }
  if let Some(target) = &column.fk_target {
    line.push_str(&format!(" (FK to {})", target.targets().join(", ")));
  }
  line
}
