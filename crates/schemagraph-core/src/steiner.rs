//! Approximate Steiner trees over a trimmed schema graph.
//!
//! This is the greedy "grow toward the nearest unconnected terminal"
//! heuristic, not Kou–Markowsky–Berman: per connected component, seed the
//! tree with the smallest terminal, then repeatedly run a multi-source
//! breadth-first search from the whole tree and splice in the shortest path
//! to the closest remaining terminal. Each step is O(V + E); a component with
//! T terminals costs O(T · (V + E)).
//!
//! Ties are broken by name everywhere (seed choice, terminal choice, and
//! neighbour order during the search), so identical inputs always produce
//! identical trees.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::Serialize;

use crate::{
  graph::{SchemaGraph, TypedEdge, load_graph},
  schema::{EdgeKey, EdgeKind, NodeClass, classify},
  store::SchemaGraphStore,
};

// ─── Result ──────────────────────────────────────────────────────────────────

/// The union of every per-component tree for one database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SteinerTree {
  pub nodes:            BTreeSet<String>,
  pub edges:            BTreeSet<EdgeKey>,
  /// Column endpoints of `HAS_PRIMARY_KEY` / `FOREIGN_KEY_TO` tree edges.
  pub involved_columns: BTreeSet<String>,
  /// Kinds for every edge of the working graph, not only tree edges.
  pub edge_types:       BTreeMap<EdgeKey, EdgeKind>,
}

impl SteinerTree {
  /// Set-union `other` into `self`.
  pub fn merge(&mut self, other: SteinerTree) {
    self.nodes.extend(other.nodes);
    self.edges.extend(other.edges);
    self.involved_columns.extend(other.involved_columns);
    self.edge_types.extend(other.edge_types);
  }

  /// Qualified names of every table touched by the tree, whether present as
  /// a table node or only through one of its columns.
  pub fn tables(&self) -> BTreeSet<&str> {
    self
      .nodes
      .iter()
      .filter_map(|n| classify(n))
      .map(NodeClass::table)
      .collect()
  }

  pub fn typed_edges(&self) -> Vec<TypedEdge> {
    self
      .edges
      .iter()
      .filter_map(|key| {
        let kind = self.edge_types.get(key)?;
        let (a, b) = key.endpoints();
        Some(TypedEdge { a: a.to_owned(), b: b.to_owned(), kind: *kind })
      })
      .collect()
  }
}

/// Serialisable form of a [`SteinerTree`], restricted to tree edges.
#[derive(Debug, Clone, Serialize)]
pub struct TreeView {
  pub nodes:            Vec<String>,
  pub edges:            Vec<TypedEdge>,
  pub involved_columns: Vec<String>,
}

impl From<&SteinerTree> for TreeView {
  fn from(tree: &SteinerTree) -> Self {
    Self {
      nodes:            tree.nodes.iter().cloned().collect(),
      edges:            tree.typed_edges(),
      involved_columns: tree.involved_columns.iter().cloned().collect(),
    }
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Distances and predecessors from one multi-source search.
struct ShortestPaths<'g> {
  distance:    HashMap<&'g str, usize>,
  predecessor: HashMap<&'g str, &'g str>,
}

pub struct SteinerTreeBuilder<'g> {
  graph: &'g SchemaGraph,
}

impl<'g> SteinerTreeBuilder<'g> {
  pub fn new(graph: &'g SchemaGraph) -> Self { Self { graph } }

  /// Connect as many of `terminals` (qualified table names) as the graph
  /// allows. Terminals absent from the graph, or unreachable within their
  /// component, are left out of the tree without error.
  pub fn build(&self, terminals: &BTreeSet<String>) -> SteinerTree {
    let mut result = SteinerTree {
      edge_types: self.graph.edge_types().clone(),
      ..SteinerTree::default()
    };

    for missing in terminals.iter().filter(|t| !self.graph.contains(t)) {
      tracing::warn!(terminal = %missing, "terminal not in trimmed graph");
    }

    for component in self.graph.connected_components() {
      let local: BTreeSet<&'g str> = terminals
        .iter()
        .filter_map(|t| self.graph.resolve(t))
        .filter(|t| component.contains(*t))
        .collect();
      if local.is_empty() {
        continue;
      }
      result.merge(self.grow(&local));
    }

    result
  }

  /// Grow one component's tree until every reachable terminal is attached.
  fn grow(&self, terminals: &BTreeSet<&'g str>) -> SteinerTree {
    let mut tree = SteinerTree::default();
    let Some(&seed) = terminals.first() else {
      return tree;
    };
    tracing::debug!(seed, terminals = terminals.len(), "growing component tree");
    tree.nodes.insert(seed.to_owned());

    let mut connected: BTreeSet<&'g str> = BTreeSet::from([seed]);
    while connected.len() < terminals.len() {
      let search = self.shortest_paths(&tree.nodes);
      let nearest = terminals
        .iter()
        .filter(|t| !connected.contains(*t))
        .filter_map(|&t| search.distance.get(t).map(|&d| (d, t)))
        .min();

      let Some((distance, terminal)) = nearest else {
        tracing::debug!(
          remaining = terminals.len() - connected.len(),
          "remaining terminals unreachable from tree"
        );
        break;
      };

      tracing::debug!(terminal, distance, "attaching nearest terminal");
      self.attach(&mut tree, &search, terminal);
      connected.insert(terminal);
    }

    tree
  }

  /// Unit-weight multi-source search from every node already in the tree.
  fn shortest_paths(&self, sources: &BTreeSet<String>) -> ShortestPaths<'g> {
    let mut distance = HashMap::new();
    let mut predecessor = HashMap::new();
    let mut queue = VecDeque::new();

    for source in sources.iter().filter_map(|s| self.graph.resolve(s)) {
      distance.insert(source, 0);
      queue.push_back(source);
    }

    while let Some(node) = queue.pop_front() {
      let next_distance = distance[node] + 1;
      for next in self.graph.neighbors(node) {
        let next = next.as_str();
        if distance.contains_key(next) {
          continue;
        }
        distance.insert(next, next_distance);
        predecessor.insert(next, node);
        queue.push_back(next);
      }
    }

    ShortestPaths { distance, predecessor }
  }

  /// Walk predecessors from `terminal` back into the tree, adding each node
  /// and edge on the way.
  fn attach(&self, tree: &mut SteinerTree, search: &ShortestPaths<'g>, terminal: &'g str) {
    let mut current = terminal;
    while let Some(&previous) = search.predecessor.get(current) {
      tree.edges.insert(EdgeKey::new(previous, current));
      if self.graph.edge_kind(previous, current).is_some_and(EdgeKind::is_key) {
        for end in [previous, current] {
          if matches!(classify(end), Some(NodeClass::Column { .. })) {
            tree.involved_columns.insert(end.to_owned());
          }
        }
      }
      tree.nodes.insert(current.to_owned());
      current = previous;
    }
  }
}

/// Load `db_id` and build the tree connecting `terminals` (qualified table
/// names).
pub async fn steiner_tree<S>(
  store: &S,
  db_id: &str,
  terminals: &BTreeSet<String>,
) -> Result<SteinerTree, S::Error>
where
  S: SchemaGraphStore,
{
  let graph = load_graph(store, db_id).await?;
  let tree = SteinerTreeBuilder::new(&graph).build(terminals);
  tracing::debug!(
    db_id,
    nodes = tree.nodes.len(),
    edges = tree.edges.len(),
    involved = tree.involved_columns.len(),
    "built steiner tree"
  );
  Ok(tree)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{fixtures, schema::GraphSnapshot};

  fn graph(snapshot: GraphSnapshot) -> SchemaGraph { SchemaGraph::trimmed(&snapshot) }

  fn terminals(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| format!("sales.{n}")).collect()
  }

  fn fk_edges(tree: &SteinerTree) -> usize {
    tree
      .typed_edges()
      .iter()
      .filter(|e| e.kind == EdgeKind::ForeignKeyTo)
      .count()
  }

  #[test]
  fn singleton_terminal_is_its_own_tree() {
    let g = graph(fixtures::sales_snapshot(true));
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Products"]));
    assert_eq!(tree.nodes, terminals(&["Products"]));
    assert!(tree.edges.is_empty());
    assert!(tree.involved_columns.is_empty());
  }

  #[test]
  fn singleton_terminal_with_only_leaf_columns() {
    // Without OrderItems, Products.id has degree 1 and is trimmed away.
    let g = graph(fixtures::sales_snapshot(false));
    assert!(g.neighbors("sales.Products").is_empty());
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Products"]));
    assert_eq!(tree.nodes, terminals(&["Products"]));
    assert!(tree.edges.is_empty());
  }

  #[test]
  fn direct_foreign_key_links_two_terminals() {
    let g = graph(fixtures::sales_snapshot(false));
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Orders", "Customers"]));

    let expected: BTreeSet<String> = [
      "sales.Orders",
      "sales.Orders.customer_id",
      "sales.Customers.id",
      "sales.Customers",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();
    assert_eq!(tree.nodes, expected);
    assert_eq!(fk_edges(&tree), 1);
    assert_eq!(tree.edges.len(), 3);
    assert!(tree.edges.contains(&EdgeKey::new("sales.Orders.customer_id", "sales.Customers.id")));
    assert!(tree.involved_columns.contains("sales.Orders.customer_id"));
    assert!(tree.involved_columns.contains("sales.Customers.id"));
    assert!(tree.involved_columns.iter().all(|c| c.matches('.').count() == 2));
  }

  #[test]
  fn bridge_table_joins_unlinked_terminals() {
    let g = graph(fixtures::sales_snapshot(true));
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Orders", "Products"]));

    assert_eq!(
      tree.tables(),
      BTreeSet::from(["sales.OrderItems", "sales.Orders", "sales.Products"])
    );
    assert_eq!(fk_edges(&tree), 2);
    assert_eq!(tree.edges.len(), 6);
    for column in [
      "sales.Orders.id",
      "sales.OrderItems.order_id",
      "sales.OrderItems.product_id",
      "sales.Products.id",
    ] {
      assert!(tree.involved_columns.contains(column), "{column} not involved");
    }
  }

  #[test]
  fn identical_inputs_give_identical_trees() {
    let g = graph(fixtures::sales_snapshot(true));
    let t = terminals(&["Orders", "Products", "Customers"]);
    let first = SteinerTreeBuilder::new(&g).build(&t);

    let mut reversed = fixtures::sales_snapshot(true);
    reversed.nodes.reverse();
    reversed.edges.reverse();
    let g2 = graph(reversed);
    let second = SteinerTreeBuilder::new(&g2).build(&t);

    assert_eq!(first, second);
  }

  #[test]
  fn leaf_columns_never_enter_the_tree() {
    let g = graph(fixtures::sales_snapshot(true));
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Orders", "Customers", "Products"]));
    assert!(!tree.nodes.contains("sales.Customers.name"));
    assert!(!tree.involved_columns.contains("sales.Customers.name"));
  }

  #[test]
  fn separate_components_get_separate_trees() {
    let mut snapshot = fixtures::sales_snapshot(false);
    let other = fixtures::inventory_snapshot_in("sales");
    snapshot.nodes.extend(other.nodes);
    snapshot.edges.extend(other.edges);
    let g = graph(snapshot);
    assert_eq!(g.connected_components().len(), 3);

    let tree = SteinerTreeBuilder::new(&g)
      .build(&terminals(&["Orders", "Customers", "Warehouses", "Stock"]));

    assert!(tree.tables().contains("sales.Warehouses"));
    assert!(tree.tables().contains("sales.Stock"));
    assert!(tree.tables().contains("sales.Orders"));
    // No edge crosses between the two components.
    for edge in &tree.edges {
      let (a, b) = edge.endpoints();
      let a_inventory = a.starts_with("sales.Warehouses") || a.starts_with("sales.Stock");
      let b_inventory = b.starts_with("sales.Warehouses") || b.starts_with("sales.Stock");
      assert_eq!(a_inventory, b_inventory, "edge {a} -- {b} crosses components");
    }
  }

  #[test]
  fn unknown_terminals_are_skipped() {
    let g = graph(fixtures::sales_snapshot(false));
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Orders", "Ghost"]));
    assert_eq!(tree.nodes, terminals(&["Orders"]));
  }

  #[test]
  fn empty_graph_gives_empty_tree() {
    let g = SchemaGraph::default();
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Orders"]));
    assert!(tree.nodes.is_empty());
    assert!(tree.edge_types.is_empty());
  }

  #[test]
  fn edge_types_cover_whole_graph() {
    let g = graph(fixtures::sales_snapshot(true));
    let tree = SteinerTreeBuilder::new(&g).build(&terminals(&["Products"]));
    assert_eq!(tree.edge_types.len(), g.edge_count());
  }

  #[test]
  fn terminal_on_an_earlier_path_needs_no_extra_edges() {
    // OrderItems lies on the only Orders -> Products path, so requesting it
    // as well adds no edges.
    let g = graph(fixtures::sales_snapshot(true));
    let with_bridge = SteinerTreeBuilder::new(&g)
      .build(&terminals(&["Orders", "Products", "OrderItems"]));
    let without = SteinerTreeBuilder::new(&g).build(&terminals(&["Orders", "Products"]));
    assert_eq!(with_bridge.edges, without.edges);
  }
}
