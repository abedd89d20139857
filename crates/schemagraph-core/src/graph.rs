//! Graph loading: the trimmed, undirected working graph for one database.
//!
//! Trimming drops every column node whose total degree is exactly 1, i.e. a
//! column attached to its table and nothing else. Such columns can never
//! bridge two tables. A terminal whose only connection ran through one of
//! them ends up isolated; that is accepted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
  schema::{EdgeKey, EdgeKind, GraphSnapshot, NodeKind},
  store::SchemaGraphStore,
};

/// An edge with its kind, endpoints in normalised order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedEdge {
  pub a:    String,
  pub b:    String,
  pub kind: EdgeKind,
}

/// Undirected adjacency plus the kind of every retained edge.
///
/// Neighbour lists are sorted so traversal order, and with it every result
/// derived from this graph, is reproducible.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
  adjacency:  BTreeMap<String, Vec<String>>,
  edge_types: BTreeMap<EdgeKey, EdgeKind>,
}

impl SchemaGraph {
  /// Build the working graph from a raw snapshot, trimming leaf columns.
  pub fn trimmed(snapshot: &GraphSnapshot) -> Self {
    let mut degree: HashMap<&str, usize> = HashMap::new();
    for edge in &snapshot.edges {
      *degree.entry(edge.from.as_str()).or_default() += 1;
      *degree.entry(edge.to.as_str()).or_default() += 1;
    }

    let mut adjacency: BTreeMap<String, BTreeSet<String>> = snapshot
      .nodes
      .iter()
      .filter(|n| !(n.kind == NodeKind::Column && degree.get(n.key.as_str()) == Some(&1)))
      .map(|n| (n.key.clone(), BTreeSet::new()))
      .collect();

    let mut edge_types = BTreeMap::new();
    for edge in &snapshot.edges {
      if !(adjacency.contains_key(&edge.from) && adjacency.contains_key(&edge.to)) {
        continue;
      }
      if let Some(n) = adjacency.get_mut(&edge.from) {
        n.insert(edge.to.clone());
      }
      if let Some(n) = adjacency.get_mut(&edge.to) {
        n.insert(edge.from.clone());
      }
      edge_types.insert(EdgeKey::new(edge.from.as_str(), edge.to.as_str()), edge.kind);
    }

    Self {
      adjacency: adjacency
        .into_iter()
        .map(|(k, n)| (k, n.into_iter().collect()))
        .collect(),
      edge_types,
    }
  }

  pub fn is_empty(&self) -> bool { self.adjacency.is_empty() }

  pub fn node_count(&self) -> usize { self.adjacency.len() }

  pub fn edge_count(&self) -> usize { self.edge_types.len() }

  pub fn contains(&self, node: &str) -> bool { self.adjacency.contains_key(node) }

  /// The graph's own copy of `node`, borrowed for the graph's lifetime.
  pub fn resolve(&self, node: &str) -> Option<&str> {
    self.adjacency.get_key_value(node).map(|(k, _)| k.as_str())
  }

  /// Nodes in sorted order.
  pub fn nodes(&self) -> impl Iterator<Item = &str> { self.adjacency.keys().map(String::as_str) }

  /// Sorted neighbours of `node`; empty for unknown nodes.
  pub fn neighbors(&self, node: &str) -> &[String] {
    self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn edge_kind(&self, a: &str, b: &str) -> Option<EdgeKind> {
    self.edge_types.get(&EdgeKey::new(a, b)).copied()
  }

  pub fn edge_types(&self) -> &BTreeMap<EdgeKey, EdgeKind> { &self.edge_types }

  pub fn typed_edges(&self) -> Vec<TypedEdge> {
    self
      .edge_types
      .iter()
      .map(|(key, kind)| {
        let (a, b) = key.endpoints();
        TypedEdge { a: a.to_owned(), b: b.to_owned(), kind: *kind }
      })
      .collect()
  }

  /// Connected components under undirected reachability, each seeded from
  /// its smallest node, listed in seed order.
  pub fn connected_components(&self) -> Vec<BTreeSet<String>> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut components = Vec::new();

    for start in self.nodes() {
      if visited.contains(start) {
        continue;
      }
      let mut component = BTreeSet::new();
      let mut stack = vec![start];
      while let Some(node) = stack.pop() {
        if !visited.insert(node) {
          continue;
        }
        component.insert(node.to_owned());
        stack.extend(
          self
            .neighbors(node)
            .iter()
            .map(String::as_str)
            .filter(|n| !visited.contains(n)),
        );
      }
      components.push(component);
    }

    components
  }
}

/// Fetch `db_id` from the store and build its trimmed graph. An unknown
/// database yields an empty graph.
pub async fn load_graph<S>(store: &S, db_id: &str) -> Result<SchemaGraph, S::Error>
where
  S: SchemaGraphStore,
{
  let snapshot = store.fetch_graph(db_id).await?;
  let graph = SchemaGraph::trimmed(&snapshot);
  tracing::debug!(
    db_id,
    raw_nodes = snapshot.nodes.len(),
    raw_edges = snapshot.edges.len(),
    nodes = graph.node_count(),
    edges = graph.edge_count(),
    "loaded trimmed schema graph"
  );
  Ok(graph)
}
