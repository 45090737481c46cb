use std::collections::{HashMap, HashSet};

use crate::flow::Edge;

/// Graph structure for traversal and analysis.
///
/// Edges are referenced by their index in the flow's edge list so callers can
/// reach guards and edge configuration.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Node ids in declaration order.
  order: Vec<String>,
  /// node_id -> indices of edges leaving it.
  outgoing: HashMap<String, Vec<usize>>,
  /// node_id -> indices of edges entering it.
  incoming: HashMap<String, Vec<usize>>,
  /// node_id -> distinct downstream node ids.
  adjacency: HashMap<String, Vec<String>>,
  /// node_id -> distinct upstream node ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Nodes with no incoming edges.
  entry_points: Vec<String>,
  /// Nodes with no outgoing edges.
  sink_nodes: Vec<String>,
  /// Nodes with more than one incoming edge.
  join_points: HashSet<String>,
}

impl Graph {
  /// Build a graph from node ids (in declaration order) and edges.
  pub fn new(node_ids: &[String], edges: &[Edge]) -> Self {
    let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
    let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for node_id in node_ids {
      outgoing.entry(node_id.clone()).or_default();
      incoming.entry(node_id.clone()).or_default();
      adjacency.entry(node_id.clone()).or_default();
      reverse_adjacency.entry(node_id.clone()).or_default();
    }

    for (idx, edge) in edges.iter().enumerate() {
      outgoing.entry(edge.from.clone()).or_default().push(idx);
      incoming.entry(edge.to.clone()).or_default().push(idx);

      let downstream = adjacency.entry(edge.from.clone()).or_default();
      if !downstream.contains(&edge.to) {
        downstream.push(edge.to.clone());
      }
      let upstream = reverse_adjacency.entry(edge.to.clone()).or_default();
      if !upstream.contains(&edge.from) {
        upstream.push(edge.from.clone());
      }
    }

    let entry_points: Vec<String> = node_ids
      .iter()
      .filter(|id| incoming.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    let sink_nodes: Vec<String> = node_ids
      .iter()
      .filter(|id| outgoing.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    let join_points: HashSet<String> = incoming
      .iter()
      .filter(|(_, edges)| edges.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    Self {
      order: node_ids.to_vec(),
      outgoing,
      incoming,
      adjacency,
      reverse_adjacency,
      entry_points,
      sink_nodes,
      join_points,
    }
  }

  /// Get entry points (nodes with no incoming edges).
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Get sink nodes (nodes with no outgoing edges).
  pub fn sink_nodes(&self) -> &[String] {
    &self.sink_nodes
  }

  pub fn is_sink(&self, node_id: &str) -> bool {
    self.outgoing.get(node_id).is_none_or(|v| v.is_empty())
  }

  /// Indices of edges entering a node.
  pub fn incoming_edges(&self, node_id: &str) -> &[usize] {
    self
      .incoming
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Indices of edges leaving a node.
  pub fn outgoing_edges(&self, node_id: &str) -> &[usize] {
    self
      .outgoing
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a node is a join point (has multiple incoming edges).
  pub fn is_join_point(&self, node_id: &str) -> bool {
    self.join_points.contains(node_id)
  }

  /// Find a cycle using DFS.
  ///
  /// Returns the node ids along the first cycle found, starting and ending
  /// with the same node (e.g. `[a, b, a]`).
  pub fn find_cycle(&self) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
      White,
      Gray,
      Black,
    }

    fn dfs<'a>(
      node: &'a str,
      adjacency: &'a HashMap<String, Vec<String>>,
      color: &mut HashMap<&'a str, Color>,
      path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
      color.insert(node, Color::Gray);
      path.push(node);

      for neighbor in adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[]) {
        match color.get(neighbor.as_str()).copied().unwrap_or(Color::White) {
          // Back edge = cycle
          Color::Gray => {
            let start = path.iter().position(|n| *n == neighbor.as_str()).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(neighbor.clone());
            return Some(cycle);
          }
          Color::White => {
            if let Some(cycle) = dfs(neighbor, adjacency, color, path) {
              return Some(cycle);
            }
          }
          Color::Black => {}
        }
      }

      path.pop();
      color.insert(node, Color::Black);
      None
    }

    let mut color: HashMap<&str, Color> = HashMap::new();
    for node_id in &self.order {
      if color.get(node_id.as_str()).copied().unwrap_or(Color::White) == Color::White {
        let mut path = Vec::new();
        if let Some(cycle) = dfs(node_id, &self.adjacency, &mut color, &mut path) {
          return Some(cycle);
        }
      }
    }

    None
  }
}
