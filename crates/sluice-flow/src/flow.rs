use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sluice_config::{EdgeDef, FlowDef, NodeDef, NodeKind};

use crate::error::FlowError;
use crate::graph::Graph;

/// A node in a validated flow. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub node_id: String,
  pub label: String,
  pub kind: NodeKind,
  pub timeout_ms: Option<u64>,
}

impl From<NodeDef> for Node {
  fn from(def: NodeDef) -> Self {
    let label = if def.label.is_empty() {
      def.node_id.clone()
    } else {
      def.label
    };
    Self {
      node_id: def.node_id,
      label,
      kind: def.kind,
      timeout_ms: def.timeout_ms,
    }
  }
}

/// A directed, optionally guarded dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
  pub edge_id: String,
  pub from: String,
  pub to: String,
  pub guard: Option<String>,
  pub config: serde_json::Value,
}

impl From<EdgeDef> for Edge {
  fn from(def: EdgeDef) -> Self {
    // Blank guards behave like no guard at all.
    let guard = def.guard.filter(|g| !g.trim().is_empty());
    Self {
      edge_id: def.edge_id,
      from: def.from,
      to: def.to,
      guard,
      config: def.config,
    }
  }
}

/// A validated flow ready for execution.
#[derive(Debug, Clone)]
pub struct Flow {
  pub flow_id: String,
  pub name: String,
  pub max_iterations: Option<u32>,
  nodes: Vec<Arc<Node>>,
  edges: Vec<Edge>,
  positions: HashMap<String, usize>,
  graph: Graph,
}

impl Flow {
  /// Validate a flow definition.
  ///
  /// Cycles are accepted here; whether a cyclic flow may run is an engine
  /// decision (see [`Graph::find_cycle`]).
  pub fn from_def(def: FlowDef) -> Result<Self, FlowError> {
    let mut positions = HashMap::with_capacity(def.nodes.len());
    for (idx, node) in def.nodes.iter().enumerate() {
      if positions.insert(node.node_id.clone(), idx).is_some() {
        return Err(FlowError::DuplicateNodeId {
          node_id: node.node_id.clone(),
        });
      }
    }

    let mut edge_ids = HashSet::with_capacity(def.edges.len());
    for edge in &def.edges {
      if !edge_ids.insert(edge.edge_id.as_str()) {
        return Err(FlowError::DuplicateEdgeId {
          edge_id: edge.edge_id.clone(),
        });
      }
      for endpoint in [&edge.from, &edge.to] {
        if !positions.contains_key(endpoint) {
          return Err(FlowError::InvalidEdge {
            edge_id: edge.edge_id.clone(),
            node_id: endpoint.clone(),
          });
        }
      }
    }

    let nodes: Vec<Arc<Node>> = def
      .nodes
      .into_iter()
      .map(|n| Arc::new(Node::from(n)))
      .collect();
    let edges: Vec<Edge> = def.edges.into_iter().map(Edge::from).collect();
    let node_ids: Vec<String> = nodes.iter().map(|n| n.node_id.clone()).collect();
    let graph = Graph::new(&node_ids, &edges);

    Ok(Self {
      flow_id: def.flow_id,
      name: def.name,
      max_iterations: def.max_iterations,
      nodes,
      edges,
      positions,
      graph,
    })
  }

  /// Nodes in declaration order.
  pub fn nodes(&self) -> &[Arc<Node>] {
    &self.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  pub fn edge(&self, idx: usize) -> &Edge {
    &self.edges[idx]
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Arc<Node>> {
    self.positions.get(node_id).map(|&idx| &self.nodes[idx])
  }

  /// Declaration index of a node.
  pub fn position(&self, node_id: &str) -> Option<usize> {
    self.positions.get(node_id).copied()
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}
