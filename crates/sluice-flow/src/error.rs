use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("duplicate node id: {node_id}")]
  DuplicateNodeId { node_id: String },

  #[error("duplicate edge id: {edge_id}")]
  DuplicateEdgeId { edge_id: String },

  #[error("edge '{edge_id}' references unknown node '{node_id}'")]
  InvalidEdge { edge_id: String, node_id: String },
}
