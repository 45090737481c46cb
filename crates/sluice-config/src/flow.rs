use serde::{Deserialize, Serialize};

use crate::edge::EdgeDef;
use crate::node::NodeDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDef {
  pub flow_id: String,
  pub name: String,
  /// Overrides the engine's wave cap for this flow.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_iterations: Option<u32>,
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
}
