use serde::{Deserialize, Serialize};

/// A directed dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub edge_id: String,
  pub from: String,
  pub to: String,
  /// Condition evaluated against the source node's output when traversed.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub guard: Option<String>,
  /// Edge-local settings. Opaque to the scheduler.
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub config: serde_json::Value,
}

impl EdgeDef {
  pub fn new(edge_id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      edge_id: edge_id.into(),
      from: from.into(),
      to: to.into(),
      guard: None,
      config: serde_json::Value::Null,
    }
  }

  pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
    self.guard = Some(guard.into());
    self
  }
}
