use serde::{Deserialize, Serialize};

use crate::enums::TriggerType;
use crate::process::{IntegrationConfig, ProcessConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub node_id: String,
  #[serde(default)]
  pub label: String,
  #[serde(flatten)]
  pub kind: NodeKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}

impl NodeDef {
  pub fn new(node_id: impl Into<String>, kind: NodeKind) -> Self {
    let node_id = node_id.into();
    Self {
      label: node_id.clone(),
      node_id,
      kind,
      timeout_ms: None,
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = label.into();
    self
  }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
  /// Delegates to a language model using an externally defined agent.
  Agent {
    /// Identifier of the agent definition in the agent registry.
    agent_id: String,
  },
  /// Runs a built-in task, automation, integration, trigger or rule.
  Process { process: ProcessConfig },
  /// Evaluates an expression and emits one of two payloads.
  Condition {
    expression: String,
    #[serde(default)]
    true_output: serde_json::Value,
    #[serde(default)]
    false_output: serde_json::Value,
  },
  /// Entry point of a flow. Emits the run variables merged with its payload.
  Trigger {
    #[serde(default)]
    trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    payload: serde_json::Value,
  },
  /// Talks to an external API, database or file store.
  Integration { integration: IntegrationConfig },
}

impl NodeKind {
  /// Short name used in logs.
  pub fn name(&self) -> &'static str {
    match self {
      NodeKind::Agent { .. } => "agent",
      NodeKind::Process { .. } => "process",
      NodeKind::Condition { .. } => "condition",
      NodeKind::Trigger { .. } => "trigger",
      NodeKind::Integration { .. } => "integration",
    }
  }
}
