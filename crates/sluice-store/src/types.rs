use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_processor::LogEntry;

/// Terminal status of a stored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Completed,
  Blocked,
  Aborted,
  Cancelled,
}

/// Status of one node within a stored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  Succeeded,
  Failed,
  /// Never became ready.
  Blocked,
}

/// A finished run as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
  pub execution_id: String,
  pub flow_id: String,
  pub status: RunStatus,
  pub success: bool,
  pub final_output: serde_json::Value,
  pub started_at: DateTime<Utc>,
  pub completed_at: DateTime<Utc>,
  pub duration_ms: u64,
  pub nodes: Vec<NodeRecord>,
  pub log: Vec<LogEntry>,
}

/// One node of a stored run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
  pub node_id: String,
  pub status: NodeStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub duration_ms: u64,
}
