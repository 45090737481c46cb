use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_processor::{LogEntry, NodeExecutionResult};
use sluice_store::{NodeRecord, NodeStatus, RunRecord, RunStatus};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
  /// No node is left to run. The run may still have failed nodes.
  Completed,
  /// Some nodes can never become ready.
  Blocked,
  /// The flow was rejected as cyclic or hit the wave cap.
  Aborted,
  Cancelled,
}

impl fmt::Display for RunOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      RunOutcome::Completed => "completed",
      RunOutcome::Blocked => "blocked",
      RunOutcome::Aborted => "aborted",
      RunOutcome::Cancelled => "cancelled",
    };
    f.write_str(name)
  }
}

/// Result of a complete run.
///
/// A node absent from `node_results` never ran: it is listed in
/// `blocked_nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
  pub execution_id: String,
  pub flow_id: String,
  /// True iff every node ran and none failed.
  pub success: bool,
  pub outcome: RunOutcome,
  /// Outputs of successful sink nodes keyed by node id, in declaration order.
  pub final_output: serde_json::Value,
  pub log: Vec<LogEntry>,
  /// One result per executed node, in execution order.
  pub node_results: Vec<NodeExecutionResult>,
  pub blocked_nodes: Vec<String>,
  pub started_at: DateTime<Utc>,
  pub duration_ms: u64,
}

impl RunResult {
  pub fn node_result(&self, node_id: &str) -> Option<&NodeExecutionResult> {
    self.node_results.iter().find(|r| r.node_id == node_id)
  }

  /// Ids of executed nodes, in execution order.
  pub fn executed_nodes(&self) -> Vec<&str> {
    self
      .node_results
      .iter()
      .map(|r| r.node_id.as_str())
      .collect()
  }

  pub fn failed_nodes(&self) -> Vec<&str> {
    self
      .node_results
      .iter()
      .filter(|r| !r.success)
      .map(|r| r.node_id.as_str())
      .collect()
  }

  /// The record handed to a [`RunStore`](sluice_store::RunStore).
  pub fn to_record(&self) -> RunRecord {
    let status = match self.outcome {
      RunOutcome::Completed => RunStatus::Completed,
      RunOutcome::Blocked => RunStatus::Blocked,
      RunOutcome::Aborted => RunStatus::Aborted,
      RunOutcome::Cancelled => RunStatus::Cancelled,
    };

    let executed = self.node_results.iter().map(|r| NodeRecord {
      node_id: r.node_id.clone(),
      status: if r.success {
        NodeStatus::Succeeded
      } else {
        NodeStatus::Failed
      },
      output: r.output.clone(),
      error: r.error.clone(),
      duration_ms: r.duration_ms,
    });
    let blocked = self.blocked_nodes.iter().map(|id| NodeRecord {
      node_id: id.clone(),
      status: NodeStatus::Blocked,
      output: None,
      error: None,
      duration_ms: 0,
    });

    RunRecord {
      execution_id: self.execution_id.clone(),
      flow_id: self.flow_id.clone(),
      status,
      success: self.success,
      final_output: self.final_output.clone(),
      started_at: self.started_at,
      completed_at: self.started_at + chrono::Duration::milliseconds(self.duration_ms as i64),
      duration_ms: self.duration_ms,
      nodes: executed.chain(blocked).collect(),
      log: self.log.clone(),
    }
  }
}
