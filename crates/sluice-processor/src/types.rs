use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_flow::Node;

/// Severity of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
  Info,
  Warning,
  Error,
  Success,
}

/// One entry of a run's audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  /// Empty for engine-level entries.
  pub node_id: String,
  pub node_label: String,
  pub level: LogLevel,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<serde_json::Value>,
}

impl LogEntry {
  /// An entry not tied to any node.
  pub fn engine(level: LogLevel, message: impl Into<String>) -> Self {
    Self {
      timestamp: Utc::now(),
      node_id: String::new(),
      node_label: String::new(),
      level,
      message: message.into(),
      data: None,
    }
  }

  pub fn with_data(mut self, data: serde_json::Value) -> Self {
    self.data = Some(data);
    self
  }
}

/// Result of executing one node.
///
/// `output` is present iff `success`, `error` iff not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionResult {
  pub node_id: String,
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub duration_ms: u64,
  pub logs: Vec<LogEntry>,
}

impl NodeExecutionResult {
  pub fn success(
    node_id: impl Into<String>,
    output: serde_json::Value,
    duration_ms: u64,
    logs: Vec<LogEntry>,
  ) -> Self {
    Self {
      node_id: node_id.into(),
      success: true,
      output: Some(output),
      error: None,
      duration_ms,
      logs,
    }
  }

  pub fn failure(
    node_id: impl Into<String>,
    error: impl Into<String>,
    duration_ms: u64,
    logs: Vec<LogEntry>,
  ) -> Self {
    Self {
      node_id: node_id.into(),
      success: false,
      output: None,
      error: Some(error.into()),
      duration_ms,
      logs,
    }
  }
}

/// Collects log entries while a node executes.
#[derive(Debug, Clone)]
pub struct NodeLog {
  node_id: String,
  node_label: String,
  entries: Vec<LogEntry>,
}

impl NodeLog {
  pub fn new(node: &Node) -> Self {
    Self::for_node(&node.node_id, &node.label)
  }

  pub fn for_node(node_id: impl Into<String>, node_label: impl Into<String>) -> Self {
    Self {
      node_id: node_id.into(),
      node_label: node_label.into(),
      entries: Vec::new(),
    }
  }

  pub fn push(
    &mut self,
    level: LogLevel,
    message: impl Into<String>,
    data: Option<serde_json::Value>,
  ) {
    self.entries.push(LogEntry {
      timestamp: Utc::now(),
      node_id: self.node_id.clone(),
      node_label: self.node_label.clone(),
      level,
      message: message.into(),
      data,
    });
  }

  pub fn info(&mut self, message: impl Into<String>) {
    self.push(LogLevel::Info, message, None);
  }

  pub fn warning(&mut self, message: impl Into<String>) {
    self.push(LogLevel::Warning, message, None);
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.push(LogLevel::Error, message, None);
  }

  pub fn success(&mut self, message: impl Into<String>, data: Option<serde_json::Value>) {
    self.push(LogLevel::Success, message, data);
  }

  pub fn entries(&self) -> &[LogEntry] {
    &self.entries
  }

  pub fn into_entries(self) -> Vec<LogEntry> {
    self.entries
  }
}
