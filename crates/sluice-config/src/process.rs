use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{AggregateOperation, FileOperation};

/// Configuration of a process node, dispatched by `process_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "process_type", rename_all = "snake_case")]
pub enum ProcessConfig {
  Task(TaskConfig),
  Automation(AutomationConfig),
  Integration(IntegrationConfig),
  /// Marks an event inside the flow and forwards its input.
  Trigger {
    #[serde(default)]
    event: String,
  },
  /// Evaluates `condition` and returns one of two payloads.
  Rule {
    condition: String,
    #[serde(default)]
    true_output: serde_json::Value,
    #[serde(default)]
    false_output: serde_json::Value,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "snake_case")]
pub enum TaskConfig {
  /// Returns the merged input unchanged.
  PassThrough,
  /// Builds a new object: each key is an output field, each value a dot path
  /// into the merged input (or a literal when it does not resolve).
  Transform { mapping: BTreeMap<String, String> },
  /// Keeps the items of the array at `source` for which `condition` holds.
  /// Item fields are addressable as `${item.field}`.
  Filter { source: String, condition: String },
  /// Reduces the array at `source`, optionally over one numeric `field`.
  Aggregate {
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    operation: AggregateOperation,
  },
  /// Sleeps, then passes the input through.
  Delay { duration_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "automation_type", rename_all = "snake_case")]
pub enum AutomationConfig {
  Webhook {
    url: String,
    #[serde(default = "default_post")]
    method: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    /// Request body. `null` sends the merged input.
    #[serde(default)]
    body: serde_json::Value,
  },
  Email {
    to: String,
    subject: String,
    #[serde(default)]
    body: String,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "integration_type", rename_all = "snake_case")]
pub enum IntegrationConfig {
  Api {
    url: String,
    #[serde(default = "default_get")]
    method: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: serde_json::Value,
  },
  Database {
    operation: String,
    target: String,
    #[serde(default)]
    params: serde_json::Value,
  },
  File {
    operation: FileOperation,
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
  },
}

fn default_post() -> String {
  "POST".to_string()
}

fn default_get() -> String {
  "GET".to_string()
}
