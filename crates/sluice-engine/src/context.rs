//! Run-scoped execution state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde_json::{Map, Value};
use sluice_flow::Node;
use sluice_processor::{LogEntry, NodeInput};

use crate::error::ContextError;

#[derive(Debug, Default)]
struct Results {
  outputs: HashMap<String, Value>,
  errors: HashMap<String, String>,
}

/// State shared by all nodes of one run.
///
/// Outputs and errors are write-once per node and mutually exclusive; the
/// log is append-only. Safe to record into from concurrent tasks.
#[derive(Debug, Default)]
pub struct ExecutionContext {
  variables: Map<String, Value>,
  results: RwLock<Results>,
  log: Mutex<Vec<LogEntry>>,
}

impl ExecutionContext {
  pub fn new(variables: Map<String, Value>) -> Self {
    Self {
      variables,
      ..Default::default()
    }
  }

  pub fn variables(&self) -> &Map<String, Value> {
    &self.variables
  }

  /// Record a successful node and append its log entries.
  pub fn record_success(
    &self,
    node_id: &str,
    output: Value,
    logs: Vec<LogEntry>,
  ) -> Result<(), ContextError> {
    {
      let mut results = self.results.write().unwrap();
      Self::check_unrecorded(&results, node_id)?;
      results.outputs.insert(node_id.to_string(), output);
    }
    self.extend_log(logs);
    Ok(())
  }

  /// Record a failed node and append its log entries.
  pub fn record_error(
    &self,
    node_id: &str,
    message: impl Into<String>,
    logs: Vec<LogEntry>,
  ) -> Result<(), ContextError> {
    {
      let mut results = self.results.write().unwrap();
      Self::check_unrecorded(&results, node_id)?;
      results.errors.insert(node_id.to_string(), message.into());
    }
    self.extend_log(logs);
    Ok(())
  }

  pub fn append_log(&self, entry: LogEntry) {
    self.log.lock().unwrap().push(entry);
  }

  fn extend_log(&self, entries: Vec<LogEntry>) {
    self.log.lock().unwrap().extend(entries);
  }

  fn check_unrecorded(results: &Results, node_id: &str) -> Result<(), ContextError> {
    if results.outputs.contains_key(node_id) || results.errors.contains_key(node_id) {
      return Err(ContextError::AlreadyRecorded {
        node_id: node_id.to_string(),
      });
    }
    Ok(())
  }

  pub fn output(&self, node_id: &str) -> Option<Value> {
    self.results.read().unwrap().outputs.get(node_id).cloned()
  }

  pub fn error(&self, node_id: &str) -> Option<String> {
    self.results.read().unwrap().errors.get(node_id).cloned()
  }

  pub fn has_executed(&self, node_id: &str) -> bool {
    let results = self.results.read().unwrap();
    results.outputs.contains_key(node_id) || results.errors.contains_key(node_id)
  }

  pub fn succeeded(&self, node_id: &str) -> bool {
    self.results.read().unwrap().outputs.contains_key(node_id)
  }

  pub fn executed_count(&self) -> usize {
    let results = self.results.read().unwrap();
    results.outputs.len() + results.errors.len()
  }

  pub fn error_count(&self) -> usize {
    self.results.read().unwrap().errors.len()
  }

  /// Snapshot of the log so far.
  pub fn log(&self) -> Vec<LogEntry> {
    self.log.lock().unwrap().clone()
  }

  /// Take the log out of the context, leaving it empty.
  pub fn take_log(&self) -> Vec<LogEntry> {
    std::mem::take(&mut *self.log.lock().unwrap())
  }

  /// Build the input every processor of the next wave sees: the variables
  /// and all outputs so far, ordered like `nodes`.
  pub fn node_input(&self, nodes: &[Arc<Node>]) -> NodeInput {
    let results = self.results.read().unwrap();
    let outputs = nodes
      .iter()
      .filter_map(|node| {
        results
          .outputs
          .get(&node.node_id)
          .map(|output| (node.node_id.clone(), output.clone()))
      })
      .collect();
    NodeInput::new(self.variables.clone(), outputs)
  }
}
