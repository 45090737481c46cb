//! Execution events and notifiers for observability.
//!
//! Events are emitted during a run so consumers can observe progress,
//! stream it to a UI, or persist it incrementally.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::RunOutcome;

/// Events emitted during flow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  RunStarted {
    execution_id: String,
    flow_id: String,
  },

  /// A wave of ready nodes is about to be dispatched.
  WaveStarted {
    execution_id: String,
    wave: u32,
    node_ids: Vec<String>,
  },

  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  NodeCompleted {
    execution_id: String,
    node_id: String,
    output: serde_json::Value,
  },

  NodeFailed {
    execution_id: String,
    node_id: String,
    error: String,
  },

  RunFinished {
    execution_id: String,
    outcome: RunOutcome,
    success: bool,
  },
}

/// Receives execution events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them. `notify` must not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a wave.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
