use sluice_store::StoreError;
use thiserror::Error;

/// Violations of the execution context's write-once rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
  /// The node already has an output or an error recorded.
  #[error("node '{node_id}' already has a recorded result")]
  AlreadyRecorded { node_id: String },
}

/// Errors surfaced by [`FlowRunner`](crate::FlowRunner). A run itself never
/// fails with an error; its outcome is part of the result.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The runner's trigger channel is closed.
  #[error("flow runner channel closed")]
  ChannelClosed,

  /// The finished run could not be persisted.
  #[error("failed to persist run: {0}")]
  Store(#[from] StoreError),
}
