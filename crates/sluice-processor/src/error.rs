use sluice_host::HostError;
use thiserror::Error;

/// Errors that make a node fail. Never escapes a run; the engine records
/// the message as the node's error.
#[derive(Debug, Error)]
pub enum ProcessorError {
  /// A collaborator the node needs was not provided.
  #[error("no {name} configured")]
  MissingCollaborator { name: &'static str },

  /// The referenced agent does not exist.
  #[error("agent not found: {agent_id}")]
  AgentNotFound { agent_id: String },

  /// Invalid input value.
  #[error("invalid input '{field}': {message}")]
  InvalidInput { field: String, message: String },

  /// Prompt template could not be rendered.
  #[error("template error: {0}")]
  Template(#[from] minijinja::Error),

  /// The remote side answered with a non-success status.
  #[error("remote returned status {status}")]
  RemoteStatus { status: u16, body: serde_json::Value },

  /// Collaborator call failed.
  #[error(transparent)]
  Host(#[from] HostError),
}

impl ProcessorError {
  pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::InvalidInput {
      field: field.into(),
      message: message.into(),
    }
  }
}
