use thiserror::Error;

/// Errors returned by collaborators (model providers, HTTP, files, etc.).
#[derive(Debug, Error)]
pub enum HostError {
  /// The request could not be built from the node's configuration.
  #[error("invalid request: {message}")]
  InvalidRequest { message: String },

  /// HTTP transport failed.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Filesystem access failed.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A payload could not be (de)serialized.
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The requested item does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// A file path resolved outside the accessor's root.
  #[error("path '{path}' escapes the configured root")]
  PathEscape { path: String },

  /// The remote side answered with an error.
  #[error("provider error: {message}")]
  Provider { message: String },
}

impl HostError {
  pub fn invalid_request(message: impl Into<String>) -> Self {
    Self::InvalidRequest {
      message: message.into(),
    }
  }

  pub fn provider(message: impl Into<String>) -> Self {
    Self::Provider {
      message: message.into(),
    }
  }
}
