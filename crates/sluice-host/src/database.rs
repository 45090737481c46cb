use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRequest {
  /// Operation name understood by the accessor (`query`, `insert`, ...).
  pub operation: String,
  /// Table, collection or statement the operation applies to.
  pub target: String,
  #[serde(default)]
  pub params: serde_json::Value,
}

/// Generic database accessor.
#[async_trait]
pub trait DatabaseAccessor: Send + Sync {
  async fn execute(&self, request: DatabaseRequest) -> Result<serde_json::Value, HostError>;
}
