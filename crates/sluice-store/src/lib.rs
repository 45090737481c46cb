//! Sluice Store
//!
//! Storage for finished runs. The engine hands each finished run to a
//! [`RunStore`] and knows nothing about where it ends up.
//!
//! Implementations:
//! - [`MemoryRunStore`] for tests and one-shot runs
//! - [`FsRunStore`] for JSON files on disk

mod fs;
mod memory;
mod types;

pub use fs::FsRunStore;
pub use memory::MemoryRunStore;
pub use types::{NodeRecord, NodeStatus, RunRecord, RunStatus};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested run was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// An id cannot be used as a storage key.
  #[error("invalid {0}")]
  InvalidId(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Storage trait for run history.
#[async_trait]
pub trait RunStore: Send + Sync {
  /// Save a finished run, replacing any run with the same execution id.
  async fn save_run(&self, run: &RunRecord) -> Result<(), StoreError>;

  /// Get a run by execution id.
  async fn get_run(&self, execution_id: &str) -> Result<RunRecord, StoreError>;

  /// List runs of a flow, oldest first.
  async fn list_runs(&self, flow_id: &str) -> Result<Vec<RunRecord>, StoreError>;
}
