use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{RunRecord, RunStore, StoreError};

/// In-memory run store. Contents are lost when dropped.
#[derive(Default)]
pub struct MemoryRunStore {
  runs: RwLock<HashMap<String, RunRecord>>,
}

impl MemoryRunStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl RunStore for MemoryRunStore {
  async fn save_run(&self, run: &RunRecord) -> Result<(), StoreError> {
    let mut runs = self.runs.write().unwrap();
    runs.insert(run.execution_id.clone(), run.clone());
    Ok(())
  }

  async fn get_run(&self, execution_id: &str) -> Result<RunRecord, StoreError> {
    let runs = self.runs.read().unwrap();
    runs
      .get(execution_id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(execution_id.to_string()))
  }

  async fn list_runs(&self, flow_id: &str) -> Result<Vec<RunRecord>, StoreError> {
    let runs = self.runs.read().unwrap();
    let mut matching: Vec<RunRecord> = runs
      .values()
      .filter(|r| r.flow_id == flow_id)
      .cloned()
      .collect();
    matching.sort_by_key(|r| r.started_at);
    Ok(matching)
  }
}
