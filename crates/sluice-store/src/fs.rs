use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::{RunRecord, RunStore, StoreError};

/// Filesystem-based run store.
///
/// Runs are stored as JSON, grouped by flow:
/// ```text
/// {root}/
/// ├── onboarding/
/// │   ├── 5c1e....json
/// │   └── 9a07....json
/// └── nightly-report/
///     └── 0d4b....json
/// ```
pub struct FsRunStore {
  root: PathBuf,
}

impl FsRunStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn run_path(&self, flow_id: &str, execution_id: &str) -> PathBuf {
    self
      .root
      .join(flow_id)
      .join(format!("{}.json", execution_id))
  }

  async fn read_run(path: &Path) -> Result<RunRecord, StoreError> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
  }
}

fn check_component(kind: &str, value: &str) -> Result<(), StoreError> {
  if value.is_empty() || value.contains(['/', '\\']) || value == "." || value == ".." {
    return Err(StoreError::InvalidId(format!("{} '{}'", kind, value)));
  }
  Ok(())
}

#[async_trait]
impl RunStore for FsRunStore {
  async fn save_run(&self, run: &RunRecord) -> Result<(), StoreError> {
    check_component("flow id", &run.flow_id)?;
    check_component("execution id", &run.execution_id)?;

    let path = self.run_path(&run.flow_id, &run.execution_id);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(run)?;
    fs::write(&path, json).await?;
    debug!(path = %path.display(), "saved run");
    Ok(())
  }

  async fn get_run(&self, execution_id: &str) -> Result<RunRecord, StoreError> {
    check_component("execution id", execution_id)?;
    if !fs::try_exists(&self.root).await? {
      return Err(StoreError::NotFound(execution_id.to_string()));
    }

    let file_name = format!("{}.json", execution_id);
    let mut flows = fs::read_dir(&self.root).await?;
    while let Some(entry) = flows.next_entry().await? {
      let path = entry.path().join(&file_name);
      if fs::metadata(&path).await.is_ok_and(|meta| meta.is_file()) {
        return Self::read_run(&path).await;
      }
    }
    Err(StoreError::NotFound(execution_id.to_string()))
  }

  async fn list_runs(&self, flow_id: &str) -> Result<Vec<RunRecord>, StoreError> {
    check_component("flow id", flow_id)?;
    let dir = self.root.join(flow_id);
    if !fs::try_exists(&dir).await? {
      return Ok(Vec::new());
    }

    let mut runs = Vec::new();
    let mut entries = fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if path.extension().is_some_and(|ext| ext == "json") {
        runs.push(Self::read_run(&path).await?);
      }
    }
    runs.sort_by_key(|r| r.started_at);
    Ok(runs)
  }
}
