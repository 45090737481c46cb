use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::HostError;

/// File access for file integrations.
#[async_trait]
pub trait FileAccessor: Send + Sync {
  async fn read(&self, path: &str) -> Result<String, HostError>;

  /// Write `content`, replacing the file. Returns bytes written.
  async fn write(&self, path: &str, content: &str) -> Result<usize, HostError>;

  /// Append `content`, creating the file when missing. Returns bytes written.
  async fn append(&self, path: &str, content: &str) -> Result<usize, HostError>;

  async fn delete(&self, path: &str) -> Result<(), HostError>;
}

/// Filesystem-based file accessor.
///
/// Every path is resolved relative to `base_path`. Absolute paths and `..`
/// components are rejected. Parent directories are created on write.
pub struct FsFileAccessor {
  base_path: PathBuf,
}

impl FsFileAccessor {
  /// Create a new accessor rooted at the given base path.
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  pub fn base_path(&self) -> &Path {
    &self.base_path
  }

  fn resolve(&self, path: &str) -> Result<PathBuf, HostError> {
    let relative = Path::new(path);
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.trim().is_empty() {
      return Err(HostError::PathEscape {
        path: path.to_string(),
      });
    }
    Ok(self.base_path.join(relative))
  }
}

#[async_trait]
impl FileAccessor for FsFileAccessor {
  async fn read(&self, path: &str) -> Result<String, HostError> {
    let full = self.resolve(path)?;
    fs::read_to_string(&full).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        HostError::NotFound(path.to_string())
      } else {
        HostError::Io(e)
      }
    })
  }

  async fn write(&self, path: &str, content: &str) -> Result<usize, HostError> {
    let full = self.resolve(path)?;
    if let Some(parent) = full.parent() {
      fs::create_dir_all(parent).await?;
    }
    fs::write(&full, content.as_bytes()).await?;
    Ok(content.len())
  }

  async fn append(&self, path: &str, content: &str) -> Result<usize, HostError> {
    let full = self.resolve(path)?;
    if let Some(parent) = full.parent() {
      fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&full)
      .await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(content.len())
  }

  async fn delete(&self, path: &str) -> Result<(), HostError> {
    let full = self.resolve(path)?;
    fs::remove_file(&full).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        HostError::NotFound(path.to_string())
      } else {
        HostError::Io(e)
      }
    })
  }
}
