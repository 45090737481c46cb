use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::HostError;

/// An agent definition referenced by agent nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
  pub agent_id: String,
  #[serde(default)]
  pub name: String,
  /// Empty means the processor's default model.
  #[serde(default)]
  pub model: String,
  /// System instruction sent with every prompt.
  #[serde(default)]
  pub system_prompt: String,
  /// minijinja template for the user prompt. `input`, `nodes` and
  /// `variables` are available. Defaults to the pretty-printed input.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub prompt_template: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
}

/// Lookup of agent definitions.
#[async_trait]
pub trait AgentRegistry: Send + Sync {
  /// Get an agent by id. Returns `Ok(None)` when it is not registered.
  async fn get(&self, agent_id: &str) -> Result<Option<AgentDefinition>, HostError>;
}

/// In-memory agent registry.
#[derive(Default)]
pub struct MemoryAgentRegistry {
  agents: RwLock<HashMap<String, AgentDefinition>>,
}

impl MemoryAgentRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, agent: AgentDefinition) {
    let mut agents = self.agents.write().unwrap();
    agents.insert(agent.agent_id.clone(), agent);
  }
}

#[async_trait]
impl AgentRegistry for MemoryAgentRegistry {
  async fn get(&self, agent_id: &str) -> Result<Option<AgentDefinition>, HostError> {
    let agents = self.agents.read().unwrap();
    Ok(agents.get(agent_id).cloned())
  }
}

/// Filesystem-based agent registry.
///
/// Agents are stored one per file:
/// ```text
/// {root}/
/// ├── summarizer.json
/// └── classifier.json
/// ```
pub struct FsAgentRegistry {
  root: PathBuf,
}

impl FsAgentRegistry {
  /// Create a new filesystem registry at the given root path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the registry.
  pub fn root(&self) -> &Path {
    &self.root
  }
}

#[async_trait]
impl AgentRegistry for FsAgentRegistry {
  async fn get(&self, agent_id: &str) -> Result<Option<AgentDefinition>, HostError> {
    if agent_id.is_empty() || agent_id.contains(['/', '\\']) || agent_id.starts_with('.') {
      return Err(HostError::invalid_request(format!(
        "invalid agent id: {}",
        agent_id
      )));
    }

    let path = self.root.join(format!("{}.json", agent_id));
    let content = match fs::read_to_string(&path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };

    let mut agent: AgentDefinition = serde_json::from_str(&content)?;
    if agent.agent_id.is_empty() {
      agent.agent_id = agent_id.to_string();
    }
    Ok(Some(agent))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn agent(id: &str) -> AgentDefinition {
    AgentDefinition {
      agent_id: id.to_string(),
      name: "Summarizer".to_string(),
      model: "gpt-4o-mini".to_string(),
      system_prompt: "Summarize.".to_string(),
      prompt_template: None,
      temperature: None,
      max_tokens: None,
    }
  }

  #[tokio::test]
  async fn test_memory_registry() {
    let registry = MemoryAgentRegistry::new();
    registry.insert(agent("summarizer"));

    assert!(registry.get("summarizer").await.unwrap().is_some());
    assert!(registry.get("missing").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_fs_registry_reads_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
      dir.path().join("summarizer.json"),
      r#"{"agent_id":"","model":"m","system_prompt":"s"}"#,
    )
    .unwrap();

    let registry = FsAgentRegistry::new(dir.path());
    let found = registry.get("summarizer").await.unwrap().unwrap();
    assert_eq!(found.agent_id, "summarizer");
    assert_eq!(found.model, "m");

    assert!(registry.get("other").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_fs_registry_rejects_path_ids() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FsAgentRegistry::new(dir.path());
    assert!(registry.get("../etc/passwd").await.is_err());
  }
}
