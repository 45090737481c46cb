//! Agent nodes.
//!
//! The agent definition is looked up in the registry, a prompt is rendered
//! from the node input and sent to the completion service. A missing
//! completion service or a provider failure does not fail the node; it
//! yields a placeholder result marked with `"placeholder": true`.

use minijinja::{Environment, context};
use serde_json::{Value, json};
use sluice_host::{AgentDefinition, Collaborators, CompletionRequest};
use tracing::warn;

use crate::error::ProcessorError;
use crate::input::NodeInput;
use crate::types::NodeLog;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub async fn execute(
  agent_id: &str,
  default_model: Option<&str>,
  input: &NodeInput,
  collaborators: &Collaborators,
  log: &mut NodeLog,
) -> Result<Value, ProcessorError> {
  let registry = collaborators
    .agents
    .as_ref()
    .ok_or(ProcessorError::MissingCollaborator {
      name: "agent registry",
    })?;
  let agent = registry
    .get(agent_id)
    .await?
    .ok_or_else(|| ProcessorError::AgentNotFound {
      agent_id: agent_id.to_string(),
    })?;

  let prompt = render_prompt(&agent, input)?;
  let model = if agent.model.is_empty() {
    default_model.unwrap_or(DEFAULT_MODEL).to_string()
  } else {
    agent.model.clone()
  };

  let Some(completions) = collaborators.completions.as_ref() else {
    log.warning("No completion service configured, returning placeholder");
    return Ok(placeholder(agent_id, "no completion service configured"));
  };

  log.info(format!("Calling {} for agent '{}'", model, agent_id));
  let request = CompletionRequest {
    model,
    system: agent.system_prompt.clone(),
    prompt,
    temperature: agent.temperature,
    max_tokens: agent.max_tokens,
  };

  match completions.complete(request).await {
    Ok(completion) => Ok(json!({
      "agent_id": agent_id,
      "response": completion.text,
      "model": completion.model,
      "usage": completion.usage,
      "placeholder": false,
    })),
    Err(e) => {
      warn!(agent_id, error = %e, "completion failed, using placeholder");
      log.warning(format!("Completion failed: {}", e));
      Ok(placeholder(agent_id, &e.to_string()))
    }
  }
}

/// Render the user prompt. Without a template the merged input is sent as
/// pretty-printed JSON.
fn render_prompt(agent: &AgentDefinition, input: &NodeInput) -> Result<String, ProcessorError> {
  let merged = input.merged();
  let Some(template) = &agent.prompt_template else {
    return Ok(serde_json::to_string_pretty(&merged).unwrap_or_default());
  };

  let env = Environment::new();
  let prompt = env.render_str(
    template,
    context! {
      input => merged,
      nodes => input.namespaced(),
      variables => input.variables(),
    },
  )?;
  Ok(prompt)
}

fn placeholder(agent_id: &str, reason: &str) -> Value {
  json!({
    "agent_id": agent_id,
    "response": format!("[placeholder] agent '{}' did not run", agent_id),
    "placeholder": true,
    "error": reason,
  })
}
