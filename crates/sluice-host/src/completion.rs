use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HostError;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// A single prompt sent to a language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
  pub model: String,
  pub system: String,
  pub prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
  pub prompt_tokens: u32,
  pub completion_tokens: u32,
  pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
  pub text: String,
  pub model: String,
  pub usage: Usage,
}

/// Language-model completion service.
#[async_trait]
pub trait CompletionService: Send + Sync {
  async fn complete(&self, request: CompletionRequest) -> Result<Completion, HostError>;
}

/// OpenAI-compatible chat completions client. Works with any server that
/// speaks `/chat/completions` (OpenAI, Ollama, vLLM, ...).
pub struct OpenAiCompletionService {
  http: Client,
  base_url: String,
  api_key: Option<String>,
}

impl OpenAiCompletionService {
  pub fn new(api_key: Option<String>) -> Self {
    Self::with_base_url(OPENAI_API_URL, api_key)
  }

  pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
    Self {
      http: Client::new(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      api_key,
    }
  }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  model: Option<String>,
  #[serde(default)]
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

#[async_trait]
impl CompletionService for OpenAiCompletionService {
  async fn complete(&self, request: CompletionRequest) -> Result<Completion, HostError> {
    let mut messages = Vec::with_capacity(2);
    if !request.system.is_empty() {
      messages.push(ChatMessage {
        role: "system",
        content: &request.system,
      });
    }
    messages.push(ChatMessage {
      role: "user",
      content: &request.prompt,
    });

    let body = ChatRequest {
      model: &request.model,
      messages,
      temperature: request.temperature,
      max_tokens: request.max_tokens,
    };

    let mut builder = self
      .http
      .post(format!("{}/chat/completions", self.base_url))
      .json(&body);
    if let Some(key) = &self.api_key {
      builder = builder.bearer_auth(key);
    }

    debug!(model = %request.model, base_url = %self.base_url, "requesting completion");
    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(HostError::provider(format!(
        "completion request failed with {}: {}",
        status, text
      )));
    }

    let parsed: ChatResponse = response.json().await?;
    let text = parsed
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| HostError::provider("completion response had no content"))?;

    Ok(Completion {
      text,
      model: parsed.model.unwrap_or(request.model),
      usage: parsed.usage.unwrap_or_default(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_base_url_trailing_slash_trimmed() {
    let service = OpenAiCompletionService::with_base_url("http://localhost:11434/v1/", None);
    assert_eq!(service.base_url, "http://localhost:11434/v1");
  }

  #[test]
  fn test_chat_request_shape() {
    let body = ChatRequest {
      model: "gpt-4o-mini",
      messages: vec![
        ChatMessage {
          role: "system",
          content: "be brief",
        },
        ChatMessage {
          role: "user",
          content: "hi",
        },
      ],
      temperature: Some(0.2),
      max_tokens: None,
    };

    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["messages"][0]["role"], "system");
    assert_eq!(value["messages"][1]["content"], "hi");
    assert!(value.get("max_tokens").is_none());
  }

  #[test]
  fn test_chat_response_parses_usage() {
    let parsed: ChatResponse = serde_json::from_str(
      r#"{"model":"m","choices":[{"message":{"content":"ok"}}],
          "usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4}}"#,
    )
    .unwrap();

    assert_eq!(parsed.usage.unwrap().total_tokens, 4);
    assert_eq!(parsed.choices[0].message.content.as_deref(), Some("ok"));
  }
}
