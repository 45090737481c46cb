use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HostError;

/// An outbound HTTP request (webhooks and API integrations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
  pub method: String,
  pub url: String,
  #[serde(default)]
  pub headers: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  /// Parsed as JSON when possible, otherwise the raw text.
  pub body: serde_json::Value,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Generic HTTP caller.
#[async_trait]
pub trait HttpCaller: Send + Sync {
  async fn call(&self, request: HttpRequest) -> Result<HttpResponse, HostError>;
}

/// [`HttpCaller`] backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpCaller {
  client: Client,
}

impl ReqwestHttpCaller {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_client(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl HttpCaller for ReqwestHttpCaller {
  async fn call(&self, request: HttpRequest) -> Result<HttpResponse, HostError> {
    let method = parse_method(&request.method)?;
    debug!(method = %method, url = %request.url, "sending http request");
    let mut builder = self.client.request(method, &request.url);

    for (key, value) in &request.headers {
      builder = builder.header(key, value);
    }

    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let response = builder.send().await?;

    let status = response.status().as_u16();
    debug!(status, url = %request.url, "http response received");
    let headers: BTreeMap<String, String> = response
      .headers()
      .iter()
      .filter_map(|(k, v)| {
        v.to_str()
          .ok()
          .map(|val| (k.as_str().to_string(), val.to_string()))
      })
      .collect();

    let text = response.text().await?;

    // Try to parse body as JSON, fall back to string
    let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

    Ok(HttpResponse {
      status,
      headers,
      body,
    })
  }
}

pub fn parse_method(method: &str) -> Result<Method, HostError> {
  match method.to_uppercase().as_str() {
    "GET" => Ok(Method::GET),
    "POST" => Ok(Method::POST),
    "PUT" => Ok(Method::PUT),
    "DELETE" => Ok(Method::DELETE),
    "PATCH" => Ok(Method::PATCH),
    "HEAD" => Ok(Method::HEAD),
    "OPTIONS" => Ok(Method::OPTIONS),
    _ => Err(HostError::invalid_request(format!(
      "unsupported HTTP method: {}",
      method
    ))),
  }
}
