use std::collections::BTreeMap;

use serde_json::{Value, json};
use sluice_config::{FileOperation, IntegrationConfig};
use sluice_guard::{interpolate, interpolate_value};
use sluice_host::{Collaborators, DatabaseRequest, HttpRequest, HttpResponse};

use crate::error::ProcessorError;
use crate::input::NodeInput;
use crate::types::NodeLog;

pub async fn execute(
  config: &IntegrationConfig,
  input: &NodeInput,
  collaborators: &Collaborators,
  log: &mut NodeLog,
) -> Result<Value, ProcessorError> {
  let merged = input.merged();
  match config {
    IntegrationConfig::Api {
      url,
      method,
      headers,
      body,
    } => {
      let body = (!body.is_null()).then(|| interpolate_value(body, &merged));
      let response = send(method, url, headers, body, &merged, collaborators, log).await?;
      Ok(json!({
        "status": response.status,
        "headers": response.headers,
        "body": response.body,
      }))
    }
    IntegrationConfig::Database {
      operation,
      target,
      params,
    } => {
      let database = collaborators
        .database
        .as_ref()
        .ok_or(ProcessorError::MissingCollaborator {
          name: "database accessor",
        })?;
      let request = DatabaseRequest {
        operation: operation.clone(),
        target: interpolate(target, &merged),
        params: interpolate_value(params, &merged),
      };
      log.info(format!("Database {} on {}", request.operation, request.target));
      let result = database.execute(request).await?;
      Ok(json!({
        "operation": operation,
        "target": target,
        "result": result,
      }))
    }
    IntegrationConfig::File {
      operation,
      path,
      content,
    } => {
      let files = collaborators
        .files
        .as_ref()
        .ok_or(ProcessorError::MissingCollaborator {
          name: "file accessor",
        })?;
      let path = interpolate(path, &merged);
      // Without configured content the merged input is written as JSON.
      let content = match content {
        Some(template) => interpolate(template, &merged),
        None => serde_json::to_string_pretty(&merged).unwrap_or_default(),
      };

      match operation {
        FileOperation::Read => {
          let content = files.read(&path).await?;
          log.info(format!("Read {} bytes from {}", content.len(), path));
          Ok(json!({ "path": path, "content": content }))
        }
        FileOperation::Write => {
          let bytes = files.write(&path, &content).await?;
          log.info(format!("Wrote {} bytes to {}", bytes, path));
          Ok(json!({ "path": path, "bytes": bytes }))
        }
        FileOperation::Append => {
          let bytes = files.append(&path, &content).await?;
          log.info(format!("Appended {} bytes to {}", bytes, path));
          Ok(json!({ "path": path, "bytes": bytes }))
        }
        FileOperation::Delete => {
          files.delete(&path).await?;
          log.info(format!("Deleted {}", path));
          Ok(json!({ "path": path, "deleted": true }))
        }
      }
    }
  }
}

/// Send an HTTP request with the URL and headers interpolated against `merged`.
/// Non-success statuses fail the node.
pub(crate) async fn send(
  method: &str,
  url: &str,
  headers: &BTreeMap<String, String>,
  body: Option<Value>,
  merged: &Value,
  collaborators: &Collaborators,
  log: &mut NodeLog,
) -> Result<HttpResponse, ProcessorError> {
  let http = collaborators
    .http
    .as_ref()
    .ok_or(ProcessorError::MissingCollaborator {
      name: "http caller",
    })?;

  let request = HttpRequest {
    method: method.to_uppercase(),
    url: interpolate(url, merged),
    headers: headers
      .iter()
      .map(|(k, v)| (k.clone(), interpolate(v, merged)))
      .collect(),
    body,
  };
  log.info(format!("{} {}", request.method, request.url));

  let response = http.call(request).await?;
  if !response.is_success() {
    return Err(ProcessorError::RemoteStatus {
      status: response.status,
      body: response.body,
    });
  }
  Ok(response)
}
