use serde_json::{Value, json};
use sluice_config::AutomationConfig;
use sluice_guard::{interpolate, interpolate_value};
use sluice_host::{Collaborators, EmailMessage};

use crate::error::ProcessorError;
use crate::input::NodeInput;
use crate::integration;
use crate::types::NodeLog;

pub async fn execute(
  config: &AutomationConfig,
  input: &NodeInput,
  collaborators: &Collaborators,
  log: &mut NodeLog,
) -> Result<Value, ProcessorError> {
  let merged = input.merged();
  match config {
    AutomationConfig::Webhook {
      url,
      method,
      headers,
      body,
    } => {
      // A webhook without a configured body delivers the whole input.
      let body = if body.is_null() {
        merged.clone()
      } else {
        interpolate_value(body, &merged)
      };
      let response =
        integration::send(method, url, headers, Some(body), &merged, collaborators, log).await?;
      Ok(json!({
        "status": response.status,
        "body": response.body,
      }))
    }
    AutomationConfig::Email { to, subject, body } => {
      let email = collaborators
        .email
        .as_ref()
        .ok_or(ProcessorError::MissingCollaborator {
          name: "email sender",
        })?;
      let message = EmailMessage {
        to: interpolate(to, &merged),
        subject: interpolate(subject, &merged),
        body: interpolate(body, &merged),
      };
      log.info(format!("Sending email to {}", message.to));
      let to = message.to.clone();
      let subject = message.subject.clone();
      let message_id = email.send(message).await?;
      Ok(json!({
        "message_id": message_id,
        "to": to,
        "subject": subject,
      }))
    }
  }
}
