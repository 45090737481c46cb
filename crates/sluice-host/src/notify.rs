use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
  pub to: String,
  pub subject: String,
  pub body: String,
}

/// Email / notification sender.
#[async_trait]
pub trait EmailSender: Send + Sync {
  /// Send a message and return a delivery id.
  async fn send(&self, message: EmailMessage) -> Result<String, HostError>;
}
