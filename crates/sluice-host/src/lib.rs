//! Sluice Host
//!
//! Interfaces to the outside world that node processors call into. The
//! engine never talks to these directly; processors receive a
//! [`Collaborators`] bundle and pick the handle they need. Every interface is
//! a trait so runs can be exercised with fakes.
//!
//! Provided adapters:
//! - [`ReqwestHttpCaller`] for webhooks and API integrations
//! - [`FsFileAccessor`] for file integrations
//! - [`OpenAiCompletionService`] for agent nodes
//! - [`MemoryAgentRegistry`] / [`FsAgentRegistry`] for agent definitions
//!
//! Email and database access have no bundled transport.

mod agent;
mod completion;
mod database;
mod error;
mod file;
mod http;
mod notify;

use std::sync::Arc;

pub use agent::{AgentDefinition, AgentRegistry, FsAgentRegistry, MemoryAgentRegistry};
pub use completion::{
  Completion, CompletionRequest, CompletionService, OpenAiCompletionService, Usage,
};
pub use database::{DatabaseAccessor, DatabaseRequest};
pub use error::HostError;
pub use file::{FileAccessor, FsFileAccessor};
pub use http::{HttpCaller, HttpRequest, HttpResponse, ReqwestHttpCaller, parse_method};
pub use notify::{EmailMessage, EmailSender};

/// Handles to every collaborator a processor may need.
///
/// A missing handle makes the nodes that need it fail (agent nodes fall back
/// to a placeholder result instead).
#[derive(Clone, Default)]
pub struct Collaborators {
  pub agents: Option<Arc<dyn AgentRegistry>>,
  pub completions: Option<Arc<dyn CompletionService>>,
  pub http: Option<Arc<dyn HttpCaller>>,
  pub email: Option<Arc<dyn EmailSender>>,
  pub database: Option<Arc<dyn DatabaseAccessor>>,
  pub files: Option<Arc<dyn FileAccessor>>,
}

impl Collaborators {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_agents(mut self, agents: Arc<dyn AgentRegistry>) -> Self {
    self.agents = Some(agents);
    self
  }

  pub fn with_completions(mut self, completions: Arc<dyn CompletionService>) -> Self {
    self.completions = Some(completions);
    self
  }

  pub fn with_http(mut self, http: Arc<dyn HttpCaller>) -> Self {
    self.http = Some(http);
    self
  }

  pub fn with_email(mut self, email: Arc<dyn EmailSender>) -> Self {
    self.email = Some(email);
    self
  }

  pub fn with_database(mut self, database: Arc<dyn DatabaseAccessor>) -> Self {
    self.database = Some(database);
    self
  }

  pub fn with_files(mut self, files: Arc<dyn FileAccessor>) -> Self {
    self.files = Some(files);
    self
  }
}

impl std::fmt::Debug for Collaborators {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Collaborators")
      .field("agents", &self.agents.is_some())
      .field("completions", &self.completions.is_some())
      .field("http", &self.http.is_some())
      .field("email", &self.email.is_some())
      .field("database", &self.database.is_some())
      .field("files", &self.files.is_some())
      .finish()
  }
}
