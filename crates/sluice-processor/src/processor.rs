use std::time::Instant;

use async_trait::async_trait;
use sluice_config::NodeKind;
use sluice_flow::Node;
use sluice_host::Collaborators;
use tracing::{debug, info, warn};

use crate::input::NodeInput;
use crate::types::{NodeExecutionResult, NodeLog};
use crate::{agent, condition, integration, process, trigger};

/// Uniform execution contract the engine dispatches every node through.
///
/// Implementations never return an error: failures are reported as a
/// non-successful [`NodeExecutionResult`].
#[async_trait]
pub trait NodeProcessor: Send + Sync {
  async fn execute(&self, node: &Node, input: &NodeInput) -> NodeExecutionResult;
}

/// Processor that handles every node kind with the bundled behavior.
#[derive(Debug, Clone, Default)]
pub struct StandardProcessor {
  collaborators: Collaborators,
  default_model: Option<String>,
}

impl StandardProcessor {
  pub fn new(collaborators: Collaborators) -> Self {
    Self {
      collaborators,
      default_model: None,
    }
  }

  /// Model used for agents that do not name one.
  pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
    self.default_model = Some(model.into());
    self
  }

  pub fn collaborators(&self) -> &Collaborators {
    &self.collaborators
  }
}

#[async_trait]
impl NodeProcessor for StandardProcessor {
  async fn execute(&self, node: &Node, input: &NodeInput) -> NodeExecutionResult {
    let start = Instant::now();
    let mut log = NodeLog::new(node);
    log.info(format!("Executing {} node", node.kind.name()));

    debug!(node_id = %node.node_id, kind = node.kind.name(), "dispatching node");

    let collaborators = &self.collaborators;
    let result = match &node.kind {
      NodeKind::Agent { agent_id } => {
        let model = self.default_model.as_deref();
        agent::execute(agent_id, model, input, collaborators, &mut log).await
      }
      NodeKind::Process { process } => {
        process::execute(process, input, collaborators, &mut log).await
      }
      NodeKind::Condition {
        expression,
        true_output,
        false_output,
      } => Ok(condition::evaluate(
        expression,
        true_output,
        false_output,
        input,
        &mut log,
      )),
      NodeKind::Trigger {
        trigger_type,
        payload,
      } => Ok(trigger::fire(*trigger_type, payload, input)),
      NodeKind::Integration { integration } => {
        integration::execute(integration, input, collaborators, &mut log).await
      }
    };

    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
      Ok(output) => {
        info!(node_id = %node.node_id, duration_ms, "node completed");
        log.success(
          format!("Completed in {}ms", duration_ms),
          Some(output.clone()),
        );
        NodeExecutionResult::success(&node.node_id, output, duration_ms, log.into_entries())
      }
      Err(e) => {
        warn!(node_id = %node.node_id, error = %e, "node failed");
        let message = e.to_string();
        log.error(message.clone());
        NodeExecutionResult::failure(&node.node_id, message, duration_ms, log.into_entries())
      }
    }
  }
}
