//! Flow runner with channel-based triggering.
//!
//! The `FlowRunner` owns an mpsc channel for receiving run variables,
//! executes its flow for each one, and hands finished runs to an optional
//! [`RunStore`].

use std::sync::Arc;

use sluice_flow::Flow;
use sluice_store::RunStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::FlowEngine;
use crate::error::EngineError;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::result::RunResult;

/// A runner that executes a flow in response to trigger payloads.
///
/// # Usage
///
/// ```ignore
/// let runner = FlowRunner::new(flow, engine).with_store(store);
///
/// // Get sender for external triggers (webhooks, UI, etc.)
/// let sender = runner.sender();
///
/// // Start the execution loop
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await?;
/// ```
pub struct FlowRunner<N: ExecutionNotifier = NoopNotifier> {
  sender: mpsc::Sender<serde_json::Value>,
  receiver: mpsc::Receiver<serde_json::Value>,
  flow: Arc<Flow>,
  engine: Arc<FlowEngine<N>>,
  store: Option<Arc<dyn RunStore>>,
}

impl<N: ExecutionNotifier> FlowRunner<N> {
  pub fn new(flow: Arc<Flow>, engine: Arc<FlowEngine<N>>) -> Self {
    Self::with_buffer_size(flow, engine, 100)
  }

  /// Create a new runner with a custom channel buffer size.
  pub fn with_buffer_size(
    flow: Arc<Flow>,
    engine: Arc<FlowEngine<N>>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      flow,
      engine,
      store: None,
    }
  }

  /// Persist every finished run to `store`.
  pub fn with_store(mut self, store: Arc<dyn RunStore>) -> Self {
    self.store = Some(store);
    self
  }

  /// Get a sender handle for triggering runs.
  pub fn sender(&self) -> mpsc::Sender<serde_json::Value> {
    self.sender.clone()
  }

  /// Trigger a run with the given variables through the channel.
  pub async fn run(&self, variables: serde_json::Value) -> Result<(), EngineError> {
    self
      .sender
      .send(variables)
      .await
      .map_err(|_| EngineError::ChannelClosed)
  }

  /// Start the execution loop.
  ///
  /// Blocks until the cancellation token is triggered or the channel closes.
  /// Runs are executed one at a time, in the order received.
  pub async fn start(mut self, cancel: CancellationToken) -> Result<(), EngineError> {
    info!(
      flow_id = %self.flow.flow_id,
      flow_name = %self.flow.name,
      "starting flow runner"
    );

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!(flow_id = %self.flow.flow_id, "flow runner cancelled");
          break;
        }
        variables = self.receiver.recv() => {
          let Some(variables) = variables else {
            info!(flow_id = %self.flow.flow_id, "flow runner channel closed");
            break;
          };

          match self.execute_once(variables, cancel.child_token()).await {
            Ok(result) => {
              info!(
                flow_id = %self.flow.flow_id,
                execution_id = %result.execution_id,
                outcome = %result.outcome,
                success = result.success,
                "flow run finished"
              );
            }
            Err(e) => {
              error!(flow_id = %self.flow.flow_id, error = %e, "flow run failed");
            }
          }
        }
      }
    }

    Ok(())
  }

  /// Execute a single run directly (without the loop) and persist it.
  pub async fn execute_once(
    &self,
    variables: serde_json::Value,
    cancel: CancellationToken,
  ) -> Result<RunResult, EngineError> {
    let result = self.engine.execute(&self.flow, variables, cancel).await;
    if let Some(store) = &self.store {
      store.save_run(&result.to_record()).await?;
    }
    Ok(result)
  }

  pub fn flow(&self) -> &Flow {
    &self.flow
  }
}
