//! Execution Scheduler.
//!
//! Runs a flow wave by wave: every ready node of a wave is spawned
//! concurrently and the next wave starts only after all of them finished and
//! were recorded in the [`ExecutionContext`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{Map, Value, json};
use sluice_flow::{Flow, Node};
use sluice_processor::{LogEntry, LogLevel, NodeExecutionResult, NodeInput, NodeLog, NodeProcessor};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::context::ExecutionContext;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::readiness::ReadinessResolver;
use crate::result::{RunOutcome, RunResult};

pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// Configuration for the flow engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Maximum number of waves per run. A flow's own `max_iterations` wins.
  pub max_iterations: u32,
  /// Refuse to run flows whose graph contains a cycle.
  pub reject_cycles: bool,
  /// Timeout for nodes that do not set their own.
  pub node_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_iterations: DEFAULT_MAX_ITERATIONS,
      reject_cycles: true,
      node_timeout_ms: None,
    }
  }
}

/// The flow execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification strategies.
/// Use `FlowEngine::new()` for an engine with no-op notifications, or
/// `FlowEngine::with_notifier()` to provide a custom notifier.
pub struct FlowEngine<N: ExecutionNotifier = NoopNotifier> {
  processor: Arc<dyn NodeProcessor>,
  config: EngineConfig,
  notifier: N,
}

impl FlowEngine<NoopNotifier> {
  pub fn new(processor: Arc<dyn NodeProcessor>, config: EngineConfig) -> Self {
    Self::with_notifier(processor, config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> FlowEngine<N> {
  pub fn with_notifier(
    processor: Arc<dyn NodeProcessor>,
    config: EngineConfig,
    notifier: N,
  ) -> Self {
    Self {
      processor,
      config,
      notifier,
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Execute a flow with the given initial variables.
  ///
  /// Never fails: node failures, blockage, cycles and cancellation are all
  /// reported in the returned [`RunResult`].
  #[instrument(
    name = "flow_execute",
    skip(self, flow, variables, cancel),
    fields(flow_id = %flow.flow_id)
  )]
  pub async fn execute(
    &self,
    flow: &Flow,
    variables: Value,
    cancel: CancellationToken,
  ) -> RunResult {
    let execution_id = uuid::Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let start = Instant::now();

    let context = ExecutionContext::new(into_variables(variables));
    context.append_log(
      LogEntry::engine(LogLevel::Info, format!("Run started for flow '{}'", flow.name))
        .with_data(json!({ "flow_id": flow.flow_id, "execution_id": execution_id })),
    );
    info!(execution_id = %execution_id, nodes = flow.len(), "run_started");
    self.notifier.notify(ExecutionEvent::RunStarted {
      execution_id: execution_id.clone(),
      flow_id: flow.flow_id.clone(),
    });

    let mut node_results = Vec::with_capacity(flow.len());
    let outcome = match self.check_cycles(flow, &context) {
      Some(outcome) => outcome,
      None => {
        self
          .run_waves(flow, &context, &mut node_results, &execution_id, &cancel)
          .await
      }
    };

    let blocked_nodes: Vec<String> = flow
      .nodes()
      .iter()
      .filter(|node| !context.has_executed(&node.node_id))
      .map(|node| node.node_id.clone())
      .collect();
    let success = outcome == RunOutcome::Completed
      && blocked_nodes.is_empty()
      && context.error_count() == 0;
    let duration_ms = start.elapsed().as_millis() as u64;

    self.log_finish(&context, outcome, success, &blocked_nodes, duration_ms);
    info!(
      execution_id = %execution_id,
      outcome = %outcome,
      success,
      duration_ms,
      "run_finished"
    );
    self.notifier.notify(ExecutionEvent::RunFinished {
      execution_id: execution_id.clone(),
      outcome,
      success,
    });

    RunResult {
      execution_id,
      flow_id: flow.flow_id.clone(),
      success,
      outcome,
      final_output: final_output(flow, &context),
      log: context.take_log(),
      node_results,
      blocked_nodes,
      started_at,
      duration_ms,
    }
  }

  /// Execute a single node outside of any graph traversal.
  ///
  /// The node sees `variables` as its whole input.
  pub async fn execute_node(&self, node: &Node, variables: Value) -> NodeExecutionResult {
    let input = Arc::new(NodeInput::new(into_variables(variables), Vec::new()));
    let timeout = self.timeout_for(node);
    let node = Arc::new(node.clone());
    let handle = tokio::spawn(run_node(
      self.processor.clone(),
      node.clone(),
      input,
      timeout,
    ));
    contain_panic(&node, handle.await)
  }

  fn check_cycles(&self, flow: &Flow, context: &ExecutionContext) -> Option<RunOutcome> {
    if !self.config.reject_cycles {
      return None;
    }
    let cycle = flow.graph().find_cycle()?;
    let path = cycle.join(" -> ");
    error!(cycle = %path, "flow contains a cycle");
    context.append_log(
      LogEntry::engine(LogLevel::Error, format!("Aborted: flow contains a cycle {}", path))
        .with_data(json!({ "cycle": cycle })),
    );
    Some(RunOutcome::Aborted)
  }

  async fn run_waves(
    &self,
    flow: &Flow,
    context: &ExecutionContext,
    node_results: &mut Vec<NodeExecutionResult>,
    execution_id: &str,
    cancel: &CancellationToken,
  ) -> RunOutcome {
    let max_iterations = flow.max_iterations.unwrap_or(self.config.max_iterations);
    let resolver = ReadinessResolver::new(flow, context);
    let mut ready = resolver.ready_set();
    let mut wave: u32 = 0;

    loop {
      if cancel.is_cancelled() {
        warn!(execution_id = %execution_id, "run cancelled");
        return RunOutcome::Cancelled;
      }

      if ready.is_empty() {
        return if context.executed_count() == flow.len() {
          RunOutcome::Completed
        } else {
          RunOutcome::Blocked
        };
      }

      if wave >= max_iterations {
        error!(execution_id = %execution_id, max_iterations, "wave cap exceeded");
        context.append_log(LogEntry::engine(
          LogLevel::Error,
          format!("Aborted: exceeded {} waves", max_iterations),
        ));
        return RunOutcome::Aborted;
      }
      wave += 1;

      info!(
        execution_id = %execution_id,
        wave,
        ready_nodes = ?ready,
        "executing wave"
      );
      context.append_log(LogEntry::engine(
        LogLevel::Info,
        format!("Wave {}: {}", wave, ready.join(", ")),
      ));
      self.notifier.notify(ExecutionEvent::WaveStarted {
        execution_id: execution_id.to_string(),
        wave,
        node_ids: ready.clone(),
      });

      let results = self.run_wave(flow, context, &ready, execution_id).await;

      let mut candidates = Vec::new();
      for result in results {
        candidates.extend_from_slice(flow.graph().downstream(&result.node_id));
        self.record(context, &result, execution_id);
        node_results.push(result);
      }

      ready = resolver.ready_among(&candidates);
    }
  }

  /// Spawn every node of the wave and wait for all of them.
  async fn run_wave(
    &self,
    flow: &Flow,
    context: &ExecutionContext,
    ready: &[String],
    execution_id: &str,
  ) -> Vec<NodeExecutionResult> {
    // One snapshot per wave: siblings never see each other's output.
    let input = Arc::new(context.node_input(flow.nodes()));

    let mut nodes = Vec::with_capacity(ready.len());
    let mut handles = Vec::with_capacity(ready.len());
    for node_id in ready {
      let Some(node) = flow.get_node(node_id) else {
        continue;
      };
      self.notifier.notify(ExecutionEvent::NodeStarted {
        execution_id: execution_id.to_string(),
        node_id: node_id.clone(),
      });

      let processor = self.processor.clone();
      let node = node.clone();
      let input = input.clone();
      let timeout = self.timeout_for(&node);
      nodes.push(node.clone());
      handles.push(tokio::spawn(run_node(processor, node, input, timeout)));
    }

    let joined = futures::future::join_all(handles).await;

    nodes
      .into_iter()
      .zip(joined)
      .map(|(node, joined)| contain_panic(&node, joined))
      .collect()
  }

  fn record(
    &self,
    context: &ExecutionContext,
    result: &NodeExecutionResult,
    execution_id: &str,
  ) {
    let logs = result.logs.clone();
    let recorded = match (&result.output, result.success) {
      (Some(output), true) => {
        self.notifier.notify(ExecutionEvent::NodeCompleted {
          execution_id: execution_id.to_string(),
          node_id: result.node_id.clone(),
          output: output.clone(),
        });
        context.record_success(&result.node_id, output.clone(), logs)
      }
      _ => {
        let message = result
          .error
          .clone()
          .unwrap_or_else(|| "node failed without an error message".to_string());
        self.notifier.notify(ExecutionEvent::NodeFailed {
          execution_id: execution_id.to_string(),
          node_id: result.node_id.clone(),
          error: message.clone(),
        });
        context.record_error(&result.node_id, message, logs)
      }
    };

    if let Err(e) = recorded {
      error!(execution_id = %execution_id, error = %e, "failed to record node result");
    }
  }

  fn log_finish(
    &self,
    context: &ExecutionContext,
    outcome: RunOutcome,
    success: bool,
    blocked_nodes: &[String],
    duration_ms: u64,
  ) {
    match outcome {
      RunOutcome::Completed if success => context.append_log(LogEntry::engine(
        LogLevel::Success,
        format!("Run completed in {}ms", duration_ms),
      )),
      RunOutcome::Completed => context.append_log(LogEntry::engine(
        LogLevel::Error,
        format!("Run completed with {} failed node(s)", context.error_count()),
      )),
      RunOutcome::Blocked => context.append_log(
        LogEntry::engine(
          LogLevel::Warning,
          format!("Run blocked: {} node(s) never became ready", blocked_nodes.len()),
        )
        .with_data(json!({ "blocked_nodes": blocked_nodes })),
      ),
      RunOutcome::Cancelled => {
        context.append_log(LogEntry::engine(LogLevel::Warning, "Run cancelled"))
      }
      // The abort reason was logged where it happened.
      RunOutcome::Aborted => {}
    }
  }

  fn timeout_for(&self, node: &Node) -> Option<Duration> {
    node
      .timeout_ms
      .or(self.config.node_timeout_ms)
      .map(Duration::from_millis)
  }
}

/// Execute one node, converting a timeout into a node failure.
async fn run_node(
  processor: Arc<dyn NodeProcessor>,
  node: Arc<Node>,
  input: Arc<NodeInput>,
  timeout: Option<Duration>,
) -> NodeExecutionResult {
  let Some(limit) = timeout else {
    return processor.execute(&node, &input).await;
  };

  match tokio::time::timeout(limit, processor.execute(&node, &input)).await {
    Ok(result) => result,
    Err(_) => {
      let timeout_ms = limit.as_millis() as u64;
      warn!(node_id = %node.node_id, timeout_ms, "node timed out");
      failed(
        &node,
        format!("node timed out after {}ms", timeout_ms),
        timeout_ms,
      )
    }
  }
}

/// A panicked (or aborted) node task becomes a failed result.
fn contain_panic(
  node: &Node,
  joined: Result<NodeExecutionResult, JoinError>,
) -> NodeExecutionResult {
  match joined {
    Ok(result) => result,
    Err(e) => {
      error!(node_id = %node.node_id, error = %e, "node task failed");
      failed(node, format!("node execution panicked: {}", e), 0)
    }
  }
}

fn failed(node: &Node, message: String, duration_ms: u64) -> NodeExecutionResult {
  let mut log = NodeLog::new(node);
  log.error(message.clone());
  NodeExecutionResult::failure(&node.node_id, message, duration_ms, log.into_entries())
}

/// Run variables are an object; anything else is wrapped as `input`.
fn into_variables(variables: Value) -> Map<String, Value> {
  match variables {
    Value::Object(map) => map,
    Value::Null => Map::new(),
    other => {
      let mut map = Map::new();
      map.insert("input".to_string(), other);
      map
    }
  }
}

fn final_output(flow: &Flow, context: &ExecutionContext) -> Value {
  let outputs: Map<String, Value> = flow
    .graph()
    .sink_nodes()
    .iter()
    .filter_map(|id| context.output(id).map(|output| (id.clone(), output)))
    .collect();
  Value::Object(outputs)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_into_variables() {
    assert_eq!(
      Value::Object(into_variables(json!({ "a": 1 }))),
      json!({ "a": 1 })
    );
    assert!(into_variables(Value::Null).is_empty());
    assert_eq!(
      Value::Object(into_variables(json!([1, 2]))),
      json!({ "input": [1, 2] })
    );
  }

  #[test]
  fn test_default_config() {
    let config = EngineConfig::default();
    assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
    assert!(config.reject_cycles);
    assert!(config.node_timeout_ms.is_none());
  }
}
