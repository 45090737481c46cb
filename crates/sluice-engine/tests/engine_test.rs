//! Integration tests for FlowEngine scheduling.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use sluice_config::{
  EdgeDef, FlowDef, NodeDef, NodeKind, ProcessConfig, TaskConfig, TriggerType,
};
use sluice_engine::{
  ChannelNotifier, EngineConfig, ExecutionEvent, FlowEngine, RunOutcome, RunResult,
};
use sluice_flow::{Flow, Node};
use sluice_processor::{
  LogLevel, NodeExecutionResult, NodeInput, NodeLog, NodeProcessor, StandardProcessor,
};
use tokio::sync::{Barrier, mpsc};
use tokio_util::sync::CancellationToken;

/// Processor whose behavior is scripted per node id.
///
/// Successful nodes output `{ "<id>_done": true }`.
#[derive(Default)]
struct ScriptedProcessor {
  fail: HashSet<String>,
  panic: HashSet<String>,
  sleep_ms: HashMap<String, u64>,
  rendezvous: Option<(HashSet<String>, Arc<Barrier>)>,
  calls: Mutex<Vec<(String, NodeInput)>>,
}

impl ScriptedProcessor {
  fn failing(ids: &[&str]) -> Self {
    Self {
      fail: ids.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }

  fn input_of(&self, node_id: &str) -> Option<NodeInput> {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .find(|(id, _)| id == node_id)
      .map(|(_, input)| input.clone())
  }
}

#[async_trait]
impl NodeProcessor for ScriptedProcessor {
  async fn execute(&self, node: &Node, input: &NodeInput) -> NodeExecutionResult {
    let id = node.node_id.clone();
    self.calls.lock().unwrap().push((id.clone(), input.clone()));

    if self.panic.contains(&id) {
      panic!("scripted panic in {}", id);
    }
    if let Some((ids, barrier)) = &self.rendezvous {
      if ids.contains(&id) {
        barrier.wait().await;
      }
    }
    if let Some(ms) = self.sleep_ms.get(&id) {
      tokio::time::sleep(Duration::from_millis(*ms)).await;
    }

    let mut log = NodeLog::new(node);
    log.info("scripted");
    if self.fail.contains(&id) {
      return NodeExecutionResult::failure(id, "scripted failure", 0, log.into_entries());
    }
    let mut output = serde_json::Map::new();
    output.insert(format!("{}_done", id), Value::Bool(true));
    NodeExecutionResult::success(id, Value::Object(output), 0, log.into_entries())
  }
}

fn pass(id: &str) -> NodeDef {
  NodeDef::new(
    id,
    NodeKind::Process {
      process: ProcessConfig::Task(TaskConfig::PassThrough),
    },
  )
}

fn edge(from: &str, to: &str) -> EdgeDef {
  EdgeDef::new(format!("{}-{}", from, to), from, to)
}

fn flow(nodes: &[&str], edges: Vec<EdgeDef>) -> Flow {
  flow_from(nodes.iter().map(|id| pass(id)).collect(), edges)
}

fn flow_from(nodes: Vec<NodeDef>, edges: Vec<EdgeDef>) -> Flow {
  Flow::from_def(FlowDef {
    flow_id: "test-flow".to_string(),
    name: "Test Flow".to_string(),
    max_iterations: None,
    nodes,
    edges,
  })
  .unwrap()
}

fn engine(processor: Arc<ScriptedProcessor>) -> FlowEngine {
  FlowEngine::new(processor, EngineConfig::default())
}

async fn run(engine: &FlowEngine, flow: &Flow, variables: Value) -> RunResult {
  engine
    .execute(flow, variables, CancellationToken::new())
    .await
}

fn wave_count(result: &RunResult) -> usize {
  result
    .log
    .iter()
    .filter(|e| e.node_id.is_empty() && e.message.starts_with("Wave "))
    .count()
}

fn executed(result: &RunResult) -> HashSet<String> {
  result
    .executed_nodes()
    .into_iter()
    .map(String::from)
    .collect()
}

#[tokio::test]
async fn test_edgeless_flow_runs_in_one_wave() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor);
  let flow = flow(&["a", "b", "c"], vec![]);

  let result = run(&engine, &flow, json!({})).await;

  assert!(result.success);
  assert_eq!(result.outcome, RunOutcome::Completed);
  assert_eq!(wave_count(&result), 1);
  assert_eq!(result.node_results.len(), 3);
  assert!(result.blocked_nodes.is_empty());
}

#[tokio::test]
async fn test_chain_runs_in_order_with_merged_input() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor.clone());
  let flow = flow(&["a", "b", "c"], vec![edge("a", "b"), edge("b", "c")]);

  let result = run(&engine, &flow, json!({ "seed": 1 })).await;

  assert!(result.success);
  assert_eq!(result.executed_nodes(), vec!["a", "b", "c"]);
  assert_eq!(wave_count(&result), 3);

  let input = processor.input_of("c").unwrap();
  assert_eq!(
    input.merged(),
    json!({ "seed": 1, "a_done": true, "b_done": true })
  );
  assert_eq!(result.final_output, json!({ "c": { "c_done": true } }));
}

#[tokio::test]
async fn test_failure_blocks_transitive_dependents() {
  let processor = Arc::new(ScriptedProcessor::failing(&["a"]));
  let engine = engine(processor);
  let flow = flow(
    &["a", "b", "c", "other"],
    vec![edge("a", "b"), edge("b", "c")],
  );

  let result = run(&engine, &flow, json!({})).await;

  assert!(!result.success);
  assert_eq!(result.outcome, RunOutcome::Blocked);
  assert_eq!(result.failed_nodes(), vec!["a"]);
  assert_eq!(result.blocked_nodes, vec!["b", "c"]);
  assert!(result.node_result("b").is_none());
  assert!(result.node_result("c").is_none());
  assert!(result.node_result("other").unwrap().success);
  assert_eq!(
    result.final_output,
    json!({ "other": { "other_done": true } })
  );
}

#[tokio::test]
async fn test_failed_sink_completes_unsuccessfully() {
  let processor = Arc::new(ScriptedProcessor::failing(&["b"]));
  let engine = engine(processor);
  let flow = flow(&["a", "b"], vec![edge("a", "b")]);

  let result = run(&engine, &flow, json!({})).await;

  assert_eq!(result.outcome, RunOutcome::Completed);
  assert!(!result.success);
  assert_eq!(
    result.node_result("b").unwrap().error.as_deref(),
    Some("scripted failure")
  );
  assert_eq!(result.final_output, json!({}));
}

#[tokio::test]
async fn test_join_needs_every_source() {
  let processor = Arc::new(ScriptedProcessor::failing(&["left"]));
  let engine = engine(processor.clone());
  let flow = flow(
    &["left", "right", "join"],
    vec![edge("left", "join"), edge("right", "join")],
  );

  let result = run(&engine, &flow, json!({})).await;

  assert!(!result.success);
  assert!(result.node_result("right").unwrap().success);
  assert!(result.node_result("join").is_none());
  assert!(processor.input_of("join").is_none());
  assert_eq!(result.blocked_nodes, vec!["join"]);
}

#[tokio::test]
async fn test_join_runs_after_all_sources() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor.clone());
  let flow = flow(
    &["start", "slow", "fast", "join"],
    vec![
      edge("start", "slow"),
      edge("start", "fast"),
      edge("slow", "join"),
      edge("fast", "join"),
    ],
  );

  let result = run(&engine, &flow, json!({})).await;

  assert!(result.success);
  assert_eq!(result.executed_nodes(), vec!["start", "slow", "fast", "join"]);
  let input = processor.input_of("join").unwrap();
  assert!(input.output("slow").is_some() && input.output("fast").is_some());
}

#[tokio::test]
async fn test_closed_guard_blocks_like_failure() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor);
  let flow = flow(
    &["a", "b"],
    vec![edge("a", "b").with_guard("${go} == true")],
  );

  let result = run(&engine, &flow, json!({ "go": false })).await;
  assert!(!result.success);
  assert!(result.node_result("a").unwrap().success);
  assert_eq!(result.blocked_nodes, vec!["b"]);

  let result = run(&engine, &flow, json!({ "go": true })).await;
  assert!(result.success);
}

#[tokio::test]
async fn test_guard_reads_source_output() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor);
  let flow = flow(
    &["a", "yes", "no"],
    vec![
      edge("a", "yes").with_guard("${a_done}"),
      edge("a", "no").with_guard("${a_done} != true"),
    ],
  );

  let result = run(&engine, &flow, json!({})).await;

  assert!(result.node_result("yes").is_some());
  assert!(result.node_result("no").is_none());
}

#[tokio::test]
async fn test_rerun_is_deterministic() {
  let flow = flow(
    &["a", "b", "c", "d"],
    vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
  );

  let first_engine = engine(Arc::new(ScriptedProcessor::failing(&["c"])));
  let second_engine = engine(Arc::new(ScriptedProcessor::failing(&["c"])));

  let first = run(&first_engine, &flow, json!({})).await;
  let second = run(&second_engine, &flow, json!({})).await;

  assert_eq!(first.success, second.success);
  assert_eq!(executed(&first), executed(&second));
  assert_eq!(first.blocked_nodes, second.blocked_nodes);
  assert_ne!(first.execution_id, second.execution_id);
}

#[tokio::test]
async fn test_cycle_is_rejected() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor.clone());
  let flow = flow(
    &["start", "a", "b"],
    vec![edge("start", "a"), edge("a", "b"), edge("b", "a")],
  );

  let result = run(&engine, &flow, json!({})).await;

  assert!(!result.success);
  assert_eq!(result.outcome, RunOutcome::Aborted);
  assert!(result.node_results.is_empty());
  assert!(processor.calls.lock().unwrap().is_empty());
  assert!(
    result
      .log
      .iter()
      .any(|e| e.level == LogLevel::Error && e.message.contains("cycle"))
  );
}

#[tokio::test]
async fn test_cycle_allowed_ends_blocked() {
  let processor = Arc::new(ScriptedProcessor::default());
  let config = EngineConfig {
    reject_cycles: false,
    ..Default::default()
  };
  let engine = FlowEngine::new(processor, config);
  let flow = flow(
    &["start", "a", "b"],
    vec![edge("start", "a"), edge("a", "b"), edge("b", "a")],
  );

  let result = run(&engine, &flow, json!({})).await;

  assert!(!result.success);
  assert_eq!(result.outcome, RunOutcome::Blocked);
  assert_eq!(result.executed_nodes(), vec!["start"]);
  assert_eq!(result.blocked_nodes, vec!["a", "b"]);
}

#[tokio::test]
async fn test_wave_cap_aborts() {
  let processor = Arc::new(ScriptedProcessor::default());
  let config = EngineConfig {
    max_iterations: 2,
    ..Default::default()
  };
  let engine = FlowEngine::new(processor, config);
  let flow = flow(&["a", "b", "c"], vec![edge("a", "b"), edge("b", "c")]);

  let result = run(&engine, &flow, json!({})).await;

  assert!(!result.success);
  assert_eq!(result.outcome, RunOutcome::Aborted);
  assert_eq!(result.executed_nodes(), vec!["a", "b"]);
  let last = result.log.last().unwrap();
  assert_eq!(last.level, LogLevel::Error);
  assert!(last.message.contains("exceeded 2 waves"));
}

#[tokio::test]
async fn test_flow_cap_overrides_engine_cap() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor);
  let mut def = FlowDef {
    flow_id: "capped".to_string(),
    name: "Capped".to_string(),
    max_iterations: Some(1),
    nodes: vec![pass("a"), pass("b")],
    edges: vec![edge("a", "b")],
  };
  let capped = Flow::from_def(def.clone()).unwrap();
  def.max_iterations = Some(2);
  let enough = Flow::from_def(def).unwrap();

  assert_eq!(run(&engine, &capped, json!({})).await.outcome, RunOutcome::Aborted);
  assert_eq!(run(&engine, &enough, json!({})).await.outcome, RunOutcome::Completed);
}

#[tokio::test]
async fn test_empty_flow_completes() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor.clone());
  let flow = flow(&[], vec![]);

  let result = run(&engine, &flow, json!({ "x": 1 })).await;

  assert!(result.success);
  assert_eq!(result.outcome, RunOutcome::Completed);
  assert_eq!(result.final_output, json!({}));
  assert!(result.node_results.is_empty());
  assert!(processor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_panicking_node_becomes_failure() {
  let processor = Arc::new(ScriptedProcessor {
    panic: HashSet::from(["boom".to_string()]),
    ..Default::default()
  });
  let engine = engine(processor);
  let flow = flow(&["boom", "fine", "after"], vec![edge("boom", "after")]);

  let result = run(&engine, &flow, json!({})).await;

  assert!(!result.success);
  let boom = result.node_result("boom").unwrap();
  assert!(!boom.success);
  assert!(boom.error.as_deref().unwrap().contains("panicked"));
  assert!(result.node_result("fine").unwrap().success);
  assert_eq!(result.blocked_nodes, vec!["after"]);
}

#[tokio::test]
async fn test_node_timeout_becomes_failure() {
  let processor = Arc::new(ScriptedProcessor {
    sleep_ms: HashMap::from([("slow".to_string(), 5_000)]),
    ..Default::default()
  });
  let config = EngineConfig {
    node_timeout_ms: Some(20),
    ..Default::default()
  };
  let engine = FlowEngine::new(processor, config);
  let flow = flow(&["slow", "quick"], vec![]);

  let result = run(&engine, &flow, json!({})).await;

  let slow = result.node_result("slow").unwrap();
  assert!(!slow.success);
  assert_eq!(slow.error.as_deref(), Some("node timed out after 20ms"));
  assert!(result.node_result("quick").unwrap().success);
}

#[tokio::test]
async fn test_wave_nodes_run_concurrently() {
  // Both nodes wait for each other; sequential dispatch would time out.
  let processor = Arc::new(ScriptedProcessor {
    rendezvous: Some((
      HashSet::from(["a".to_string(), "b".to_string()]),
      Arc::new(Barrier::new(2)),
    )),
    ..Default::default()
  });
  let config = EngineConfig {
    node_timeout_ms: Some(2_000),
    ..Default::default()
  };
  let engine = FlowEngine::new(processor, config);
  let flow = flow(&["a", "b"], vec![]);

  let result = run(&engine, &flow, json!({})).await;

  assert!(result.success);
}

#[tokio::test]
async fn test_cancellation_checked_between_waves() {
  let processor = Arc::new(ScriptedProcessor {
    sleep_ms: HashMap::from([("a".to_string(), 100)]),
    ..Default::default()
  });
  let engine = Arc::new(engine(processor));
  let flow = Arc::new(flow(&["a", "b"], vec![edge("a", "b")]));
  let cancel = CancellationToken::new();

  let handle = {
    let (engine, flow, cancel) = (engine.clone(), flow.clone(), cancel.clone());
    tokio::spawn(async move { engine.execute(&flow, json!({}), cancel).await })
  };
  tokio::time::sleep(Duration::from_millis(20)).await;
  cancel.cancel();
  let result = handle.await.unwrap();

  assert_eq!(result.outcome, RunOutcome::Cancelled);
  assert!(!result.success);
  // The running wave finishes, the next one never starts.
  assert!(result.node_result("a").unwrap().success);
  assert_eq!(result.blocked_nodes, vec!["b"]);
}

#[tokio::test]
async fn test_events_are_emitted_in_order() {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let engine = FlowEngine::with_notifier(
    Arc::new(ScriptedProcessor::failing(&["b"])),
    EngineConfig::default(),
    ChannelNotifier::new(tx),
  );
  let flow = flow(&["a", "b"], vec![edge("a", "b")]);

  let result = engine
    .execute(&flow, json!({}), CancellationToken::new())
    .await;
  drop(engine);

  let mut events = Vec::new();
  while let Some(event) = rx.recv().await {
    events.push(event);
  }

  let names: Vec<&str> = events
    .iter()
    .map(|e| match e {
      ExecutionEvent::RunStarted { .. } => "run_started",
      ExecutionEvent::WaveStarted { .. } => "wave_started",
      ExecutionEvent::NodeStarted { .. } => "node_started",
      ExecutionEvent::NodeCompleted { .. } => "node_completed",
      ExecutionEvent::NodeFailed { .. } => "node_failed",
      ExecutionEvent::RunFinished { .. } => "run_finished",
    })
    .collect();
  assert_eq!(
    names,
    vec![
      "run_started",
      "wave_started",
      "node_started",
      "node_completed",
      "wave_started",
      "node_started",
      "node_failed",
      "run_finished",
    ]
  );
  assert_eq!(
    events.last(),
    Some(&ExecutionEvent::RunFinished {
      execution_id: result.execution_id.clone(),
      outcome: RunOutcome::Completed,
      success: false,
    })
  );
}

#[tokio::test]
async fn test_log_collects_node_and_engine_entries() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor);
  let flow = flow(&["a", "b"], vec![edge("a", "b")]);

  let result = run(&engine, &flow, json!({})).await;

  let first = result.log.first().unwrap();
  assert!(first.node_id.is_empty());
  assert!(first.message.starts_with("Run started"));
  assert_eq!(result.log.last().unwrap().level, LogLevel::Success);

  let node_entries: Vec<&str> = result
    .log
    .iter()
    .filter(|e| !e.node_id.is_empty())
    .map(|e| e.node_id.as_str())
    .collect();
  assert_eq!(node_entries, vec!["a", "b"]);
}

#[tokio::test]
async fn test_scalar_variables_are_wrapped() {
  let processor = Arc::new(ScriptedProcessor::default());
  let engine = engine(processor.clone());
  let flow = flow(&["a"], vec![]);

  run(&engine, &flow, json!("hello")).await;

  let input = processor.input_of("a").unwrap();
  assert_eq!(input.variables().get("input"), Some(&json!("hello")));
}

#[tokio::test]
async fn test_execute_node_directly() {
  let engine = FlowEngine::new(
    Arc::new(StandardProcessor::default()),
    EngineConfig::default(),
  );
  let node = Node::from(NodeDef::new(
    "check",
    NodeKind::Condition {
      expression: "${score} > 50".to_string(),
      true_output: json!("pass"),
      false_output: json!("fail"),
    },
  ));

  let result = engine.execute_node(&node, json!({ "score": 70 })).await;

  assert!(result.success);
  assert_eq!(
    result.output,
    Some(json!({ "condition": true, "result": "pass" }))
  );
}

#[tokio::test]
async fn test_execute_node_contains_panic() {
  let processor = Arc::new(ScriptedProcessor {
    panic: HashSet::from(["boom".to_string()]),
    ..Default::default()
  });
  let engine = engine(processor);
  let node = Node::from(pass("boom"));

  let result = engine.execute_node(&node, json!({})).await;

  assert!(!result.success);
  assert_eq!(result.node_id, "boom");
  assert!(result.output.is_none());
  assert!(result.error.as_deref().unwrap().contains("panicked"));
}

fn trigger_condition_process() -> Flow {
  flow_from(
    vec![
      NodeDef::new(
        "T",
        NodeKind::Trigger {
          trigger_type: TriggerType::Manual,
          payload: Value::Null,
        },
      ),
      NodeDef::new(
        "C",
        NodeKind::Condition {
          expression: "${x} > 5".to_string(),
          true_output: json!({ "size": "big" }),
          false_output: json!({ "size": "small" }),
        },
      ),
      pass("P"),
    ],
    vec![
      edge("T", "C"),
      edge("C", "P").with_guard("${condition} == true"),
    ],
  )
}

#[tokio::test]
async fn test_trigger_condition_process_open_branch() {
  let engine = FlowEngine::new(
    Arc::new(StandardProcessor::default()),
    EngineConfig::default(),
  );
  let flow = trigger_condition_process();

  let result = run(&engine, &flow, json!({ "x": 10 })).await;

  assert!(result.success);
  assert_eq!(result.executed_nodes(), vec!["T", "C", "P"]);
  assert_eq!(
    result.node_result("C").unwrap().output,
    Some(json!({ "condition": true, "result": { "size": "big" } }))
  );
  assert_eq!(result.final_output["P"]["x"], 10);
}

#[tokio::test]
async fn test_trigger_condition_process_closed_branch() {
  let engine = FlowEngine::new(
    Arc::new(StandardProcessor::default()),
    EngineConfig::default(),
  );
  let flow = trigger_condition_process();

  let result = run(&engine, &flow, json!({ "x": 1 })).await;

  assert!(!result.success);
  assert_eq!(result.outcome, RunOutcome::Blocked);
  assert_eq!(result.executed_nodes(), vec!["T", "C"]);
  assert_eq!(
    result.node_result("C").unwrap().output,
    Some(json!({ "condition": false, "result": { "size": "small" } }))
  );
  assert_eq!(result.blocked_nodes, vec!["P"]);
}
