//! Readiness Resolver.
//!
//! A node is ready when it has not executed and every incoming edge is
//! satisfied: the source executed, succeeded, and the edge guard (if any)
//! holds against the source output. Failed sources and closed guards leave
//! their targets blocked for the rest of the run.

use serde_json::{Map, Value};
use sluice_flow::{Edge, Flow};

use crate::context::ExecutionContext;

pub struct ReadinessResolver<'a> {
  flow: &'a Flow,
  context: &'a ExecutionContext,
}

impl<'a> ReadinessResolver<'a> {
  pub fn new(flow: &'a Flow, context: &'a ExecutionContext) -> Self {
    Self { flow, context }
  }

  pub fn is_ready(&self, node_id: &str) -> bool {
    if self.flow.get_node(node_id).is_none() || self.context.has_executed(node_id) {
      return false;
    }
    self
      .flow
      .graph()
      .incoming_edges(node_id)
      .iter()
      .all(|&idx| self.edge_satisfied(self.flow.edge(idx)))
  }

  /// Every ready node, in declaration order.
  pub fn ready_set(&self) -> Vec<String> {
    self
      .flow
      .nodes()
      .iter()
      .map(|node| node.node_id.as_str())
      .filter(|id| self.is_ready(id))
      .map(String::from)
      .collect()
  }

  /// Ready nodes among `candidates`, deduplicated, in declaration order.
  pub fn ready_among(&self, candidates: &[String]) -> Vec<String> {
    let mut ready: Vec<&str> = candidates
      .iter()
      .map(String::as_str)
      .filter(|id| self.is_ready(id))
      .collect();
    ready.sort_by_key(|id| self.flow.position(id));
    ready.dedup();
    ready.into_iter().map(String::from).collect()
  }

  fn edge_satisfied(&self, edge: &Edge) -> bool {
    let Some(output) = self.context.output(&edge.from) else {
      // Not executed yet, or failed.
      return false;
    };
    match &edge.guard {
      None => true,
      Some(guard) => {
        let context = guard_context(self.context.variables(), output);
        sluice_guard::evaluate(guard, &context)
      }
    }
  }
}

/// Guards see the run variables overlaid with the source output. A
/// non-object output is exposed as `output`.
pub(crate) fn guard_context(variables: &Map<String, Value>, output: Value) -> Value {
  let mut context = variables.clone();
  match output {
    Value::Object(fields) => context.extend(fields),
    other => {
      context.insert("output".to_string(), other);
    }
  }
  Value::Object(context)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use sluice_config::{EdgeDef, FlowDef, NodeDef, NodeKind, ProcessConfig, TaskConfig};

  fn pass(id: &str) -> NodeDef {
    NodeDef::new(
      id,
      NodeKind::Process {
        process: ProcessConfig::Task(TaskConfig::PassThrough),
      },
    )
  }

  fn flow(nodes: &[&str], edges: Vec<EdgeDef>) -> Flow {
    Flow::from_def(FlowDef {
      flow_id: "f".to_string(),
      name: "f".to_string(),
      max_iterations: None,
      nodes: nodes.iter().map(|id| pass(id)).collect(),
      edges,
    })
    .unwrap()
  }

  #[test]
  fn test_entry_nodes_ready_at_start() {
    let flow = flow(&["a", "b", "c"], vec![EdgeDef::new("e1", "a", "c")]);
    let ctx = ExecutionContext::default();
    let resolver = ReadinessResolver::new(&flow, &ctx);

    assert_eq!(resolver.ready_set(), vec!["a", "b"]);
    assert!(!resolver.is_ready("c"));
    assert!(!resolver.is_ready("missing"));
  }

  #[test]
  fn test_and_semantics() {
    let flow = flow(
      &["a", "b", "join"],
      vec![
        EdgeDef::new("e1", "a", "join"),
        EdgeDef::new("e2", "b", "join"),
      ],
    );
    let ctx = ExecutionContext::default();
    ctx.record_success("a", json!({}), vec![]).unwrap();

    let resolver = ReadinessResolver::new(&flow, &ctx);
    assert!(!resolver.is_ready("join"));

    ctx.record_error("b", "boom", vec![]).unwrap();
    assert!(!resolver.is_ready("join"));
    assert!(resolver.ready_set().is_empty());
  }

  #[test]
  fn test_executed_nodes_never_ready_again() {
    let flow = flow(&["a"], vec![]);
    let ctx = ExecutionContext::default();
    ctx.record_success("a", json!(1), vec![]).unwrap();

    assert!(ReadinessResolver::new(&flow, &ctx).ready_set().is_empty());
  }

  #[test]
  fn test_guards_see_source_output_and_variables() {
    let flow = flow(
      &["check", "yes", "no", "big"],
      vec![
        EdgeDef::new("e1", "check", "yes").with_guard("${condition} == true"),
        EdgeDef::new("e2", "check", "no").with_guard("${condition} == false"),
        EdgeDef::new("e3", "check", "big").with_guard("${limit} > 5"),
      ],
    );
    let vars = json!({ "limit": 10 }).as_object().cloned().unwrap();
    let ctx = ExecutionContext::new(vars);
    ctx
      .record_success("check", json!({ "condition": true }), vec![])
      .unwrap();

    let resolver = ReadinessResolver::new(&flow, &ctx);
    assert_eq!(resolver.ready_set(), vec!["yes", "big"]);
  }

  #[test]
  fn test_non_object_output_guard() {
    let flow = flow(
      &["count", "many"],
      vec![EdgeDef::new("e1", "count", "many").with_guard("${output} > 2")],
    );
    let ctx = ExecutionContext::default();
    ctx.record_success("count", json!(3), vec![]).unwrap();

    assert!(ReadinessResolver::new(&flow, &ctx).is_ready("many"));
  }

  #[test]
  fn test_ready_among_orders_and_dedups() {
    let flow = flow(
      &["a", "b", "c"],
      vec![EdgeDef::new("e1", "a", "c"), EdgeDef::new("e2", "a", "b")],
    );
    let ctx = ExecutionContext::default();
    ctx.record_success("a", json!({}), vec![]).unwrap();

    let resolver = ReadinessResolver::new(&flow, &ctx);
    let candidates = vec!["c".to_string(), "b".to_string(), "c".to_string()];
    assert_eq!(resolver.ready_among(&candidates), vec!["b", "c"]);
  }
}
