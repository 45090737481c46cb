//! Input assembly.
//!
//! Every processor sees the same [`NodeInput`]: the run variables plus every
//! node output produced before the node's wave started, in flow declaration
//! order.
//!
//! # Merge policy
//! [`NodeInput::merged`] starts from the variables, then applies each output
//! in declaration order. Object outputs are shallow-merged field by field;
//! any other output is stored under the producing node's id. A later entry
//! overwrites an earlier one with the same key.
//!
//! Processors that must not lose colliding fields use
//! [`NodeInput::namespaced`], which keys each output by node id.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInput {
  variables: Map<String, Value>,
  outputs: Vec<(String, Value)>,
}

impl NodeInput {
  /// `outputs` must already be in declaration order.
  pub fn new(variables: Map<String, Value>, outputs: Vec<(String, Value)>) -> Self {
    Self { variables, outputs }
  }

  pub fn variables(&self) -> &Map<String, Value> {
    &self.variables
  }

  pub fn outputs(&self) -> &[(String, Value)] {
    &self.outputs
  }

  /// Output of a specific node, if it has produced one.
  pub fn output(&self, node_id: &str) -> Option<&Value> {
    self
      .outputs
      .iter()
      .find(|(id, _)| id == node_id)
      .map(|(_, v)| v)
  }

  /// Variables and outputs merged into one object.
  pub fn merged(&self) -> Value {
    let mut merged = self.variables.clone();
    for (node_id, output) in &self.outputs {
      match output {
        Value::Object(fields) => {
          for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
          }
        }
        other => {
          merged.insert(node_id.clone(), other.clone());
        }
      }
    }
    Value::Object(merged)
  }

  /// Outputs keyed by node id.
  pub fn namespaced(&self) -> Value {
    Value::Object(
      self
        .outputs
        .iter()
        .map(|(id, v)| (id.clone(), v.clone()))
        .collect(),
    )
  }
}
