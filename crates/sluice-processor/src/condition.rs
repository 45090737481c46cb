use serde_json::{Value, json};

use crate::input::NodeInput;
use crate::types::NodeLog;

/// Evaluate `expression` against the merged input and emit the chosen branch.
///
/// Output shape: `{ "condition": bool, "result": <branch payload> }`.
pub fn evaluate(
  expression: &str,
  true_output: &Value,
  false_output: &Value,
  input: &NodeInput,
  log: &mut NodeLog,
) -> Value {
  let passed = sluice_guard::evaluate(expression, &input.merged());
  log.info(format!("Condition '{}' evaluated to {}", expression, passed));

  let result = if passed { true_output } else { false_output };
  json!({
    "condition": passed,
    "result": result,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Map;

  #[test]
  fn test_branches_on_merged_input() {
    let mut log = NodeLog::for_node("check", "check");
    let input = NodeInput::new(
      Map::new(),
      vec![("start".to_string(), json!({ "x": 10 }))],
    );

    let output = evaluate("${x} > 5", &json!("big"), &json!("small"), &input, &mut log);
    assert_eq!(output, json!({ "condition": true, "result": "big" }));

    let input = NodeInput::new(Map::new(), vec![("start".to_string(), json!({ "x": 1 }))]);
    let output = evaluate("${x} > 5", &json!("big"), &json!("small"), &input, &mut log);
    assert_eq!(output, json!({ "condition": false, "result": "small" }));
    assert_eq!(log.entries().len(), 2);
  }
}
