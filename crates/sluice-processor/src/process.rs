use serde_json::{Value, json};
use sluice_config::ProcessConfig;
use sluice_host::Collaborators;

use crate::error::ProcessorError;
use crate::input::NodeInput;
use crate::types::NodeLog;
use crate::{automation, condition, integration, task};

/// Dispatch a process node to its sub-kind handler.
pub async fn execute(
  config: &ProcessConfig,
  input: &NodeInput,
  collaborators: &Collaborators,
  log: &mut NodeLog,
) -> Result<Value, ProcessorError> {
  match config {
    ProcessConfig::Task(task) => task::execute(task, input, log).await,
    ProcessConfig::Automation(automation) => {
      automation::execute(automation, input, collaborators, log).await
    }
    ProcessConfig::Integration(integration) => {
      integration::execute(integration, input, collaborators, log).await
    }
    ProcessConfig::Trigger { event } => {
      log.info(format!("Raising event '{}'", event));
      let mut output = input.merged();
      if let Value::Object(fields) = &mut output {
        fields.insert("event".to_string(), json!(event));
      }
      Ok(output)
    }
    ProcessConfig::Rule {
      condition,
      true_output,
      false_output,
    } => Ok(condition::evaluate(
      condition,
      true_output,
      false_output,
      input,
      log,
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Map;

  #[tokio::test]
  async fn test_rule_selects_payload() {
    let config = ProcessConfig::Rule {
      condition: "${status} == 'active'".to_string(),
      true_output: json!({ "route": "a" }),
      false_output: json!({ "route": "b" }),
    };
    let vars = json!({ "status": "active" }).as_object().cloned().unwrap();
    let mut log = NodeLog::for_node("rule", "rule");

    let output = execute(
      &config,
      &NodeInput::new(vars, vec![]),
      &Collaborators::default(),
      &mut log,
    )
    .await
    .unwrap();

    assert_eq!(output, json!({ "condition": true, "result": { "route": "a" } }));
  }

  #[tokio::test]
  async fn test_trigger_adds_event() {
    let config = ProcessConfig::Trigger {
      event: "user.created".to_string(),
    };
    let mut log = NodeLog::for_node("emit", "emit");

    let output = execute(
      &config,
      &NodeInput::new(Map::new(), vec![("a".to_string(), json!({ "id": 7 }))]),
      &Collaborators::default(),
      &mut log,
    )
    .await
    .unwrap();

    assert_eq!(output, json!({ "id": 7, "event": "user.created" }));
  }
}
