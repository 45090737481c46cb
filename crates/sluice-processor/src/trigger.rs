use serde_json::Value;
use sluice_config::TriggerType;

use crate::input::NodeInput;

/// A trigger emits the merged input overlaid with its configured payload.
///
/// Object payloads are merged field by field; any other non-null payload is
/// exposed as `payload`.
pub fn fire(trigger_type: TriggerType, payload: &Value, input: &NodeInput) -> Value {
  let mut output = input.merged();
  if let Value::Object(fields) = &mut output {
    match payload {
      Value::Null => {}
      Value::Object(extra) => {
        for (key, value) in extra {
          fields.insert(key.clone(), value.clone());
        }
      }
      other => {
        fields.insert("payload".to_string(), other.clone());
      }
    }
    if trigger_type != TriggerType::Manual {
      fields.insert(
        "trigger_type".to_string(),
        serde_json::to_value(trigger_type).unwrap_or(Value::Null),
      );
    }
  }
  output
}
