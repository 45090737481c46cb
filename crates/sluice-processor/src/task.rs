//! Built-in data tasks: pass-through, transform, filter, aggregate and delay.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value, json};
use sluice_config::{AggregateOperation, TaskConfig};
use sluice_guard::{interpolate, resolve_path};

use crate::error::ProcessorError;
use crate::input::NodeInput;
use crate::types::NodeLog;

pub async fn execute(
  config: &TaskConfig,
  input: &NodeInput,
  log: &mut NodeLog,
) -> Result<Value, ProcessorError> {
  let merged = input.merged();
  match config {
    TaskConfig::PassThrough => Ok(merged),
    TaskConfig::Transform { mapping } => Ok(transform(mapping, &merged)),
    TaskConfig::Filter { source, condition } => {
      let items = source_array(source, &merged)?;
      let kept: Vec<Value> = items
        .iter()
        .filter(|item| sluice_guard::evaluate(condition, &item_context(&merged, item)))
        .cloned()
        .collect();
      log.info(format!("Kept {} of {} items", kept.len(), items.len()));
      Ok(json!({ "items": kept, "count": kept.len() }))
    }
    TaskConfig::Aggregate {
      source,
      field,
      operation,
    } => {
      let items = source_array(source, &merged)?;
      let value = aggregate(items, field.as_deref(), *operation);
      Ok(json!({
        "operation": operation,
        "value": value,
        "count": items.len(),
      }))
    }
    TaskConfig::Delay { duration_ms } => {
      log.info(format!("Waiting {}ms", duration_ms));
      tokio::time::sleep(Duration::from_millis(*duration_ms)).await;
      Ok(merged)
    }
  }
}

/// Build an object from `mapping`. A value containing `${` is a template;
/// anything else is a dot path into the input (missing paths yield null).
fn transform(mapping: &BTreeMap<String, String>, merged: &Value) -> Value {
  let mut output = Map::new();
  for (target, source) in mapping {
    let value = if source.contains("${") {
      Value::String(interpolate(source, merged))
    } else {
      resolve_path(merged, source).cloned().unwrap_or(Value::Null)
    };
    output.insert(target.clone(), value);
  }
  Value::Object(output)
}

fn source_array<'a>(source: &str, merged: &'a Value) -> Result<&'a Vec<Value>, ProcessorError> {
  match resolve_path(merged, source) {
    Some(Value::Array(items)) => Ok(items),
    Some(_) => Err(ProcessorError::invalid_input(source, "expected an array")),
    None => Err(ProcessorError::invalid_input(source, "not found in input")),
  }
}

/// Filter conditions see the input, the item's own fields, and the item as `item`.
fn item_context(merged: &Value, item: &Value) -> Value {
  let mut context = merged.as_object().cloned().unwrap_or_default();
  if let Value::Object(fields) = item {
    for (key, value) in fields {
      context.insert(key.clone(), value.clone());
    }
  }
  context.insert("item".to_string(), item.clone());
  Value::Object(context)
}

fn aggregate(items: &[Value], field: Option<&str>, operation: AggregateOperation) -> Value {
  // Non-numeric values are skipped.
  let numbers: Vec<f64> = items
    .iter()
    .filter_map(|item| match field {
      Some(path) => resolve_path(item, path),
      None => Some(item),
    })
    .filter_map(Value::as_f64)
    .collect();

  match operation {
    AggregateOperation::Count => json!(items.len()),
    AggregateOperation::Sum => json!(numbers.iter().sum::<f64>()),
    AggregateOperation::Avg if numbers.is_empty() => Value::Null,
    AggregateOperation::Avg => json!(numbers.iter().sum::<f64>() / numbers.len() as f64),
    AggregateOperation::Min => numbers
      .iter()
      .copied()
      .reduce(f64::min)
      .map_or(Value::Null, |n| json!(n)),
    AggregateOperation::Max => numbers
      .iter()
      .copied()
      .reduce(f64::max)
      .map_or(Value::Null, |n| json!(n)),
  }
}
