use serde_json::Value;

use crate::path::resolve_path;

/// Replace `${path}` placeholders with values from `context`.
pub fn interpolate(template: &str, context: &Value) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(start) = rest.find("${") {
    out.push_str(&rest[..start]);
    let after = &rest[start + 2..];

    let Some(end) = after.find('}') else {
      // Unterminated placeholder, keep the remainder verbatim.
      out.push_str(&rest[start..]);
      return out;
    };

    let placeholder = &rest[start..start + 2 + end + 1];
    match resolve_path(context, &after[..end]) {
      Some(value) => out.push_str(&render(value)),
      None => out.push_str(placeholder),
    }
    rest = &after[end + 1..];
  }

  out.push_str(rest);
  out
}

/// Interpolate every string inside a JSON value, recursively.
pub fn interpolate_value(value: &Value, context: &Value) -> Value {
  match value {
    Value::String(s) => Value::String(interpolate(s, context)),
    Value::Array(items) => Value::Array(
      items
        .iter()
        .map(|v| interpolate_value(v, context))
        .collect(),
    ),
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| (k.clone(), interpolate_value(v, context)))
        .collect(),
    ),
    other => other.clone(),
  }
}

fn render(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
