use serde_json::Value;

/// Resolve a dot path (`a.b.0.c`) inside a JSON value.
///
/// Object keys are matched exactly; numeric segments index arrays. An empty
/// path returns the value itself.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
  let path = path.trim();
  if path.is_empty() {
    return Some(value);
  }

  path.split('.').try_fold(value, |current, segment| match current {
    Value::Object(map) => map.get(segment),
    Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
    _ => None,
  })
}
