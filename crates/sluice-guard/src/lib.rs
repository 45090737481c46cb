//! Guard expression evaluation.
//!
//! Guards gate edge traversal and drive condition/rule nodes. The grammar is
//! deliberately small and never executes user code:
//!
//! ```text
//! guard      := comparison | value
//! comparison := value ( "==" | "!=" | ">" | "<" ) value
//! value      := any text, with ${dot.path} placeholders interpolated first
//! ```
//!
//! # Interpolation
//! `${user.age}` is replaced with the value at that dot path in the context.
//! Numeric segments index into arrays (`${items.0.name}`). Strings are inserted
//! as-is, other JSON values as compact JSON. Placeholders that do not resolve
//! are left in the text untouched.
//!
//! # Comparison
//! Operators are tried in a fixed order (`==`, `!=`, `>`, `<`) and the
//! expression is split on the first occurrence of the first operator found.
//! When both operands parse as numbers they are compared numerically,
//! otherwise `==`/`!=` compare the strings and `>`/`<` are false.
//!
//! Without an operator the interpolated text is checked for truthiness: it
//! must be non-empty, not `false` and not numerically zero.

mod interpolate;
mod path;

pub use interpolate::{interpolate, interpolate_value};
pub use path::resolve_path;

use serde_json::Value;

/// Comparison operators in the order they are recognized.
const OPERATORS: [Operator; 4] = [Operator::Eq, Operator::Ne, Operator::Gt, Operator::Lt];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
  Eq,
  Ne,
  Gt,
  Lt,
}

impl Operator {
  fn symbol(self) -> &'static str {
    match self {
      Operator::Eq => "==",
      Operator::Ne => "!=",
      Operator::Gt => ">",
      Operator::Lt => "<",
    }
  }
}

/// Evaluate a guard expression against a context value.
pub fn evaluate(expression: &str, context: &Value) -> bool {
  let text = interpolate(expression, context);

  for op in OPERATORS {
    if let Some((lhs, rhs)) = text.split_once(op.symbol()) {
      return compare(op, operand(lhs), operand(rhs));
    }
  }

  is_truthy(&text)
}

/// Truthiness of interpolated text.
pub fn is_truthy(text: &str) -> bool {
  let text = operand(text);
  if text.is_empty() || text.eq_ignore_ascii_case("false") {
    return false;
  }
  match text.parse::<f64>() {
    Ok(n) => n != 0.0,
    Err(_) => true,
  }
}

fn compare(op: Operator, lhs: &str, rhs: &str) -> bool {
  if let (Ok(l), Ok(r)) = (lhs.parse::<f64>(), rhs.parse::<f64>()) {
    return match op {
      Operator::Eq => l == r,
      Operator::Ne => l != r,
      Operator::Gt => l > r,
      Operator::Lt => l < r,
    };
  }

  match op {
    Operator::Eq => lhs == rhs,
    Operator::Ne => lhs != rhs,
    Operator::Gt | Operator::Lt => false,
  }
}

/// Trim whitespace and one layer of matching quotes.
fn operand(raw: &str) -> &str {
  let trimmed = raw.trim();
  for quote in ['"', '\''] {
    if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
      return &trimmed[1..trimmed.len() - 1];
    }
  }
  trimmed
}
