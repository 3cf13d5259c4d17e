//! Argument checks shared by the builtins. Every failure is a ready-to-use
//! `TypeError: ...` message.

use crate::object::Object;

pub fn exact_args(name: &str, args: &[Object], n: usize) -> Result<(), String> {
  if args.len() != n {
    return Err(format!(
      "TypeError: {}() takes exactly {} argument ({} given)",
      name,
      n,
      args.len()
    ));
  }
  Ok(())
}

pub fn minimum_args(name: &str, args: &[Object], n: usize) -> Result<(), String> {
  if args.len() < n {
    return Err(format!(
      "TypeError: {}() takes a minimum {} arguments ({} given)",
      name,
      n,
      args.len()
    ));
  }
  Ok(())
}

pub fn range_of_args(name: &str, args: &[Object], min: usize, max: usize) -> Result<(), String> {
  if args.len() < min || args.len() > max {
    return Err(format!(
      "TypeError: {}() takes at least {} arguments at most {} ({} given)",
      name,
      min,
      max,
      args.len()
    ));
  }
  Ok(())
}

/// Message for argument `position` (1-based) having the wrong type.
pub fn unexpected_type(name: &str, position: usize, expected: &str, got: &Object) -> String {
  format!(
    "TypeError: {}() expected argument #{} to be '{}' got '{}'",
    name,
    position,
    expected,
    got.type_name()
  )
}

/// Checks positional argument types by type name. Missing arguments are not checked.
pub fn with_types(name: &str, args: &[Object], types: &[&str]) -> Result<(), String> {
  for (i, (expected, arg)) in types.iter().zip(args).enumerate() {
    if arg.type_name() != *expected {
      return Err(unexpected_type(name, i + 1, expected, arg));
    }
  }
  Ok(())
}

pub fn to_float(object: &Object) -> Result<f64, String> {
  match object {
    Object::Integer(value) => Ok(*value as f64),
    Object::Float(value) => Ok(*value),
    other => Err(format!("expected to be 'int' or 'float' got '{}'", other.type_name())),
  }
}

/// Integer view of a number. Floats are rounded.
pub fn to_int(object: &Object) -> Result<i64, String> {
  match object {
    Object::Integer(value) => Ok(*value),
    Object::Float(value) => Ok(value.round() as i64),
    other => Err(format!("expected to be 'int' got '{}'", other.type_name())),
  }
}

pub fn to_str(object: &Object) -> Result<&str, String> {
  match object {
    Object::String(value) => Ok(value),
    other => Err(format!("expected to be 'str' got '{}'", other.type_name())),
  }
}
