use std::collections::HashMap;

use chrono::Local;

use crate::env::Env;
use crate::object::{Builtin, BuiltinFunction, HashPairs, Object};
use crate::typing::{exact_args, minimum_args, range_of_args, to_float, to_str, unexpected_type, with_types};

/// Registry of native functions, consulted after the scope chain misses.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
  functions: HashMap<String, Builtin>,
}

impl Builtins {
  pub fn new() -> Self {
    Builtins::default()
  }

  pub fn standard() -> Self {
    let mut builtins = Builtins::new();
    builtins.register("args", builtin_args);
    builtins.register("bool", builtin_bool);
    builtins.register("float", builtin_float);
    builtins.register("int", builtin_int);
    builtins.register("str", builtin_str);
    builtins.register("type", builtin_type);
    builtins.register("len", builtin_len);
    builtins.register("print", builtin_print);
    builtins.register("println", builtin_println);
    builtins.register("append", builtin_append);
    builtins.register("keys", builtin_keys);
    builtins.register("delete", builtin_delete);
    builtins.register("time", builtin_time);
    builtins.register("abs", builtin_abs);
    builtins.register("sqrt", builtin_sqrt);
    builtins.register("pow", builtin_pow);
    builtins.register("min", builtin_min);
    builtins.register("max", builtin_max);
    builtins.register("snapshot", builtin_snapshot);
    builtins
  }

  pub fn register(&mut self, name: &str, func: BuiltinFunction) {
    let builtin = Builtin {
      name: name.to_owned(),
      func,
    };
    self.functions.insert(name.to_owned(), builtin);
  }

  pub fn get(&self, name: &str) -> Option<Object> {
    self.functions.get(name).cloned().map(Object::Builtin)
  }

  pub fn names(&self) -> Vec<&str> {
    let mut names = self.functions.keys().map(String::as_str).collect::<Vec<_>>();
    names.sort_unstable();
    names
  }
}

fn builtin_args(env: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("args", args, 0)?;

  let elements = env
    .host()
    .args
    .iter()
    .map(|arg| Object::String(arg.clone()))
    .collect();
  Ok(Some(Object::array(elements)))
}

fn builtin_bool(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("bool", args, 1)?;
  Ok(Some(Object::Boolean(args[0].to_bool())))
}

fn builtin_float(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("float", args, 1)?;

  let value = match &args[0] {
    Object::Boolean(value) => f64::from(u8::from(*value)),
    Object::Float(value) => *value,
    Object::Integer(value) => *value as f64,
    Object::String(value) => value
      .trim()
      .parse::<f64>()
      .map_err(|err| format!("could not parse string to float: {}", err))?,
    _ => 0.0,
  };
  Ok(Some(Object::Float(value)))
}

fn builtin_int(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("int", args, 1)?;

  let value = match &args[0] {
    Object::Boolean(value) => i64::from(*value),
    Object::Integer(value) => *value,
    Object::Float(value) => value.round() as i64,
    Object::String(value) => value
      .trim()
      .parse::<i64>()
      .map_err(|err| format!("could not parse string to int: {}", err))?,
    _ => 0,
  };
  Ok(Some(Object::Integer(value)))
}

fn builtin_str(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("str", args, 1)?;
  Ok(Some(Object::String(args[0].to_string())))
}

fn builtin_type(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("type", args, 1)?;
  Ok(Some(Object::String(args[0].type_name().to_owned())))
}

fn builtin_len(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("len", args, 1)?;

  match args[0].len() {
    Some(len) => Ok(Some(Object::Integer(len as i64))),
    None => Err(format!("TypeError: object of type '{}' has no len()", args[0].type_name())),
  }
}

fn builtin_print(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  for arg in args {
    print!("{}", arg);
  }
  Ok(None)
}

fn builtin_println(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  println!("{}", args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(" "));
  Ok(None)
}

/// Returns a new array; the argument is left untouched.
fn builtin_append(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("append", args, 2)?;

  let mut elements = match &args[0] {
    Object::Array(elements) => elements.borrow().clone(),
    other => return Err(unexpected_type("append", 1, "array", other)),
  };
  elements.push(args[1].clone());
  Ok(Some(Object::array(elements)))
}

fn builtin_keys(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("keys", args, 1)?;

  let keys = match &args[0] {
    Object::Hash(pairs) => pairs.borrow().values().map(|pair| pair.key.clone()).collect(),
    other => return Err(unexpected_type("keys", 1, "hash", other)),
  };
  Ok(Some(Object::array(keys)))
}

/// Returns a copy of the hash without `key`.
fn builtin_delete(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("delete", args, 2)?;

  let key = args[1].hash_key().ok_or_else(|| {
    format!(
      "TypeError: delete() expected argument #2 to be 'str', 'int', 'float' or 'bool' got '{}'",
      args[1].type_name()
    )
  })?;

  let pairs: HashPairs = match &args[0] {
    Object::Hash(pairs) => pairs
      .borrow()
      .iter()
      .filter(|(k, _)| **k != key)
      .map(|(k, pair)| (*k, pair.clone()))
      .collect(),
    other => return Err(unexpected_type("delete", 1, "hash", other)),
  };
  Ok(Some(Object::hash(pairs)))
}

fn builtin_time(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("time", args, 0)?;
  Ok(Some(Object::Integer(Local::now().timestamp_millis())))
}

fn builtin_abs(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("abs", args, 1)?;

  match &args[0] {
    Object::Integer(value) => Ok(Some(Object::Integer(value.wrapping_abs()))),
    Object::Float(value) => Ok(Some(Object::Float(value.abs()))),
    other => Err(format!(
      "TypeError: abs() argument #1 expected to be 'int' or 'float' got '{}'",
      other.type_name()
    )),
  }
}

fn builtin_sqrt(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("sqrt", args, 1)?;

  let x = to_float(&args[0]).map_err(|err| format!("TypeError: sqrt() argument #1 {}", err))?;
  Ok(Some(Object::Float(x.sqrt())))
}

fn builtin_pow(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  exact_args("pow", args, 2)?;

  let x = to_float(&args[0]).map_err(|err| format!("TypeError: pow() argument #1 {}", err))?;
  let y = to_float(&args[1]).map_err(|err| format!("TypeError: pow() argument #2 {}", err))?;
  Ok(Some(Object::Float(x.powf(y))))
}

/// Numbers passed either as arguments or as a single array argument.
fn numbers(name: &str, args: &[Object]) -> Result<Vec<f64>, String> {
  minimum_args(name, args, 1)?;

  let values = match args {
    [Object::Array(elements)] => elements.borrow().clone(),
    _ => args.to_vec(),
  };

  values
    .iter()
    .enumerate()
    .map(|(i, value)| to_float(value).map_err(|err| format!("TypeError: {}() argument #{} {}", name, i + 1, err)))
    .collect()
}

fn builtin_min(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  let values = numbers("min", args)?;
  Ok(Some(Object::Float(values.into_iter().fold(f64::INFINITY, f64::min))))
}

fn builtin_max(_: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  let values = numbers("max", args)?;
  Ok(Some(Object::Float(values.into_iter().fold(f64::NEG_INFINITY, f64::max))))
}

/// `snapshot([filename])` asks the attached canvas to write a PNG, by default
/// to the next numbered file of the snapshot folder.
fn builtin_snapshot(env: &Env, args: &[Object]) -> Result<Option<Object>, String> {
  range_of_args("snapshot", args, 0, 1)?;
  with_types("snapshot", args, &["str"])?;

  let host = env.host();
  let canvas = host
    .canvas
    .as_ref()
    .ok_or_else(|| "snapshot() requires a canvas".to_owned())?;

  let path = match args.first() {
    Some(filename) => host.snapshot.directory().join(to_str(filename)?),
    None => host.snapshot.next_path(),
  };

  canvas
    .borrow_mut()
    .save_png(&path)
    .map_err(|err| format!("IOError: could not write '{}': {}", path.display(), err))?;
  Ok(None)
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::io;
  use std::path::{Path, PathBuf};
  use std::rc::Rc;

  use super::*;
  use crate::host::{Canvas, Host, Snapshot};
  use crate::object::HashPair;

  #[derive(Debug, Default)]
  struct RecordingCanvas {
    saved: Vec<PathBuf>,
  }

  impl Canvas for RecordingCanvas {
    fn width(&self) -> f64 {
      640.0
    }

    fn height(&self) -> f64 {
      480.0
    }

    fn save_png(&mut self, path: &Path) -> io::Result<()> {
      self.saved.push(path.to_path_buf());
      Ok(())
    }
  }

  fn env() -> Env {
    Env::new(Rc::new(Host::new().with_args(vec!["-v".to_owned()])))
  }

  fn call(name: &str, args: Vec<Object>) -> Result<Option<Object>, String> {
    let builtins = Builtins::standard();
    match builtins.get(name) {
      Some(Object::Builtin(builtin)) => (builtin.func)(&env(), &args),
      _ => panic!("missing builtin {}", name),
    }
  }

  fn string(value: &str) -> Object {
    Object::String(value.to_owned())
  }

  #[test]
  fn test_registry() {
    let mut builtins = Builtins::new();
    assert!(builtins.get("len").is_none());

    builtins.register("len", builtin_len);
    assert_eq!(builtins.names(), vec!["len"]);
    assert_eq!(builtins.get("len").unwrap().to_string(), "<built-in function len>");
  }

  #[test]
  fn test_conversions() {
    assert_eq!(call("int", vec![string("42")]), Ok(Some(Object::Integer(42))));
    assert_eq!(call("int", vec![Object::Float(2.6)]), Ok(Some(Object::Integer(3))));
    assert_eq!(call("float", vec![Object::Boolean(true)]), Ok(Some(Object::Float(1.0))));
    assert_eq!(call("str", vec![Object::Float(1.5)]), Ok(Some(string("1.5"))));
    assert_eq!(call("bool", vec![Object::Integer(0)]), Ok(Some(Object::Boolean(false))));
    assert_eq!(call("type", vec![Object::Null]), Ok(Some(string("null"))));
    assert!(call("int", vec![string("x")]).unwrap_err().starts_with("could not parse string to int"));
  }

  #[test]
  fn test_len() {
    assert_eq!(call("len", vec![string("héllo")]), Ok(Some(Object::Integer(5))));
    assert_eq!(
      call("len", vec![Object::Integer(1)]),
      Err("TypeError: object of type 'int' has no len()".to_owned())
    );
    assert_eq!(
      call("len", vec![]),
      Err("TypeError: len() takes exactly 1 argument (0 given)".to_owned())
    );
  }

  #[test]
  fn test_append_copies() {
    let array = Object::array(vec![Object::Integer(1)]);
    let appended = call("append", vec![array.clone(), Object::Integer(2)]).unwrap().unwrap();

    assert_eq!(array.to_string(), "[1]");
    assert_eq!(appended.to_string(), "[1, 2]");
  }

  #[test]
  fn test_keys_and_delete() {
    let mut pairs = HashPairs::new();
    for (key, value) in [("a", 1), ("b", 2)] {
      let key = string(key);
      pairs.insert(key.hash_key().unwrap(), HashPair { key, value: Object::Integer(value) });
    }
    let hash = Object::hash(pairs);

    let keys = call("keys", vec![hash.clone()]).unwrap().unwrap();
    assert_eq!(keys.len(), Some(2));

    let deleted = call("delete", vec![hash.clone(), string("a")]).unwrap().unwrap();
    assert_eq!(deleted.to_string(), "{b: 2}");
    assert_eq!(hash.len(), Some(2));

    assert!(call("delete", vec![hash, Object::array(vec![])]).is_err());
  }

  #[test]
  fn test_math() {
    assert_eq!(call("abs", vec![Object::Integer(-3)]), Ok(Some(Object::Integer(3))));
    assert_eq!(call("sqrt", vec![Object::Integer(9)]), Ok(Some(Object::Float(3.0))));
    assert_eq!(call("pow", vec![Object::Integer(2), Object::Integer(10)]), Ok(Some(Object::Float(1024.0))));
    assert_eq!(
      call("min", vec![Object::Integer(3), Object::Float(1.5), Object::Integer(2)]),
      Ok(Some(Object::Float(1.5)))
    );
    assert_eq!(
      call("max", vec![Object::array(vec![Object::Integer(3), Object::Integer(7)])]),
      Ok(Some(Object::Float(7.0)))
    );
    assert_eq!(
      call("pow", vec![string("2"), Object::Integer(1)]),
      Err("TypeError: pow() argument #1 expected to be 'int' or 'float' got 'str'".to_owned())
    );
  }

  #[test]
  fn test_args_come_from_host() {
    assert_eq!(call("args", vec![]).unwrap().unwrap().to_string(), "[-v]");
  }

  #[test]
  fn test_snapshot() {
    assert_eq!(call("snapshot", vec![]), Err("snapshot() requires a canvas".to_owned()));

    let canvas = Rc::new(RefCell::new(RecordingCanvas::default()));
    let host = Host::new()
      .with_snapshot(Snapshot::new("out", Some("demo".to_owned())))
      .with_canvas(canvas.clone());
    let env = Env::new(Rc::new(host));

    assert_eq!(env.get("WIDTH"), Some(Object::Float(640.0)));
    builtin_snapshot(&env, &[]).unwrap();
    builtin_snapshot(&env, &[string("custom.png")]).unwrap();
    builtin_snapshot(&env, &[]).unwrap();

    assert_eq!(
      canvas.borrow().saved,
      vec![
        Path::new("out").join("demo_0001.png"),
        Path::new("out").join("custom.png"),
        Path::new("out").join("demo_0002.png"),
      ]
    );
  }
}
