use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use crate::ast::Block;
use crate::env::Env;

/// Native function signature. `Ok(None)` is an implicit null, `Err` becomes an error value.
pub type BuiltinFunction = fn(&Env, &[Object]) -> Result<Option<Object>, String>;

pub type HashPairs = BTreeMap<HashKey, HashPair>;

#[derive(Debug, Clone)]
pub enum Object {
  Integer(i64),
  Float(f64),
  String(String),
  Boolean(bool),
  Null,
  Array(Rc<RefCell<Vec<Object>>>),
  Hash(Rc<RefCell<HashPairs>>),
  Function(Rc<Function>),
  Builtin(Builtin),
  Error(String),
  Module(Rc<Module>),
}

pub struct Function {
  pub name: Option<String>,
  pub parameters: Vec<String>,
  pub body: Rc<Block>,
  pub env: Rc<RefCell<Env>>,
}

// The captured environment usually contains the function itself.
impl fmt::Debug for Function {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("Function")
      .field("name", &self.name)
      .field("parameters", &self.parameters)
      .finish()
  }
}

#[derive(Clone)]
pub struct Builtin {
  pub name: String,
  pub func: BuiltinFunction,
}

impl fmt::Debug for Builtin {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "Builtin({})", self.name)
  }
}

#[derive(Debug)]
pub struct Module {
  pub name: String,
  pub attrs: Rc<RefCell<HashPairs>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKind {
  Integer,
  Float,
  Boolean,
  String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey {
  pub kind: HashKind,
  pub value: u64,
}

impl HashKey {
  pub fn of_str(value: &str) -> HashKey {
    HashKey {
      kind: HashKind::String,
      value: fnv1a(value.as_bytes()),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
  pub key: Object,
  pub value: Object,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(bytes: &[u8]) -> u64 {
  bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
    (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
  })
}

fn sign(ordering: Ordering) -> i32 {
  match ordering {
    Ordering::Less => -1,
    Ordering::Equal => 0,
    Ordering::Greater => 1,
  }
}

fn compare_floats(left: f64, right: f64) -> i32 {
  left.partial_cmp(&right).map(sign).unwrap_or(-1)
}

impl Object {
  pub fn array(elements: Vec<Object>) -> Object {
    Object::Array(Rc::new(RefCell::new(elements)))
  }

  pub fn hash(pairs: HashPairs) -> Object {
    Object::Hash(Rc::new(RefCell::new(pairs)))
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Object::Integer(_) => "int",
      Object::Float(_) => "float",
      Object::String(_) => "str",
      Object::Boolean(_) => "bool",
      Object::Null => "null",
      Object::Array(_) => "array",
      Object::Hash(_) => "hash",
      Object::Function(_) => "fn",
      Object::Builtin(_) => "builtin",
      Object::Error(_) => "error",
      Object::Module(_) => "module",
    }
  }

  /// Condition truthiness: only null and false are falsy.
  pub fn truthy(&self) -> bool {
    !matches!(self, Object::Null | Object::Boolean(false))
  }

  /// Value conversion used by `bool()`.
  pub fn to_bool(&self) -> bool {
    match self {
      Object::Integer(value) => *value != 0,
      Object::Float(value) => *value != 0.0,
      Object::String(value) => !value.is_empty(),
      Object::Boolean(value) => *value,
      Object::Null => false,
      Object::Array(elements) => !elements.borrow().is_empty(),
      Object::Hash(pairs) => !pairs.borrow().is_empty(),
      Object::Error(_) => false,
      Object::Function(_) | Object::Builtin(_) | Object::Module(_) => true,
    }
  }

  /// Three-way comparison against `other`, driven by the left operand.
  /// Returns `None` when the left operand is not comparable at all.
  pub fn compare(&self, other: &Object) -> Option<i32> {
    let result = match (self, other) {
      (Object::Integer(left), Object::Integer(right)) => sign(left.cmp(right)),
      (Object::Integer(left), Object::Float(right)) => compare_floats(*left as f64, *right),
      (Object::Float(left), Object::Float(right)) => compare_floats(*left, *right),
      (Object::Float(left), Object::Integer(right)) => compare_floats(*left, *right as f64),
      (Object::String(left), Object::String(right)) => sign(left.cmp(right)),
      (Object::Boolean(left), Object::Boolean(right)) => sign(left.cmp(right)),
      (Object::Null, Object::Null) => 0,
      (Object::Array(left), Object::Array(right)) => compare_arrays(&left.borrow(), &right.borrow()),
      (Object::Hash(left), Object::Hash(right)) => compare_hashes(&left.borrow(), &right.borrow()),
      (Object::Integer(_) | Object::Float(_) | Object::Array(_) | Object::Hash(_), _) => -1,
      (Object::String(_) | Object::Boolean(_) | Object::Null, _) => 1,
      (Object::Function(_) | Object::Builtin(_) | Object::Error(_) | Object::Module(_), _) => return None,
    };

    Some(result)
  }

  /// Key under which this value is stored in a hash, if it is hashable.
  pub fn hash_key(&self) -> Option<HashKey> {
    let key = match self {
      Object::Integer(value) => HashKey { kind: HashKind::Integer, value: *value as u64 },
      Object::Boolean(value) => HashKey { kind: HashKind::Boolean, value: u64::from(*value) },
      Object::String(value) => HashKey::of_str(value),
      Object::Float(_) => HashKey { kind: HashKind::Float, value: fnv1a(self.to_string().as_bytes()) },
      _ => return None,
    };

    Some(key)
  }

  pub fn len(&self) -> Option<usize> {
    match self {
      Object::String(value) => Some(value.chars().count()),
      Object::Array(elements) => Some(elements.borrow().len()),
      Object::Hash(pairs) => Some(pairs.borrow().len()),
      _ => None,
    }
  }
}

fn compare_arrays(left: &[Object], right: &[Object]) -> i32 {
  if left.len() != right.len() {
    return -1;
  }

  for (a, b) in left.iter().zip(right) {
    match a.compare(b) {
      Some(0) => continue,
      Some(result) => return result,
      None => return -1,
    }
  }

  0
}

fn compare_hashes(left: &HashPairs, right: &HashPairs) -> i32 {
  if left.len() != right.len() {
    return -1;
  }

  for (key, pair) in left {
    let other = match right.get(key) {
      Some(other) => other,
      None => return -1,
    };

    match pair.value.compare(&other.value) {
      Some(0) => continue,
      Some(result) => return result,
      None => return -1,
    }
  }

  0
}

impl PartialEq for Object {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Object::Integer(a), Object::Integer(b)) => a == b,
      (Object::Float(a), Object::Float(b)) => a == b,
      (Object::String(a), Object::String(b)) => a == b,
      (Object::Boolean(a), Object::Boolean(b)) => a == b,
      (Object::Null, Object::Null) => true,
      (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
      (Object::Hash(a), Object::Hash(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
      (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
      (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
      (Object::Error(a), Object::Error(b)) => a == b,
      (Object::Module(a), Object::Module(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl fmt::Display for Object {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Object::Integer(value) => write!(f, "{}", value),
      Object::Float(value) => write!(f, "{}", value),
      Object::String(value) => f.write_str(value),
      Object::Boolean(value) => write!(f, "{}", value),
      Object::Null => f.write_str("null"),
      Object::Array(elements) => {
        let elements = elements
          .borrow()
          .iter()
          .map(|element| element.to_string())
          .collect::<Vec<_>>();
        write!(f, "[{}]", elements.join(", "))
      }
      Object::Hash(pairs) => {
        let pairs = pairs
          .borrow()
          .values()
          .map(|pair| format!("{}: {}", pair.key, pair.value))
          .collect::<Vec<_>>();
        write!(f, "{{{}}}", pairs.join(", "))
      }
      Object::Function(function) => write!(
        f,
        "fn {}({}) {}",
        function.name.as_deref().unwrap_or(""),
        function.parameters.join(", "),
        function.body
      ),
      Object::Builtin(builtin) => write!(f, "<built-in function {}>", builtin.name),
      Object::Error(message) => write!(f, "ERROR: {}", message),
      Object::Module(module) => write!(f, "<module '{}'>", module.name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hash_of(entries: Vec<(Object, Object)>) -> Object {
    let mut pairs = HashPairs::new();
    for (key, value) in entries {
      pairs.insert(key.hash_key().unwrap(), HashPair { key, value });
    }
    Object::hash(pairs)
  }

  #[test]
  fn test_truthiness_differs_from_bool_conversion() {
    let zero = Object::Integer(0);
    let empty = Object::String(String::new());

    assert!(zero.truthy());
    assert!(empty.truthy());
    assert!(!zero.to_bool());
    assert!(!empty.to_bool());

    assert!(!Object::Null.truthy());
    assert!(!Object::Boolean(false).truthy());
    assert!(!Object::array(vec![]).to_bool());
    assert!(Object::array(vec![Object::Null]).to_bool());
  }

  #[test]
  fn test_compare_numbers() {
    assert_eq!(Object::Integer(1).compare(&Object::Integer(2)), Some(-1));
    assert_eq!(Object::Integer(2).compare(&Object::Float(2.0)), Some(0));
    assert_eq!(Object::Float(2.5).compare(&Object::Integer(2)), Some(1));
    assert_eq!(Object::Float(f64::NAN).compare(&Object::Float(1.0)), Some(-1));
  }

  #[test]
  fn test_compare_across_types() {
    assert_eq!(Object::Integer(1).compare(&Object::String("1".to_owned())), Some(-1));
    assert_eq!(Object::String("1".to_owned()).compare(&Object::Integer(1)), Some(1));
    assert_eq!(Object::Null.compare(&Object::Boolean(false)), Some(1));
    assert_eq!(Object::Null.compare(&Object::Null), Some(0));
    assert_eq!(Object::Error("x".to_owned()).compare(&Object::Integer(1)), None);
  }

  #[test]
  fn test_compare_containers() {
    let a = Object::array(vec![Object::Integer(1), Object::Integer(2)]);
    let b = Object::array(vec![Object::Integer(1), Object::Integer(3)]);
    let c = Object::array(vec![Object::Integer(1)]);

    assert_eq!(a.compare(&a.clone()), Some(0));
    assert_eq!(a.compare(&b), Some(-1));
    assert_eq!(b.compare(&a), Some(1));
    assert_eq!(a.compare(&c), Some(-1));

    let h1 = hash_of(vec![(Object::String("k".to_owned()), Object::Integer(1))]);
    let h2 = hash_of(vec![(Object::String("k".to_owned()), Object::Integer(1))]);
    let h3 = hash_of(vec![(Object::String("j".to_owned()), Object::Integer(1))]);

    assert_eq!(h1.compare(&h2), Some(0));
    assert_eq!(h1.compare(&h3), Some(-1));
  }

  #[test]
  fn test_hash_keys() {
    let hello = Object::String("Hello World".to_owned());
    let same = Object::String("Hello World".to_owned());
    let other = Object::String("My name is johnny".to_owned());

    assert_eq!(hello.hash_key(), same.hash_key());
    assert_ne!(hello.hash_key(), other.hash_key());
    assert_ne!(Object::Integer(1).hash_key(), Object::Float(1.0).hash_key());
    assert_ne!(Object::Integer(1).hash_key(), Object::Boolean(true).hash_key());
    assert_eq!(Object::array(vec![]).hash_key(), None);
  }

  #[test]
  fn test_len() {
    assert_eq!(Object::String("héllo".to_owned()).len(), Some(5));
    assert_eq!(Object::array(vec![Object::Null, Object::Null]).len(), Some(2));
    assert_eq!(Object::Integer(3).len(), None);
  }

  #[test]
  fn test_display() {
    assert_eq!(Object::Float(1.0).to_string(), "1");
    assert_eq!(Object::Float(2.5).to_string(), "2.5");
    assert_eq!(Object::Error("boom".to_owned()).to_string(), "ERROR: boom");
    assert_eq!(
      Object::array(vec![Object::Integer(1), Object::String("a".to_owned())]).to_string(),
      "[1, a]"
    );
    assert_eq!(
      hash_of(vec![(Object::Integer(2), Object::Boolean(true)), (Object::Integer(1), Object::Null)]).to_string(),
      "{1: null, 2: true}"
    );
  }

  #[test]
  fn test_arrays_alias_on_clone() {
    let a = Object::array(vec![Object::Integer(1)]);
    let b = a.clone();

    if let Object::Array(elements) = &b {
      elements.borrow_mut()[0] = Object::Integer(9);
    }

    assert_eq!(a.to_string(), "[9]");
  }
}
