use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::Rc;

use tracing::debug;

use crate::host::Host;
use crate::object::Object;

type Objects = HashMap<String, Object>;

/// Names the runtime owns. Binding them from a script is silently ignored.
pub fn is_reserved(name: &str) -> bool {
  if name.len() > 4 && name.starts_with("__") && name.ends_with("__") {
    return true;
  }

  matches!(name, "PI" | "HALF_PI" | "QUARTER_PI" | "TWO_PI" | "WIDTH" | "HEIGHT")
}

#[derive(Debug)]
pub struct Env {
  objects: Objects,
  parent: Option<Rc<RefCell<Env>>>,
  host: Rc<Host>,
}

impl Env {
  /// A root scope seeded with the math constants, and the canvas size when one is attached.
  pub fn new(host: Rc<Host>) -> Self {
    let mut objects = HashMap::new();
    objects.insert("PI".to_owned(), Object::Float(PI));
    objects.insert("HALF_PI".to_owned(), Object::Float(PI / 2.0));
    objects.insert("QUARTER_PI".to_owned(), Object::Float(PI / 4.0));
    objects.insert("TWO_PI".to_owned(), Object::Float(2.0 * PI));

    if let Some(canvas) = &host.canvas {
      let canvas = canvas.borrow();
      objects.insert("WIDTH".to_owned(), Object::Float(canvas.width()));
      objects.insert("HEIGHT".to_owned(), Object::Float(canvas.height()));
    }

    Self {
      objects,
      parent: None,
      host,
    }
  }

  pub fn new_with_parent(parent: Rc<RefCell<Env>>) -> Self {
    let host = parent.borrow().host.clone();

    Self {
      objects: HashMap::new(),
      parent: Some(parent),
      host,
    }
  }

  pub fn host(&self) -> &Rc<Host> {
    &self.host
  }

  pub fn get(&self, name: &str) -> Option<Object> {
    if let Some(object) = self.objects.get(name) {
      return Some(object.clone());
    }

    if let Some(ref parent) = self.parent {
      return parent.borrow().get(name);
    }

    None
  }

  /// Binds `name` in this scope. Returns false when the name is reserved.
  pub fn set(&mut self, name: &str, value: Object) -> bool {
    if is_reserved(name) {
      debug!(name, "ignoring binding of reserved name");
      return false;
    }

    self.objects.insert(name.to_owned(), value);
    true
  }

  /// Bindings of this scope that a module exports: names starting with an upper-case letter.
  pub fn exported(&self) -> Vec<(String, Object)> {
    let mut exported = self
      .objects
      .iter()
      .filter(|(name, _)| name.chars().next().map_or(false, char::is_uppercase) && !is_reserved(name))
      .map(|(name, value)| (name.clone(), value.clone()))
      .collect::<Vec<_>>();

    exported.sort_by(|a, b| a.0.cmp(&b.0));
    exported
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn root() -> Rc<RefCell<Env>> {
    Rc::new(RefCell::new(Env::new(Rc::new(Host::new()))))
  }

  #[test]
  fn test_root_is_seeded_with_constants() {
    let env = root();
    assert_eq!(env.borrow().get("PI"), Some(Object::Float(PI)));
    assert_eq!(env.borrow().get("WIDTH"), None);
  }

  #[test]
  fn test_child_sees_parent_and_shadows_locally() {
    let parent = root();
    parent.borrow_mut().set("x", Object::Integer(1));

    let mut child = Env::new_with_parent(parent.clone());
    assert_eq!(child.get("x"), Some(Object::Integer(1)));

    child.set("x", Object::Integer(2));
    assert_eq!(child.get("x"), Some(Object::Integer(2)));
    assert_eq!(parent.borrow().get("x"), Some(Object::Integer(1)));
    assert!(Rc::ptr_eq(child.host(), parent.borrow().host()));
  }

  #[test]
  fn test_reserved_names_are_not_rebound() {
    let env = root();
    assert!(!env.borrow_mut().set("PI", Object::Integer(3)));
    assert!(!env.borrow_mut().set("__name__", Object::Integer(3)));
    assert!(env.borrow_mut().set("__", Object::Integer(3)));
    assert_eq!(env.borrow().get("PI"), Some(Object::Float(PI)));
  }

  #[test]
  fn test_exported_names() {
    let env = root();
    env.borrow_mut().set("Square", Object::Integer(1));
    env.borrow_mut().set("helper", Object::Integer(2));
    env.borrow_mut().set("Area", Object::Integer(3));

    let names = env.borrow().exported().into_iter().map(|(name, _)| name).collect::<Vec<_>>();
    assert_eq!(names, vec!["Area", "Square"]);
  }
}
