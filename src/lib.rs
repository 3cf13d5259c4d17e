use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

pub mod ast;
pub mod builtin;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod host;
pub mod lexer;
pub mod module;
pub mod object;
pub mod parser;
pub mod token;
pub mod typing;

pub use error::Error;

use env::Env;
use evaluator::Evaluator;
use host::Host;
use object::Object;

/// Parses and evaluates `source` in a fresh root scope.
///
/// Parse diagnostics and runtime errors come back as [`Error`]; otherwise the
/// value of the last statement, if it produced one.
pub fn run(source: &str, host: Rc<Host>) -> Result<Option<Object>, Error> {
  let (program, source_map) = parser::parse(source)?;

  let env = Rc::new(RefCell::new(Env::new(host)));
  let mut evaluator = Evaluator::new(env).with_source_map(source_map);

  match evaluator.eval(&program) {
    Some(Object::Error(message)) => Err(Error::Runtime(message)),
    result => Ok(result),
  }
}

pub fn run_file(path: &Path, host: Rc<Host>) -> Result<Option<Object>, Error> {
  let source = fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;

  run(&source, host)
}
