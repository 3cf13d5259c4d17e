use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseErrors;

/// Failures reported to the embedding program.
#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Parse(#[from] ParseErrors),
  #[error("{0}")]
  Runtime(String),
  #[error("could not read '{}': {source}", path.display())]
  Io { path: PathBuf, source: io::Error },
}
