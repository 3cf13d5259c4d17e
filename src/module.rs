use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::host::Host;

pub const EXTENSION: &str = "scrawl";

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("no module named '{0}'")]
  NotFound(String),
  #[error("error reading module '{name}': {source}")]
  Io { name: String, source: io::Error },
}

/// Turns an `import("name")` into module source text.
pub trait ModuleResolver: fmt::Debug {
  fn resolve(&self, name: &str, host: &Host) -> Result<String, ResolveError>;
}

/// Looks for `name` and `name.scrawl` in the working directory, then in each search path.
#[derive(Debug, Clone, Default)]
pub struct FileResolver {
  root: Option<PathBuf>,
}

impl FileResolver {
  pub fn new() -> Self {
    FileResolver::default()
  }

  /// Resolves relative to `root` instead of the process working directory.
  pub fn with_root(root: impl Into<PathBuf>) -> Self {
    FileResolver {
      root: Some(root.into()),
    }
  }

  fn candidates(&self, name: &str, host: &Host) -> Vec<PathBuf> {
    let root = self.root.clone().unwrap_or_default();
    let with_extension = format!("{}.{}", name, EXTENSION);

    std::iter::once(root.as_path())
      .chain(host.search_paths.iter().map(PathBuf::as_path))
      .flat_map(|dir: &Path| [dir.join(name), dir.join(&with_extension)])
      .collect()
  }
}

impl ModuleResolver for FileResolver {
  fn resolve(&self, name: &str, host: &Host) -> Result<String, ResolveError> {
    let path = self
      .candidates(name, host)
      .into_iter()
      .find(|path| path.is_file())
      .ok_or_else(|| ResolveError::NotFound(name.to_owned()))?;

    fs::read_to_string(&path).map_err(|source| ResolveError::Io {
      name: name.to_owned(),
      source,
    })
  }
}
