use std::cell::{Cell, RefCell};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Drawing surface owned by the embedding program. Scripts only see its size
/// and ask it to write snapshots.
pub trait Canvas: fmt::Debug {
  fn width(&self) -> f64;
  fn height(&self) -> f64;
  fn save_png(&mut self, path: &Path) -> io::Result<()>;
}

/// Output folder and file naming for canvas snapshots.
#[derive(Debug, Default)]
pub struct Snapshot {
  directory: PathBuf,
  prefix: Option<String>,
  counter: Cell<u32>,
}

impl Snapshot {
  pub fn new(directory: impl Into<PathBuf>, prefix: Option<String>) -> Self {
    Snapshot {
      directory: directory.into(),
      prefix,
      counter: Cell::new(0),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  /// Next file name in the sequence: `frame_0001.png`, or `<prefix>_0001.png`.
  pub fn next_filename(&self) -> String {
    let count = self.counter.get() + 1;
    self.counter.set(count);

    match &self.prefix {
      Some(prefix) => format!("{}_{:04}.png", prefix, count),
      None => format!("frame_{:04}.png", count),
    }
  }

  pub fn next_path(&self) -> PathBuf {
    let filename = self.next_filename();
    self.directory.join(filename)
  }
}

/// Services injected by the embedding program and shared by every scope of a run.
#[derive(Debug, Default)]
pub struct Host {
  pub args: Vec<String>,
  pub search_paths: Vec<PathBuf>,
  pub snapshot: Snapshot,
  pub canvas: Option<Rc<RefCell<dyn Canvas>>>,
}

impl Host {
  pub fn new() -> Self {
    Host::default()
  }

  pub fn with_args(mut self, args: Vec<String>) -> Self {
    self.args = args;
    self
  }

  pub fn with_search_paths(mut self, search_paths: Vec<PathBuf>) -> Self {
    self.search_paths = search_paths;
    self
  }

  pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
    self.snapshot = snapshot;
    self
  }

  pub fn with_canvas(mut self, canvas: Rc<RefCell<dyn Canvas>>) -> Self {
    self.canvas = Some(canvas);
    self
  }
}
