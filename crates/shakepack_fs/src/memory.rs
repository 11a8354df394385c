use std::{
  io,
  path::{Path, PathBuf},
};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::FileSystem;

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
  files: DashMap<PathBuf, String, FxBuildHasher>,
}

impl MemoryFileSystem {
  pub fn new<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
  where
    P: Into<PathBuf>,
    C: Into<String>,
  {
    let fs = Self::default();
    for (path, content) in files {
      fs.add_file(path, content);
    }
    fs
  }

  pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
    self.files.insert(path.into(), content.into());
  }
}

impl FileSystem for MemoryFileSystem {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    self.files.get(path).map(|content| content.value().clone()).ok_or_else(|| {
      io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", path.display()))
    })
  }

  fn is_file(&self, path: &Path) -> bool {
    self.files.contains_key(path)
  }
}

#[test]
fn test_memory_file_system() {
  let fs = MemoryFileSystem::new([("/project/package.json", r#"{"name":"app"}"#)]);
  assert!(fs.is_file(Path::new("/project/package.json")));
  assert!(!fs.is_file(Path::new("/project/index.js")));
  assert_eq!(
    fs.read_to_string(Path::new("/project/index.js")).map_err(|err| err.kind()),
    Err(io::ErrorKind::NotFound)
  );
}
