use std::{io, path::Path};

use crate::FileSystem;

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("package.json");
    std::fs::write(&manifest, r#"{"sideEffects":false}"#).unwrap();

    assert!(OsFileSystem.is_file(&manifest));
    assert!(!OsFileSystem.is_file(dir.path()));
    assert_eq!(OsFileSystem.read_to_string(&manifest).unwrap(), r#"{"sideEffects":false}"#);
  }
}
