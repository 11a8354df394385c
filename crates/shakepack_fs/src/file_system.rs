use std::{io, path::Path};

/// Read-only view of the files the serializer consults, mostly `package.json` manifests.
pub trait FileSystem: Send + Sync {
  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  fn is_file(&self, path: &Path) -> bool;
}

impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    (**self).read_to_string(path)
  }

  fn is_file(&self, path: &Path) -> bool {
    (**self).is_file(path)
  }
}
