use std::path::Path;

use arcstr::ArcStr;
use sugar_path::SugarPath;

/// `ModuleId` is the unique string identifier for each module, its absolute path.
/// Virtual modules start with `\0`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct ModuleId(ArcStr);

impl ModuleId {
  pub fn new(value: impl Into<ArcStr>) -> Self {
    Self(value.into())
  }

  pub fn is_virtual(&self) -> bool {
    self.0.starts_with('\0')
  }

  pub fn as_path(&self) -> &Path {
    Path::new(self.0.as_str())
  }

  /// Slash path relative to `root`, the form the runtime sees in dev define calls.
  pub fn stabilize(&self, root: &Path) -> String {
    if self.as_path().is_absolute() {
      self.as_path().relative(root).to_slash_lossy().into_owned()
    } else {
      self.0.replace('\0', "")
    }
  }
}

impl std::ops::Deref for ModuleId {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    self
  }
}

impl std::borrow::Borrow<str> for ModuleId {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for ModuleId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<ArcStr> for ModuleId {
  fn from(value: ArcStr) -> Self {
    Self::new(value)
  }
}

impl From<&str> for ModuleId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

#[test]
fn test_stabilize() {
  let id = ModuleId::from("/project/src/index.js");
  assert_eq!(id.stabilize(Path::new("/project")), "src/index.js");
  assert_eq!(ModuleId::from("\0shakepack/env.js").stabilize(Path::new("/project")), "shakepack/env.js");
  assert!(ModuleId::from("\0shakepack/env.js").is_virtual());
}
