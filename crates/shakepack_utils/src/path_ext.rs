use std::{borrow::Cow, ffi::OsStr, path::Path};

use sugar_path::SugarPath;

pub trait PathExt {
  /// A readable name for chunks started from this file. `index` files take the name of their
  /// directory.
  fn representative_file_name(&self) -> Cow<str>;

  /// `./`-prefixed slash path of `self` relative to `base`, the form `package.json#sideEffects` globs use.
  fn relative_slash_from(&self, base: &Path) -> String;
}

impl PathExt for Path {
  fn representative_file_name(&self) -> Cow<str> {
    let file_name =
      self.file_stem().map_or_else(|| self.to_string_lossy(), |stem| stem.to_string_lossy());
    if file_name != "index" {
      return file_name;
    }
    self.parent().and_then(Self::file_name).map_or(file_name, OsStr::to_string_lossy)
  }

  fn relative_slash_from(&self, base: &Path) -> String {
    let relative = self.relative(base);
    let slash = relative.to_slash_lossy();
    if slash.starts_with("../") || slash.starts_with("./") {
      slash.into_owned()
    } else {
      let mut ret = String::with_capacity(slash.len() + 2);
      ret.push_str("./");
      ret.push_str(&slash);
      ret
    }
  }
}

#[test]
fn test_representative_file_name() {
  assert_eq!(Path::new("/app/screens/settings.js").representative_file_name(), "settings");
  assert_eq!(Path::new("/app/screens/home/index.tsx").representative_file_name(), "home");
  assert_eq!(Path::new("/index.js").representative_file_name(), "index");
}

#[test]
fn test_relative_slash_from() {
  let path = Path::new("/project/node_modules/lib/src/index.js");
  assert_eq!(path.relative_slash_from(Path::new("/project/node_modules/lib")), "./src/index.js");
  assert_eq!(path.relative_slash_from(Path::new("/project/node_modules/other")), "../lib/src/index.js");
}
