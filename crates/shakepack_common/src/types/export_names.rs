use serde::Serialize;
use shakepack_utils::indexmap::FxIndexSet;

/// Export names an importer consumes from a dependency. `*` stands for every export.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportNames(FxIndexSet<String>);

impl ExportNames {
  pub const ALL: &'static str = "*";

  pub fn all() -> Self {
    let mut ret = Self::default();
    ret.insert(Self::ALL);
    ret
  }

  pub fn insert(&mut self, name: &str) {
    if !self.0.contains(name) {
      self.0.insert(name.to_string());
    }
  }

  pub fn extend(&mut self, other: &Self) {
    for name in &other.0 {
      self.insert(name);
    }
  }

  pub fn is_all(&self) -> bool {
    self.0.contains(Self::ALL)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<'a> FromIterator<&'a str> for ExportNames {
  fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
    let mut ret = Self::default();
    for name in iter {
      ret.insert(name);
    }
    ret
  }
}

#[test]
fn test_export_names() {
  let mut names: ExportNames = ["a", "b", "a"].into_iter().collect();
  assert_eq!(names.iter().collect::<Vec<_>>(), ["a", "b"]);
  assert!(!names.is_all());
  names.extend(&ExportNames::all());
  assert!(names.is_all());
}
