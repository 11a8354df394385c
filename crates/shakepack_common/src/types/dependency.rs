use std::fmt;

use crate::{AsyncType, ContextParams, ExportNames, ModuleId, SourceLocation};

/// Stable identity of an edge. Every occurrence of the same specifier with the same async type
/// and context arguments collapses into a single dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
  pub name: String,
  pub async_type: AsyncType,
  pub context_params: Option<ContextParams>,
}

impl DependencyKey {
  pub fn sync(name: impl Into<String>) -> Self {
    Self { name: name.into(), async_type: AsyncType::None, context_params: None }
  }

  pub fn new(name: impl Into<String>, async_type: AsyncType) -> Self {
    Self { name: name.into(), async_type, context_params: None }
  }
}

impl fmt::Display for DependencyKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)?;
    if !self.async_type.is_sync() {
      write!(f, " ({})", self.async_type.as_str())?;
    }
    if let Some(params) = &self.context_params {
      write!(
        f,
        " (context recursive={} filter=/{}/{} mode={:?})",
        params.recursive, params.filter.pattern, params.filter.flags, params.mode
      )?;
    }
    Ok(())
  }
}

/// What the collector knows about a dependency before it is bound to a graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyData {
  /// The specifier as written in source.
  pub name: String,
  pub async_type: AsyncType,
  pub export_names: ExportNames,
  pub locs: Vec<SourceLocation>,
  /// Every occurrence is guarded by `try`, so a failed resolution must not break the build.
  pub is_optional: bool,
  pub context_params: Option<ContextParams>,
}

impl DependencyData {
  pub fn new(name: impl Into<String>, async_type: AsyncType) -> Self {
    Self {
      name: name.into(),
      async_type,
      export_names: ExportNames::default(),
      locs: Vec::new(),
      is_optional: false,
      context_params: None,
    }
  }

  pub fn key(&self) -> DependencyKey {
    DependencyKey {
      name: self.name.clone(),
      async_type: self.async_type,
      context_params: self.context_params.clone(),
    }
  }

  /// Export names can't be pruned through this edge: a wildcard, or a non-static load.
  pub fn uses_all_exports(&self) -> bool {
    self.export_names.is_all() || !self.async_type.is_sync() || self.context_params.is_some()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
  pub absolute_path: ModuleId,
  pub data: DependencyData,
}

impl Dependency {
  pub fn new(absolute_path: impl Into<ModuleId>, data: DependencyData) -> Self {
    Self { absolute_path: absolute_path.into(), data }
  }

  pub fn key(&self) -> DependencyKey {
    self.data.key()
  }
}

#[test]
fn test_dependency_key_display() {
  assert_eq!(DependencyKey::sync("./a").to_string(), "./a");
  assert_eq!(DependencyKey::new("./a", AsyncType::Async).to_string(), "./a (async)");
}
