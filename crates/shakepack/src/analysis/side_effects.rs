use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use shakepack_common::{Module, ModuleGraph, ModuleId};
use shakepack_fs::FileSystem;
use shakepack_utils::path_ext::PathExt;

/// The `sideEffects` field of a `package.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSideEffects {
  /// Missing or malformed field, every module may have side effects.
  Unspecified,
  Bool(bool),
  /// Modules matching any glob have side effects, the rest don't.
  Globs(Vec<String>),
}

impl PackageSideEffects {
  pub fn from_package_json(content: &str) -> Self {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(content) else {
      return Self::Unspecified;
    };
    match json.get("sideEffects") {
      Some(serde_json::Value::Bool(value)) => Self::Bool(*value),
      Some(serde_json::Value::String(glob)) => Self::Globs(vec![glob.clone()]),
      Some(serde_json::Value::Array(items)) => Self::Globs(
        items.iter().filter_map(serde_json::Value::as_str).map(ToString::to_string).collect(),
      ),
      _ => Self::Unspecified,
    }
  }

  /// `relative_path` is the module path relative to the package directory, `./`-prefixed.
  pub fn matches(&self, relative_path: &str) -> bool {
    match self {
      Self::Unspecified => true,
      Self::Bool(value) => *value,
      Self::Globs(globs) => globs.iter().any(|glob| match_glob_pattern(glob, relative_path)),
    }
  }
}

/// Globs are tried against the path with and without its `./` prefix. A glob without a `/`
/// matches the file name at any depth.
fn match_glob_pattern(pattern: &str, relative_path: &str) -> bool {
  let bare_path = relative_path.strip_prefix("./").unwrap_or(relative_path);
  if !pattern.contains('/') {
    let pattern = format!("**/{pattern}");
    return fast_glob::glob_match(&pattern, bare_path);
  }
  fast_glob::glob_match(pattern, relative_path) || fast_glob::glob_match(pattern, bare_path)
}

/// Memoizes the nearest `package.json` of every directory and the `sideEffects` field of every
/// package. Safe to share between concurrent requests.
#[derive(Debug, Default)]
pub struct PackageSideEffectsCache {
  package_dirs: DashMap<PathBuf, Option<PathBuf>, FxBuildHasher>,
  declarations: DashMap<PathBuf, Arc<PackageSideEffects>, FxBuildHasher>,
}

impl PackageSideEffectsCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Directory of the closest `package.json` above `dir`, `dir` included.
  fn package_dir(&self, fs: &dyn FileSystem, dir: &Path) -> Option<PathBuf> {
    let mut visited = Vec::new();
    let mut found = None;
    for ancestor in dir.ancestors() {
      if let Some(cached) = self.package_dirs.get(ancestor) {
        found.clone_from(cached.value());
        break;
      }
      visited.push(ancestor.to_path_buf());
      if fs.is_file(&ancestor.join("package.json")) {
        found = Some(ancestor.to_path_buf());
        break;
      }
    }
    for dir in visited {
      self.package_dirs.insert(dir, found.clone());
    }
    found
  }

  fn declaration(&self, fs: &dyn FileSystem, package_dir: &Path) -> Arc<PackageSideEffects> {
    if let Some(cached) = self.declarations.get(package_dir) {
      return Arc::clone(cached.value());
    }
    let declaration = match fs.read_to_string(&package_dir.join("package.json")) {
      Ok(content) => PackageSideEffects::from_package_json(&content),
      Err(err) => {
        tracing::warn!("failed to read {}/package.json: {err}", package_dir.display());
        PackageSideEffects::Unspecified
      }
    };
    let declaration = Arc::new(declaration);
    self.declarations.insert(package_dir.to_path_buf(), Arc::clone(&declaration));
    declaration
  }

  /// What the nearest package says about `path`. No package at all means side effects.
  pub fn package_has_side_effects(&self, fs: &dyn FileSystem, path: &Path) -> bool {
    let Some(dir) = path.parent() else { return true };
    let Some(package_dir) = self.package_dir(fs, dir) else { return true };
    self.declaration(fs, &package_dir).matches(&path.relative_slash_from(&package_dir))
  }
}

pub struct SideEffectClassifier<'me> {
  fs: &'me dyn FileSystem,
  cache: &'me PackageSideEffectsCache,
}

impl<'me> SideEffectClassifier<'me> {
  pub fn new(fs: &'me dyn FileSystem, cache: &'me PackageSideEffectsCache) -> Self {
    Self { fs, cache }
  }

  /// Whether evaluating the module by itself is observable, ignoring its dependencies.
  pub fn module_has_side_effects(&self, module: &Module) -> bool {
    if let Some(side_effects) = module.side_effects {
      return side_effects;
    }
    if module.path.is_virtual() {
      return false;
    }
    self.cache.package_has_side_effects(self.fs, module.path.as_path())
  }

  /// Fills in `side_effects` for every module that wasn't classified yet.
  pub fn classify_graph(&self, graph: &mut ModuleGraph) {
    for module in graph.dependencies.values_mut() {
      if module.side_effects.is_none() {
        module.side_effects = Some(self.module_has_side_effects(module));
      }
    }
  }
}

/// Result of the transitive check, with the import chain down to the first module found to have
/// side effects.
#[derive(Debug, Default)]
pub struct SideEffectTrace {
  pub has_side_effects: bool,
  pub trace: Vec<ModuleId>,
}

/// A module has side effects when it has them itself or through its synchronous dependencies.
/// Modules that weren't classified count as having side effects.
pub fn has_side_effects_with_trace(graph: &ModuleGraph, path: &ModuleId) -> SideEffectTrace {
  let mut visited = FxHashSet::default();
  let mut trace = Vec::new();
  let has_side_effects = visit(graph, path, &mut visited, &mut trace);
  if !has_side_effects {
    trace.clear();
  }
  SideEffectTrace { has_side_effects, trace }
}

pub fn has_side_effects(graph: &ModuleGraph, path: &ModuleId) -> bool {
  has_side_effects_with_trace(graph, path).has_side_effects
}

fn visit<'a>(
  graph: &'a ModuleGraph,
  path: &'a ModuleId,
  visited: &mut FxHashSet<&'a ModuleId>,
  trace: &mut Vec<ModuleId>,
) -> bool {
  if !visited.insert(path) {
    return false;
  }
  let Some(module) = graph.get(path) else { return true };
  trace.push(path.clone());
  if module.side_effects.unwrap_or(true) {
    return true;
  }
  let found = module
    .dependencies
    .values()
    .filter(|dep| dep.data.async_type.is_sync())
    .any(|dep| visit(graph, &dep.absolute_path, visited, trace));
  if !found {
    trace.pop();
  }
  found
}
