use shakepack_error::{BuildError, BuildResult, SerializeError};
use shakepack_utils::indexmap::{FxIndexMap, FxIndexSet};
use tracing::debug;

use crate::{Dependency, DependencyData, DependencyKey, Module, ModuleId, TransformOptions};

/// The module arena. Edges live in `Module::dependencies`, back-links in
/// `Module::inverse_dependencies`, and every mutation here keeps both sides in sync.
#[derive(Debug, Default)]
pub struct ModuleGraph {
  pub dependencies: FxIndexMap<ModuleId, Module>,
  /// Roots that are never disposed, even without importers.
  pub entry_points: FxIndexSet<ModuleId>,
  pub transform_options: TransformOptions,
}

#[derive(Debug, Default)]
pub struct DisposeResult {
  pub disposed: Vec<ModuleId>,
  /// Surviving modules that lost at least one importer.
  pub touched: FxIndexSet<ModuleId>,
}

impl DisposeResult {
  pub fn merge(&mut self, other: Self) {
    for path in &other.disposed {
      self.touched.shift_remove(path);
    }
    self.disposed.extend(other.disposed);
    self.touched.extend(other.touched.into_iter().filter(|path| !self.disposed.contains(path)));
  }
}

#[derive(Debug, Default)]
pub struct ReplaceDependenciesResult {
  /// Edges that no longer exist.
  pub removed: Vec<Dependency>,
  /// Surviving targets whose incoming edge from the importer changed or disappeared.
  pub changed_targets: FxIndexSet<ModuleId>,
  pub dispose: DisposeResult,
}

impl ModuleGraph {
  pub fn new(transform_options: TransformOptions) -> Self {
    Self { transform_options, ..Self::default() }
  }

  pub fn add_module(&mut self, module: Module) {
    self.dependencies.insert(module.path.clone(), module);
  }

  pub fn add_entry_point(&mut self, path: impl Into<ModuleId>) {
    self.entry_points.insert(path.into());
  }

  pub fn get(&self, path: &str) -> Option<&Module> {
    self.dependencies.get(path)
  }

  pub fn get_mut(&mut self, path: &str) -> Option<&mut Module> {
    self.dependencies.get_mut(path)
  }

  pub fn contains(&self, path: &str) -> bool {
    self.dependencies.contains_key(path)
  }

  pub fn is_root(&self, path: &str) -> bool {
    self.entry_points.contains(path)
  }

  fn missing_module(importer: &str, target: &str) -> BuildError {
    SerializeError::MissingModule { importer: importer.to_string(), target: target.to_string() }
      .into()
  }

  /// Adds the edge `importer -> dependency.absolute_path` and its back-link. Re-connecting an
  /// existing key replaces the record.
  pub fn connect(&mut self, importer: &ModuleId, dependency: Dependency) -> BuildResult<()> {
    let target = dependency.absolute_path.clone();
    let Some(target_module) = self.dependencies.get_mut(&target) else {
      return Err(Self::missing_module(importer, &target));
    };
    target_module.inverse_dependencies.insert(importer.clone());
    let Some(importer_module) = self.dependencies.get_mut(importer) else {
      return Err(Self::missing_module(importer, importer));
    };
    importer_module.dependencies.insert(dependency.key(), dependency);
    Ok(())
  }

  /// Removes one edge. When it was the importer's last edge to the target the back-link goes too,
  /// and a target left without importers is disposed along with everything only it kept alive.
  pub fn disconnect(
    &mut self,
    importer: &ModuleId,
    key: &DependencyKey,
  ) -> BuildResult<DisposeResult> {
    let Some(importer_module) = self.dependencies.get_mut(importer) else {
      return Err(Self::missing_module(importer, importer));
    };
    let Some(removed) = importer_module.dependencies.shift_remove(key) else {
      return Err(
        SerializeError::MissingDependency { module: importer.to_string(), key: key.to_string() }
          .into(),
      );
    };
    let still_linked =
      importer_module.dependencies.values().any(|dep| dep.absolute_path == removed.absolute_path);

    let mut result = DisposeResult::default();
    if !still_linked {
      debug!(importer = %importer, target = %removed.absolute_path, "disconnect");
      self.unlink(importer, &removed.absolute_path, &mut result);
    }
    Ok(result)
  }

  fn unlink(&mut self, importer: &ModuleId, target: &ModuleId, result: &mut DisposeResult) {
    let Some(target_module) = self.dependencies.get_mut(target) else {
      return;
    };
    target_module.inverse_dependencies.shift_remove(importer);
    if target_module.inverse_dependencies.is_empty() && !self.entry_points.contains(target) {
      result.merge(self.dispose(target));
    } else {
      result.touched.insert(target.clone());
    }
  }

  /// Removes `path` from the graph, then every dependency that is left without importers,
  /// iteratively so long chains are fine. Cycles that only keep themselves alive are collected
  /// by a reachability sweep from the entry points.
  pub fn dispose(&mut self, path: &ModuleId) -> DisposeResult {
    let mut result = DisposeResult::default();
    self.dispose_queue(vec![path.clone()], &mut result);

    if !result.touched.is_empty() && !self.entry_points.is_empty() {
      let reachable = self.reachable_from_entries();
      let mut garbage = FxIndexSet::default();
      let mut stack =
        result.touched.iter().filter(|path| !reachable.contains(*path)).cloned().collect::<Vec<_>>();
      while let Some(path) = stack.pop() {
        let Some(module) = self.dependencies.get(&path) else {
          continue;
        };
        stack.extend(
          module
            .dependencies
            .values()
            .filter(|dep| !reachable.contains(&dep.absolute_path) && !garbage.contains(&dep.absolute_path))
            .map(|dep| dep.absolute_path.clone()),
        );
        garbage.insert(path);
      }
      if !garbage.is_empty() {
        debug!(count = garbage.len(), "collect unreachable cycle");
        self.dispose_queue(garbage.into_iter().collect(), &mut result);
      }
    }

    result.touched.retain(|path| self.dependencies.contains_key(path));
    result
  }

  fn dispose_queue(&mut self, mut queue: Vec<ModuleId>, result: &mut DisposeResult) {
    while let Some(path) = queue.pop() {
      let Some(module) = self.dependencies.shift_remove(&path) else {
        continue;
      };
      debug!(module = %path, "dispose");

      // Normally empty; keeps the graph consistent when a module with importers is disposed.
      for importer in &module.inverse_dependencies {
        if let Some(importer_module) = self.dependencies.get_mut(importer) {
          importer_module.dependencies.retain(|_, dep| dep.absolute_path != path);
        }
      }

      for dep in module.dependencies.values() {
        let target = &dep.absolute_path;
        let Some(target_module) = self.dependencies.get_mut(target) else {
          continue;
        };
        target_module.inverse_dependencies.shift_remove(&path);
        if target_module.inverse_dependencies.is_empty() && !self.entry_points.contains(target) {
          queue.push(target.clone());
        } else {
          result.touched.insert(target.clone());
        }
      }
      result.touched.shift_remove(&path);
      result.disposed.push(path);
    }
  }

  /// Replaces the importer's dependency records with a fresh collection. Keys must already be
  /// known: collection after a mutation can only narrow the edges, never add targets.
  pub fn replace_dependencies(
    &mut self,
    importer: &ModuleId,
    collected: Vec<DependencyData>,
  ) -> BuildResult<ReplaceDependenciesResult> {
    let Some(module) = self.dependencies.get_mut(importer) else {
      return Err(Self::missing_module(importer, importer));
    };
    if let Some(unknown) = collected.iter().find(|data| !module.dependencies.contains_key(&data.key()))
    {
      return Err(
        SerializeError::MissingDependency {
          module: importer.to_string(),
          key: unknown.key().to_string(),
        }
        .into(),
      );
    }

    let mut result = ReplaceDependenciesResult::default();
    let mut previous = std::mem::take(&mut module.dependencies);
    for data in collected {
      let key = data.key();
      let Some(prev) = previous.shift_remove(&key) else {
        // Duplicate key in the collection, the first record wins.
        continue;
      };
      if prev.data.export_names != data.export_names {
        result.changed_targets.insert(prev.absolute_path.clone());
      }
      module.dependencies.insert(key, Dependency { absolute_path: prev.absolute_path, data });
    }

    let unlinked = previous
      .values()
      .filter(|dep| !module.dependencies.values().any(|kept| kept.absolute_path == dep.absolute_path))
      .map(|dep| dep.absolute_path.clone())
      .collect::<FxIndexSet<_>>();
    for (_, dep) in previous {
      debug!(importer = %importer, key = %dep.key(), "remove dependency");
      result.changed_targets.insert(dep.absolute_path.clone());
      result.removed.push(dep);
    }
    for target in &unlinked {
      self.unlink(importer, target, &mut result.dispose);
    }
    result.changed_targets.retain(|path| !result.dispose.disposed.contains(path));

    Ok(result)
  }

  /// Checks the bidirectional edge invariant and that every non-root module has an importer.
  pub fn assert_consistent(&self) -> BuildResult<()> {
    let mut errors = Vec::new();
    for (path, module) in &self.dependencies {
      for dep in module.dependencies.values() {
        match self.dependencies.get(&dep.absolute_path) {
          None => errors.push(
            SerializeError::MissingModule {
              importer: path.to_string(),
              target: dep.absolute_path.to_string(),
            }
            .into(),
          ),
          Some(target) if !target.inverse_dependencies.contains(path) => errors
            .push(anyhow::anyhow!("{}: no inverse dependency on importer {path}", dep.absolute_path)),
          Some(_) => {}
        }
      }
      for importer in &module.inverse_dependencies {
        if !self.dependencies.get(importer).is_some_and(|importer| module.is_dependency_of(importer)) {
          errors.push(anyhow::anyhow!("{path}: stale inverse dependency {importer}"));
        }
      }
      if module.inverse_dependencies.is_empty() && !self.is_root(path) {
        errors.push(anyhow::anyhow!("{path}: module has no importers and is not an entry point"));
      }
    }
    if errors.is_empty() { Ok(()) } else { Err(errors.into()) }
  }

  /// Modules reachable from the entry points, in depth-first pre-order.
  pub fn reachable_from_entries(&self) -> FxIndexSet<ModuleId> {
    let mut visited = FxIndexSet::default();
    let mut stack = self.entry_points.iter().rev().cloned().collect::<Vec<_>>();
    while let Some(path) = stack.pop() {
      let Some(module) = self.dependencies.get(&path) else {
        continue;
      };
      if !visited.insert(path) {
        continue;
      }
      stack.extend(module.dependencies.values().rev().map(|dep| dep.absolute_path.clone()));
    }
    visited
  }
}
