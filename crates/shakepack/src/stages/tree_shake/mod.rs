mod shake_program;

use std::{collections::VecDeque, sync::Arc};

use rustc_hash::{FxHashMap, FxHashSet};
use shakepack_common::{DependencyKey, ModuleGraph, ModuleId, NormalizedSerializerOptions};
use shakepack_error::{BuildResult, SerializeError};
use shakepack_fs::FileSystem;
use tracing::debug;

pub use self::shake_program::{shake_program, ShakeOutcome, ShakePlan};
use super::{SerializerInput, SerializerStage};
use crate::{
  analysis::{
    collect_dependencies::collect_dependencies,
    module_exports::{resolve_exported_names, used_exports, ModuleExports},
    side_effects::{has_side_effects, PackageSideEffectsCache, SideEffectClassifier},
  },
  utils::build_scoping::build_scoping,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeShakeStats {
  pub removed_exports: usize,
  pub removed_imports: usize,
  pub disposed_modules: usize,
}

/// Removes exports nobody imports and whatever becomes dead with them, then drops the modules
/// left without importers. Only runs when `used_exports` is enabled.
pub struct TreeShakeStage {
  fs: Arc<dyn FileSystem>,
  cache: Arc<PackageSideEffectsCache>,
}

impl TreeShakeStage {
  pub fn new(fs: Arc<dyn FileSystem>, cache: Arc<PackageSideEffectsCache>) -> Self {
    Self { fs, cache }
  }
}

impl SerializerStage for TreeShakeStage {
  fn name(&self) -> &'static str {
    "tree-shake"
  }

  fn run(&self, mut input: SerializerInput) -> BuildResult<SerializerInput> {
    if !input.options.used_exports {
      return Ok(input);
    }
    let _span = tracing::debug_span!("tree_shake").entered();

    SideEffectClassifier::new(&*self.fs, &self.cache).classify_graph(&mut input.graph);
    let stats = TreeShaker::new(&mut input.graph, &input.options).run(&input.entry_point)?;
    debug!(
      removed_exports = stats.removed_exports,
      removed_imports = stats.removed_imports,
      disposed_modules = stats.disposed_modules,
      "tree shaking finished"
    );

    Ok(input)
  }
}

pub struct TreeShaker<'a> {
  graph: &'a mut ModuleGraph,
  options: &'a NormalizedSerializerOptions,
  queue: VecDeque<ModuleId>,
  queued: FxHashSet<ModuleId>,
  visited: FxHashSet<ModuleId>,
  stats: TreeShakeStats,
}

impl<'a> TreeShaker<'a> {
  pub fn new(graph: &'a mut ModuleGraph, options: &'a NormalizedSerializerOptions) -> Self {
    Self {
      graph,
      options,
      queue: VecDeque::new(),
      queued: FxHashSet::default(),
      visited: FxHashSet::default(),
      stats: TreeShakeStats::default(),
    }
  }

  fn enqueue(&mut self, path: ModuleId) {
    if self.queued.insert(path.clone()) {
      self.queue.push_back(path);
    }
  }

  /// Visits modules breadth-first from `entry`. A module is shaken again whenever what its
  /// importers consume from it changes, which only ever shrinks, so the loop terminates.
  pub fn run(mut self, entry: &ModuleId) -> BuildResult<TreeShakeStats> {
    self.enqueue(entry.clone());
    for root in self.graph.entry_points.clone() {
      self.enqueue(root);
    }

    while let Some(path) = self.queue.pop_front() {
      self.queued.remove(&path);
      if !self.graph.contains(&path) {
        continue;
      }
      self.shake_module(&path)?;

      if self.visited.insert(path.clone()) {
        let targets = self
          .graph
          .get(&path)
          .map(|module| {
            module.dependencies.values().map(|dep| dep.absolute_path.clone()).collect::<Vec<_>>()
          })
          .unwrap_or_default();
        for target in targets {
          self.enqueue(target);
        }
      }
    }

    Ok(self.stats)
  }

  fn plan(&self, path: &ModuleId) -> BuildResult<Option<ShakePlan>> {
    let Some(module) = self.graph.get(path) else { return Ok(None) };
    let Some(ast) = &module.ast else { return Ok(None) };
    if module.module_type.is_exempt_from_shaking() || path.is_virtual() {
      return Ok(None);
    }

    // Exports also written through `module`/`exports` can be read by name at runtime.
    let exports = ModuleExports::analyze(ast.program());
    let used_exports = if exports.is_static { used_exports(self.graph, path) } else { None };

    let mut keep_loaded = FxHashMap::default();
    for dep in module.dependencies.values() {
      if !dep.data.async_type.is_sync() || dep.data.context_params.is_some() {
        continue;
      }
      let target = self.graph.get(&dep.absolute_path).ok_or_else(|| SerializeError::MissingModule {
        importer: path.to_string(),
        target: dep.absolute_path.to_string(),
      })?;
      keep_loaded.insert(
        dep.data.name.clone(),
        !target.is_empty() && has_side_effects(self.graph, &dep.absolute_path),
      );
    }

    let mut star_exports = FxHashMap::default();
    if used_exports.is_some() {
      for source in exports.star_sources {
        let dep = module.dependencies.get(&DependencyKey::sync(source.as_str())).ok_or_else(|| {
          SerializeError::MissingDependency { module: path.to_string(), key: source.clone() }
        })?;
        let names = resolve_exported_names(self.graph, &dep.absolute_path, &mut vec![path.clone()])?;
        star_exports.insert(source, names);
      }
    }

    Ok(Some(ShakePlan { used_exports, keep_loaded, star_exports }))
  }

  fn shake_module(&mut self, path: &ModuleId) -> BuildResult<()> {
    let Some(plan) = self.plan(path)? else { return Ok(()) };
    let max_depth = self.options.max_shake_depth;
    let dynamic_requires = self.options.dynamic_requires;

    let Some(ast) = self.graph.get_mut(path).and_then(|module| module.ast.as_mut()) else {
      return Ok(());
    };
    let (outcome, collected) = ast.with_mut(|fields| -> BuildResult<_> {
      let mut total = ShakeOutcome::default();
      for _ in 0..max_depth {
        let outcome = shake_program(fields.allocator, fields.program, &plan)?;
        total.merge(outcome);
        if !outcome.changed() {
          break;
        }
      }
      let scoping = build_scoping(fields.program);
      let collected = collect_dependencies(path, fields.program, &scoping, dynamic_requires)?;
      Ok((total, collected))
    })?;

    if outcome.changed() {
      debug!(
        module = %path,
        removed_exports = outcome.removed_exports,
        removed_imports = outcome.removed_imports,
        removed_declarations = outcome.removed_declarations,
        "shake module"
      );
    }
    self.stats.removed_exports += outcome.removed_exports;
    self.stats.removed_imports += outcome.removed_imports;

    // Warnings are reported once, by the final collection during reconciliation.
    let result = self.graph.replace_dependencies(path, collected.dependencies)?;
    self.stats.disposed_modules += result.dispose.disposed.len();
    for target in result.changed_targets.into_iter().chain(result.dispose.touched) {
      self.enqueue(target);
    }

    Ok(())
  }
}
