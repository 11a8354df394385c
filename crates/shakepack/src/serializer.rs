use std::sync::Arc;

use shakepack_common::{Module, ModuleGraph, ModuleId, SerializerOptions};
use shakepack_error::BuildResult;
use shakepack_fs::{FileSystem, OsFileSystem};
use tracing::debug;

use crate::{
  analysis::side_effects::PackageSideEffectsCache,
  stages::{
    chunk::{ChunkSerializer, SerializerOutput},
    environment::EnvironmentInliningStage,
    reconcile::ReconcileStage,
    tree_shake::TreeShakeStage,
    SerializerInput, SerializerStage,
  },
  utils::normalize_options::normalize_options,
};

/// Turns a resolved module graph into output artifacts. One `Serializer` can serve many
/// requests; the `package.json` lookups it caches outlive each of them.
pub struct Serializer {
  options: SerializerOptions,
  stages: Vec<Box<dyn SerializerStage>>,
}

impl Serializer {
  pub fn new(options: SerializerOptions) -> Self {
    Self::with_file_system(options, Arc::new(OsFileSystem))
  }

  pub fn with_file_system(options: SerializerOptions, fs: Arc<dyn FileSystem>) -> Self {
    let cache = Arc::new(PackageSideEffectsCache::new());
    let stages: Vec<Box<dyn SerializerStage>> = vec![
      Box::new(EnvironmentInliningStage),
      Box::new(TreeShakeStage::new(fs, cache)),
      Box::new(ReconcileStage),
    ];
    Self { options, stages }
  }

  pub async fn serialize(
    &self,
    entry_point: impl Into<ModuleId>,
    pre_modules: Vec<Module>,
    graph: ModuleGraph,
  ) -> BuildResult<SerializerOutput> {
    let options = normalize_options(self.options.clone(), &graph.transform_options);
    let mut input = SerializerInput {
      entry_point: entry_point.into(),
      pre_modules,
      graph,
      options: Arc::new(options),
      warnings: Vec::new(),
    };

    for stage in &self.stages {
      debug!(stage = stage.name(), modules = input.graph.dependencies.len(), "run stage");
      input = stage.run(input)?;
    }

    ChunkSerializer.serialize(input).await
  }
}
