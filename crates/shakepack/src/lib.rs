mod analysis;
mod serializer;
mod stages;
#[cfg(test)]
mod test_utils;
mod utils;

pub use crate::{
  analysis::{
    collect_dependencies::{CollectedDependencies, UnresolvableCall},
    collect_module_dependencies,
    side_effects::{
      has_side_effects, has_side_effects_with_trace, PackageSideEffects, PackageSideEffectsCache,
      SideEffectClassifier, SideEffectTrace,
    },
  },
  serializer::Serializer,
  stages::{
    chunk::{ChunkSerializer, SerializerOutput},
    environment::{EnvironmentInliningStage, ENV_MODULE_ID},
    reconcile::ReconcileStage,
    tree_shake::{TreeShakeStage, TreeShakeStats, TreeShaker},
    SerializerInput, SerializerStage,
  },
  utils::normalize_options::normalize_options,
};
pub use shakepack_common::*;
pub use shakepack_error::{BuildError, BuildResult, SerializeError};
pub use shakepack_fs::{FileSystem, MemoryFileSystem, OsFileSystem};
