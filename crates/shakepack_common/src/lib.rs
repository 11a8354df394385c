mod chunk;
mod graph;
mod module;
mod options;
mod types;

pub use crate::{
  chunk::{Chunk, ChunkIdx},
  graph::{DisposeResult, ModuleGraph, ReplaceDependenciesResult},
  module::{
    module_output::{CssOutput, ModuleOutput, ModuleOutputKind},
    module_type::ModuleType,
    Module,
  },
  options::{
    dynamic_requires::DynamicRequiresBehavior,
    normalized_serializer_options::NormalizedSerializerOptions,
    output_mode::OutputMode,
    serializer_options::SerializerOptions,
    transform_options::{CustomTransformOptions, TransformOptions},
  },
  types::{
    async_type::AsyncType,
    context_params::{ContextFilter, ContextMode, ContextParams},
    dependency::{Dependency, DependencyData, DependencyKey},
    export_names::ExportNames,
    module_id::ModuleId,
    output_artifact::{ArtifactMetadata, ArtifactType, OutputArtifact},
    source_location::{Position, SourceLocation},
  },
};

/// Parameter names of the module factory, in the order the runtime passes them.
pub mod wrapper_params {
  pub const GLOBAL: &str = "global";
  pub const REQUIRE: &str = "_$$_REQUIRE";
  pub const IMPORT_DEFAULT: &str = "_$$_IMPORT_DEFAULT";
  pub const IMPORT_ALL: &str = "_$$_IMPORT_ALL";
  pub const MODULE: &str = "module";
  pub const EXPORTS: &str = "exports";
  pub const DEPENDENCY_MAP: &str = "_dependencyMap";

  pub const ALL: [&str; 7] =
    [GLOBAL, REQUIRE, IMPORT_DEFAULT, IMPORT_ALL, MODULE, EXPORTS, DEPENDENCY_MAP];
}
