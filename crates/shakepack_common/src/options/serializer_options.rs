use std::path::PathBuf;

use serde::Deserialize;

use crate::{DynamicRequiresBehavior, OutputMode};

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializerOptions {
  /// Enables tree shaking.
  pub used_exports: Option<bool>,
  pub split_chunks: Option<bool>,
  pub include_source_maps: Option<bool>,
  pub inline_source_map: Option<bool>,
  pub output_mode: Option<OutputMode>,
  /// Directory module paths are shown relative to.
  pub project_root: Option<PathBuf>,
  pub max_shake_depth: Option<usize>,
  /// How many async chunks must share a module before it is moved into the entry chunk.
  pub common_chunk_threshold: Option<usize>,
  pub dynamic_requires: Option<DynamicRequiresBehavior>,
  pub env_prefix: Option<String>,
  /// Modules required with `__r` before the entry, like the runtime initializers.
  pub run_before_main_module: Option<Vec<String>>,
}
