use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::{DynamicRequiresBehavior, OutputMode};

#[allow(clippy::struct_excessive_bools)] // Using raw booleans is more clear in this case
#[derive(Debug, Clone)]
pub struct NormalizedSerializerOptions {
  pub used_exports: bool,
  pub split_chunks: bool,
  pub include_source_maps: bool,
  pub inline_source_map: bool,
  pub output_mode: OutputMode,
  pub project_root: PathBuf,
  pub max_shake_depth: usize,
  pub common_chunk_threshold: usize,
  pub dynamic_requires: DynamicRequiresBehavior,
  pub env_prefix: String,
  pub run_before_main_module: Vec<String>,

  // --- From the graph's transform options
  pub platform: String,
  pub dev: bool,
  pub minify: bool,
  pub environment: FxHashMap<String, String>,
}

impl NormalizedSerializerOptions {
  /// Whether async imports produce their own chunks.
  pub fn is_splitting(&self) -> bool {
    self.split_chunks && matches!(self.output_mode, OutputMode::Static)
  }
}
