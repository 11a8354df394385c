use std::path::PathBuf;

use shakepack_common::{NormalizedSerializerOptions, SerializerOptions, TransformOptions};

pub fn normalize_options(
  raw_options: SerializerOptions,
  transform_options: &TransformOptions,
) -> NormalizedSerializerOptions {
  NormalizedSerializerOptions {
    used_exports: raw_options.used_exports.unwrap_or(false),
    split_chunks: raw_options.split_chunks.unwrap_or(false),
    include_source_maps: raw_options.include_source_maps.unwrap_or(false),
    inline_source_map: raw_options.inline_source_map.unwrap_or(false),
    output_mode: raw_options.output_mode.unwrap_or_default(),
    project_root: raw_options.project_root.unwrap_or_else(|| PathBuf::from("/")),
    max_shake_depth: raw_options.max_shake_depth.unwrap_or(5).max(1),
    common_chunk_threshold: raw_options.common_chunk_threshold.unwrap_or(2).max(1),
    dynamic_requires: raw_options.dynamic_requires.unwrap_or_default(),
    env_prefix: raw_options.env_prefix.unwrap_or_else(|| "EXPO_PUBLIC_".to_string()),
    run_before_main_module: raw_options.run_before_main_module.unwrap_or_default(),
    platform: transform_options.platform.clone().unwrap_or_else(|| "web".to_string()),
    dev: transform_options.dev.unwrap_or(false),
    minify: transform_options.minify.unwrap_or(false),
    environment: transform_options.custom.environment.clone(),
  }
}
