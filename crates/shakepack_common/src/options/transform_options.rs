use rustc_hash::FxHashMap;
use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTransformOptions {
  /// Values for `process.env.*` reads.
  #[serde(default)]
  pub environment: FxHashMap<String, String>,
}

/// The options the graph was transformed with.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
  pub platform: Option<String>,
  pub dev: Option<bool>,
  pub minify: Option<bool>,
  #[serde(default)]
  pub custom: CustomTransformOptions,
}
