use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
  Js,
  Map,
  Css,
  CssExternal,
  Json,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
  pub is_async: bool,
  /// Filenames of chunks that must be loaded before this one.
  pub requires: Vec<String>,
  /// Modules serialized into the artifact, by stabilized path.
  pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputArtifact {
  pub filename: String,
  pub origin_filename: String,
  #[serde(rename = "type")]
  pub kind: ArtifactType,
  pub source: String,
  pub metadata: ArtifactMetadata,
}
