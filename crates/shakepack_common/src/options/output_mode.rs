use serde::Deserialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
  /// Content-hashed files under `_expo/static`, optionally split into chunks.
  #[default]
  Static,
  /// One `<entry>.bundle` file.
  Classic,
}
