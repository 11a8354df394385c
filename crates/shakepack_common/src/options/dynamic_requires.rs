use serde::Deserialize;

/// What to do with a `require`/`import()` whose target isn't a string literal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicRequiresBehavior {
  #[default]
  Reject,
  Warn,
  ThrowAtRuntime,
}
