use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextMode {
  #[default]
  Sync,
  Eager,
  Lazy,
  LazyOnce,
}

impl ContextMode {
  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "sync" => Some(Self::Sync),
      "eager" => Some(Self::Eager),
      "lazy" => Some(Self::Lazy),
      "lazy-once" => Some(Self::LazyOnce),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextFilter {
  pub pattern: String,
  pub flags: String,
}

impl Default for ContextFilter {
  fn default() -> Self {
    Self { pattern: String::from(".*"), flags: String::new() }
  }
}

/// Arguments of a `require.context(dir, recursive, filter, mode)` call. Two contexts over the
/// same directory with different arguments are different dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextParams {
  pub recursive: bool,
  pub filter: ContextFilter,
  pub mode: ContextMode,
}

impl Default for ContextParams {
  fn default() -> Self {
    Self { recursive: true, filter: ContextFilter::default(), mode: ContextMode::default() }
  }
}
