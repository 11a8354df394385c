use serde::{Deserialize, Serialize};

/// How a dependency is loaded. `None` is a plain synchronous require or static import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AsyncType {
  #[default]
  None,
  /// `import('x')`
  Async,
  /// `require.resolveWeak('x')`, only the module id is needed.
  Weak,
  /// `__prefetchImport('x')`
  Prefetch,
  /// `require.unstable_importMaybeSync('x')`
  MaybeSync,
}

impl AsyncType {
  pub fn is_sync(self) -> bool {
    matches!(self, Self::None)
  }

  /// Whether the target lives behind a lazy boundary and may be placed in its own chunk.
  pub fn is_split_point(self) -> bool {
    matches!(self, Self::Async | Self::Prefetch | Self::MaybeSync)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::None => "sync",
      Self::Async => "async",
      Self::Weak => "weak",
      Self::Prefetch => "prefetch",
      Self::MaybeSync => "maybeSync",
    }
  }
}
