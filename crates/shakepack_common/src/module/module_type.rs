use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
  Js,
  Json,
  Css,
  /// Images, fonts and the like; only a JS stub exists for them.
  Asset,
}

impl ModuleType {
  pub fn from_path(path: &str) -> Self {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
      Some("json") => Self::Json,
      Some("css") => Self::Css,
      Some("js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "mts" | "cts") | None => Self::Js,
      Some(_) => Self::Asset,
    }
  }

  /// Modules whose exports are not shaped by ESM syntax, so only reachability applies.
  pub fn is_exempt_from_shaking(self) -> bool {
    matches!(self, Self::Json | Self::Css)
  }
}

#[test]
fn test_from_path() {
  assert_eq!(ModuleType::from_path("/a/b.tsx"), ModuleType::Js);
  assert_eq!(ModuleType::from_path("/a/b.module.css"), ModuleType::Css);
  assert_eq!(ModuleType::from_path("/a/data.json"), ModuleType::Json);
  assert_eq!(ModuleType::from_path("/a/logo.png"), ModuleType::Asset);
  assert_eq!(ModuleType::from_path("\0shakepack/env"), ModuleType::Js);
}
