use shakepack_sourcemap::SourceMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleOutputKind {
  /// Wrapped in a module factory and registered with `__d`.
  JsModule,
  /// Executed as-is, like polyfills.
  JsScript,
  /// A script generated by the serializer itself.
  JsScriptVirtual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssOutput {
  pub code: String,
  pub line_count: u32,
  /// URLs of `@import`s that are kept as separate stylesheets.
  pub external_imports: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModuleOutput {
  pub kind: ModuleOutputKind,
  pub code: String,
  pub line_count: u32,
  pub map: Option<SourceMap>,
  pub css: Option<CssOutput>,
}

impl ModuleOutput {
  pub fn js(kind: ModuleOutputKind, code: String) -> Self {
    let line_count = shakepack_sourcemap::lines_count(&code) + 1;
    Self { kind, code, line_count, map: None, css: None }
  }
}
