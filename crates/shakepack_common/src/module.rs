pub mod module_output;
pub mod module_type;

use arcstr::ArcStr;
use oxc::span::SourceType;
use shakepack_ecmascript::{EcmaAst, EcmaCompiler};
use shakepack_error::BuildResult;
use shakepack_utils::indexmap::{FxIndexMap, FxIndexSet};

use crate::{
  CssOutput, Dependency, DependencyKey, ModuleId, ModuleOutput, ModuleOutputKind, ModuleType,
};

/// One transformed source file in the graph.
#[derive(Debug)]
pub struct Module {
  pub path: ModuleId,
  pub module_type: ModuleType,
  /// Present until reconciliation turns it into `output`.
  pub ast: Option<EcmaAst>,
  pub dependencies: FxIndexMap<DependencyKey, Dependency>,
  pub inverse_dependencies: FxIndexSet<ModuleId>,
  /// `None` until classified.
  pub side_effects: Option<bool>,
  pub css: Option<CssOutput>,
  pub output: Vec<ModuleOutput>,
  pub output_kind: ModuleOutputKind,
}

impl Module {
  pub fn new(path: impl Into<ModuleId>, module_type: ModuleType, ast: Option<EcmaAst>) -> Self {
    Self {
      path: path.into(),
      module_type,
      ast,
      dependencies: FxIndexMap::default(),
      inverse_dependencies: FxIndexSet::default(),
      side_effects: None,
      css: None,
      output: Vec::new(),
      output_kind: ModuleOutputKind::JsModule,
    }
  }

  /// Parses already-transformed JS. The module type follows the path's extension.
  pub fn from_source(path: impl Into<ModuleId>, source: impl Into<ArcStr>) -> BuildResult<Self> {
    let path = path.into();
    let module_type = ModuleType::from_path(&path);
    let source_type = if matches!(module_type, ModuleType::Json) {
      SourceType::cjs()
    } else {
      SourceType::unambiguous()
    };
    let ast = EcmaCompiler::parse(&path, source, source_type)?;
    Ok(Self::new(path, module_type, Some(ast)))
  }

  /// A stylesheet as produced by the CSS transformer: an empty JS stub plus CSS metadata.
  pub fn css(path: impl Into<ModuleId>, css: CssOutput) -> BuildResult<Self> {
    let path = path.into();
    let ast = EcmaCompiler::parse(&path, "", SourceType::mjs())?;
    let mut module = Self::new(path, ModuleType::Css, Some(ast));
    module.css = Some(css);
    Ok(module)
  }

  /// A script run before the entry, outside of any module factory.
  pub fn script(path: impl Into<ModuleId>, code: String, kind: ModuleOutputKind) -> Self {
    let mut module = Self::new(path, ModuleType::Js, None);
    module.output_kind = kind;
    module.output.push(ModuleOutput::js(kind, code));
    module
  }

  pub fn js_output(&self) -> Option<&ModuleOutput> {
    self.output.first()
  }

  /// No statements at all, so loading it can't be observed.
  pub fn is_empty(&self) -> bool {
    self.ast.as_ref().is_some_and(EcmaAst::is_body_empty)
  }

  pub fn is_dependency_of(&self, importer: &Module) -> bool {
    importer.dependencies.values().any(|dep| dep.absolute_path == self.path)
  }
}
