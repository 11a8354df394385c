mod impl_visit;

use oxc::{ast::ast::Program, ast_visit::Visit, semantic::Scoping, span::Span};
use rustc_hash::FxHashSet;
use shakepack_common::{
  DependencyData, DependencyKey, DynamicRequiresBehavior, ExportNames, SourceLocation,
};
use shakepack_error::{BuildResult, SerializeError};
use shakepack_utils::indexmap::FxIndexMap;

use super::dependency_call::{DependencyCallKind, DependencyCallMatcher};

/// A load whose target can't be determined statically.
#[derive(Debug, Clone)]
pub struct UnresolvableCall {
  pub kind: DependencyCallKind,
  pub span: Span,
  pub loc: SourceLocation,
}

#[derive(Debug, Default)]
pub struct CollectedDependencies {
  /// In order of first occurrence, one entry per distinct key.
  pub dependencies: Vec<DependencyData>,
  /// Left in the output as is, or stubbed, depending on the dynamic requires policy.
  pub unresolvable: Vec<UnresolvableCall>,
  pub warnings: Vec<anyhow::Error>,
}

impl CollectedDependencies {
  pub fn keys(&self) -> FxHashSet<DependencyKey> {
    self.dependencies.iter().map(DependencyData::key).collect()
  }
}

/// Walks a module and records every static import, re-export and recognized load call.
pub fn collect_dependencies(
  module_id: &str,
  program: &Program,
  scoping: &Scoping,
  dynamic_requires: DynamicRequiresBehavior,
) -> BuildResult<CollectedDependencies> {
  let mut collector = DependencyCollector {
    module_id,
    source: program.source_text,
    matcher: DependencyCallMatcher::new(scoping, program.source_text),
    dynamic_requires,
    try_depth: 0,
    dependencies: FxIndexMap::default(),
    unresolvable: Vec::new(),
    warnings: Vec::new(),
    errors: Vec::new(),
  };
  collector.visit_program(program);

  if !collector.errors.is_empty() {
    return Err(collector.errors.into());
  }

  Ok(CollectedDependencies {
    dependencies: collector.dependencies.into_values().collect(),
    unresolvable: collector.unresolvable,
    warnings: collector.warnings,
  })
}

struct DependencyCollector<'me> {
  module_id: &'me str,
  source: &'me str,
  matcher: DependencyCallMatcher<'me>,
  dynamic_requires: DynamicRequiresBehavior,
  /// Nesting level of `try` blocks around the current node.
  try_depth: u32,
  dependencies: FxIndexMap<DependencyKey, DependencyData>,
  unresolvable: Vec<UnresolvableCall>,
  warnings: Vec<anyhow::Error>,
  errors: Vec<anyhow::Error>,
}

impl DependencyCollector<'_> {
  fn add_dependency(&mut self, key: DependencyKey, names: &ExportNames, span: Span) {
    let is_optional = self.try_depth > 0;
    let loc = SourceLocation::from_span(self.source, span.start, span.end);
    let mut is_new = false;
    let data = self.dependencies.entry(key).or_insert_with_key(|key| {
      is_new = true;
      let mut data = DependencyData::new(key.name.clone(), key.async_type);
      data.context_params.clone_from(&key.context_params);
      data
    });
    // Optional only if every occurrence is guarded.
    data.is_optional = if is_new { is_optional } else { data.is_optional && is_optional };
    data.export_names.extend(names);
    data.locs.push(loc);
  }

  fn add_unresolvable(&mut self, kind: DependencyCallKind, span: Span) {
    let loc = SourceLocation::from_span(self.source, span.start, span.end);
    let error = SerializeError::UnresolvableDependency {
      module: self.module_id.to_string(),
      kind: kind.label(),
      line: loc.start.line,
      column: loc.start.column,
    };
    match self.dynamic_requires {
      DynamicRequiresBehavior::Reject => self.errors.push(error.into()),
      DynamicRequiresBehavior::Warn => {
        tracing::warn!("{error}");
        self.warnings.push(error.into());
      }
      DynamicRequiresBehavior::ThrowAtRuntime => {}
    }
    self.unresolvable.push(UnresolvableCall { kind, span, loc });
  }
}
