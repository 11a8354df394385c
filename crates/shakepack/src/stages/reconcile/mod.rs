mod factory;
mod impl_visit_mut;
mod lower_module;

use oxc::{
  allocator::Allocator,
  ast::ast::{Expression, IdentifierReference, Program},
  ast_visit::VisitMut,
  codegen::CodegenReturn,
};
use rustc_hash::FxHashMap;
use shakepack_common::{
  wrapper_params, Dependency, DependencyKey, DynamicRequiresBehavior, Module, ModuleOutput,
  ModuleOutputKind, NormalizedSerializerOptions, SourceLocation,
};
use shakepack_ecmascript::{EcmaCompiler, PrintOptions};
use shakepack_ecmascript_utils::AstSnippet;
use shakepack_error::{BuildError, BuildResult, SerializeError};
use shakepack_utils::{
  indexmap::FxIndexMap,
  rayon::{IntoParallelIterator, ParallelIterator},
};
use tracing::debug;

use self::lower_module::{ImportBinding, ModuleLowering};
use super::{SerializerInput, SerializerStage};
use crate::{
  analysis::{
    collect_dependencies::collect_dependencies,
    dependency_call::{DependencyCall, DependencyCallMatcher},
  },
  utils::build_scoping::build_scoping,
};

/// Turns every module still holding an AST into the text of its `__d(...)` factory.
///
/// Dependencies are collected one last time first, so the order of `Module::dependencies` is
/// the order of the final AST and `_dependencyMap[i]` indexes into it.
pub struct ReconcileStage;

impl SerializerStage for ReconcileStage {
  fn name(&self) -> &'static str {
    "reconcile"
  }

  fn run(&self, mut input: SerializerInput) -> BuildResult<SerializerInput> {
    let _span = tracing::debug_span!("reconcile").entered();
    let options = &*input.options;

    let mut collected = Vec::new();
    for (path, module) in &input.graph.dependencies {
      let Some(ast) = &module.ast else { continue };
      let scoping = build_scoping(ast.program());
      let result = collect_dependencies(path, ast.program(), &scoping, options.dynamic_requires)?;
      collected.push((path.clone(), result));
    }
    for (path, result) in collected {
      input.warnings.extend(result.warnings);
      if input.graph.contains(&path) {
        input.graph.replace_dependencies(&path, result.dependencies)?;
      }
    }

    let errors = input
      .graph
      .dependencies
      .values_mut()
      .collect::<Vec<_>>()
      .into_par_iter()
      .filter_map(|module| reconcile_module(module, options).err())
      .flat_map_iter(|err| err.0)
      .collect::<Vec<_>>();
    if !errors.is_empty() {
      return Err(errors.into());
    }

    for module in &mut input.pre_modules {
      reconcile_script(module, options)?;
    }

    debug!(modules = input.graph.dependencies.len(), "reconcile finished");
    Ok(input)
  }
}

fn codegen_error(module_id: &str, err: &anyhow::Error) -> BuildError {
  SerializeError::Codegen { module: module_id.to_string(), message: format!("{err:#}") }.into()
}

fn print_options<'a>(module: &'a Module, options: &NormalizedSerializerOptions) -> PrintOptions<'a> {
  PrintOptions {
    sourcemap_path: options.include_source_maps.then(|| module.path.as_path()),
    minify: options.minify,
  }
}

fn into_output(kind: ModuleOutputKind, ret: CodegenReturn) -> ModuleOutput {
  let code = ret.code.trim_end_matches('\n').to_string();
  let mut output = ModuleOutput::js(kind, code);
  output.map = ret.map;
  output
}

fn reconcile_module(module: &mut Module, options: &NormalizedSerializerOptions) -> BuildResult<()> {
  let Some(mut ast) = module.ast.take() else { return Ok(()) };
  let module_id = &*module.path;
  let dependencies = &module.dependencies;
  let print_options = print_options(module, options);

  let ret = ast.with_mut(|fields| -> BuildResult<CodegenReturn> {
    let lowered = ModuleLowering::new(fields.allocator, module_id, dependencies, fields.program)
      .lower(fields.program)?;

    let scoping = build_scoping(fields.program);
    DependencyRewriter {
      snippet: AstSnippet::new(fields.allocator),
      matcher: DependencyCallMatcher::new(&scoping, fields.source),
      module_id,
      source: fields.source,
      dependencies,
      imports: &lowered.imports,
      dynamic_requires: options.dynamic_requires,
      errors: Vec::new(),
    }
    .rewrite(fields.program)?;

    factory::wrap_in_factory(fields.allocator, fields.program, lowered.is_esm)
      .map_err(|err| codegen_error(module_id, &err))?;

    let scoping = minify(fields.allocator, fields.program, options, &wrapper_params::ALL);
    Ok(EcmaCompiler::print(fields.program, scoping, print_options))
  })?;

  let mut output = into_output(ModuleOutputKind::JsModule, ret);
  output.css.clone_from(&module.css);
  module.output = vec![output];
  module.output_kind = ModuleOutputKind::JsModule;
  Ok(())
}

/// Pre-modules run as they are, outside of any factory.
fn reconcile_script(module: &mut Module, options: &NormalizedSerializerOptions) -> BuildResult<()> {
  let Some(mut ast) = module.ast.take() else { return Ok(()) };
  let kind = match module.output_kind {
    ModuleOutputKind::JsModule => ModuleOutputKind::JsScript,
    kind => kind,
  };
  let print_options = print_options(module, options);
  let ret = ast.with_mut(|fields| {
    let scoping = minify(fields.allocator, fields.program, options, &[]);
    EcmaCompiler::print(fields.program, scoping, print_options)
  });
  module.output = vec![into_output(kind, ret)];
  module.output_kind = kind;
  Ok(())
}

fn minify<'a>(
  allocator: &'a Allocator,
  program: &mut Program<'a>,
  options: &NormalizedSerializerOptions,
  reserved_names: &[&str],
) -> Option<oxc::semantic::Scoping> {
  if options.minify { EcmaCompiler::minify(allocator, program, reserved_names) } else { None }
}

/// Points every import binding and dependency call of a lowered module at the factory's
/// parameters.
pub struct DependencyRewriter<'me, 'ast> {
  snippet: AstSnippet<'ast>,
  matcher: DependencyCallMatcher<'me>,
  module_id: &'me str,
  source: &'me str,
  dependencies: &'me FxIndexMap<DependencyKey, Dependency>,
  imports: &'me FxHashMap<String, ImportBinding>,
  dynamic_requires: DynamicRequiresBehavior,
  errors: Vec<anyhow::Error>,
}

impl<'ast> DependencyRewriter<'_, 'ast> {
  pub fn rewrite(mut self, program: &mut Program<'ast>) -> BuildResult<()> {
    self.visit_program(program);
    if self.errors.is_empty() { Ok(()) } else { Err(self.errors.into()) }
  }

  /// `_x.name` for a read of a named import. Local bindings that shadow the import stay as
  /// they are.
  fn import_access(&self, ident: &IdentifierReference) -> Option<String> {
    if self.imports.is_empty() || !self.matcher.is_unbound(ident, ident.name.as_str()) {
      return None;
    }
    self.imports.get(ident.name.as_str()).map(ImportBinding::access)
  }

  fn parse_expression(&mut self, source: &str) -> Option<Expression<'ast>> {
    match self.snippet.expression(source) {
      Ok(expr) => Some(expr),
      Err(err) => {
        let message = format!("{err:#}");
        self.errors.push(SerializeError::Codegen { module: self.module_id.to_string(), message }.into());
        None
      }
    }
  }

  fn lower_dependency_call(&mut self, call: DependencyCall) -> Option<Expression<'ast>> {
    let text = match &call.key {
      Some(key) => {
        let Some(index) = self.dependencies.get_index_of(key) else {
          self.errors.push(
            SerializeError::MissingDependency {
              module: self.module_id.to_string(),
              key: key.to_string(),
            }
            .into(),
          );
          return None;
        };
        factory::load_expr(call.kind.async_type(), index)
      }
      None if self.dynamic_requires == DynamicRequiresBehavior::ThrowAtRuntime => {
        let loc = SourceLocation::from_span(self.source, call.span.start, call.span.end);
        factory::throw_stub(loc.start.line)
      }
      // Left for the runtime to deal with.
      None => return None,
    };
    self.parse_expression(&text)
  }
}

#[cfg(test)]
mod tests {
  use shakepack_common::{ModuleGraph, SerializerOptions, TransformOptions};

  use super::*;
  use crate::test_utils::TestGraph;

  fn reconcile(fixture: TestGraph, options: SerializerOptions, minify: bool) -> ModuleGraph {
    let transform = TransformOptions { minify: Some(minify), ..TransformOptions::default() };
    ReconcileStage.run(fixture.input(options, &transform)).unwrap().graph
  }

  fn code<'g>(graph: &'g ModuleGraph, path: &str) -> &'g str {
    &graph.get(path).unwrap().js_output().unwrap().code
  }

  #[test]
  fn lowers_imports_to_dependency_map_lookups() {
    let graph = reconcile(
      TestGraph::new()
        .module(
          "/app/index.js",
          "import { add } from './math';
           import answer from './answer';
           import * as all from './math';
           console.log(add(1, 2), { add }, answer, all);",
        )
        .module("/app/math.js", "export function add(a, b) { return a + b; }")
        .module("/app/answer.js", "export default 42;")
        .edge("/app/index.js", "./math", "/app/math.js")
        .edge("/app/index.js", "./answer", "/app/answer.js"),
      SerializerOptions::default(),
      false,
    );

    let index = code(&graph, "/app/index.js");
    assert!(index.starts_with("__d(function"), "{index}");
    assert!(index.contains("_dependencyMap) {"), "{index}");
    assert!(index.contains("var _math = _$$_REQUIRE(_dependencyMap[0]);"), "{index}");
    assert!(index.contains("var answer = _$$_IMPORT_DEFAULT(_dependencyMap[1]);"), "{index}");
    assert!(index.contains("var all = _$$_IMPORT_ALL(_dependencyMap[0]);"), "{index}");
    assert!(index.contains("(0, _math.add)(1, 2)"), "{index}");
    assert!(index.contains("add: _math.add"), "{index}");
    assert!(!index.contains("import "), "{index}");

    let math = code(&graph, "/app/math.js");
    assert!(math.contains("\"__esModule\""), "{math}");
    assert!(math.contains("Object.defineProperty(exports, \"add\""), "{math}");
    assert!(math.contains("function add(a, b)"), "{math}");

    let answer = code(&graph, "/app/answer.js");
    assert!(answer.contains("var _default = 42;"), "{answer}");
    assert!(graph.dependencies.values().all(|module| module.ast.is_none()));
  }

  #[test]
  fn star_reexports_skip_own_export_names() {
    let graph = reconcile(
      TestGraph::new()
        .module("/mid.js", "export * from './lib';\nexport const own = 'local';\nexport default own;")
        .module("/lib.js", "export const own = 'lib';")
        .edge("/mid.js", "./lib", "/lib.js"),
      SerializerOptions::default(),
      false,
    );

    let mid = code(&graph, "/mid.js");
    let names = mid.find("var _exportNames = {").unwrap();
    assert!(mid.contains("\"own\": true"), "{mid}");
    assert!(mid.contains("\"default\": true"), "{mid}");
    let star = mid.find("Object.keys(_lib).forEach").unwrap();
    assert!(names < star, "{mid}");
    assert!(mid.contains("hasOwnProperty.call(_exportNames, key)"), "{mid}");
    assert!(!mid.contains("exports[key]"), "{mid}");
  }

  #[test]
  fn every_async_variant_goes_through_the_runtime() {
    let graph = reconcile(
      TestGraph::new()
        .module(
          "/app/index.js",
          "import('./lazy'); require.resolveWeak('./lazy'); require('./lazy');",
        )
        .module("/app/lazy.js", "module.exports = 1;")
        .async_edge("/app/index.js", "./lazy", "/app/lazy.js")
        .edge_with("/app/index.js", "./lazy", "/app/lazy.js", shakepack_common::AsyncType::Weak)
        .edge("/app/index.js", "./lazy", "/app/lazy.js"),
      SerializerOptions::default(),
      false,
    );
    let index = code(&graph, "/app/index.js");
    assert!(
      index.contains("_$$_REQUIRE.importAsync(_dependencyMap[0], _dependencyMap.paths)"),
      "{index}"
    );
    assert!(index.contains("_dependencyMap[1];"), "{index}");
    assert!(index.contains("_$$_REQUIRE(_dependencyMap[2]);"), "{index}");
    // CommonJS stays sloppy.
    assert!(!code(&graph, "/app/lazy.js").contains("use strict"));
  }

  #[test]
  fn unresolvable_requires_follow_the_policy() {
    let fixture =
      || TestGraph::new().module("/app/index.js", "const a = 1;\nconst b = require(name);");

    let options = SerializerOptions {
      dynamic_requires: Some(DynamicRequiresBehavior::ThrowAtRuntime),
      ..SerializerOptions::default()
    };
    let graph = reconcile(fixture(), options, false);
    let index = code(&graph, "/app/index.js");
    assert!(index.contains("Dynamic require defined at line 2; not supported"), "{index}");

    let err = ReconcileStage
      .run(fixture().input(SerializerOptions::default(), &TransformOptions::default()))
      .err()
      .unwrap();
    assert!(err.any_serialize_error(|err| matches!(err, SerializeError::UnresolvableDependency { .. })));

    let options = SerializerOptions {
      dynamic_requires: Some(DynamicRequiresBehavior::Warn),
      ..SerializerOptions::default()
    };
    let output = ReconcileStage.run(fixture().input(options, &TransformOptions::default())).unwrap();
    assert_eq!(output.warnings.len(), 1);
    assert!(code(&output.graph, "/app/index.js").contains("require(name)"));
  }

  #[test]
  fn minify_keeps_the_factory_parameters() {
    let graph = reconcile(
      TestGraph::new()
        .module("/app/index.js", "import { value } from './value'; console.log(value);")
        .module("/app/value.js", "export const value = 1;")
        .edge("/app/index.js", "./value", "/app/value.js"),
      SerializerOptions::default(),
      true,
    );
    let index = code(&graph, "/app/index.js");
    assert!(index.contains("_$$_REQUIRE(_dependencyMap[0])"), "{index}");
    assert!(!index.contains('\n'), "{index}");
  }

  #[test]
  fn source_maps_point_at_the_module() {
    let options = SerializerOptions { include_source_maps: Some(true), ..SerializerOptions::default() };
    let graph = reconcile(TestGraph::new().module("/app/index.js", "console.log(1);"), options, false);
    let output = graph.get("/app/index.js").unwrap().js_output().unwrap();
    let map = output.map.as_ref().unwrap();
    assert_eq!(map.get_source(0).map(|s| &**s), Some("/app/index.js"));
    assert_eq!(output.line_count, shakepack_sourcemap::lines_count(&output.code) + 1);
  }

  #[test]
  fn pre_modules_are_printed_as_scripts() {
    let mut input = TestGraph::new()
      .module("/app/index.js", "console.log(1);")
      .input(SerializerOptions::default(), &TransformOptions::default());
    input.pre_modules.push(Module::from_source("/app/polyfill.js", "globalThis.a = 1;").unwrap());
    let output = ReconcileStage.run(input).unwrap();
    let script = output.pre_modules[0].js_output().unwrap();
    assert_eq!(script.kind, ModuleOutputKind::JsScript);
    assert_eq!(script.code, "globalThis.a = 1;");
  }
}
