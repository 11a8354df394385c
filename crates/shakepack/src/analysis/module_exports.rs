use oxc::{
  ast::ast::{
    Expression, ExportDefaultDeclarationKind, IdentifierReference, Program, Statement,
  },
  ast_visit::{walk, Visit},
};
use rustc_hash::FxHashSet;
use shakepack_common::{DependencyKey, ModuleGraph, ModuleId};
use shakepack_ecmascript_utils::{declaration_names, StatementExt};
use shakepack_error::{BuildResult, SerializeError};
use shakepack_utils::indexmap::FxIndexSet;

/// The export surface of a module as declared by its syntax.
#[derive(Debug, Default, Clone)]
pub struct ModuleExports {
  /// Names produced by `export` declarations and specifiers, `default` included. Names coming
  /// through `export * from` are not listed.
  pub names: FxIndexSet<String>,
  /// Sources of `export * from 'x'` without an alias.
  pub star_sources: Vec<String>,
  /// Exports come from ESM syntax alone. A module touching `module` or `exports` as globals may
  /// add exports at runtime, so its surface can't be known.
  pub is_static: bool,
}

impl ModuleExports {
  pub fn analyze(program: &Program) -> Self {
    let mut exports = Self { is_static: true, ..Self::default() };

    for stmt in &program.body {
      match stmt {
        Statement::ExportNamedDeclaration(decl) => {
          if let Some(declaration) = &decl.declaration {
            exports.names.extend(declaration_names(declaration).into_iter().map(str::to_string));
          }
          for spec in &decl.specifiers {
            exports.names.insert(spec.exported.name().to_string());
          }
        }
        Statement::ExportDefaultDeclaration(decl) => {
          if !matches!(decl.declaration, ExportDefaultDeclarationKind::TSInterfaceDeclaration(_)) {
            exports.names.insert("default".to_string());
          }
        }
        Statement::ExportAllDeclaration(decl) => match &decl.exported {
          Some(exported) => {
            exports.names.insert(exported.name().to_string());
          }
          None => exports.star_sources.push(decl.source.value.to_string()),
        },
        _ => {}
      }
    }

    let top_level_names = program
      .body
      .iter()
      .flat_map(StatementExt::declared_names)
      .collect::<FxHashSet<_>>();
    let mut finder = CommonJsExportsFinder { top_level_names, found: false };
    finder.visit_program(program);
    exports.is_static = !finder.found;

    exports
  }
}

/// Looks for `module` or `exports` read as globals. Shadowing in nested scopes isn't tracked, so a
/// local variable named `exports` makes the module count as dynamic, which only keeps more code.
struct CommonJsExportsFinder<'a> {
  top_level_names: FxHashSet<&'a str>,
  found: bool,
}

impl<'ast> Visit<'ast> for CommonJsExportsFinder<'_> {
  fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'ast>) {
    let name = ident.name.as_str();
    if matches!(name, "module" | "exports") && !self.top_level_names.contains(name) {
      self.found = true;
    }
  }

  fn visit_expression(&mut self, expr: &Expression<'ast>) {
    if !self.found {
      walk::walk_expression(self, expr);
    }
  }
}

/// Export names consumers of `path` rely on. `None` means every export is needed.
pub fn used_exports(graph: &ModuleGraph, path: &ModuleId) -> Option<FxIndexSet<String>> {
  let module = graph.get(path)?;
  let mut used = FxIndexSet::default();
  for importer in &module.inverse_dependencies {
    let Some(importer) = graph.get(importer) else { continue };
    for dep in importer.dependencies.values().filter(|dep| dep.absolute_path == *path) {
      if dep.data.uses_all_exports() {
        return None;
      }
      used.extend(dep.data.export_names.iter().map(str::to_string));
    }
  }
  Some(used)
}

/// Every name `path` exports, following `export *` chains. `None` when some module on the way has
/// a surface that can't be known statically. `stack` holds the chain that led here, and a module
/// reappearing on it is a circular re-export.
pub fn resolve_exported_names(
  graph: &ModuleGraph,
  path: &ModuleId,
  stack: &mut Vec<ModuleId>,
) -> BuildResult<Option<FxIndexSet<String>>> {
  if stack.contains(path) {
    let mut chain = stack.iter().map(ToString::to_string).collect::<Vec<_>>();
    chain.push(path.to_string());
    return Err(SerializeError::CircularReexport { chain }.into());
  }

  let module = graph.get(path).ok_or_else(|| SerializeError::MissingModule {
    importer: stack.last().map(ToString::to_string).unwrap_or_default(),
    target: path.to_string(),
  })?;
  let Some(ast) = &module.ast else { return Ok(None) };
  if module.module_type.is_exempt_from_shaking() {
    return Ok(None);
  }
  let exports = ModuleExports::analyze(ast.program());
  if !exports.is_static {
    return Ok(None);
  }

  let mut names = exports.names;
  stack.push(path.clone());
  for source in &exports.star_sources {
    let dep = module.dependencies.get(&DependencyKey::sync(source.as_str())).ok_or_else(|| {
      SerializeError::MissingDependency { module: path.to_string(), key: source.clone() }
    })?;
    match resolve_exported_names(graph, &dep.absolute_path, stack)? {
      // `export *` never forwards `default`.
      Some(star_names) => names.extend(star_names.into_iter().filter(|name| name != "default")),
      None => {
        stack.pop();
        return Ok(None);
      }
    }
  }
  stack.pop();

  Ok(Some(names))
}
