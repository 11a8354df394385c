//! Text of the calls a reconciled module makes into the runtime. Everything here goes through
//! the module factory's parameters, see [`wrapper_params`].

use oxc::{
  allocator::{Allocator, TakeIn},
  ast::ast::{Argument, Expression, FunctionBody, Program, Statement},
};
use shakepack_common::{wrapper_params, AsyncType};
use shakepack_ecmascript_utils::{AstSnippet, StatementExt};
use shakepack_utils::{concat_string, ecmascript::to_js_string_literal};

/// `_dependencyMap[index]`
pub fn dependency_ref(index: usize) -> String {
  let mut buf = itoa::Buffer::new();
  let index = buf.format(index);
  concat_string!(wrapper_params::DEPENDENCY_MAP, "[", index, "]")
}

/// Loads dependency `index` the way `async_type` asks for it. `require.context` loads are sync.
pub fn load_expr(async_type: AsyncType, index: usize) -> String {
  let dep = dependency_ref(index);
  let paths = concat_string!(wrapper_params::DEPENDENCY_MAP, ".paths");
  match async_type {
    AsyncType::None => concat_string!(wrapper_params::REQUIRE, "(", dep, ")"),
    AsyncType::Weak => dep,
    AsyncType::Async => {
      concat_string!(wrapper_params::REQUIRE, ".importAsync(", dep, ", ", paths, ")")
    }
    AsyncType::Prefetch => {
      concat_string!(wrapper_params::REQUIRE, ".prefetch(", dep, ", ", paths, ")")
    }
    AsyncType::MaybeSync => {
      concat_string!(wrapper_params::REQUIRE, ".importMaybeSync(", dep, ", ", paths, ")")
    }
  }
}

pub fn import_default_expr(index: usize) -> String {
  let dep = dependency_ref(index);
  concat_string!(wrapper_params::IMPORT_DEFAULT, "(", dep, ")")
}

pub fn import_all_expr(index: usize) -> String {
  let dep = dependency_ref(index);
  concat_string!(wrapper_params::IMPORT_ALL, "(", dep, ")")
}

/// Replaces a load whose target was never resolved.
pub fn throw_stub(line: u32) -> String {
  format!("(() => {{ throw new Error(\"Dynamic require defined at line {line}; not supported\"); }})()")
}

pub fn es_module_marker() -> String {
  concat_string!("Object.defineProperty(", wrapper_params::EXPORTS, ", \"__esModule\", { value: true });")
}

/// Live binding: the getter reads `value` every time the export is accessed.
pub fn export_getter(name: &str, value: &str) -> String {
  let name = to_js_string_literal(name);
  concat_string!(
    "Object.defineProperty(",
    wrapper_params::EXPORTS,
    ", ",
    name,
    ", { enumerable: true, get: function () { return ",
    value,
    "; } });"
  )
}

/// `var <binding> = { "a": true, ... };` listing the module's own export names.
pub fn export_names_object(binding: &str, names: &[String]) -> String {
  let entries = names.iter().map(|name| format!("{}: true", to_js_string_literal(name)));
  format!("var {binding} = {{ {} }};", entries.collect::<Vec<_>>().join(", "))
}

/// `export * from`: forwards every export of `object` but `default`. Own exports listed in
/// `own_names` shadow star names, and the first star source providing a name wins. The
/// module's getters are never read, their bindings may not be initialized yet.
pub fn export_star_loop(object: &str, own_names: &str) -> String {
  let exports = wrapper_params::EXPORTS;
  format!(
    "Object.keys({object}).forEach(function (key) {{ \
       if (key === \"default\" || key === \"__esModule\") return; \
       if (Object.prototype.hasOwnProperty.call({own_names}, key)) return; \
       if (Object.prototype.hasOwnProperty.call({exports}, key)) return; \
       Object.defineProperty({exports}, key, {{ enumerable: true, get: function () {{ return {object}[key]; }} }}); \
     }});"
  )
}

fn factory_template(is_esm: bool) -> String {
  let params = wrapper_params::ALL.join(", ");
  let prologue = if is_esm { "\"use strict\";" } else { "" };
  concat_string!("__d(function (", params, ") {", prologue, "});")
}

fn factory_body_mut<'s, 'ast>(stmt: &'s mut Statement<'ast>) -> Option<&'s mut FunctionBody<'ast>> {
  let Statement::ExpressionStatement(stmt) = stmt else { return None };
  let Expression::CallExpression(call) = &mut stmt.expression else { return None };
  let Some(Argument::FunctionExpression(func)) = call.arguments.first_mut() else { return None };
  func.body.as_deref_mut()
}

/// A lexical top-level binding named like a factory parameter would redeclare the parameter,
/// a syntax error once the body sits inside the factory.
fn check_parameter_collisions(program: &Program) -> anyhow::Result<()> {
  for stmt in &program.body {
    let is_lexical = match stmt {
      Statement::VariableDeclaration(decl) => decl.kind.is_lexical(),
      Statement::ClassDeclaration(_) => true,
      _ => false,
    };
    if !is_lexical {
      continue;
    }
    if let Some(name) = stmt.declared_names().into_iter().find(|name| wrapper_params::ALL.contains(name)) {
      anyhow::bail!("top-level `{name}` redeclares a module factory parameter");
    }
  }
  Ok(())
}

/// Moves the whole program into `__d(function (global, ...) { ... });`. The module's directives
/// become the factory's, and ESM gets strict mode.
pub fn wrap_in_factory<'ast>(
  alloc: &'ast Allocator,
  program: &mut Program<'ast>,
  is_esm: bool,
) -> anyhow::Result<()> {
  check_parameter_collisions(program)?;
  let snippet = AstSnippet::new(alloc);
  let mut factory = snippet.statement(&factory_template(is_esm))?;
  let Some(body) = factory_body_mut(&mut factory) else {
    anyhow::bail!("module factory template has no function body");
  };
  for directive in program.directives.take_in(alloc) {
    if is_esm && directive.directive.as_str() == "use strict" {
      continue;
    }
    body.directives.push(directive);
  }
  body.statements = program.body.take_in(alloc);
  program.body.push(factory);
  program.hashbang = None;
  Ok(())
}

#[test]
fn test_load_expr() {
  assert_eq!(load_expr(AsyncType::None, 0), "_$$_REQUIRE(_dependencyMap[0])");
  assert_eq!(load_expr(AsyncType::Weak, 3), "_dependencyMap[3]");
  assert_eq!(
    load_expr(AsyncType::Async, 1),
    "_$$_REQUIRE.importAsync(_dependencyMap[1], _dependencyMap.paths)"
  );
  assert_eq!(
    load_expr(AsyncType::MaybeSync, 1),
    "_$$_REQUIRE.importMaybeSync(_dependencyMap[1], _dependencyMap.paths)"
  );
  assert_eq!(import_default_expr(2), "_$$_IMPORT_DEFAULT(_dependencyMap[2])");
}

#[test]
fn test_export_getter() {
  assert_eq!(
    export_getter("a-b", "_x.c"),
    "Object.defineProperty(exports, \"a-b\", { enumerable: true, get: function () { return _x.c; } });"
  );
}

#[test]
fn test_export_star_loop() {
  assert_eq!(
    export_names_object("_exportNames", &["own".to_string(), "default".to_string()]),
    "var _exportNames = { \"own\": true, \"default\": true };"
  );
  let code = export_star_loop("_lib", "_exportNames");
  assert!(code.contains("Object.prototype.hasOwnProperty.call(_exportNames, key)"));
  assert!(code.contains("Object.prototype.hasOwnProperty.call(exports, key)"));
  assert!(!code.contains("exports[key]"));
}
