use itertools::Itertools;
use oxc::{
  allocator::{Allocator, Vec as ArenaVec},
  ast::ast::{
    BindingIdentifier, BindingPatternKind, Declaration, Program, Statement,
    VariableDeclarationKind,
  },
};
use rustc_hash::FxHashMap;
use shakepack_ecmascript_utils::{
  declaration_names, default_kind_into_statement, retain_in_arena, AstSnippet,
  SideEffectDetector,
};
use shakepack_utils::{
  ecmascript::{to_js_string_literal, to_module_import_export_name},
  indexmap::FxIndexSet,
};

use crate::{analysis::module_exports::ModuleExports, utils::build_scoping::build_scoping};

/// Facts about the rest of the graph one module's shaking depends on.
#[derive(Debug, Default)]
pub struct ShakePlan {
  /// `None` keeps every export.
  pub used_exports: Option<FxIndexSet<String>>,
  /// Per sync specifier, whether the target must still be evaluated once nothing is imported
  /// from it by name.
  pub keep_loaded: FxHashMap<String, bool>,
  /// Per `export * from` specifier, every name the target provides. `None` when unknown.
  pub star_exports: FxHashMap<String, Option<FxIndexSet<String>>>,
}

impl ShakePlan {
  fn is_used(&self, name: &str) -> bool {
    self.used_exports.as_ref().is_none_or(|used| used.contains(name))
  }

  fn keeps_loaded(&self, specifier: &str) -> bool {
    self.keep_loaded.get(specifier).copied().unwrap_or(true)
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ShakeOutcome {
  pub removed_exports: usize,
  pub removed_imports: usize,
  pub removed_declarations: usize,
  pub expanded_star_exports: usize,
}

impl ShakeOutcome {
  pub fn changed(&self) -> bool {
    self.removed_exports + self.removed_imports + self.removed_declarations + self.expanded_star_exports
      > 0
  }

  pub fn merge(&mut self, other: Self) {
    self.removed_exports += other.removed_exports;
    self.removed_imports += other.removed_imports;
    self.removed_declarations += other.removed_declarations;
    self.expanded_star_exports += other.expanded_star_exports;
  }
}

/// One round of shaking: drops unused exports, then top-level declarations nothing references,
/// then imports nothing references. Removing one thing can orphan another, so callers repeat
/// this until nothing changes.
pub fn shake_program<'a>(
  alloc: &'a Allocator,
  program: &mut Program<'a>,
  plan: &ShakePlan,
) -> anyhow::Result<ShakeOutcome> {
  let snippet = AstSnippet::new(alloc);
  let mut outcome = ShakeOutcome::default();
  prune_exports(snippet, program, plan, &mut outcome)?;
  remove_unreferenced_declarations(alloc, program, &mut outcome);
  prune_imports(snippet, program, plan, &mut outcome)?;
  Ok(outcome)
}

/// `import 'x'` when the target still has to run, nothing otherwise.
fn side_effect_import<'a>(
  snippet: AstSnippet<'a>,
  plan: &ShakePlan,
  specifier: &str,
) -> anyhow::Result<Option<Statement<'a>>> {
  if plan.keeps_loaded(specifier) {
    snippet.import_side_effect_stmt(specifier).map(Some)
  } else {
    Ok(None)
  }
}

fn into_statement(declaration: Declaration<'_>) -> Option<Statement<'_>> {
  match declaration {
    Declaration::VariableDeclaration(decl) => Some(Statement::VariableDeclaration(decl)),
    Declaration::FunctionDeclaration(func) => Some(Statement::FunctionDeclaration(func)),
    Declaration::ClassDeclaration(class) => Some(Statement::ClassDeclaration(class)),
    _ => None,
  }
}

fn prune_exports<'a>(
  snippet: AstSnippet<'a>,
  program: &mut Program<'a>,
  plan: &ShakePlan,
  outcome: &mut ShakeOutcome,
) -> anyhow::Result<()> {
  if plan.used_exports.is_none() {
    return Ok(());
  }
  let alloc = snippet.alloc();
  let local_exports = ModuleExports::analyze(program).names;
  let scoping = build_scoping(program);
  let detector = SideEffectDetector::new(&scoping);

  let body = std::mem::replace(&mut program.body, ArenaVec::new_in(alloc));
  for stmt in body {
    match stmt {
      Statement::ExportNamedDeclaration(mut decl) => {
        if let Some(declaration) = &decl.declaration {
          let names = declaration_names(declaration);
          let count = names.len();
          // Declarations binding used and unused names at once stay exported as a whole.
          if names.is_empty() || names.iter().any(|name| plan.is_used(name)) {
            program.body.push(Statement::ExportNamedDeclaration(decl));
            continue;
          }
          outcome.removed_exports += count;
          if let Some(stmt) = decl.unbox().declaration.and_then(into_statement) {
            program.body.push(stmt);
          }
          continue;
        }

        let had_specifiers = !decl.specifiers.is_empty();
        outcome.removed_exports += retain_in_arena(&mut decl.specifiers, alloc, |spec| {
          plan.is_used(spec.exported.name().as_str())
        });
        if !had_specifiers || !decl.specifiers.is_empty() {
          program.body.push(Statement::ExportNamedDeclaration(decl));
        } else if let Some(source) = &decl.source {
          program.body.extend(side_effect_import(snippet, plan, source.value.as_str())?);
        }
      }
      Statement::ExportDefaultDeclaration(decl) if !plan.is_used("default") => {
        outcome.removed_exports += 1;
        let kept = default_kind_into_statement(decl.unbox().declaration, |expr| {
          snippet.expr_stmt(expr)
        })
        .filter(|stmt| match stmt {
          Statement::ExpressionStatement(stmt) => detector.detect_side_effect_of_expr(&stmt.expression),
          _ => true,
        });
        program.body.extend(kept);
      }
      Statement::ExportAllDeclaration(decl) => {
        let source = decl.source.value;
        let source = source.as_str();
        if let Some(exported) = &decl.exported {
          if plan.is_used(exported.name().as_str()) {
            program.body.push(Statement::ExportAllDeclaration(decl));
          } else {
            outcome.removed_exports += 1;
            program.body.extend(side_effect_import(snippet, plan, source)?);
          }
          continue;
        }

        let (Some(used), Some(Some(star_names))) =
          (&plan.used_exports, plan.star_exports.get(source))
        else {
          program.body.push(Statement::ExportAllDeclaration(decl));
          continue;
        };
        // Local exports shadow names coming through `export *`.
        let names = star_names
          .iter()
          .filter(|name| used.contains(*name) && !local_exports.contains(*name))
          .collect::<Vec<_>>();
        if names.is_empty() {
          outcome.removed_exports += 1;
          program.body.extend(side_effect_import(snippet, plan, source)?);
        } else {
          outcome.expanded_star_exports += 1;
          let specifiers =
            names.iter().map(|name| to_module_import_export_name(name)).join(", ");
          program.body.push(
            snippet.statement(&format!(
              "export {{ {specifiers} }} from {};",
              to_js_string_literal(source)
            ))?,
          );
        }
      }
      stmt => program.body.push(stmt),
    }
  }
  Ok(())
}

fn remove_unreferenced_declarations<'a>(
  alloc: &'a Allocator,
  program: &mut Program<'a>,
  outcome: &mut ShakeOutcome,
) {
  let scoping = build_scoping(program);
  let detector = SideEffectDetector::new(&scoping);
  let is_unreferenced = |id: &BindingIdentifier| {
    id.symbol_id.get().is_some_and(|symbol_id| scoping.get_resolved_reference_ids(symbol_id).is_empty())
  };

  let mut removed_declarators = 0;
  let removed_statements = retain_in_arena(&mut program.body, alloc, |stmt| match stmt {
    Statement::VariableDeclaration(decl) => {
      if !matches!(
        decl.kind,
        VariableDeclarationKind::Var | VariableDeclarationKind::Let | VariableDeclarationKind::Const
      ) {
        return true;
      }
      let had_declarators = !decl.declarations.is_empty();
      removed_declarators += retain_in_arena(&mut decl.declarations, alloc, |declarator| {
        // Destructuring may run getters, so only plain bindings are candidates.
        let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind else { return true };
        !is_unreferenced(id)
          || declarator.init.as_ref().is_some_and(|init| detector.detect_side_effect_of_expr(init))
      });
      !had_declarators || !decl.declarations.is_empty()
    }
    Statement::FunctionDeclaration(func) => !func.id.as_ref().is_some_and(is_unreferenced),
    Statement::ClassDeclaration(class) => {
      !class.id.as_ref().is_some_and(is_unreferenced) || detector.detect_side_effect_of_class(class)
    }
    _ => true,
  });
  outcome.removed_declarations += removed_statements + removed_declarators;
}

fn prune_imports<'a>(
  snippet: AstSnippet<'a>,
  program: &mut Program<'a>,
  plan: &ShakePlan,
  outcome: &mut ShakeOutcome,
) -> anyhow::Result<()> {
  let alloc = snippet.alloc();
  let scoping = build_scoping(program);
  let is_referenced = |id: &BindingIdentifier| {
    id.symbol_id.get().is_none_or(|symbol_id| !scoping.get_resolved_reference_ids(symbol_id).is_empty())
  };

  let body = std::mem::replace(&mut program.body, ArenaVec::new_in(alloc));
  for stmt in body {
    let Statement::ImportDeclaration(mut decl) = stmt else {
      program.body.push(stmt);
      continue;
    };
    if decl.import_kind.is_type() {
      program.body.push(Statement::ImportDeclaration(decl));
      continue;
    }

    let removed = match &mut decl.specifiers {
      Some(specifiers) if !specifiers.is_empty() => {
        retain_in_arena(specifiers, alloc, |spec| is_referenced(spec.local()))
      }
      _ => 0,
    };
    outcome.removed_imports += removed;

    if decl.specifiers.as_ref().is_some_and(|specifiers| !specifiers.is_empty()) {
      program.body.push(Statement::ImportDeclaration(decl));
    } else if plan.keeps_loaded(decl.source.value.as_str()) {
      decl.specifiers = None;
      program.body.push(Statement::ImportDeclaration(decl));
    } else if removed == 0 {
      // A bare import of a module that can't be observed.
      outcome.removed_imports += 1;
    }
  }
  Ok(())
}
