use oxc::{
  ast::ast::{
    self, ExportAllDeclaration, ExportNamedDeclaration, ImportDeclaration,
    ImportDeclarationSpecifier,
  },
  ast_visit::{walk, Visit},
};
use shakepack_common::{DependencyKey, ExportNames};

use super::DependencyCollector;

impl<'ast> Visit<'ast> for DependencyCollector<'_> {
  fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'ast>) {
    if decl.import_kind.is_type() {
      return;
    }
    let mut names = ExportNames::default();
    for specifier in decl.specifiers.iter().flatten() {
      match specifier {
        ImportDeclarationSpecifier::ImportSpecifier(spec) => {
          if !spec.import_kind.is_type() {
            names.insert(spec.imported.name().as_str());
          }
        }
        ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => names.insert("default"),
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => names.insert(ExportNames::ALL),
      }
    }
    self.add_dependency(DependencyKey::sync(decl.source.value.as_str()), &names, decl.span);
  }

  fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'ast>) {
    let Some(source) = &decl.source else {
      walk::walk_export_named_declaration(self, decl);
      return;
    };
    if decl.export_kind.is_type() {
      return;
    }
    let names = decl
      .specifiers
      .iter()
      .filter(|spec| !spec.export_kind.is_type())
      .map(|spec| spec.local.name())
      .collect::<Vec<_>>();
    let names = names.iter().map(|name| name.as_str()).collect::<ExportNames>();
    self.add_dependency(DependencyKey::sync(source.value.as_str()), &names, decl.span);
  }

  fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'ast>) {
    if decl.export_kind.is_type() {
      return;
    }
    self.add_dependency(
      DependencyKey::sync(decl.source.value.as_str()),
      &ExportNames::all(),
      decl.span,
    );
  }

  fn visit_try_statement(&mut self, it: &ast::TryStatement<'ast>) {
    self.try_depth += 1;
    self.visit_block_statement(&it.block);
    self.try_depth -= 1;
    if let Some(handler) = &it.handler {
      self.visit_catch_clause(handler);
    }
    if let Some(finalizer) = &it.finalizer {
      self.visit_block_statement(finalizer);
    }
  }

  fn visit_call_expression(&mut self, call: &ast::CallExpression<'ast>) {
    if let Some(found) = self.matcher.match_call(call) {
      match found.key {
        Some(key) => self.add_dependency(key, &found.kind.export_names(), found.span),
        None => self.add_unresolvable(found.kind, found.span),
      }
    }
    walk::walk_call_expression(self, call);
  }

  fn visit_import_expression(&mut self, expr: &ast::ImportExpression<'ast>) {
    let found = self.matcher.match_import(expr);
    match found.key {
      Some(key) => self.add_dependency(key, &found.kind.export_names(), found.span),
      None => self.add_unresolvable(found.kind, found.span),
    }
    walk::walk_import_expression(self, expr);
  }
}
