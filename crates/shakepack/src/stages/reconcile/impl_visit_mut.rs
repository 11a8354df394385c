use oxc::{
  ast::ast::{CallExpression, Expression, ObjectProperty},
  ast_visit::{walk_mut, VisitMut},
};
use shakepack_utils::concat_string;

use super::DependencyRewriter;

impl<'ast> VisitMut<'ast> for DependencyRewriter<'_, 'ast> {
  fn visit_expression(&mut self, expr: &mut Expression<'ast>) {
    let replacement = match expr {
      Expression::Identifier(ident) => {
        self.import_access(ident).and_then(|access| self.parse_expression(&access))
      }
      Expression::CallExpression(call) => {
        self.matcher.match_call(call).and_then(|found| self.lower_dependency_call(found))
      }
      Expression::ImportExpression(import) => {
        let found = self.matcher.match_import(import);
        self.lower_dependency_call(found)
      }
      _ => None,
    };
    if let Some(replacement) = replacement {
      *expr = replacement;
      return;
    }
    walk_mut::walk_expression(self, expr);
  }

  // `f()` with `f` imported must not call it with the namespace object as `this`.
  fn visit_call_expression(&mut self, call: &mut CallExpression<'ast>) {
    if let Expression::Identifier(ident) = &call.callee {
      if let Some(access) = self.import_access(ident) {
        if let Some(callee) = self.parse_expression(&concat_string!("(0, ", access, ")")) {
          call.callee = callee;
        }
      }
    }
    walk_mut::walk_call_expression(self, call);
  }

  // `{ a }` has to become `{ a: _x.a }`.
  fn visit_object_property(&mut self, prop: &mut ObjectProperty<'ast>) {
    if prop.shorthand {
      if let Expression::Identifier(ident) = &prop.value {
        if self.import_access(ident).is_some() {
          prop.shorthand = false;
        }
      }
    }
    walk_mut::walk_object_property(self, prop);
  }
}
