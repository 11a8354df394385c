use oxc::{
  allocator::{Allocator, TakeIn},
  ast::ast::{BinaryOperator, Expression, LogicalOperator, Program, Statement, UnaryOperator},
  ast_visit::{walk_mut, VisitMut},
  semantic::Scoping,
  span::SPAN,
};
use shakepack_common::NormalizedSerializerOptions;
use shakepack_ecmascript_utils::{AstSnippet, ExpressionExt};
use shakepack_error::BuildResult;
use shakepack_utils::ecmascript::to_js_string_literal;

pub struct EnvInliner<'me, 'ast> {
  snippet: AstSnippet<'ast>,
  scoping: &'me Scoping,
  options: &'me NormalizedSerializerOptions,
  count: usize,
  errors: Vec<anyhow::Error>,
}

impl<'me, 'ast> EnvInliner<'me, 'ast> {
  pub fn new(
    alloc: &'ast Allocator,
    scoping: &'me Scoping,
    options: &'me NormalizedSerializerOptions,
  ) -> Self {
    Self { snippet: AstSnippet::new(alloc), scoping, options, count: 0, errors: Vec::new() }
  }

  /// Returns how many reads were replaced.
  pub fn inline_program(&mut self, program: &mut Program<'ast>) -> BuildResult<usize> {
    self.visit_program(program);
    if self.errors.is_empty() {
      Ok(self.count)
    } else {
      Err(std::mem::take(&mut self.errors).into())
    }
  }

  /// Value of a `process.env.NAME` read, when it is known at build time.
  fn env_value(&self, expr: &Expression) -> Option<&'me str> {
    let Expression::StaticMemberExpression(member) = expr else { return None };
    let Expression::StaticMemberExpression(env) = &member.object else { return None };
    let Expression::Identifier(process) = &env.object else { return None };
    let is_global_process = process.name.as_str() == "process"
      && process
        .reference_id
        .get()
        .is_none_or(|reference_id| self.scoping.get_reference(reference_id).symbol_id().is_none());
    if !is_global_process || env.property.name.as_str() != "env" {
      return None;
    }

    let name = member.property.name.as_str();
    if name == "NODE_ENV" {
      return Some("production");
    }
    if !name.starts_with(self.options.env_prefix.as_str()) {
      return None;
    }
    self.options.environment.get(name).map(String::as_str)
  }

  fn fold_expression(&self, expr: &mut Expression<'ast>) {
    let alloc = self.snippet.alloc();
    let replacement = match expr {
      Expression::ConditionalExpression(cond) => match static_truthiness(&cond.test) {
        Some(true) => Some(cond.consequent.take_in(alloc)),
        Some(false) => Some(cond.alternate.take_in(alloc)),
        None => None,
      },
      Expression::LogicalExpression(logical) => {
        match (logical.operator, static_truthiness(&logical.left)) {
          (LogicalOperator::And, Some(false)) | (LogicalOperator::Or, Some(true)) => {
            Some(logical.left.take_in(alloc))
          }
          (LogicalOperator::And, Some(true)) | (LogicalOperator::Or, Some(false)) => {
            Some(logical.right.take_in(alloc))
          }
          _ => None,
        }
      }
      _ => None,
    };
    if let Some(replacement) = replacement {
      *expr = replacement;
    }
  }

  fn fold_if_statement(&self, stmt: &mut Statement<'ast>) {
    let alloc = self.snippet.alloc();
    let Statement::IfStatement(if_stmt) = stmt else { return };
    let replacement = match static_truthiness(&if_stmt.test) {
      Some(true) => if_stmt.consequent.take_in(alloc),
      Some(false) => match &mut if_stmt.alternate {
        Some(alternate) => alternate.take_in(alloc),
        None => self.snippet.builder.statement_empty(SPAN),
      },
      None => return,
    };
    *stmt = replacement;
  }
}

impl<'ast> VisitMut<'ast> for EnvInliner<'_, 'ast> {
  fn visit_expression(&mut self, expr: &mut Expression<'ast>) {
    if let Some(value) = self.env_value(expr) {
      match self.snippet.expression(&to_js_string_literal(value)) {
        Ok(literal) => {
          *expr = literal;
          self.count += 1;
        }
        Err(err) => self.errors.push(err),
      }
      return;
    }
    walk_mut::walk_expression(self, expr);
    self.fold_expression(expr);
  }

  fn visit_statement(&mut self, stmt: &mut Statement<'ast>) {
    walk_mut::walk_statement(self, stmt);
    self.fold_if_statement(stmt);
  }
}

/// Truthiness of a test that only involves literals.
fn static_truthiness(expr: &Expression) -> Option<bool> {
  match expr.without_parentheses() {
    Expression::BooleanLiteral(lit) => Some(lit.value),
    Expression::StringLiteral(lit) => Some(!lit.value.is_empty()),
    Expression::NumericLiteral(lit) => Some(lit.value.abs() > 0.0),
    Expression::NullLiteral(_) => Some(false),
    Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::LogicalNot => {
      static_truthiness(&unary.argument).map(|value| !value)
    }
    Expression::BinaryExpression(binary) => {
      let left = binary.left.without_parentheses().as_static_string()?;
      let right = binary.right.without_parentheses().as_static_string()?;
      match binary.operator {
        BinaryOperator::StrictEquality | BinaryOperator::Equality => Some(left == right),
        BinaryOperator::StrictInequality | BinaryOperator::Inequality => Some(left != right),
        _ => None,
      }
    }
    _ => None,
  }
}
