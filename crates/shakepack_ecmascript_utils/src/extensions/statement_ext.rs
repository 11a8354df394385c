use oxc::ast::ast::{Declaration, ExportDefaultDeclarationKind, Statement};

use super::binding_pattern_ext::BindingPatternExt;

pub trait StatementExt<'ast> {
  fn is_import_declaration(&self) -> bool;

  fn is_module_declaration(&self) -> bool;

  /// Names bound at the top level by a declaration statement.
  fn declared_names(&self) -> Vec<&str>;
}

impl<'ast> StatementExt<'ast> for Statement<'ast> {
  fn is_import_declaration(&self) -> bool {
    matches!(self, Statement::ImportDeclaration(_))
  }

  fn is_module_declaration(&self) -> bool {
    self.as_module_declaration().is_some()
  }

  fn declared_names(&self) -> Vec<&str> {
    match self {
      Statement::VariableDeclaration(decl) => decl
        .declarations
        .iter()
        .flat_map(|declarator| declarator.id.binding_identifiers())
        .map(|id| id.name.as_str())
        .collect(),
      Statement::FunctionDeclaration(func) => func.id.iter().map(|id| id.name.as_str()).collect(),
      Statement::ClassDeclaration(class) => class.id.iter().map(|id| id.name.as_str()).collect(),
      _ => vec![],
    }
  }
}

pub fn declaration_names<'d>(decl: &'d Declaration<'_>) -> Vec<&'d str> {
  match decl {
    Declaration::VariableDeclaration(decl) => decl
      .declarations
      .iter()
      .flat_map(|declarator| declarator.id.binding_identifiers())
      .map(|id| id.name.as_str())
      .collect(),
    Declaration::FunctionDeclaration(func) => func.id.iter().map(|id| id.name.as_str()).collect(),
    Declaration::ClassDeclaration(class) => class.id.iter().map(|id| id.name.as_str()).collect(),
    _ => vec![],
  }
}

/// The statement an `export default` declaration leaves behind once it is no longer exported.
/// Anonymous functions and classes have nothing to keep and yield `None`.
pub fn default_kind_into_statement<'ast>(
  kind: ExportDefaultDeclarationKind<'ast>,
  expr_stmt: impl FnOnce(oxc::ast::ast::Expression<'ast>) -> Statement<'ast>,
) -> Option<Statement<'ast>> {
  match kind {
    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
      func.id.is_some().then(|| Statement::FunctionDeclaration(func))
    }
    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
      class.id.is_some().then(|| Statement::ClassDeclaration(class))
    }
    ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => None,
    kind => Some(expr_stmt(kind.into_expression())),
  }
}
