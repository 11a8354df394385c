use oxc::{
  allocator::{Allocator, Vec as ArenaVec},
  ast::{
    ast::{self, Expression, Statement},
    AstBuilder,
  },
  ast_visit::VisitMut,
  parser::Parser,
  span::{SourceType, SPAN},
};

use crate::SpanReset;

// `AstBuilder` is more suitable name, but it's already used in oxc.
/// Builds nodes inside an existing arena. Larger fragments are written as JS text and parsed
/// into the arena, which keeps generated code readable and independent of builder signatures.
#[derive(Clone, Copy)]
pub struct AstSnippet<'ast> {
  pub builder: AstBuilder<'ast>,
}

impl<'ast> AstSnippet<'ast> {
  pub fn new(alloc: &'ast Allocator) -> Self {
    Self { builder: AstBuilder::new(alloc) }
  }

  #[inline]
  pub fn alloc(&self) -> &'ast Allocator {
    self.builder.allocator
  }

  #[inline]
  pub fn id(&self, name: &str) -> ast::BindingIdentifier<'ast> {
    self.builder.binding_identifier(SPAN, self.builder.atom(name))
  }

  pub fn expr_stmt(&self, expr: Expression<'ast>) -> Statement<'ast> {
    self.builder.statement_expression(SPAN, expr)
  }

  /// Parses `source` as module code and returns its top-level statements.
  pub fn statements(&self, source: &str) -> anyhow::Result<ArenaVec<'ast, Statement<'ast>>> {
    let source = self.alloc().alloc_str(source);
    let ret = Parser::new(self.alloc(), source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
      anyhow::bail!("invalid generated code `{source}`: {:?}", ret.errors);
    }
    let mut program = ret.program;
    SpanReset.visit_program(&mut program);
    Ok(std::mem::replace(&mut program.body, self.builder.vec()))
  }

  pub fn statement(&self, source: &str) -> anyhow::Result<Statement<'ast>> {
    let mut stmts = self.statements(source)?;
    match stmts.pop() {
      Some(stmt) if stmts.is_empty() => Ok(stmt),
      _ => anyhow::bail!("expected exactly one statement in `{source}`"),
    }
  }

  pub fn expression(&self, source: &str) -> anyhow::Result<Expression<'ast>> {
    let source = self.alloc().alloc_str(source);
    let mut expr = Parser::new(self.alloc(), source, SourceType::mjs())
      .parse_expression()
      .map_err(|errors| anyhow::anyhow!("invalid generated expression `{source}`: {errors:?}"))?;
    SpanReset.visit_expression(&mut expr);
    Ok(expr)
  }

  /// `var name = init;`
  pub fn var_decl_stmt(&self, name: &str, init: Expression<'ast>) -> anyhow::Result<Statement<'ast>> {
    let mut stmt = self.statement(&format!("var {name} = void 0;"))?;
    let Statement::VariableDeclaration(decl) = &mut stmt else {
      anyhow::bail!("`{name}` is not a valid binding name");
    };
    let Some(declarator) = decl.declarations.first_mut() else {
      anyhow::bail!("`{name}` is not a valid binding name");
    };
    declarator.init = Some(init);
    Ok(stmt)
  }

  /// `import "source";`
  pub fn import_side_effect_stmt(&self, source: &str) -> anyhow::Result<Statement<'ast>> {
    self.statement(&format!("import {};", json_quote(source)))
  }
}

fn json_quote(value: &str) -> String {
  let mut ret = String::with_capacity(value.len() + 2);
  ret.push('"');
  for c in value.chars() {
    match c {
      '"' => ret.push_str("\\\""),
      '\\' => ret.push_str("\\\\"),
      '\n' => ret.push_str("\\n"),
      '\r' => ret.push_str("\\r"),
      c => ret.push(c),
    }
  }
  ret.push('"');
  ret
}
