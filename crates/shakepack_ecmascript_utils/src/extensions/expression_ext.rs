use oxc::ast::ast::{self, Argument, Expression};

pub trait ExpressionExt<'ast> {
  fn as_identifier(&self) -> Option<&ast::IdentifierReference<'ast>>;

  /// Value of a string literal or of a template literal without substitutions.
  fn as_static_string(&self) -> Option<&str>;

  fn without_parentheses(&self) -> &Expression<'ast>;
}

impl<'ast> ExpressionExt<'ast> for Expression<'ast> {
  fn as_identifier(&self) -> Option<&ast::IdentifierReference<'ast>> {
    if let Expression::Identifier(ident) = self { Some(ident) } else { None }
  }

  fn as_static_string(&self) -> Option<&str> {
    match self {
      Expression::StringLiteral(lit) => Some(lit.value.as_str()),
      Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => {
        tpl.quasis.first().and_then(|quasi| quasi.value.cooked.as_ref()).map(|cooked| cooked.as_str())
      }
      _ => None,
    }
  }

  fn without_parentheses(&self) -> &Expression<'ast> {
    let mut expr = self;
    while let Expression::ParenthesizedExpression(paren) = expr {
      expr = &paren.expression;
    }
    expr
  }
}

/// First argument as a static string, `None` when it is missing, spread or dynamic.
pub fn first_static_string_argument<'a>(arguments: &'a [Argument<'_>]) -> Option<&'a str> {
  arguments.first().and_then(Argument::as_expression).and_then(ExpressionExt::as_static_string)
}
