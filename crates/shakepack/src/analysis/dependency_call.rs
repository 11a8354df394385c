use oxc::{
  ast::ast::{Argument, CallExpression, Expression, IdentifierReference, ImportExpression},
  semantic::Scoping,
  span::Span,
};
use shakepack_common::{
  AsyncType, ContextFilter, ContextMode, ContextParams, DependencyKey, ExportNames,
};
use shakepack_ecmascript_utils::{first_static_string_argument, ExpressionExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyCallKind {
  Require,
  ResolveWeak,
  ImportMaybeSync,
  Prefetch,
  Context,
  Import,
}

impl DependencyCallKind {
  pub fn async_type(self) -> AsyncType {
    match self {
      Self::Require | Self::Context => AsyncType::None,
      Self::ResolveWeak => AsyncType::Weak,
      Self::ImportMaybeSync => AsyncType::MaybeSync,
      Self::Prefetch => AsyncType::Prefetch,
      Self::Import => AsyncType::Async,
    }
  }

  /// How the call reads in source, for diagnostics.
  pub fn label(self) -> &'static str {
    match self {
      Self::Require => "require",
      Self::ResolveWeak => "require.resolveWeak",
      Self::ImportMaybeSync => "require.unstable_importMaybeSync",
      Self::Prefetch => "__prefetchImport",
      Self::Context => "require.context",
      Self::Import => "import()",
    }
  }

  /// Names the importer consumes. Anything loaded through a call hands out the whole module.
  pub fn export_names(self) -> ExportNames {
    match self {
      Self::ResolveWeak => ExportNames::default(),
      _ => ExportNames::all(),
    }
  }
}

#[derive(Debug)]
pub struct DependencyCall {
  pub kind: DependencyCallKind,
  /// `None` when the arguments can't be resolved statically.
  pub key: Option<DependencyKey>,
  pub span: Span,
}

/// Recognizes the call forms that load another module. `require` and friends only count when
/// `require` isn't bound by the module itself.
pub struct DependencyCallMatcher<'me> {
  scoping: &'me Scoping,
  source: &'me str,
}

impl<'me> DependencyCallMatcher<'me> {
  pub fn new(scoping: &'me Scoping, source: &'me str) -> Self {
    Self { scoping, source }
  }

  pub fn is_unbound(&self, ident: &IdentifierReference, name: &str) -> bool {
    ident.name.as_str() == name
      && ident
        .reference_id
        .get()
        .is_none_or(|reference_id| self.scoping.get_reference(reference_id).symbol_id().is_none())
  }

  pub fn match_call(&self, call: &CallExpression) -> Option<DependencyCall> {
    let kind = match call.callee.without_parentheses() {
      Expression::Identifier(ident) if self.is_unbound(ident, "require") => {
        DependencyCallKind::Require
      }
      Expression::Identifier(ident) if self.is_unbound(ident, "__prefetchImport") => {
        DependencyCallKind::Prefetch
      }
      Expression::StaticMemberExpression(member) => {
        let Expression::Identifier(object) = &member.object else { return None };
        if !self.is_unbound(object, "require") {
          return None;
        }
        match member.property.name.as_str() {
          "resolveWeak" => DependencyCallKind::ResolveWeak,
          "unstable_importMaybeSync" => DependencyCallKind::ImportMaybeSync,
          "context" => DependencyCallKind::Context,
          _ => return None,
        }
      }
      _ => return None,
    };

    let key = match kind {
      DependencyCallKind::Context => self.context_key(&call.arguments),
      _ => first_static_string_argument(&call.arguments)
        .map(|name| DependencyKey::new(name, kind.async_type())),
    };
    Some(DependencyCall { kind, key, span: call.span })
  }

  pub fn match_import(&self, expr: &ImportExpression) -> DependencyCall {
    let key = expr
      .source
      .as_static_string()
      .map(|name| DependencyKey::new(name, DependencyCallKind::Import.async_type()));
    DependencyCall { kind: DependencyCallKind::Import, key, span: expr.span }
  }

  /// `require.context(directory, recursive = true, filter = /.*/, mode = "sync")`. Every given
  /// argument must be a literal of the right kind.
  fn context_key(&self, arguments: &[Argument]) -> Option<DependencyKey> {
    let directory = first_static_string_argument(arguments)?;
    let mut params = ContextParams::default();

    if let Some(arg) = arguments.get(1) {
      match arg.as_expression()? {
        Expression::BooleanLiteral(lit) => params.recursive = lit.value,
        _ => return None,
      }
    }
    if let Some(arg) = arguments.get(2) {
      match arg.as_expression()? {
        Expression::RegExpLiteral(lit) => params.filter = self.regexp_filter(lit.span)?,
        _ => return None,
      }
    }
    if let Some(arg) = arguments.get(3) {
      params.mode = arg.as_expression()?.as_static_string().and_then(ContextMode::parse)?;
    }

    Some(DependencyKey {
      name: directory.to_string(),
      async_type: AsyncType::None,
      context_params: Some(params),
    })
  }

  fn regexp_filter(&self, span: Span) -> Option<ContextFilter> {
    let raw = self.source.get(span.start as usize..span.end as usize)?;
    let body = raw.strip_prefix('/')?;
    let end = body.rfind('/')?;
    Some(ContextFilter { pattern: body[..end].to_string(), flags: body[end + 1..].to_string() })
  }
}
