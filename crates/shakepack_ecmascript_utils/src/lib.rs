mod ast_snippet;
mod extensions;
mod side_effect_detector;
mod span_reset;

pub use crate::{
  ast_snippet::AstSnippet,
  extensions::{
    arena_vec_ext::retain_in_arena,
    binding_pattern_ext::BindingPatternExt,
    expression_ext::{first_static_string_argument, ExpressionExt},
    statement_ext::{declaration_names, default_kind_into_statement, StatementExt},
  },
  side_effect_detector::SideEffectDetector,
  span_reset::SpanReset,
};
