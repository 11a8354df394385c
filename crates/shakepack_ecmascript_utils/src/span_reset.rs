use oxc::{
  ast_visit::VisitMut,
  span::{Span, SPAN},
};

/// Clears every span in a subtree. Snippet nodes carry offsets into the snippet text,
/// which would otherwise turn into bogus source-map mappings and comment attachments.
pub struct SpanReset;

impl VisitMut<'_> for SpanReset {
  fn visit_span(&mut self, span: &mut Span) {
    *span = SPAN;
  }
}
