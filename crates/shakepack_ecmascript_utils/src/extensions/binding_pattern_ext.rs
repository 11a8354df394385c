use oxc::ast::ast::{BindingIdentifier, BindingPattern, BindingPatternKind};

pub trait BindingPatternExt<'ast> {
  /// Every identifier the pattern binds, in source order. Default values are not entered.
  fn binding_identifiers(&self) -> Vec<&BindingIdentifier<'ast>>;
}

impl<'ast> BindingPatternExt<'ast> for BindingPattern<'ast> {
  fn binding_identifiers(&self) -> Vec<&BindingIdentifier<'ast>> {
    let mut ret = Vec::new();
    collect(self, &mut ret);
    ret
  }
}

fn collect<'p, 'ast>(pattern: &'p BindingPattern<'ast>, out: &mut Vec<&'p BindingIdentifier<'ast>>) {
  match &pattern.kind {
    BindingPatternKind::BindingIdentifier(id) => out.push(id),
    BindingPatternKind::ObjectPattern(obj) => {
      for prop in &obj.properties {
        collect(&prop.value, out);
      }
      if let Some(rest) = &obj.rest {
        collect(&rest.argument, out);
      }
    }
    BindingPatternKind::ArrayPattern(arr) => {
      for element in arr.elements.iter().flatten() {
        collect(element, out);
      }
      if let Some(rest) = &arr.rest {
        collect(&rest.argument, out);
      }
    }
    BindingPatternKind::AssignmentPattern(assign) => collect(&assign.left, out),
  }
}
