use oxc::{ast::ast::Program, semantic::{Scoping, SemanticBuilder}};

/// Fresh symbol and reference tables. Rebuilding also re-stamps the ids stored on the AST,
/// so it must run again after every structural mutation before ids are consulted.
pub fn build_scoping(program: &Program) -> Scoping {
  SemanticBuilder::new().build(program).semantic.into_scoping()
}
