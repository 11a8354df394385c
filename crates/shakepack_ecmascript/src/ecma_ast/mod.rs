pub mod program_cell;

use std::fmt::Debug;

use arcstr::ArcStr;
use oxc::{allocator::Allocator, ast::ast::Program, span::SourceType};

use self::program_cell::{ProgramCell, WithMutFields};

/// A parsed module that owns both its source text and the arena its `Program` lives in.
///
/// - To access `&mut ast::Program`, use `ast.with_mut(|fields| { fields.program; })`.
pub struct EcmaAst {
  pub program: ProgramCell,
  pub source_type: SourceType,
}

impl EcmaAst {
  pub fn source(&self) -> &ArcStr {
    &self.program.borrow_owner().source
  }

  pub fn allocator(&self) -> &Allocator {
    &self.program.borrow_owner().allocator
  }

  pub fn program(&self) -> &Program {
    &self.program.borrow_dependent().program
  }

  pub fn with_mut<'outer, Ret>(
    &'outer mut self,
    func: impl for<'inner> FnOnce(WithMutFields<'outer, 'inner>) -> Ret,
  ) -> Ret {
    self.program.with_mut(func)
  }

  /// Nothing but directives, so evaluating it can never be observed.
  pub fn is_body_empty(&self) -> bool {
    self.program().body.is_empty()
  }
}

impl Debug for EcmaAst {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EcmaAst").field("source", &self.source()).finish_non_exhaustive()
  }
}

unsafe impl Send for EcmaAst {}
unsafe impl Sync for EcmaAst {}
