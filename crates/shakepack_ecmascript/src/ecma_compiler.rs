use std::path::Path;

use arcstr::ArcStr;
use oxc::{
  allocator::Allocator,
  ast::ast::{BindingIdentifier, Program},
  ast_visit::Visit,
  codegen::{Codegen, CodegenOptions, CodegenReturn},
  minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions},
  parser::Parser,
  semantic::{Scoping, SymbolId},
  span::SourceType,
};
use rustc_hash::FxHashSet;
use shakepack_error::{BuildResult, SerializeError};

use crate::ecma_ast::{
  program_cell::{ProgramCell, ProgramCellDependent, ProgramCellOwner},
  EcmaAst,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOptions<'a> {
  /// Emit a source map whose `sources` entry is this path.
  pub sourcemap_path: Option<&'a Path>,
  pub minify: bool,
}

pub struct EcmaCompiler;

impl EcmaCompiler {
  pub fn parse(
    module_id: &str,
    source: impl Into<ArcStr>,
    source_type: SourceType,
  ) -> BuildResult<EcmaAst> {
    let allocator = Allocator::default();
    let owner = ProgramCellOwner { source: source.into(), allocator };
    let program = ProgramCell::try_new(owner, |owner| {
      let ret = Parser::new(&owner.allocator, &owner.source, source_type).parse();
      if ret.errors.is_empty() && !ret.panicked {
        Ok(ProgramCellDependent { program: ret.program })
      } else {
        let message = ret.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        Err(SerializeError::Parse { module: module_id.to_string(), message })
      }
    })?;

    Ok(EcmaAst { program, source_type })
  }

  pub fn print(program: &Program, scoping: Option<Scoping>, options: PrintOptions) -> CodegenReturn {
    Codegen::new()
      .with_options(CodegenOptions {
        minify: options.minify,
        source_map_path: options.sourcemap_path.map(Path::to_path_buf),
        ..CodegenOptions::default()
      })
      .with_scoping(scoping)
      .build(program)
  }

  /// Compresses and mangles `program` in place. Bindings named in `reserved_names` keep their
  /// names, so a runtime calling the module factory positionally still sees the expected
  /// identifiers inside the body. The returned scoping must be handed to [`Self::print`].
  pub fn minify<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
    reserved_names: &[&str],
  ) -> Option<Scoping> {
    let ret = Minifier::new(MinifierOptions {
      mangle: Some(MangleOptions::default()),
      compress: Some(CompressOptions::default()),
    })
    .minify(allocator, program);

    let mut scoping = ret.scoping?;
    let mut collector = ReservedBindings {
      reserved_names: reserved_names.iter().copied().collect(),
      found: Vec::new(),
    };
    collector.visit_program(program);
    for (symbol_id, name) in collector.found {
      scoping.set_symbol_name(symbol_id, &name);
    }
    Some(scoping)
  }
}

struct ReservedBindings<'r> {
  reserved_names: FxHashSet<&'r str>,
  found: Vec<(SymbolId, String)>,
}

impl<'a> Visit<'a> for ReservedBindings<'_> {
  fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
    if self.reserved_names.contains(it.name.as_str()) {
      if let Some(symbol_id) = it.symbol_id.get() {
        self.found.push((symbol_id, it.name.to_string()));
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_and_print() {
    let ast = EcmaCompiler::parse("/a.js", "const a = 1;", SourceType::mjs()).unwrap();
    let code = EcmaCompiler::print(ast.program(), None, PrintOptions::default()).code;
    assert_eq!(code, "const a = 1;\n");
  }

  #[test]
  fn parse_errors_carry_the_module_path() {
    let err = EcmaCompiler::parse("/broken.js", "const = ;", SourceType::mjs()).unwrap_err();
    assert!(err.to_string().starts_with("/broken.js: failed to parse"));
  }

  #[test]
  fn emits_a_map_when_asked() {
    let ast = EcmaCompiler::parse("/a.js", "export const a = 1;", SourceType::mjs()).unwrap();
    let ret = EcmaCompiler::print(
      ast.program(),
      None,
      PrintOptions { sourcemap_path: Some(Path::new("/a.js")), minify: false },
    );
    assert!(ret.map.is_some());
  }

  #[test]
  fn minify_keeps_reserved_parameter_names() {
    let mut ast = EcmaCompiler::parse(
      "/a.js",
      "__d(function (global, _$$_REQUIRE, module, exports, _dependencyMap) { var longName = _$$_REQUIRE(_dependencyMap[0]); module.exports = longName; });",
      SourceType::cjs(),
    )
    .unwrap();
    let code = ast.with_mut(|fields| {
      let scoping = EcmaCompiler::minify(
        fields.allocator,
        fields.program,
        &["global", "_$$_REQUIRE", "module", "exports", "_dependencyMap"],
      );
      EcmaCompiler::print(fields.program, scoping, PrintOptions { minify: true, ..PrintOptions::default() })
        .code
    });
    assert!(code.contains("_$$_REQUIRE(_dependencyMap[0])"), "{code}");
    assert!(!code.contains("longName"), "{code}");
  }
}
