pub mod collect_dependencies;
pub mod dependency_call;
pub mod module_exports;
pub mod side_effects;

use shakepack_common::{DynamicRequiresBehavior, Module};
use shakepack_error::BuildResult;

use self::collect_dependencies::{collect_dependencies, CollectedDependencies};
use crate::utils::build_scoping::build_scoping;

/// Collects the dependencies of a parsed module. Modules without an AST have none.
pub fn collect_module_dependencies(
  module: &Module,
  dynamic_requires: DynamicRequiresBehavior,
) -> BuildResult<CollectedDependencies> {
  let Some(ast) = &module.ast else { return Ok(CollectedDependencies::default()) };
  let scoping = build_scoping(ast.program());
  collect_dependencies(&module.path, ast.program(), &scoping, dynamic_requires)
}
