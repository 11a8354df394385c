mod inline_env;

use std::sync::Arc;

use itertools::Itertools;
use shakepack_common::{Module, ModuleOutputKind, NormalizedSerializerOptions};
use shakepack_error::BuildResult;
use shakepack_utils::ecmascript::to_js_string_literal;
use tracing::debug;

use self::inline_env::EnvInliner;
use super::{SerializerInput, SerializerStage};
use crate::utils::build_scoping::build_scoping;

pub const ENV_MODULE_ID: &str = "\0shakepack/env.js";

/// Production builds get `process.env` reads replaced by their values and statically dead
/// branches folded away. Development builds keep the code and define the variables in a script
/// that runs before any module.
pub struct EnvironmentInliningStage;

impl SerializerStage for EnvironmentInliningStage {
  fn name(&self) -> &'static str {
    "environment"
  }

  fn run(&self, mut input: SerializerInput) -> BuildResult<SerializerInput> {
    let _span = tracing::debug_span!("environment").entered();
    let options = Arc::clone(&input.options);

    if options.dev {
      if let Some(script) = env_script(&options) {
        input.pre_modules.insert(0, Module::script(ENV_MODULE_ID, script, ModuleOutputKind::JsScriptVirtual));
      }
      return Ok(input);
    }

    let mut inlined = 0;
    for module in input.graph.dependencies.values_mut() {
      let Some(ast) = module.ast.as_mut() else { continue };
      let count = ast.with_mut(|fields| {
        let scoping = build_scoping(fields.program);
        let mut inliner = EnvInliner::new(fields.allocator, &scoping, &options);
        inliner.inline_program(fields.program)
      })?;
      if count > 0 {
        debug!(module = %module.path, count, "inline environment");
      }
      inlined += count;
    }
    debug!(inlined, "environment inlining finished");

    Ok(input)
  }
}

/// Prefixed variables only; the rest of the environment never reaches the client.
fn env_script(options: &NormalizedSerializerOptions) -> Option<String> {
  let vars = options
    .environment
    .iter()
    .filter(|(name, _)| name.starts_with(&options.env_prefix))
    .sorted_by(|a, b| a.0.cmp(b.0))
    .collect::<Vec<_>>();
  if vars.is_empty() {
    return None;
  }
  let mut script = String::from(
    "globalThis.process = globalThis.process || {};\nglobalThis.process.env = globalThis.process.env || {};",
  );
  for (name, value) in vars {
    script.push_str(&format!(
      "\nglobalThis.process.env[{}] = {};",
      to_js_string_literal(name),
      to_js_string_literal(value)
    ));
  }
  Some(script)
}

#[cfg(test)]
mod tests {
  use rustc_hash::FxHashMap;
  use shakepack_common::{ModuleGraph, ModuleId, SerializerOptions, TransformOptions};

  use super::*;
  use crate::utils::normalize_options::normalize_options;

  fn options(dev: bool) -> Arc<NormalizedSerializerOptions> {
    let mut environment = FxHashMap::default();
    environment.insert("EXPO_PUBLIC_API".to_string(), "https://api".to_string());
    environment.insert("SECRET".to_string(), "hunter2".to_string());
    let transform = TransformOptions {
      dev: Some(dev),
      custom: shakepack_common::CustomTransformOptions { environment },
      ..TransformOptions::default()
    };
    Arc::new(normalize_options(SerializerOptions::default(), &transform))
  }

  fn input(dev: bool, source: &str) -> SerializerInput {
    let mut graph = ModuleGraph::new(TransformOptions::default());
    graph.add_module(Module::from_source("/index.js", source).unwrap());
    graph.add_entry_point("/index.js");
    SerializerInput {
      entry_point: ModuleId::from("/index.js"),
      pre_modules: vec![],
      graph,
      options: options(dev),
      warnings: vec![],
    }
  }

  #[test]
  fn dev_defines_prefixed_variables_in_a_script() {
    let output = EnvironmentInliningStage.run(input(true, "process.env.EXPO_PUBLIC_API;")).unwrap();
    assert_eq!(output.pre_modules.len(), 1);
    let script = &output.pre_modules[0];
    assert_eq!(&*script.path, ENV_MODULE_ID);
    let code = &script.js_output().unwrap().code;
    assert!(code.contains(r#"globalThis.process.env["EXPO_PUBLIC_API"] = "https://api";"#), "{code}");
    assert!(!code.contains("hunter2"));
  }

  #[test]
  fn production_leaves_no_pre_module() {
    let output = EnvironmentInliningStage.run(input(false, "process.env.EXPO_PUBLIC_API;")).unwrap();
    assert!(output.pre_modules.is_empty());
  }
}
