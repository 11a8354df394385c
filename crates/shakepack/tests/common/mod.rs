#![allow(dead_code)]

use std::{
  io::Write,
  process::{Command, Stdio},
  sync::Arc,
};

use oxc::span::SourceType;
use shakepack::{
  collect_module_dependencies, normalize_options, Dependency, DynamicRequiresBehavior, Module,
  ModuleGraph, ModuleId, SerializerInput, SerializerOptions, TransformOptions,
};
use shakepack_ecmascript::EcmaCompiler;

/// Builds a graph from sources the way the graph builder would: every module is parsed, its
/// dependencies collected and resolved with a fixed scheme. `./x` resolves next to the importer,
/// a bare `pkg` to `/node_modules/pkg/index.js`. The first module is the entry point.
#[derive(Default)]
pub struct Fixture {
  modules: Vec<(String, String)>,
  transform_options: TransformOptions,
}

impl Fixture {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn module(mut self, path: &str, source: &str) -> Self {
    self.modules.push((path.to_string(), source.to_string()));
    self
  }

  pub fn transform_options(mut self, transform_options: TransformOptions) -> Self {
    self.transform_options = transform_options;
    self
  }

  pub fn entry(&self) -> ModuleId {
    ModuleId::from(self.modules[0].0.as_str())
  }

  pub fn graph(&self) -> ModuleGraph {
    let mut graph = ModuleGraph::new(self.transform_options.clone());
    for (path, source) in &self.modules {
      graph.add_module(Module::from_source(path.as_str(), source.as_str()).unwrap());
    }
    graph.add_entry_point(self.entry());

    let mut edges = Vec::new();
    for module in graph.dependencies.values() {
      let collected = collect_module_dependencies(module, DynamicRequiresBehavior::Warn).unwrap();
      for data in collected.dependencies {
        let target = resolve(&module.path, &data.name);
        edges.push((module.path.clone(), Dependency::new(target.as_str(), data)));
      }
    }
    for (importer, dependency) in edges {
      graph.connect(&importer, dependency).unwrap();
    }
    graph
  }

  pub fn input(&self, options: SerializerOptions) -> SerializerInput {
    SerializerInput {
      entry_point: self.entry(),
      pre_modules: vec![],
      graph: self.graph(),
      options: Arc::new(normalize_options(options, &self.transform_options)),
      warnings: vec![],
    }
  }
}

pub fn resolve(importer: &str, specifier: &str) -> String {
  match specifier.strip_prefix("./") {
    Some(rest) => {
      let dir = importer.rsplit_once('/').map_or("", |(dir, _)| dir);
      format!("{dir}/{rest}.js")
    }
    None => format!("/node_modules/{specifier}/index.js"),
  }
}

/// A module stays in the graph exactly as long as something imports it or it is a root.
pub fn assert_refcounts(graph: &ModuleGraph) {
  graph.assert_consistent().unwrap();
  for (path, module) in &graph.dependencies {
    assert!(
      graph.is_root(path) || !module.inverse_dependencies.is_empty(),
      "{path} is alive without importers"
    );
  }
}

pub fn shaking() -> SerializerOptions {
  SerializerOptions { used_exports: Some(true), ..SerializerOptions::default() }
}

/// Module registry with the factory signature bundles call into. Enough to evaluate sync
/// bundles: the entry's `__r` call runs everything.
const RUNTIME: &str = r"
var __modules = Object.create(null);
function __d(factory, id, dependencyMap) {
  __modules[id] = { factory: factory, dependencyMap: dependencyMap, module: null };
}
function __r(id) {
  var record = __modules[id];
  if (record.module) return record.module.exports;
  var module = { exports: {} };
  record.module = module;
  function require(id) { return __r(id); }
  function importDefault(id) {
    var exports = __r(id);
    return exports && exports.__esModule ? exports.default : exports;
  }
  function importAll(id) {
    var exports = __r(id);
    if (exports && exports.__esModule) return exports;
    var ns = {};
    if (exports != null) Object.keys(exports).forEach(function (key) { ns[key] = exports[key]; });
    ns.default = exports;
    return ns;
  }
  record.factory(globalThis, require, importDefault, importAll, module, module.exports, record.dependencyMap);
  return module.exports;
}
";

/// The bundle is valid script source.
pub fn assert_parses(code: &str) {
  if let Err(err) = EcmaCompiler::parse("bundle.js", code.to_string(), SourceType::cjs()) {
    panic!("bundle does not parse: {err:?}\n{code}");
  }
}

/// Evaluates `code` in node and returns what it leaves in `globalThis.result`, as JSON. `None`
/// when node isn't installed; the caller then only checks the bundle's structure.
pub fn run_bundle(code: &str) -> Option<Result<String, String>> {
  let mut child = Command::new("node")
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .ok()?;
  let script = format!("{RUNTIME}\n{code}\nprocess.stdout.write(JSON.stringify(globalThis.result));\n");
  child.stdin.take().unwrap().write_all(script.as_bytes()).unwrap();
  let output = child.wait_with_output().unwrap();
  Some(if output.status.success() {
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  } else {
    Err(String::from_utf8_lossy(&output.stderr).into_owned())
  })
}

/// Parses the bundle and, when node is available, checks what it evaluates to.
pub fn assert_evaluates_to(code: &str, expected: &str) {
  assert_parses(code);
  match run_bundle(code) {
    Some(Ok(result)) => assert_eq!(result, expected, "{code}"),
    Some(Err(stderr)) => panic!("bundle threw:\n{stderr}\n{code}"),
    None => eprintln!("node not found, skipped evaluating the bundle"),
  }
}
