mod common;

use std::sync::Arc;

use common::{assert_evaluates_to, assert_refcounts, shaking, Fixture};
use shakepack::{
  ArtifactType, DependencyKey, MemoryFileSystem, ModuleGraph, PackageSideEffectsCache,
  SerializeError, Serializer, SerializerOptions, SerializerStage, TreeShakeStage,
};
use shakepack_ecmascript::{EcmaCompiler, PrintOptions};

fn shake(fixture: &Fixture, fs: MemoryFileSystem) -> ModuleGraph {
  shake_with(fixture, fs, shaking())
}

fn shake_with(fixture: &Fixture, fs: MemoryFileSystem, options: SerializerOptions) -> ModuleGraph {
  let stage = TreeShakeStage::new(Arc::new(fs), Arc::new(PackageSideEffectsCache::new()));
  let graph = stage.run(fixture.input(options)).unwrap().graph;
  assert_refcounts(&graph);
  graph
}

fn print(graph: &ModuleGraph, path: &str) -> String {
  let ast = graph.get(path).and_then(|module| module.ast.as_ref()).unwrap();
  EcmaCompiler::print(ast.program(), None, PrintOptions::default()).code
}

fn export_names<'a>(graph: &'a ModuleGraph, importer: &str, specifier: &str) -> Vec<&'a str> {
  let module = graph.get(importer).unwrap();
  module.dependencies[&DependencyKey::sync(specifier)].data.export_names.iter().collect()
}

fn used_and_unused() -> Fixture {
  Fixture::new()
    .module("/B.js", "import { used } from './A';\nconsole.log(used);\n")
    .module("/A.js", "export const used = 1;\nexport const unused = 2;\n")
}

#[test]
fn unused_export_is_removed() {
  let graph = shake(&used_and_unused(), MemoryFileSystem::default());
  let code = print(&graph, "/A.js");
  assert!(code.contains("used = 1"), "{code}");
  assert!(!code.contains("unused"), "{code}");
  assert_eq!(export_names(&graph, "/B.js", "./A"), ["used"]);
}

#[tokio::test]
async fn unused_export_is_missing_from_the_bundle() {
  let fixture = used_and_unused();
  let serializer = Serializer::with_file_system(shaking(), Arc::new(MemoryFileSystem::default()));
  let output = serializer.serialize(fixture.entry(), vec![], fixture.graph()).await.unwrap();

  let bundles = output.artifacts.iter().filter(|artifact| artifact.kind == ArtifactType::Js);
  let code = bundles.map(|artifact| artifact.source.as_str()).collect::<String>();
  assert!(code.contains("used = 1"), "{code}");
  assert!(!code.contains("unused"), "{code}");
}

#[test]
fn export_pruning_keeps_used_values_and_side_effects() {
  let fixture = Fixture::new()
    .module("/index.js", "import { used } from './lib';\nconsole.log(used);\n")
    .module(
      "/lib.js",
      "import './register';\nconst base = 2;\nexport const used = base * 2;\nexport const unused = base + 1;\n",
    )
    .module("/register.js", "globalThis.registered = true;\n");
  let graph = shake(&fixture, MemoryFileSystem::default());

  let code = print(&graph, "/lib.js");
  assert!(code.contains("base = 2"), "{code}");
  assert!(code.contains("base * 2"), "{code}");
  assert!(!code.contains("base + 1"), "{code}");
  assert!(code.contains("import \"./register\""), "{code}");
  assert!(graph.contains("/register.js"));
}

#[test]
fn side_effect_free_package_is_disposed() {
  let fixture = Fixture::new()
    .module("/index.js", "import 'pkg';\nconsole.log('ready');\n")
    .module("/node_modules/pkg/index.js", "globalThis.registered = true;\n");
  let fs = MemoryFileSystem::new([(
    "/node_modules/pkg/package.json",
    r#"{ "name": "pkg", "sideEffects": false }"#,
  )]);
  let graph = shake(&fixture, fs);

  assert!(!graph.contains("/node_modules/pkg/index.js"));
  assert!(graph.get("/index.js").unwrap().dependencies.is_empty());
  assert!(!print(&graph, "/index.js").contains("pkg"));
}

#[test]
fn package_with_side_effects_is_kept() {
  let fixture = Fixture::new()
    .module("/index.js", "import 'pkg';\n")
    .module("/node_modules/pkg/index.js", "globalThis.registered = true;\n");
  let fs = MemoryFileSystem::new([(
    "/node_modules/pkg/package.json",
    r#"{ "name": "pkg", "sideEffects": ["./index.js"] }"#,
  )]);
  let graph = shake(&fixture, fs);
  assert!(graph.contains("/node_modules/pkg/index.js"));
}

#[test]
fn star_reexport_is_narrowed_to_used_names() {
  let fixture = Fixture::new()
    .module("/index.js", "import { x } from './A';\nconsole.log(x);\n")
    .module("/A.js", "export * from './B';\n")
    .module("/B.js", "export const x = 1;\nexport const y = 2;\n");
  let graph = shake(&fixture, MemoryFileSystem::default());

  let code = print(&graph, "/A.js");
  assert!(code.contains("export { x } from \"./B\""), "{code}");
  assert!(!code.contains("export *"), "{code}");
  assert_eq!(export_names(&graph, "/A.js", "./B"), ["x"]);

  let code = print(&graph, "/B.js");
  assert!(code.contains("x = 1"), "{code}");
  assert!(!code.contains("y = 2"), "{code}");
}

#[test]
fn circular_star_reexports_are_fatal() {
  let fixture = Fixture::new()
    .module("/index.js", "import { x } from './A';\nconsole.log(x);\n")
    .module("/A.js", "export * from './B';\n")
    .module("/B.js", "export * from './A';\n");
  let stage = TreeShakeStage::new(
    Arc::new(MemoryFileSystem::default()),
    Arc::new(PackageSideEffectsCache::new()),
  );
  let Err(err) = stage.run(fixture.input(shaking())) else { panic!("expected a cycle error") };
  assert!(
    err.any_serialize_error(|err| matches!(err, SerializeError::CircularReexport { .. })),
    "{err:?}"
  );
}

#[test]
fn without_used_exports_nothing_is_shaken() {
  let fixture = used_and_unused();
  let stage = TreeShakeStage::new(
    Arc::new(MemoryFileSystem::default()),
    Arc::new(PackageSideEffectsCache::new()),
  );
  let graph = stage.run(fixture.input(SerializerOptions::default())).unwrap().graph;
  assert!(print(&graph, "/A.js").contains("unused"));
}

/// `lib` also hands out exports through `exports`, by a name only known at runtime.
fn mixed_exports() -> Fixture {
  Fixture::new()
    .module("/index.js", "import { pick } from './lib';\nglobalThis.result = [pick('a'), pick('b')];\n")
    .module("/lib.js", "export const a = 1;\nexport const b = 2;\nexports.pick = (k) => exports[k];\n")
}

#[test]
fn commonjs_exports_keep_every_export() {
  let graph = shake(&mixed_exports(), MemoryFileSystem::default());
  let code = print(&graph, "/lib.js");
  assert!(code.contains("export const a = 1"), "{code}");
  assert!(code.contains("export const b = 2"), "{code}");
}

#[tokio::test]
async fn commonjs_exports_still_resolve_at_runtime() {
  let fixture = mixed_exports();
  let serializer = Serializer::with_file_system(shaking(), Arc::new(MemoryFileSystem::default()));
  let output = serializer.serialize(fixture.entry(), vec![], fixture.graph()).await.unwrap();
  let bundle = output.artifacts.iter().find(|artifact| artifact.kind == ArtifactType::Js).unwrap();
  assert_evaluates_to(&bundle.source, "[1,2]");
}

#[test]
fn shaking_rounds_are_bounded_by_max_shake_depth() {
  // Each round orphans one more declaration of the chain.
  let fixture = Fixture::new()
    .module("/index.js", "import { used } from './lib';\nconsole.log(used);\n")
    .module(
      "/lib.js",
      "const first = 1;\nconst second = first;\nconst third = second;\nexport const used = 1;\nexport const unused = third;\n",
    );

  let single_round = SerializerOptions { max_shake_depth: Some(1), ..shaking() };
  let code = print(&shake_with(&fixture, MemoryFileSystem::default(), single_round), "/lib.js");
  assert!(!code.contains("unused"), "{code}");
  assert!(code.contains("first = 1"), "{code}");

  let code = print(&shake(&fixture, MemoryFileSystem::default()), "/lib.js");
  assert!(code.contains("used = 1"), "{code}");
  for name in ["first", "second", "third"] {
    assert!(!code.contains(name), "{code}");
  }
}
