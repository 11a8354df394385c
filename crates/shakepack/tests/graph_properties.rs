mod common;

use std::sync::Arc;

use common::{assert_refcounts, shaking, Fixture};
use shakepack::{
  collect_module_dependencies, has_side_effects, has_side_effects_with_trace, AsyncType,
  DynamicRequiresBehavior, MemoryFileSystem, Module, ModuleId, PackageSideEffectsCache,
  SerializerStage, SideEffectClassifier, TreeShakeStage,
};

#[test]
fn collecting_twice_gives_the_same_dependencies() {
  let module = Module::from_source(
    "/index.js",
    r"
      import a, { b } from './a';
      import { c } from './a';
      export { d } from './d';
      export * from './e';
      const lazy = import('./lazy');
      require.resolveWeak('./weak');
      try { require('optional'); } catch {}
      console.log(a, b, c, lazy);
    ",
  )
  .unwrap();

  let first = collect_module_dependencies(&module, DynamicRequiresBehavior::Reject).unwrap();
  let second = collect_module_dependencies(&module, DynamicRequiresBehavior::Reject).unwrap();
  assert_eq!(first.dependencies, second.dependencies);

  let a = &first.dependencies[0];
  assert_eq!(a.name, "./a");
  assert_eq!(a.export_names.iter().collect::<Vec<_>>(), ["default", "b", "c"]);
  let kinds = first.dependencies.iter().map(|dep| dep.async_type).collect::<Vec<_>>();
  assert!(kinds.contains(&AsyncType::Async));
  assert!(kinds.contains(&AsyncType::Weak));
  assert!(first.dependencies.iter().any(|dep| dep.name == "optional" && dep.is_optional));
}

#[test]
fn disposed_modules_are_exactly_the_unreferenced_ones() {
  let fixture = Fixture::new()
    .module("/index.js", "import { keep } from './lib';\nconsole.log(keep);\n")
    .module("/lib.js", "import { helper } from './helper';\nexport const keep = 1;\nexport const drop = helper;\n")
    .module("/helper.js", "import './deep';\nexport const helper = 2;\n")
    .module("/deep.js", "export const deep = 3;\n");
  let fs = MemoryFileSystem::new([("/package.json", r#"{ "sideEffects": false }"#)]);
  let stage = TreeShakeStage::new(Arc::new(fs), Arc::new(PackageSideEffectsCache::new()));
  let graph = stage.run(fixture.input(shaking())).unwrap().graph;

  assert_refcounts(&graph);
  let alive = graph.dependencies.keys().map(|path| &**path).collect::<Vec<_>>();
  assert_eq!(alive, ["/index.js", "/lib.js"]);
}

#[test]
fn side_effects_propagate_to_importers() {
  let fixture = Fixture::new()
    .module("/index.js", "import 'lib';\n")
    .module("/node_modules/lib/index.js", "import './setup';\nexport const a = 1;\n")
    .module("/node_modules/lib/setup.js", "import './polyfill';\n")
    .module("/node_modules/lib/polyfill.js", "globalThis.patched = true;\n");
  let fs = MemoryFileSystem::new([(
    "/node_modules/lib/package.json",
    r#"{ "name": "lib", "sideEffects": ["./polyfill.js"] }"#,
  )]);
  let mut graph = fixture.graph();
  SideEffectClassifier::new(&fs, &PackageSideEffectsCache::new()).classify_graph(&mut graph);

  let lib = ModuleId::from("/node_modules/lib/index.js");
  let setup = ModuleId::from("/node_modules/lib/setup.js");
  assert_eq!(graph.get(&lib).unwrap().side_effects, Some(false));

  // Asking about the importer first or last makes no difference.
  assert!(has_side_effects(&graph, &lib));
  assert!(has_side_effects(&graph, &setup));
  assert!(has_side_effects(&graph, &lib));

  let trace = has_side_effects_with_trace(&graph, &lib);
  assert_eq!(trace.trace.last().map(|path| &**path), Some("/node_modules/lib/polyfill.js"));
}

#[test]
fn side_effect_free_chain_stays_side_effect_free() {
  let fixture = Fixture::new()
    .module("/index.js", "import 'lib';\n")
    .module("/node_modules/lib/index.js", "import './util';\n")
    .module("/node_modules/lib/util.js", "export const util = 1;\n");
  let fs = MemoryFileSystem::new([("/node_modules/lib/package.json", r#"{ "sideEffects": false }"#)]);
  let mut graph = fixture.graph();
  SideEffectClassifier::new(&fs, &PackageSideEffectsCache::new()).classify_graph(&mut graph);

  assert!(!has_side_effects(&graph, &ModuleId::from("/node_modules/lib/index.js")));
  assert!(has_side_effects(&graph, &ModuleId::from("/index.js")));
}
