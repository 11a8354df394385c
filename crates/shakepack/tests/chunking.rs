mod common;

use std::{collections::BTreeSet, sync::Arc};

use common::Fixture;
use shakepack::{
  ArtifactType, MemoryFileSystem, OutputArtifact, OutputMode, Serializer, SerializerOptions,
  SerializerOutput,
};

fn two_lazy_routes() -> Fixture {
  Fixture::new()
    .module("/index.js", "import('./a').then(console.log);\nimport('./b').then(console.log);\n")
    .module("/a.js", "import { c } from './c';\nexport default c + 1;\n")
    .module("/b.js", "import { c } from './c';\nexport default c + 2;\n")
    .module("/c.js", "export const c = 1;\n")
}

async fn serialize(fixture: &Fixture, options: SerializerOptions) -> SerializerOutput {
  Serializer::with_file_system(options, Arc::new(MemoryFileSystem::default()))
    .serialize(fixture.entry(), vec![], fixture.graph())
    .await
    .unwrap()
}

fn splitting() -> SerializerOptions {
  SerializerOptions { split_chunks: Some(true), ..SerializerOptions::default() }
}

fn bundles(output: &SerializerOutput) -> Vec<&OutputArtifact> {
  output.artifacts.iter().filter(|artifact| artifact.kind == ArtifactType::Js).collect()
}

#[tokio::test]
async fn shared_module_is_lifted_into_the_entry_chunk() {
  let output = serialize(&two_lazy_routes(), splitting()).await;
  let bundles = bundles(&output);
  assert_eq!(bundles.len(), 3);

  let entry = bundles.iter().find(|bundle| !bundle.metadata.is_async).unwrap();
  assert_eq!(entry.metadata.paths, ["index.js", "c.js"]);
  assert!(entry.filename.starts_with("_expo/static/js/web/"));
  assert!(entry.source.trim_end().ends_with("__r(0);"), "{}", entry.source);

  let lazy = bundles.iter().filter(|bundle| bundle.metadata.is_async).collect::<Vec<_>>();
  assert_eq!(lazy[0].metadata.paths, ["a.js"]);
  assert_eq!(lazy[1].metadata.paths, ["b.js"]);
  for bundle in lazy {
    assert_eq!(bundle.metadata.requires, [entry.filename.clone()]);
    assert!(!bundle.source.contains("__r("), "{}", bundle.source);
  }
}

#[tokio::test]
async fn chunks_partition_the_reachable_modules() {
  let output = serialize(&two_lazy_routes(), splitting()).await;
  let owned = bundles(&output)
    .iter()
    .flat_map(|bundle| bundle.metadata.paths.iter().cloned())
    .collect::<Vec<_>>();
  let unique = owned.iter().cloned().collect::<BTreeSet<_>>();
  assert_eq!(owned.len(), unique.len(), "{owned:?}");
  assert_eq!(unique.into_iter().collect::<Vec<_>>(), ["a.js", "b.js", "c.js", "index.js"]);
}

#[tokio::test]
async fn entry_points_at_lazy_chunks_through_the_dependency_map() {
  let output = serialize(&two_lazy_routes(), splitting()).await;
  let bundles = bundles(&output);
  let entry = bundles.iter().find(|bundle| !bundle.metadata.is_async).unwrap();
  assert!(entry.source.contains(".importAsync(_dependencyMap["), "{}", entry.source);
  assert!(entry.source.contains("\"paths\""), "{}", entry.source);
  for lazy in bundles.iter().filter(|bundle| bundle.metadata.is_async) {
    assert!(entry.source.contains(&format!("\"/{}\"", lazy.filename)), "{}", entry.source);
  }
}

#[tokio::test]
async fn manifest_lists_every_chunk() {
  let output = serialize(&two_lazy_routes(), splitting()).await;
  let manifest = output.artifacts.iter().find(|artifact| artifact.kind == ArtifactType::Json).unwrap();
  assert_eq!(manifest.filename, "_expo/static/js/web/manifest.json");

  let manifest: serde_json::Value = serde_json::from_str(&manifest.source).unwrap();
  let entry = bundles(&output).into_iter().find(|bundle| !bundle.metadata.is_async).unwrap();
  assert_eq!(manifest["entry"], entry.filename.as_str());
  assert_eq!(manifest["asyncChunks"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn filenames_follow_content() {
  let first = serialize(&two_lazy_routes(), splitting()).await;
  let second = serialize(&two_lazy_routes(), splitting()).await;
  let names = |output: &SerializerOutput| {
    bundles(output).iter().map(|bundle| bundle.filename.clone()).collect::<Vec<_>>()
  };
  assert_eq!(names(&first), names(&second));

  let changed = Fixture::new()
    .module("/index.js", "import('./a').then(console.log);\nimport('./b').then(console.log);\n")
    .module("/a.js", "import { c } from './c';\nexport default c + 10;\n")
    .module("/b.js", "import { c } from './c';\nexport default c + 2;\n")
    .module("/c.js", "export const c = 1;\n");
  let changed = serialize(&changed, splitting()).await;
  let (before, after) = (names(&first), names(&changed));
  // The entry only refers to the lazy chunk by url, which isn't part of its hash.
  assert_eq!(before[0], after[0]);
  assert_ne!(before[1], after[1]);
  assert_eq!(before[2], after[2]);
}

#[tokio::test]
async fn filenames_follow_module_ids() {
  let bundle_of = |output: &SerializerOutput, path: &str| {
    bundles(output)
      .into_iter()
      .find(|bundle| bundle.metadata.paths == [path])
      .map(|bundle| bundle.filename.clone())
      .unwrap()
  };
  let before = serialize(&two_lazy_routes(), splitting()).await;

  // `/x.js` comes before `/b.js` in graph order, so b's define call registers another id while
  // its code stays the same.
  let shifted = Fixture::new()
    .module(
      "/index.js",
      "import './x';\nimport('./a').then(console.log);\nimport('./b').then(console.log);\n",
    )
    .module("/x.js", "console.log('x');\n")
    .module("/a.js", "import { c } from './c';\nexport default c + 1;\n")
    .module("/b.js", "import { c } from './c';\nexport default c + 2;\n")
    .module("/c.js", "export const c = 1;\n");
  let after = serialize(&shifted, splitting()).await;

  assert_ne!(bundle_of(&before, "b.js"), bundle_of(&after, "b.js"));
}

#[tokio::test]
async fn without_splitting_there_is_one_bundle() {
  let output = serialize(&two_lazy_routes(), SerializerOptions::default()).await;
  let bundles = bundles(&output);
  assert_eq!(bundles.len(), 1);
  assert_eq!(bundles[0].metadata.paths, ["index.js", "a.js", "c.js", "b.js"]);
  assert!(!bundles[0].source.contains("\"paths\""));
}

#[tokio::test]
async fn classic_output_is_a_single_named_bundle() {
  let options = SerializerOptions {
    split_chunks: Some(true),
    output_mode: Some(OutputMode::Classic),
    ..SerializerOptions::default()
  };
  let output = serialize(&two_lazy_routes(), options).await;
  assert_eq!(output.artifacts.len(), 1);
  assert_eq!(output.artifacts[0].filename, "index.bundle");
}

#[tokio::test]
async fn source_maps_are_emitted_next_to_bundles() {
  let options = SerializerOptions { include_source_maps: Some(true), ..SerializerOptions::default() };
  let output = serialize(&two_lazy_routes(), options).await;
  let bundle = bundles(&output)[0];
  let map = output.artifacts.iter().find(|artifact| artifact.kind == ArtifactType::Map).unwrap();
  assert_eq!(map.filename, format!("{}.map", bundle.filename));
  assert!(bundle.source.ends_with(".js.map"), "{}", bundle.source);

  let map: serde_json::Value = serde_json::from_str(&map.source).unwrap();
  let sources = map["sources"].as_array().unwrap();
  assert!(sources.iter().any(|source| source.as_str().is_some_and(|s| s.ends_with("a.js"))));
}
