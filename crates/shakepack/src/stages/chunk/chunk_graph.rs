use std::collections::VecDeque;

use oxc_index::IndexVec;
use rustc_hash::FxHashMap;
use shakepack_common::{Chunk, ChunkIdx, Module, ModuleGraph, ModuleId, NormalizedSerializerOptions};
use shakepack_error::{BuildResult, SerializeError};
use shakepack_utils::{
  indexmap::{FxIndexMap, FxIndexSet},
  path_ext::PathExt,
  sanitize_file_name::sanitize_file_name,
};
use tracing::debug;

#[derive(Debug)]
pub struct ChunkGraph {
  pub chunks: IndexVec<ChunkIdx, Chunk>,
  pub entry_chunk: ChunkIdx,
  /// The chunk each module is loaded from. When a module sits in several chunks the first one,
  /// so the entry chunk, wins.
  pub module_to_chunk: FxHashMap<ModuleId, ChunkIdx>,
}

impl ChunkGraph {
  /// One chunk for the entry, plus one per module behind a split point when splitting is on.
  pub fn build(
    graph: &ModuleGraph,
    entry: &ModuleId,
    pre_modules: &[Module],
    options: &NormalizedSerializerOptions,
  ) -> BuildResult<Self> {
    let splitting = options.is_splitting();

    let mut roots = FxIndexSet::default();
    roots.insert(entry.clone());
    roots.extend(graph.entry_points.iter().filter(|path| graph.contains(path)).cloned());
    let mut entry_chunk = Chunk::new(chunk_name(entry), roots, false);
    entry_chunk.pre_modules = pre_modules.iter().map(|module| module.path.clone()).collect();

    let mut chunks: IndexVec<ChunkIdx, Chunk> = IndexVec::default();
    let entry_chunk = chunks.push(entry_chunk);
    let mut async_roots = FxHashMap::default();
    let mut queue = VecDeque::from([entry_chunk]);

    while let Some(idx) = queue.pop_front() {
      let (deps, split_points) = gather(graph, &chunks[idx].entries, splitting)?;
      chunks[idx].deps = deps;
      for root in split_points {
        if async_roots.contains_key(&root) {
          continue;
        }
        let chunk = Chunk::new(chunk_name(&root), [root.clone()].into_iter().collect(), true);
        let chunk_idx = chunks.push(chunk);
        async_roots.insert(root, chunk_idx);
        queue.push_back(chunk_idx);
      }
    }

    let mut chunk_graph = Self { chunks, entry_chunk, module_to_chunk: FxHashMap::default() };
    chunk_graph.consolidate(options.common_chunk_threshold);
    chunk_graph.assign_owners();
    chunk_graph.compute_required_chunks(graph);
    debug!(chunks = chunk_graph.chunks.len(), "chunk graph built");
    Ok(chunk_graph)
  }

  /// Async chunks drop what the entry chunk already loads, and modules shared by at least
  /// `threshold` async chunks move into the entry chunk. Async chunks left empty disappear.
  fn consolidate(&mut self, threshold: usize) {
    let entry = self.entry_chunk;
    let in_entry = self.chunks[entry].deps.clone();

    let mut counts: FxIndexMap<ModuleId, usize> = FxIndexMap::default();
    for (idx, chunk) in self.chunks.iter_mut_enumerated() {
      if idx == entry {
        continue;
      }
      chunk.deps.retain(|path| !in_entry.contains(path));
      for path in &chunk.deps {
        *counts.entry(path.clone()).or_default() += 1;
      }
    }

    let common = counts
      .into_iter()
      .filter(|(_, count)| *count >= threshold)
      .map(|(path, _)| path)
      .collect::<FxIndexSet<_>>();
    if !common.is_empty() {
      debug!(count = common.len(), "move shared modules into the entry chunk");
      for (idx, chunk) in self.chunks.iter_mut_enumerated() {
        if idx != entry {
          chunk.deps.retain(|path| !common.contains(path));
        }
      }
      self.chunks[entry].deps.extend(common);
    }

    // Only async chunks are dropped and the entry chunk comes first, so its index survives the
    // rebuild. Owners and required chunks are computed afterwards.
    debug_assert_eq!(entry.index(), 0);
    self.chunks = std::mem::take(&mut self.chunks)
      .into_iter()
      .filter(|chunk| !chunk.is_async || !chunk.deps.is_empty())
      .collect();
  }

  fn assign_owners(&mut self) {
    for (idx, chunk) in self.chunks.iter_enumerated() {
      for path in &chunk.deps {
        self.module_to_chunk.entry(path.clone()).or_insert(idx);
      }
    }
  }

  /// A chunk requires every other chunk holding one of its modules' synchronous dependencies.
  fn compute_required_chunks(&mut self, graph: &ModuleGraph) {
    for idx in self.chunks.indices() {
      let chunk = &self.chunks[idx];
      let mut required = FxIndexSet::default();
      for path in &chunk.deps {
        let Some(module) = graph.get(path) else { continue };
        for dep in module.dependencies.values() {
          if dep.data.async_type.is_split_point() || chunk.has_module(&dep.absolute_path) {
            continue;
          }
          if let Some(owner) = self.module_to_chunk.get(&dep.absolute_path) {
            required.insert(*owner);
          }
        }
      }
      self.chunks[idx].required_chunks = required;
    }
  }

  pub fn chunk_of(&self, path: &str) -> Option<ChunkIdx> {
    self.module_to_chunk.get(path).copied()
  }
}

/// Depth-first from `roots`, stopping at split points. Returns the modules in visit order and
/// the targets of the split points that were crossed.
fn gather(
  graph: &ModuleGraph,
  roots: &FxIndexSet<ModuleId>,
  splitting: bool,
) -> BuildResult<(FxIndexSet<ModuleId>, Vec<ModuleId>)> {
  let mut deps = FxIndexSet::default();
  let mut split_points = Vec::new();
  let mut stack = roots.iter().rev().cloned().collect::<Vec<_>>();

  while let Some(path) = stack.pop() {
    if deps.contains(&path) {
      continue;
    }
    let Some(module) = graph.get(&path) else {
      return Err(
        SerializeError::MissingModule { importer: path.to_string(), target: path.to_string() }.into(),
      );
    };
    for dep in module.dependencies.values() {
      if !graph.contains(&dep.absolute_path) {
        return Err(
          SerializeError::MissingModule {
            importer: path.to_string(),
            target: dep.absolute_path.to_string(),
          }
          .into(),
        );
      }
      if splitting && dep.data.async_type.is_split_point() {
        split_points.push(dep.absolute_path.clone());
      }
    }
    stack.extend(
      module
        .dependencies
        .values()
        .rev()
        .filter(|dep| !(splitting && dep.data.async_type.is_split_point()))
        .map(|dep| dep.absolute_path.clone()),
    );
    deps.insert(path);
  }

  Ok((deps, split_points))
}

fn chunk_name(path: &ModuleId) -> String {
  sanitize_file_name(&path.as_path().representative_file_name())
}

#[cfg(test)]
mod tests {
  use shakepack_common::{SerializerOptions, TransformOptions};

  use super::*;
  use crate::{test_utils::TestGraph, utils::normalize_options::normalize_options};

  fn build(fixture: TestGraph, split_chunks: bool, threshold: Option<usize>) -> (ModuleGraph, ChunkGraph) {
    let options = normalize_options(
      SerializerOptions {
        split_chunks: Some(split_chunks),
        common_chunk_threshold: threshold,
        ..SerializerOptions::default()
      },
      &TransformOptions::default(),
    );
    let graph = fixture.graph();
    let chunk_graph = ChunkGraph::build(&graph, &ModuleId::from("/index.js"), &[], &options).unwrap();
    (graph, chunk_graph)
  }

  fn deps(chunk: &Chunk) -> Vec<&str> {
    chunk.deps.iter().map(|path| &**path).collect()
  }

  /// index -> d, index ~> a, index ~> b, a -> c, a -> d, b -> c
  fn two_async_chunks() -> TestGraph {
    TestGraph::new()
      .module("/index.js", "")
      .module("/a.js", "")
      .module("/b.js", "")
      .module("/c.js", "")
      .module("/d.js", "")
      .edge("/index.js", "./d", "/d.js")
      .async_edge("/index.js", "./a", "/a.js")
      .async_edge("/index.js", "./b", "/b.js")
      .edge("/a.js", "./c", "/c.js")
      .edge("/a.js", "./d", "/d.js")
      .edge("/b.js", "./c", "/c.js")
  }

  #[test]
  fn shared_modules_move_into_the_entry_chunk() {
    let (graph, chunk_graph) = build(two_async_chunks(), true, None);
    let chunks = &chunk_graph.chunks;
    assert_eq!(chunks.len(), 3);
    assert_eq!(deps(&chunks[chunk_graph.entry_chunk]), ["/index.js", "/d.js", "/c.js"]);
    assert_eq!(deps(&chunks[ChunkIdx::from_usize(1)]), ["/a.js"]);
    assert_eq!(deps(&chunks[ChunkIdx::from_usize(2)]), ["/b.js"]);
    assert!(chunks[ChunkIdx::from_usize(1)].is_async);
    assert_eq!(
      chunks[ChunkIdx::from_usize(1)].required_chunks.iter().copied().collect::<Vec<_>>(),
      [chunk_graph.entry_chunk]
    );

    // Every reachable module is owned by exactly one chunk.
    let owned = chunks.iter().flat_map(|chunk| chunk.deps.iter()).collect::<Vec<_>>();
    let reachable = graph.reachable_from_entries();
    assert_eq!(owned.len(), reachable.len());
    assert!(reachable.iter().all(|path| owned.contains(&path)));
  }

  #[test]
  fn higher_threshold_keeps_shared_modules_in_async_chunks() {
    let (_, chunk_graph) = build(two_async_chunks(), true, Some(3));
    assert_eq!(deps(&chunk_graph.chunks[chunk_graph.entry_chunk]), ["/index.js", "/d.js"]);
    assert_eq!(deps(&chunk_graph.chunks[ChunkIdx::from_usize(1)]), ["/a.js", "/c.js"]);
    assert_eq!(deps(&chunk_graph.chunks[ChunkIdx::from_usize(2)]), ["/b.js", "/c.js"]);
    assert_eq!(chunk_graph.chunk_of("/c.js"), Some(ChunkIdx::from_usize(1)));
  }

  #[test]
  fn without_splitting_everything_is_one_chunk() {
    let (_, chunk_graph) = build(two_async_chunks(), false, None);
    assert_eq!(chunk_graph.chunks.len(), 1);
    assert_eq!(
      deps(&chunk_graph.chunks[chunk_graph.entry_chunk]),
      ["/index.js", "/d.js", "/a.js", "/c.js", "/b.js"]
    );
  }

  #[test]
  fn async_import_of_an_entry_module_makes_no_chunk() {
    let fixture = TestGraph::new()
      .module("/index.js", "")
      .module("/a.js", "")
      .edge("/index.js", "./a", "/a.js")
      .async_edge("/a.js", "./index", "/index.js");
    let (_, chunk_graph) = build(fixture, true, None);
    assert_eq!(chunk_graph.chunks.len(), 1);
  }
}
