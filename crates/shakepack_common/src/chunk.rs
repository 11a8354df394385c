use shakepack_utils::indexmap::FxIndexSet;

use crate::ModuleId;

oxc_index::define_index_type! {
  pub struct ChunkIdx = u32;
}

#[derive(Debug)]
pub struct Chunk {
  pub name: String,
  /// Modules the chunk starts from. Only the entry chunk has more than one kind of root.
  pub entries: FxIndexSet<ModuleId>,
  /// Modules serialized into this chunk, in registration order.
  pub deps: FxIndexSet<ModuleId>,
  /// Scripts run before any module, only set on the entry chunk.
  pub pre_modules: Vec<ModuleId>,
  /// Chunks that must be loaded before this one can run.
  pub required_chunks: FxIndexSet<ChunkIdx>,
  pub is_async: bool,
}

impl Chunk {
  pub fn new(name: impl Into<String>, entries: FxIndexSet<ModuleId>, is_async: bool) -> Self {
    Self {
      name: name.into(),
      entries,
      deps: FxIndexSet::default(),
      pre_modules: Vec::new(),
      required_chunks: FxIndexSet::default(),
      is_async,
    }
  }

  pub fn has_module(&self, path: &str) -> bool {
    self.deps.contains(path)
  }
}
