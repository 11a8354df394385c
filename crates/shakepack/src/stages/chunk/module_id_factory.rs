use rustc_hash::FxHashMap;
use shakepack_common::{ModuleGraph, ModuleId};

/// Numeric ids the runtime registers module factories under.
#[derive(Debug, Default)]
pub struct ModuleIdFactory {
  ids: FxHashMap<ModuleId, u32>,
  next: u32,
}

impl ModuleIdFactory {
  /// Ids follow graph order, so the same graph always gets the same ids.
  pub fn from_graph(graph: &ModuleGraph) -> Self {
    let mut factory = Self::default();
    for path in graph.dependencies.keys() {
      factory.get_or_create(path);
    }
    factory
  }

  pub fn get_or_create(&mut self, path: &ModuleId) -> u32 {
    if let Some(id) = self.ids.get(path) {
      return *id;
    }
    let id = self.next;
    self.next += 1;
    self.ids.insert(path.clone(), id);
    id
  }

  pub fn get(&self, path: &str) -> Option<u32> {
    self.ids.get(path).copied()
  }
}

#[test]
fn test_ids_follow_graph_order() {
  use shakepack_common::{Module, ModuleType};

  let mut graph = ModuleGraph::default();
  for path in ["/index.js", "/b.js", "/a.js"] {
    graph.add_module(Module::new(path, ModuleType::Js, None));
  }
  let mut factory = ModuleIdFactory::from_graph(&graph);
  assert_eq!(factory.get("/index.js"), Some(0));
  assert_eq!(factory.get("/a.js"), Some(2));
  assert_eq!(factory.get_or_create(&ModuleId::from("/b.js")), 1);
  assert_eq!(factory.get_or_create(&ModuleId::from("/late.js")), 3);
  assert_eq!(factory.get("/missing.js"), None);
}
