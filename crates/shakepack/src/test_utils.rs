use std::sync::Arc;

use shakepack_common::{
  AsyncType, Dependency, DependencyData, ExportNames, Module, ModuleGraph, ModuleId,
  SerializerOptions, TransformOptions,
};

use crate::{stages::SerializerInput, utils::normalize_options::normalize_options};

/// Graph fixtures. The first module added is the entry point.
#[derive(Default)]
pub struct TestGraph {
  graph: ModuleGraph,
  entry: Option<ModuleId>,
}

impl TestGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn module(mut self, path: &str, source: &str) -> Self {
    self.graph.add_module(Module::from_source(path, source.to_string()).unwrap());
    if self.entry.is_none() {
      self.entry = Some(ModuleId::from(path));
      self.graph.add_entry_point(path);
    }
    self
  }

  pub fn edge(self, from: &str, specifier: &str, to: &str) -> Self {
    self.edge_with(from, specifier, to, AsyncType::None)
  }

  pub fn async_edge(self, from: &str, specifier: &str, to: &str) -> Self {
    self.edge_with(from, specifier, to, AsyncType::Async)
  }

  pub fn edge_with(mut self, from: &str, specifier: &str, to: &str, async_type: AsyncType) -> Self {
    let mut data = DependencyData::new(specifier, async_type);
    data.export_names = ExportNames::all();
    self.graph.connect(&ModuleId::from(from), Dependency::new(to, data)).unwrap();
    self
  }

  pub fn graph(self) -> ModuleGraph {
    self.graph
  }

  pub fn input(self, options: SerializerOptions, transform: &TransformOptions) -> SerializerInput {
    SerializerInput {
      entry_point: self.entry.unwrap(),
      pre_modules: vec![],
      graph: self.graph,
      options: Arc::new(normalize_options(options, transform)),
      warnings: vec![],
    }
  }
}
