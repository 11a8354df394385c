use thiserror::Error;

/// Fatal conditions of the serializer. Any of these aborts the whole request.
#[derive(Debug, Error)]
pub enum SerializeError {
  #[error(
    "{module}:{line}:{column}: {kind} argument cannot be statically resolved to a string literal"
  )]
  UnresolvableDependency { module: String, kind: &'static str, line: u32, column: u32 },

  #[error("{module}: dependency `{key}` is not present in the module's dependency map")]
  MissingDependency { module: String, key: String },

  #[error("{importer}: dependency target `{target}` is missing from the graph")]
  MissingModule { importer: String, target: String },

  #[error("circular `export *` chain cannot be resolved: {}", chain.join(" -> "))]
  CircularReexport { chain: Vec<String> },

  #[error("{module}: failed to parse: {message}")]
  Parse { module: String, message: String },

  #[error("{module}: failed to generate code: {message}")]
  Codegen { module: String, message: String },
}

impl SerializeError {
  pub fn is_graph_inconsistency(&self) -> bool {
    matches!(self, Self::MissingDependency { .. } | Self::MissingModule { .. })
  }
}

#[test]
fn test_circular_reexport_message() {
  let err = SerializeError::CircularReexport {
    chain: vec!["/a.js".to_string(), "/b.js".to_string(), "/a.js".to_string()],
  };
  assert_eq!(err.to_string(), "circular `export *` chain cannot be resolved: /a.js -> /b.js -> /a.js");
}
