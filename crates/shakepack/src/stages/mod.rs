pub mod chunk;
pub mod environment;
pub mod reconcile;
pub mod tree_shake;

use std::sync::Arc;

use shakepack_common::{Module, ModuleGraph, ModuleId, NormalizedSerializerOptions};
use shakepack_error::BuildResult;

/// What flows from one serializer stage to the next.
pub struct SerializerInput {
  pub entry_point: ModuleId,
  /// Scripts that run before any module, in order.
  pub pre_modules: Vec<Module>,
  pub graph: ModuleGraph,
  pub options: Arc<NormalizedSerializerOptions>,
  pub warnings: Vec<anyhow::Error>,
}

/// One step of the module-level pipeline. Stages run in order and each hands its result to the
/// next; the first error stops the request.
pub trait SerializerStage: Send + Sync {
  fn name(&self) -> &'static str;

  fn run(&self, input: SerializerInput) -> BuildResult<SerializerInput>;
}
