use oxc_index::IndexVec;
use serde_json::{json, Map, Value};
use shakepack_common::{
  ChunkIdx, Module, ModuleGraph, ModuleId, ModuleOutput, ModuleOutputKind,
  NormalizedSerializerOptions, OutputMode,
};
use shakepack_error::{BuildResult, SerializeError};
use shakepack_sourcemap::{SourceJoiner, SourceMap, SourceMapSource};
use shakepack_utils::{
  base64::to_source_map_data_url,
  concat_string,
  rayon::{IntoParallelRefIterator, ParallelIterator},
  xxhash::xxhash_hex,
};
use tracing::debug;

use super::{chunk_graph::ChunkGraph, module_id_factory::ModuleIdFactory};

/// Everything chunk rendering reads. Rendering never mutates the graph, so chunks render
/// concurrently.
pub struct ChunkRenderContext<'a> {
  pub graph: &'a ModuleGraph,
  pub chunk_graph: &'a ChunkGraph,
  pub pre_modules: &'a [Module],
  pub ids: &'a ModuleIdFactory,
  pub options: &'a NormalizedSerializerOptions,
  pub entry: &'a ModuleId,
}

#[derive(Debug)]
pub struct RenderedChunk {
  pub code: String,
  pub map: Option<SourceMap>,
}

impl ChunkRenderContext<'_> {
  fn pre_module_outputs(&self, idx: ChunkIdx) -> impl Iterator<Item = &ModuleOutput> {
    let chunk = &self.chunk_graph.chunks[idx];
    self
      .pre_modules
      .iter()
      .filter(move |module| chunk.pre_modules.contains(&module.path))
      .filter_map(Module::js_output)
  }

  fn module(&self, path: &ModuleId) -> BuildResult<&Module> {
    self.graph.get(path).ok_or_else(|| {
      SerializeError::MissingModule { importer: self.entry.to_string(), target: path.to_string() }
        .into()
    })
  }

  fn module_id(&self, importer: &ModuleId, path: &ModuleId) -> BuildResult<u32> {
    self.ids.get(path).ok_or_else(|| {
      SerializeError::MissingModule { importer: importer.to_string(), target: path.to_string() }
        .into()
    })
  }

  /// Content hash of the chunk: module code plus the ids each define call registers and
  /// requires. Chunk urls in `paths` are left out, so filenames are known before any define
  /// call is rendered.
  pub fn content_hash(&self, idx: ChunkIdx) -> BuildResult<String> {
    let mut content = String::new();
    for output in self.pre_module_outputs(idx) {
      content.push_str(&output.code);
      content.push('\n');
    }
    for path in &self.chunk_graph.chunks[idx].deps {
      let module = self.module(path)?;
      let Some(output) = module.js_output() else { continue };
      content.push_str(&output.code);
      if output.kind == ModuleOutputKind::JsModule {
        let id = self.module_id(&module.path, &module.path)?;
        let dependency_ids = self.dependency_ids(module)?;
        content.push_str(&format!("\n{id}{}", json!(dependency_ids)));
      }
      content.push('\n');
    }
    Ok(xxhash_hex(content.as_bytes()))
  }

  fn dependency_ids(&self, module: &Module) -> BuildResult<Vec<u32>> {
    module.dependencies.values().map(|dep| self.module_id(&module.path, &dep.absolute_path)).collect()
  }

  pub fn filename(&self, hash: &str) -> String {
    match self.options.output_mode {
      OutputMode::Static => format!("_expo/static/js/{}/{hash}.js", self.options.platform),
      OutputMode::Classic => {
        let stem = self.entry.as_path().file_stem().and_then(|stem| stem.to_str()).unwrap_or("index");
        concat_string!(stem, ".bundle")
      }
    }
  }

  /// `id, dependencyMap[, "path"]` for the module's define call. The dependency map is an array
  /// of module ids in dependency order, or an object with a `paths` entry when some split point
  /// target lives in another chunk.
  fn define_params(
    &self,
    module: &Module,
    idx: ChunkIdx,
    filenames: &IndexVec<ChunkIdx, String>,
  ) -> BuildResult<String> {
    let id = self.module_id(&module.path, &module.path)?;
    let dependency_ids = self.dependency_ids(module)?;
    let mut paths = Map::new();
    for (dep, dependency_id) in module.dependencies.values().zip(&dependency_ids) {
      if !dep.data.async_type.is_split_point() {
        continue;
      }
      if let Some(owner) = self.chunk_graph.chunk_of(&dep.absolute_path) {
        if owner != idx && owner != self.chunk_graph.entry_chunk {
          let url = concat_string!("/", filenames[owner]);
          paths.insert(dependency_id.to_string(), Value::String(url));
        }
      }
    }

    let dependency_map = if paths.is_empty() {
      json!(dependency_ids)
    } else {
      let mut map = dependency_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (index.to_string(), json!(id)))
        .collect::<Map<_, _>>();
      map.insert("paths".to_string(), Value::Object(paths));
      Value::Object(map)
    };

    let mut params = vec![json!(id), dependency_map];
    if self.options.dev {
      params.push(json!(module.path.stabilize(&self.options.project_root)));
    }
    Ok(params.iter().map(Value::to_string).collect::<Vec<_>>().join(","))
  }

  /// Joins pre-modules, define calls and `__r` calls of one chunk, with the source map of the
  /// result when modules carry maps.
  pub fn render(
    &self,
    idx: ChunkIdx,
    filenames: &IndexVec<ChunkIdx, String>,
  ) -> BuildResult<RenderedChunk> {
    let chunk = &self.chunk_graph.chunks[idx];
    debug!(chunk = %chunk.name, modules = chunk.deps.len(), "render chunk");

    let modules = chunk
      .deps
      .par_iter()
      .map(|path| -> BuildResult<Option<(String, &ModuleOutput)>> {
        let module = self.module(path)?;
        let Some(output) = module.js_output() else { return Ok(None) };
        let code = if output.kind == ModuleOutputKind::JsModule {
          add_params_to_define_call(&output.code, &self.define_params(module, idx, filenames)?)
        } else {
          output.code.clone()
        };
        Ok(Some((code, output)))
      })
      .collect::<BuildResult<Vec<_>>>()?;

    let mut joiner = SourceJoiner::default();
    for output in self.pre_module_outputs(idx) {
      append_output(&mut joiner, &output.code, output);
    }
    for (code, output) in modules.iter().flatten() {
      append_output(&mut joiner, code, output);
    }

    if idx == self.chunk_graph.entry_chunk {
      for path in &self.options.run_before_main_module {
        let Some(id) = self.ids.get(path).filter(|_| chunk.has_module(path)) else { continue };
        joiner.append_source(format!("__r({id});"));
      }
      let entry_id = self.module_id(self.entry, self.entry)?;
      joiner.append_source(format!("__r({entry_id});"));
    }

    let (mut code, map) = joiner.join();
    if self.options.include_source_maps {
      if let Some(map) = &map {
        let url = if self.options.inline_source_map {
          to_source_map_data_url(&map.to_json_string())
        } else {
          source_map_url(&filenames[idx])
        };
        code.push_str("\n//# sourceMappingURL=");
        code.push_str(&url);
      }
    }
    Ok(RenderedChunk { code, map })
  }
}

fn append_output<'a>(joiner: &mut SourceJoiner<'a>, code: &'a str, output: &'a ModuleOutput) {
  match &output.map {
    Some(map) => joiner.append_source(
      SourceMapSource::new(code, map).with_pre_computed_lines_count(output.line_count - 1),
    ),
    None => joiner.append_source(code),
  }
}

fn source_map_url(filename: &str) -> String {
  let basename = filename.rsplit('/').next().unwrap_or(filename);
  concat_string!(basename, ".map")
}

/// Appends `params` to the arguments of the trailing `__d(...)` call.
pub fn add_params_to_define_call(code: &str, params: &str) -> String {
  let Some(index) = code.rfind(')') else { return code.to_string() };
  let (head, tail) = code.split_at(index);
  concat_string!(head, ",", params, tail)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn params_go_before_the_closing_paren() {
    assert_eq!(
      add_params_to_define_call("__d(function () {\n  a();\n});", "3,[1,2]"),
      "__d(function () {\n  a();\n},3,[1,2]);"
    );
    assert_eq!(add_params_to_define_call("no call", "1"), "no call");
  }

  #[test]
  fn map_urls_are_relative_to_the_chunk() {
    assert_eq!(source_map_url("_expo/static/js/web/abc.js"), "abc.js.map");
    assert_eq!(source_map_url("index.bundle"), "index.bundle.map");
  }
}
