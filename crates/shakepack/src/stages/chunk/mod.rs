mod chunk_graph;
mod module_id_factory;
mod render_chunk;

use std::collections::BTreeMap;

use futures::future::try_join_all;
use oxc_index::IndexVec;
use serde::Serialize;
use shakepack_common::{
  ArtifactMetadata, ArtifactType, Chunk, ChunkIdx, CssOutput, ModuleGraph,
  NormalizedSerializerOptions, OutputArtifact, OutputMode,
};
use shakepack_error::BuildResult;
use shakepack_utils::{indexmap::FxIndexSet, xxhash::xxhash_hex};
use tracing::debug;

use self::{
  chunk_graph::ChunkGraph,
  module_id_factory::ModuleIdFactory,
  render_chunk::{ChunkRenderContext, RenderedChunk},
};
use super::SerializerInput;

#[derive(Debug, Default)]
pub struct SerializerOutput {
  pub artifacts: Vec<OutputArtifact>,
  pub warnings: Vec<anyhow::Error>,
}

/// Lists what a client has to load for the entry and for each async chunk.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetManifest {
  entry: String,
  async_chunks: Vec<String>,
  required_chunks: BTreeMap<String, Vec<String>>,
  css: Vec<String>,
}

/// Partitions the reconciled graph into chunks and renders every chunk into artifacts.
pub struct ChunkSerializer;

impl ChunkSerializer {
  pub async fn serialize(&self, input: SerializerInput) -> BuildResult<SerializerOutput> {
    let SerializerInput { entry_point, pre_modules, graph, options, warnings } = input;

    let (chunk_graph, ids) = {
      let _span = tracing::debug_span!("chunk_graph").entered();
      let chunk_graph = ChunkGraph::build(&graph, &entry_point, &pre_modules, &options)?;
      (chunk_graph, ModuleIdFactory::from_graph(&graph))
    };

    let ctx = ChunkRenderContext {
      graph: &graph,
      chunk_graph: &chunk_graph,
      pre_modules: &pre_modules,
      ids: &ids,
      options: &options,
      entry: &entry_point,
    };

    let filenames = chunk_graph
      .chunks
      .indices()
      .map(|idx| ctx.content_hash(idx).map(|hash| ctx.filename(&hash)))
      .collect::<BuildResult<IndexVec<ChunkIdx, String>>>()?;

    let tasks = chunk_graph.chunks.indices().map(|idx| {
      let (ctx, filenames) = (&ctx, &filenames);
      async move { ctx.render(idx, filenames) }
    });
    let rendered = try_join_all(tasks).await?;

    let mut artifacts = Vec::new();
    let mut manifest = AssetManifest {
      entry: filenames[chunk_graph.entry_chunk].clone(),
      async_chunks: Vec::new(),
      required_chunks: BTreeMap::new(),
      css: Vec::new(),
    };

    for ((idx, chunk), rendered) in chunk_graph.chunks.iter_enumerated().zip(rendered) {
      let filename = &filenames[idx];
      let origin_filename = chunk
        .entries
        .first()
        .map(|path| path.stabilize(&options.project_root))
        .unwrap_or_default();
      let requires =
        chunk.required_chunks.iter().map(|required| filenames[*required].clone()).collect::<Vec<_>>();
      let metadata = ArtifactMetadata {
        is_async: chunk.is_async,
        requires: requires.clone(),
        paths: chunk.deps.iter().map(|path| path.stabilize(&options.project_root)).collect(),
      };

      if chunk.is_async {
        manifest.async_chunks.push(filename.clone());
      }
      if !requires.is_empty() {
        manifest.required_chunks.insert(filename.clone(), requires);
      }

      let RenderedChunk { code, map } = rendered;
      artifacts.push(OutputArtifact {
        filename: filename.clone(),
        origin_filename: origin_filename.clone(),
        kind: ArtifactType::Js,
        source: code,
        metadata,
      });
      // Inlined maps are already part of the code.
      if let Some(map) = map.filter(|_| options.include_source_maps && !options.inline_source_map) {
        artifacts.push(OutputArtifact {
          filename: format!("{filename}.map"),
          origin_filename: origin_filename.clone(),
          kind: ArtifactType::Map,
          source: map.to_json_string(),
          metadata: ArtifactMetadata { is_async: chunk.is_async, ..ArtifactMetadata::default() },
        });
      }

      for artifact in css_artifacts(&graph, chunk, &origin_filename, &options) {
        if artifact.kind == ArtifactType::Css {
          manifest.css.push(artifact.filename.clone());
        }
        artifacts.push(artifact);
      }
    }

    if options.output_mode == OutputMode::Static {
      artifacts.push(OutputArtifact {
        filename: format!("_expo/static/js/{}/manifest.json", options.platform),
        origin_filename: entry_point.stabilize(&options.project_root),
        kind: ArtifactType::Json,
        source: serde_json::to_string_pretty(&manifest).map_err(anyhow::Error::from)?,
        metadata: ArtifactMetadata::default(),
      });
    }

    debug!(chunks = chunk_graph.chunks.len(), artifacts = artifacts.len(), "chunks serialized");
    Ok(SerializerOutput { artifacts, warnings })
  }
}

/// The chunk's stylesheets concatenated in module order, plus one artifact per external
/// `@import` URL.
fn css_artifacts(
  graph: &ModuleGraph,
  chunk: &Chunk,
  origin_filename: &str,
  options: &NormalizedSerializerOptions,
) -> Vec<OutputArtifact> {
  let mut paths = Vec::new();
  let mut code = String::new();
  let mut external = FxIndexSet::default();

  for path in &chunk.deps {
    let Some(module) = graph.get(path) else { continue };
    let css: Option<&CssOutput> =
      module.js_output().and_then(|output| output.css.as_ref()).or(module.css.as_ref());
    let Some(css) = css else { continue };
    external.extend(css.external_imports.iter().cloned());
    if css.code.is_empty() {
      continue;
    }
    if !code.is_empty() {
      code.push('\n');
    }
    code.push_str(&css.code);
    paths.push(path.stabilize(&options.project_root));
  }

  let mut artifacts = Vec::new();
  if !code.is_empty() {
    artifacts.push(OutputArtifact {
      filename: format!("_expo/static/css/{}.css", xxhash_hex(code.as_bytes())),
      origin_filename: origin_filename.to_string(),
      kind: ArtifactType::Css,
      source: code,
      metadata: ArtifactMetadata { is_async: chunk.is_async, requires: Vec::new(), paths },
    });
  }
  artifacts.extend(external.into_iter().map(|url| OutputArtifact {
    filename: url,
    origin_filename: origin_filename.to_string(),
    kind: ArtifactType::CssExternal,
    source: String::new(),
    metadata: ArtifactMetadata { is_async: chunk.is_async, ..ArtifactMetadata::default() },
  }));
  artifacts
}
