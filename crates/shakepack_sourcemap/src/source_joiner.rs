use oxc_sourcemap::{ConcatSourceMapBuilder, SourceMap};

use crate::Source;

/// Concatenates sources with `\n` and, when any of them carries a map, the maps with matching line offsets.
#[derive(Default)]
pub struct SourceJoiner<'source> {
  inner: Vec<Box<dyn Source + Send + 'source>>,
  prepend_source: Vec<Box<dyn Source + Send + 'source>>,
  enable_sourcemap: bool,
}

impl<'source> SourceJoiner<'source> {
  pub fn append_source<T: Source + Send + 'source>(&mut self, source: T) {
    self.enable_sourcemap |= source.sourcemap().is_some();
    self.inner.push(Box::new(source));
  }

  pub fn prepend_source<T: Source + Send + 'source>(&mut self, source: T) {
    self.enable_sourcemap |= source.sourcemap().is_some();
    self.prepend_source.push(Box::new(source));
  }

  pub fn is_empty(&self) -> bool {
    self.inner.is_empty() && self.prepend_source.is_empty()
  }

  pub fn join(&self) -> (String, Option<SourceMap>) {
    let sources_len = self.prepend_source.len() + self.inner.len();
    if sources_len == 0 {
      return (String::new(), None);
    }
    let sources_iter = self.prepend_source.iter().rev().chain(self.inner.iter()).enumerate();

    let size_hint = sources_iter.clone().map(|(_, source)| source.content().len()).sum::<usize>()
      + (sources_len - 1);
    let mut ret_source = String::with_capacity(size_hint);
    let mut sourcemap_builder = self.enable_sourcemap.then(ConcatSourceMapBuilder::default);
    let mut line_offset = 0;

    for (index, source) in sources_iter {
      if let (Some(builder), Some(map)) = (sourcemap_builder.as_mut(), source.sourcemap()) {
        builder.add_sourcemap(map, line_offset);
      }
      ret_source.push_str(source.content());
      line_offset += source.lines_count();
      if index < sources_len - 1 {
        ret_source.push('\n');
        line_offset += 1;
      }
    }

    (ret_source, sourcemap_builder.map(ConcatSourceMapBuilder::into_sourcemap))
  }
}
