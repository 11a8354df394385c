use oxc_sourcemap::SourceMap;

use crate::lines_count;

pub trait Source {
  fn content(&self) -> &str;

  fn sourcemap(&self) -> Option<&SourceMap> {
    None
  }

  fn lines_count(&self) -> u32 {
    lines_count(self.content())
  }
}

impl Source for &str {
  fn content(&self) -> &str {
    self
  }
}

impl Source for String {
  fn content(&self) -> &str {
    self
  }
}

/// Generated code together with its map. The line count is usually known from codegen already.
#[derive(Debug)]
pub struct SourceMapSource<'a> {
  content: &'a str,
  sourcemap: &'a SourceMap,
  pre_computed_lines_count: Option<u32>,
}

impl<'a> SourceMapSource<'a> {
  pub fn new(content: &'a str, sourcemap: &'a SourceMap) -> Self {
    Self { content, sourcemap, pre_computed_lines_count: None }
  }

  #[must_use]
  pub fn with_pre_computed_lines_count(mut self, lines: u32) -> Self {
    self.pre_computed_lines_count = Some(lines);
    self
  }
}

impl Source for SourceMapSource<'_> {
  fn content(&self) -> &str {
    self.content
  }

  fn sourcemap(&self) -> Option<&SourceMap> {
    Some(self.sourcemap)
  }

  fn lines_count(&self) -> u32 {
    self.pre_computed_lines_count.unwrap_or_else(|| lines_count(self.content))
  }
}
