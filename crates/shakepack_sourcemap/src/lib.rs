mod lines_count;
mod source;
mod source_joiner;

pub use crate::lines_count::lines_count;
pub use crate::source::{Source, SourceMapSource};
pub use crate::source_joiner::SourceJoiner;
pub use oxc_sourcemap::{ConcatSourceMapBuilder, JSONSourceMap, SourceMap, SourceMapBuilder};
