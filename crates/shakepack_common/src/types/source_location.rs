use serde::Serialize;

/// 1-based line, 0-based column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
  pub line: u32,
  pub column: u32,
}

impl Position {
  pub fn from_offset(source: &str, offset: u32) -> Self {
    let offset = (offset as usize).min(source.len());
    let before = &source.as_bytes()[..offset];
    let line_start = before.iter().rposition(|b| *b == b'\n').map_or(0, |idx| idx + 1);
    let line = before.iter().filter(|b| **b == b'\n').count() + 1;
    let column = source.get(line_start..offset).map_or(offset - line_start, |s| s.chars().count());
    Self {
      line: u32::try_from(line).unwrap_or(u32::MAX),
      column: u32::try_from(column).unwrap_or(u32::MAX),
    }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
  pub start: Position,
  pub end: Position,
}

impl SourceLocation {
  pub fn from_span(source: &str, start: u32, end: u32) -> Self {
    Self { start: Position::from_offset(source, start), end: Position::from_offset(source, end) }
  }
}

#[test]
fn test_position_from_offset() {
  let source = "a\nbc\nd";
  assert_eq!(Position::from_offset(source, 0), Position { line: 1, column: 0 });
  assert_eq!(Position::from_offset(source, 3), Position { line: 2, column: 1 });
  assert_eq!(Position::from_offset(source, 5), Position { line: 3, column: 0 });
}
