//! Content region extraction.
//!
//! Given a start position and a codepoint length, computes the byte
//! boundaries the span covers, possibly across several lines. Every line
//! boundary crossed consumes one virtual codepoint for its newline. Edits
//! use the boundaries to splice lines, queries use the optional materialized
//! text.

use the_core::utf8;
use thiserror::Error;

use crate::{
  line::LineStore,
  position::Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionError {
  /// The bytes copied while materializing disagree with the byte accounting.
  #[error("invalid content position: expected {expected} bytes, copied {actual}")]
  InvalidContentPos { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, RegionError>;

/// How far a region extends from its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
  /// Exactly this many codepoints, newlines included, or up to the end of
  /// the document.
  Codepoints(usize),
  /// The rest of the start line, without crossing its newline.
  ToLineEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
  /// Start position, column clamped to the line length.
  pub start:      Position,
  /// Byte offset of `start` within the first line: `before_content` is
  /// `first_line[..start_byte]`.
  pub start_byte: usize,
  /// Last line touched by the span.
  pub end_line:   usize,
  /// `after_content` is `lines[end_line][end_byte..]`.
  pub end_byte:   usize,
  /// Number of lines touched; zero when nothing was spanned.
  pub line_count: usize,
  /// Codepoints actually spanned. Less than requested at document end.
  pub consumed:   usize,
  /// The spanned text with `\n` between lines, when materialized.
  pub content:    Option<String>,
}

impl Region {
  fn empty(start: Position, materialize: bool) -> Self {
    Self {
      start,
      start_byte: 0,
      end_line: start.line,
      end_byte: 0,
      line_count: 0,
      consumed: 0,
      content: materialize.then(String::new),
    }
  }

  /// Walks `span` forward from `start`.
  ///
  /// A start line past the end of the document is not an error: the region
  /// is simply empty. With `Span::Codepoints(0)` the region is a pure split
  /// point (`line_count == 0`) and only `before`/`after` are meaningful.
  pub fn compute(lines: &LineStore, start: Position, span: Span, materialize: bool) -> Result<Self> {
    let Ok(first) = lines.line(start.line) else {
      return Ok(Self::empty(start, materialize));
    };

    let start_byte = first.byte_offset(start.col);
    let start = Position::new(start.line, utf8::codepoint_len(&first.as_str()[..start_byte]));
    let requested = match span {
      Span::Codepoints(count) => count,
      Span::ToLineEnd => usize::MAX,
    };

    let mut content = materialize.then(String::new);
    let mut expected_bytes = 0;
    let mut consumed = 0;
    let mut line = start.line;
    let mut byte = start_byte;

    loop {
      let text = lines.get(line).unwrap_or_default();
      let (count, end) = utf8::consume_codepoints(text, byte, requested - consumed);
      consumed += count;
      expected_bytes += end - byte;
      if let Some(buf) = content.as_mut() {
        buf.push_str(&text[byte..end]);
      }
      byte = end;

      let exhausted = line + 1 >= lines.len();
      if consumed == requested || span == Span::ToLineEnd || exhausted {
        break;
      }

      // Crossing into the next line consumes its newline.
      consumed += 1;
      expected_bytes += 1;
      if let Some(buf) = content.as_mut() {
        buf.push('\n');
      }
      line += 1;
      byte = 0;
    }

    if let Some(buf) = &content
      && buf.len() != expected_bytes
    {
      return Err(RegionError::InvalidContentPos {
        expected: expected_bytes,
        actual:   buf.len(),
      });
    }

    let line_count = if consumed == 0 {
      0
    } else {
      line - start.line + 1
    };

    Ok(Self {
      start,
      start_byte,
      end_line: line,
      end_byte: byte,
      line_count,
      consumed,
      content,
    })
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.line_count == 0
  }

  /// Text of the first line before the start.
  pub fn before<'a>(&self, lines: &'a LineStore) -> &'a str {
    lines
      .get(self.start.line)
      .map_or("", |line| &line[..self.start_byte])
  }

  /// Text of the last touched line after the end.
  pub fn after<'a>(&self, lines: &'a LineStore) -> &'a str {
    lines
      .get(self.end_line)
      .map_or("", |line| &line[self.end_byte..])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "hello world\nsecond line\n\nolá mundo -- em português";

  fn region(text: &str, line: usize, col: usize, span: Span) -> Region {
    let lines = LineStore::from_text(text);
    Region::compute(&lines, Position::new(line, col), span, true).unwrap()
  }

  #[test]
  fn spanning_the_newline_touches_two_lines() {
    let r = region(SAMPLE, 0, 0, Span::Codepoints(12));
    assert_eq!(r.content.as_deref(), Some("hello world\n"));
    assert_eq!(r.line_count, 2);
    assert_eq!(r.end_line, 1);
    assert_eq!(r.end_byte, 0);
  }

  #[test]
  fn multibyte_span_within_a_line() {
    let r = region(SAMPLE, 3, 4, Span::Codepoints(5));
    assert_eq!(r.content.as_deref(), Some("mundo"));
    assert_eq!(r.line_count, 1);
    assert_eq!(r.start_byte, 5);
  }

  #[test]
  fn split_point_has_no_lines() {
    let lines = LineStore::from_text(SAMPLE);
    let r = Region::compute(&lines, Position::new(3, 3), Span::Codepoints(0), false).unwrap();
    assert!(r.is_empty());
    assert_eq!(r.content, None);
    assert_eq!(r.before(&lines), "olá");
    assert_eq!(r.after(&lines), " mundo -- em português");
  }

  #[test]
  fn span_past_document_end_stops_at_the_end() {
    let r = region(SAMPLE, 2, 0, Span::Codepoints(1_000));
    assert_eq!(r.content.as_deref(), Some("\nolá mundo -- em português"));
    assert_eq!(r.consumed, 26);
    assert_eq!(r.line_count, 2);
  }

  #[test]
  fn span_at_true_end_is_empty() {
    let r = region("ab\ncd", 1, 2, Span::Codepoints(3));
    assert_eq!(r.line_count, 0);
    assert_eq!(r.content.as_deref(), Some(""));
  }

  #[test]
  fn line_past_end_is_empty() {
    let r = region("ab", 5, 0, Span::Codepoints(3));
    assert!(r.is_empty());
    assert_eq!(r.content.as_deref(), Some(""));
  }

  #[test]
  fn to_line_end_does_not_cross_newline() {
    let r = region(SAMPLE, 1, 7, Span::ToLineEnd);
    assert_eq!(r.content.as_deref(), Some("line"));
    assert_eq!(r.line_count, 1);
    assert_eq!(r.end_line, 1);
  }

  #[test]
  fn column_past_line_end_is_clamped() {
    let r = region("abc\ndef", 0, 10, Span::Codepoints(2));
    assert_eq!(r.start, Position::new(0, 3));
    assert_eq!(r.content.as_deref(), Some("\nd"));
  }
}
