//! Codepoint-addressed line storage.
//!
//! A document is an ordered sequence of [`Line`]s, each owning its UTF-8 text
//! without the trailing newline. Newlines are structural: they only exist
//! between lines. The store is never empty; an empty document is a single
//! empty line.

use std::ops::RangeInclusive;

use the_core::utf8;
use thiserror::Error;

use crate::{
  highlight::{
    Token,
    Tokens,
  },
  position::Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("line {index} is out of bounds (line count: {len})")]
pub struct LineOutOfBounds {
  pub index: usize,
  pub len:   usize,
}

pub type Result<T> = std::result::Result<T, LineOutOfBounds>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Line {
  content: String,
  tokens:  Tokens,
}

impl Line {
  pub fn new(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      tokens:  Tokens::new(),
    }
  }

  #[inline]
  pub fn as_str(&self) -> &str {
    &self.content
  }

  #[inline]
  pub fn len_bytes(&self) -> usize {
    self.content.len()
  }

  #[inline]
  pub fn len_codepoints(&self) -> usize {
    utf8::codepoint_len(&self.content)
  }

  /// Byte offset of `column`, clamped to the end of the line.
  #[inline]
  pub fn byte_offset(&self, column: usize) -> usize {
    utf8::byte_offset_for_column(&self.content, column)
  }

  /// Cached highlight tokens. Only meaningful below the highlight watermark.
  pub fn tokens(&self) -> &[Token] {
    &self.tokens
  }

  pub fn set_tokens(&mut self, tokens: Tokens) {
    self.tokens = tokens;
  }

  pub fn clear_tokens(&mut self) {
    self.tokens.clear();
  }
}

impl From<&str> for Line {
  fn from(value: &str) -> Self {
    Line::new(value)
  }
}

impl From<String> for Line {
  fn from(value: String) -> Self {
    Line::new(value)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStore {
  lines: Vec<Line>,
}

impl Default for LineStore {
  fn default() -> Self {
    Self::new()
  }
}

impl LineStore {
  /// A store holding a single empty line.
  pub fn new() -> Self {
    Self {
      lines: vec![Line::default()],
    }
  }

  /// Splits `text` on `\n`, one line per piece. A trailing `\n` yields a
  /// trailing empty line.
  pub fn from_text(text: &str) -> Self {
    Self {
      lines: text.split('\n').map(Line::from).collect(),
    }
  }

  /// Number of lines, always at least one.
  #[inline]
  pub fn len(&self) -> usize {
    self.lines.len()
  }

  /// A store always holds at least one line, so this only reports whether
  /// that single line has no content.
  pub fn is_empty(&self) -> bool {
    self.lines.len() == 1 && self.lines[0].content.is_empty()
  }

  #[inline]
  pub fn last_index(&self) -> usize {
    self.lines.len() - 1
  }

  /// The position just past the last codepoint of the document.
  pub fn end_position(&self) -> Position {
    let last = self.last_index();
    Position::new(last, self.lines[last].len_codepoints())
  }

  fn out_of_bounds(&self, index: usize) -> LineOutOfBounds {
    LineOutOfBounds {
      index,
      len: self.lines.len(),
    }
  }

  pub fn line(&self, index: usize) -> Result<&Line> {
    self.lines.get(index).ok_or_else(|| self.out_of_bounds(index))
  }

  pub(crate) fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
    self.lines.get_mut(index)
  }

  /// Content of line `index`, without its newline.
  pub fn get(&self, index: usize) -> Result<&str> {
    self.line(index).map(Line::as_str)
  }

  /// Codepoint length of line `index`.
  pub fn line_len(&self, index: usize) -> Result<usize> {
    self.line(index).map(Line::len_codepoints)
  }

  /// Byte offset of `column` within line `index`, clamped at the line end.
  pub fn byte_offset_for_column(&self, index: usize, column: usize) -> Result<usize> {
    self.line(index).map(|line| line.byte_offset(column))
  }

  pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Line> + ExactSizeIterator {
    self.lines.iter()
  }

  /// Replaces line `index` with `contents`.
  ///
  /// The first piece overwrites the existing line in place (keeping its stale
  /// tokens, which the highlight watermark already marks invalid), the rest
  /// are spliced in right after it.
  pub(crate) fn replace_line(&mut self, index: usize, contents: Vec<String>) -> Result<()> {
    if index >= self.lines.len() {
      return Err(self.out_of_bounds(index));
    }

    let mut contents = contents.into_iter();
    if let Some(first) = contents.next() {
      self.lines[index].content = first;
    }
    self
      .lines
      .splice(index + 1..index + 1, contents.map(Line::from));
    Ok(())
  }

  /// Joins the lines in `range` into the first one: keeps the first line up
  /// to `head_bytes`, appends the last line from `tail_bytes` on and drops
  /// everything in between.
  pub(crate) fn merge(
    &mut self,
    range: RangeInclusive<usize>,
    head_bytes: usize,
    tail_bytes: usize,
  ) -> Result<()> {
    let (first, last) = (*range.start(), *range.end());
    if last >= self.lines.len() {
      return Err(self.out_of_bounds(last));
    }
    debug_assert!(first <= last);

    let tail = self.lines[last].content[tail_bytes..].to_owned();
    let head = &mut self.lines[first].content;
    head.truncate(head_bytes);
    head.push_str(&tail);

    if last > first {
      self.lines.drain(first + 1..=last);
    }
    Ok(())
  }

  /// Every line followed by `\n`.
  pub fn to_content(&self) -> String {
    let len = self.lines.iter().map(|line| line.len_bytes() + 1).sum();
    let mut content = String::with_capacity(len);
    for line in &self.lines {
      content.push_str(&line.content);
      content.push('\n');
    }
    content
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_store_has_one_line() {
    let store = LineStore::new();
    assert_eq!(store.len(), 1);
    assert!(store.is_empty());
    assert_eq!(store.get(0).unwrap(), "");
    assert_eq!(store.end_position(), Position::zero());
  }

  #[test]
  fn from_text_splits_on_newlines() {
    let store = LineStore::from_text("hello world\nsecond line\n\nolá mundo");
    assert_eq!(store.len(), 4);
    assert_eq!(store.get(2).unwrap(), "");
    assert_eq!(store.line_len(3).unwrap(), 9);
    assert_eq!(store.end_position(), Position::new(3, 9));

    let store = LineStore::from_text("a\n");
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn get_out_of_bounds_errors() {
    let store = LineStore::from_text("a\nb");
    assert_eq!(store.get(2), Err(LineOutOfBounds { index: 2, len: 2 }));
  }

  #[test]
  fn byte_offsets_clamp_at_line_end() {
    let store = LineStore::from_text("olá");
    assert_eq!(store.byte_offset_for_column(0, 3).unwrap(), 4);
    assert_eq!(store.byte_offset_for_column(0, 99).unwrap(), 4);
    assert!(store.byte_offset_for_column(1, 0).is_err());
  }

  #[test]
  fn replace_line_splices_new_lines() {
    let mut store = LineStore::from_text("a\nb\nc");
    store
      .replace_line(1, vec!["x".into(), "y".into(), "z".into()])
      .unwrap();
    assert_eq!(store.to_content(), "a\nx\ny\nz\nc\n");
  }

  #[test]
  fn merge_drops_inner_lines() {
    let mut store = LineStore::from_text("hello\nmiddle\nworld");
    store.merge(0..=2, 2, 3).unwrap();
    assert_eq!(store.to_content(), "held\n");
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn merge_within_one_line() {
    let mut store = LineStore::from_text("hello");
    store.merge(0..=0, 1, 4).unwrap();
    assert_eq!(store.get(0).unwrap(), "ho");
  }
}
