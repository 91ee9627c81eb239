//! Codepoint addressing over UTF-8 `str` slices.
//!
//! Columns everywhere in the-lib count Unicode scalar values, not bytes and
//! not grapheme clusters. These helpers translate between the two without
//! ever producing an offset that falls inside a multi-byte sequence.

/// Returns the byte offset of the `column`-th codepoint of `text`.
///
/// Columns past the end of `text` clamp to `text.len()`. Callers that need
/// strict bounds checking compare against [`codepoint_len`] themselves.
#[inline]
pub fn byte_offset_for_column(text: &str, column: usize) -> usize {
  text
    .char_indices()
    .nth(column)
    .map_or(text.len(), |(offset, _)| offset)
}

/// Number of codepoints in `text`.
#[inline]
pub fn codepoint_len(text: &str) -> usize {
  text.chars().count()
}

/// Advance over at most `count` codepoints of `text` starting at byte
/// `from`.
///
/// Returns how many codepoints were consumed together with the byte offset
/// where consumption stopped. `from` must lie on a char boundary; values past
/// the end are treated as the end.
pub fn consume_codepoints(text: &str, from: usize, count: usize) -> (usize, usize) {
  let from = from.min(text.len());
  debug_assert!(text.is_char_boundary(from));

  let mut consumed = 0;
  let mut end = from;
  for ch in text[from..].chars() {
    if consumed == count {
      break;
    }
    consumed += 1;
    end += ch.len_utf8();
  }
  (consumed, end)
}
