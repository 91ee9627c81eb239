use std::fmt;

/// A single point in a document.
///
/// 0-indexed. `col` counts codepoints within the line, so `col == line_len`
/// addresses the end of the line (valid for insertion).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
  pub line: usize,
  pub col:  usize,
}

impl Position {
  pub const fn new(line: usize, col: usize) -> Self {
    Self { line, col }
  }

  pub const fn zero() -> Self {
    Self { line: 0, col: 0 }
  }

  pub const fn is_zero(&self) -> bool {
    self.line == 0 && self.col == 0
  }

  /// Position reached after typing `text` starting at `self`.
  pub fn traverse(self, text: impl AsRef<str>) -> Self {
    let Self { mut line, mut col } = self;
    for ch in text.as_ref().chars() {
      if ch == '\n' {
        line += 1;
        col = 0;
      } else {
        col += 1;
      }
    }
    Self { line, col }
  }
}

impl From<(usize, usize)> for Position {
  fn from(value: (usize, usize)) -> Self {
    Position::new(value.0, value.1)
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.col)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordering_is_line_then_column() {
    assert!(Position::new(0, 9) < Position::new(1, 0));
    assert!(Position::new(2, 1) < Position::new(2, 3));
    assert_eq!(Position::new(1, 1), (1, 1).into());
  }

  #[test]
  fn traverse_counts_codepoints_and_newlines() {
    assert_eq!(Position::zero().traverse("olá"), Position::new(0, 3));
    assert_eq!(Position::new(0, 5).traverse("hello\nyo\nyo\n"), Position::new(3, 0));
    assert_eq!(Position::new(2, 2).traverse(""), Position::new(2, 2));
  }
}
