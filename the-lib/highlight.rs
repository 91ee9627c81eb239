//! Incremental syntax highlighting state.
//!
//! Tokenizing is delegated to an external [`Highlighter`]. The document only
//! tracks a watermark: lines `[0, highlighted_line_count)` carry valid cached
//! tokens, everything after it has to be re-tokenized. Edits lower the
//! watermark, the cooperative [`HighlightState::step`] pass raises it again
//! one line at a time under a time budget.
//!
//! Multi-line constructs (block comments and the like) are reported through
//! the delimiter token kinds. When an edit lands inside or next to one, the
//! watermark is pulled back to the line where the construct starts so it is
//! re-highlighted as a whole.

use std::time::{
  Duration,
  Instant,
};

use smallvec::SmallVec;
use thiserror::Error;

use crate::line::LineStore;

/// Default time slice for one highlighting step, a bit under a 60Hz frame.
pub const DEFAULT_HIGHLIGHT_BUDGET: Duration = Duration::from_millis(13);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Normal,
  Keyword,
  Type,
  Function,
  Number,
  String,
  Comment,
  Operator,
  Punctuation,
  /// Text enclosed by a multi-line construct.
  InsideDelimiter,
  /// The token opening a multi-line construct.
  DelimiterStart,
  /// The token closing a multi-line construct.
  DelimiterEnd,
}

impl TokenKind {
  /// Whether a line ending on this kind may be part of a multi-line
  /// construct.
  pub const fn is_delimited(self) -> bool {
    matches!(
      self,
      Self::InsideDelimiter | Self::DelimiterStart | Self::DelimiterEnd
    )
  }
}

/// A highlighted span of a single line. `start..end` are byte offsets into
/// the line content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
  pub kind:  TokenKind,
  pub start: usize,
  pub end:   usize,
}

impl Token {
  pub const fn new(kind: TokenKind, start: usize, end: usize) -> Self {
    Self { kind, start, end }
  }
}

pub type Tokens = SmallVec<[Token; 4]>;

#[derive(Debug, Error)]
pub enum HighlightError {
  #[error("highlighter failed: {0}")]
  Failed(String),
}

/// The external pattern-matching service that turns lines into tokens.
///
/// Implementations keep whatever nested context they need between calls
/// (for example "currently inside a block comment"). Lines are always fed in
/// document order starting from the watermark; [`Highlighter::reset`] is
/// called whenever the watermark moves back so that context can be dropped.
pub trait Highlighter {
  fn highlight_line(&mut self, line: &str) -> Result<Tokens, HighlightError>;

  fn reset(&mut self) -> Result<(), HighlightError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightProgress {
  /// Every line is highlighted.
  Done,
  /// The budget ran out; call again to continue.
  Pending,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HighlightState {
  highlighted_line_count: usize,
}

impl HighlightState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of leading lines with valid cached tokens.
  #[inline]
  pub fn highlighted_line_count(&self) -> usize {
    self.highlighted_line_count
  }

  pub fn is_complete(&self, lines: &LineStore) -> bool {
    self.highlighted_line_count >= lines.len()
  }

  /// Drops every cached line.
  pub fn invalidate_all(&mut self) {
    self.highlighted_line_count = 0;
  }

  /// Lowers the watermark after an edit starting at `start_line`.
  ///
  /// Returns the line highlighting has to restart from, or `None` when the
  /// watermark did not move (the line is past the end, or at or past the
  /// watermark). Lines below the watermark are untouched in the latter case,
  /// so the highlighter's nested context stays valid. The caller must reset
  /// that context when `Some` is returned.
  pub fn invalidate_from(&mut self, lines: &LineStore, start_line: usize) -> Option<usize> {
    if start_line >= lines.len() || start_line >= self.highlighted_line_count {
      return None;
    }

    let restart = restart_line(lines, start_line);
    if restart >= self.highlighted_line_count {
      return None;
    }

    self.highlighted_line_count = restart;
    Some(restart)
  }

  /// Highlights lines from the watermark on until every line is done or
  /// `budget` has elapsed.
  ///
  /// Highlighter failures are logged and leave the affected line without
  /// tokens; they never abort the pass.
  pub fn step(
    &mut self,
    lines: &mut LineStore,
    highlighter: &mut dyn Highlighter,
    budget: Duration,
  ) -> HighlightProgress {
    let started = Instant::now();
    let from = self.highlighted_line_count;

    while self.highlighted_line_count < lines.len() {
      let index = self.highlighted_line_count;
      let Some(line) = lines.line_mut(index) else {
        break;
      };

      match highlighter.highlight_line(line.as_str()) {
        Ok(tokens) => line.set_tokens(tokens),
        Err(err) => {
          tracing::warn!(%err, line = index, "failed to highlight line");
          line.clear_tokens();
        },
      }
      self.highlighted_line_count += 1;

      if started.elapsed() >= budget && self.highlighted_line_count < lines.len() {
        tracing::debug!(
          from,
          to = self.highlighted_line_count,
          elapsed = ?started.elapsed(),
          "highlight budget exhausted"
        );
        return HighlightProgress::Pending;
      }
    }

    HighlightProgress::Done
  }
}

/// Finds the line re-highlighting must start from after an edit on
/// `start_line`.
fn restart_line(lines: &LineStore, start_line: usize) -> usize {
  let last_kind = (0..=start_line)
    .rev()
    .filter_map(|index| lines.line(index).ok())
    .find_map(|line| line.tokens().last().map(|token| token.kind));

  match last_kind {
    Some(kind) if kind.is_delimited() => (0..=start_line)
      .rev()
      .find(|&index| {
        lines.line(index).is_ok_and(|line| {
          line
            .tokens()
            .iter()
            .any(|token| token.kind == TokenKind::DelimiterStart)
        })
      })
      .unwrap_or(0),
    _ => start_line,
  }
}

/// A minimal [`Highlighter`] that only understands one pair of block
/// delimiters, e.g. `/*` and `*/`.
///
/// Everything outside the delimiters is a single [`TokenKind::Normal`] span.
#[derive(Debug, Clone)]
pub struct DelimitedHighlighter {
  open:   String,
  close:  String,
  inside: bool,
}

impl DelimitedHighlighter {
  pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
    Self {
      open:   open.into(),
      close:  close.into(),
      inside: false,
    }
  }

  pub fn block_comments() -> Self {
    Self::new("/*", "*/")
  }
}

impl Highlighter for DelimitedHighlighter {
  fn highlight_line(&mut self, line: &str) -> Result<Tokens, HighlightError> {
    if self.open.is_empty() || self.close.is_empty() {
      return Err(HighlightError::Failed("empty delimiter".into()));
    }

    let mut tokens = Tokens::new();
    let mut pos = 0;
    while pos < line.len() {
      let rest = &line[pos..];
      if self.inside {
        match rest.find(self.close.as_str()) {
          Some(found) => {
            if found > 0 {
              tokens.push(Token::new(TokenKind::InsideDelimiter, pos, pos + found));
            }
            let end = pos + found + self.close.len();
            tokens.push(Token::new(TokenKind::DelimiterEnd, pos + found, end));
            self.inside = false;
            pos = end;
          },
          None => {
            tokens.push(Token::new(TokenKind::InsideDelimiter, pos, line.len()));
            pos = line.len();
          },
        }
      } else {
        match rest.find(self.open.as_str()) {
          Some(found) => {
            if found > 0 {
              tokens.push(Token::new(TokenKind::Normal, pos, pos + found));
            }
            let end = pos + found + self.open.len();
            tokens.push(Token::new(TokenKind::DelimiterStart, pos + found, end));
            self.inside = true;
            pos = end;
          },
          None => {
            tokens.push(Token::new(TokenKind::Normal, pos, line.len()));
            pos = line.len();
          },
        }
      }
    }

    Ok(tokens)
  }

  fn reset(&mut self) -> Result<(), HighlightError> {
    self.inside = false;
    Ok(())
  }
}
