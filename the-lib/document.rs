//! Document core state and editing API.
//!
//! A [`Document`] owns the line store, the undo/redo log and the highlighting
//! watermark, and keeps the three in sync: every primitive edit mutates the
//! lines, records its inverse-able [`TextOp`] and lowers the watermark.
//!
//! # Example
//!
//! ```
//! use the_lib::{
//!   document::Document,
//!   position::Position,
//! };
//!
//! let mut doc = Document::from_text("hello");
//! doc.insert(" world", Position::new(0, 5)).unwrap();
//! assert_eq!(doc.entire_content(), "hello world\n");
//!
//! doc.undo().unwrap();
//! assert_eq!(doc.entire_content(), "hello\n");
//! ```

use std::{
  fmt,
  path::{
    Path,
    PathBuf,
  },
  string::FromUtf8Error,
  time::Duration,
};

use bitflags::bitflags;
use the_core::utf8;
use thiserror::Error;

use crate::{
  Tendril,
  config::DocumentConfig,
  highlight::{
    HighlightProgress,
    HighlightState,
    Highlighter,
    Token,
  },
  history::{
    History,
    HistoryJump,
    TextOp,
  },
  line::{
    LineOutOfBounds,
    LineStore,
  },
  position::Position,
  region::{
    Region,
    RegionError,
    Span,
  },
};

#[derive(Debug, Error)]
pub enum DocumentError {
  #[error("document is readonly")]
  Readonly,
  #[error(transparent)]
  LineOutOfBounds(#[from] LineOutOfBounds),
  #[error("invalid range: {end} is before {start}")]
  InvalidRange { start: Position, end: Position },
  #[error("document has no path")]
  NoPath,
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("document is not valid UTF-8: {0}")]
  InvalidUtf8(#[from] FromUtf8Error),
  #[error(transparent)]
  Region(#[from] RegionError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

bitflags! {
  /// Modifiers for a single primitive edit.
  #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
  pub struct EditFlags: u8 {
    /// Bypass the readonly check.
    const FORCE      = 1 << 0;
    /// Do not record the edit in history. Used while replaying history.
    ///
    /// Recorded positions of earlier entries are not adjusted, so outside
    /// of replay this can leave history describing text that no longer
    /// exists. A later undo may then fail partway, leaving the text partly
    /// replayed while the stacks stay as they were.
    const NO_HISTORY = 1 << 1;
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFlags {
  pub readonly: bool,
}

/// Text copied out of a document by [`Document::content`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extracted {
  /// The spanned text with `\n` between lines.
  pub text:       String,
  /// Number of lines the span touched, `0` for an empty span.
  pub line_count: usize,
}

pub struct Document {
  lines:       LineStore,
  history:     History,
  highlight:   HighlightState,
  highlighter: Option<Box<dyn Highlighter>>,
  path:        Option<PathBuf>,
  flags:       DocumentFlags,
  version:     u64,
  config:      DocumentConfig,
}

impl fmt::Debug for Document {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Document")
      .field("lines", &self.lines.len())
      .field("path", &self.path)
      .field("flags", &self.flags)
      .field("version", &self.version)
      .field("history", &self.history)
      .field("highlight", &self.highlight)
      .field("highlighter", &self.highlighter.is_some())
      .finish_non_exhaustive()
  }
}

impl Default for Document {
  fn default() -> Self {
    Self::new()
  }
}

impl Document {
  /// An empty document: a single empty line.
  pub fn new() -> Self {
    Self::from_lines(LineStore::new())
  }

  /// Splits `text` on `\n`, one line per piece.
  pub fn from_text(text: &str) -> Self {
    Self::from_lines(LineStore::from_text(text))
  }

  fn from_lines(lines: LineStore) -> Self {
    Self {
      lines,
      history: History::new(),
      highlight: HighlightState::new(),
      highlighter: None,
      path: None,
      flags: DocumentFlags::default(),
      version: 0,
      config: DocumentConfig::default(),
    }
  }

  /// Reads `path` as UTF-8 text. The normalized, absolute path is retained
  /// for [`Document::save`].
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = the_stdx::path::canonicalize(path);
    let text = String::from_utf8(std::fs::read(&path)?)?;
    let mut doc = Self::from_text(&text);
    tracing::debug!(path = %path.display(), lines = doc.line_count(), "loaded document");
    doc.path = Some(path);
    Ok(doc)
  }

  pub fn with_config(mut self, config: DocumentConfig) -> Self {
    self.flags.readonly = config.readonly;
    self.config = config;
    self
  }

  pub fn config(&self) -> &DocumentConfig {
    &self.config
  }

  /// Installs the tokenizer used by the incremental highlighting pass. The
  /// whole document becomes stale.
  pub fn set_highlighter(&mut self, highlighter: Box<dyn Highlighter>) {
    self.highlighter = Some(highlighter);
    self.highlight.invalidate_all();
  }

  pub fn clear_highlighter(&mut self) {
    self.highlighter = None;
    self.highlight.invalidate_all();
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub fn set_path(&mut self, path: impl AsRef<Path>) {
    self.path = Some(the_stdx::path::canonicalize(path));
  }

  pub fn flags(&self) -> DocumentFlags {
    self.flags
  }

  pub fn set_readonly(&mut self, readonly: bool) {
    self.flags.readonly = readonly;
  }

  /// Bumped on every mutation of the text, including undo and redo.
  pub fn version(&self) -> u64 {
    self.version
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  pub fn lines(&self) -> &LineStore {
    &self.lines
  }

  pub fn is_modified(&self) -> bool {
    self.history.is_modified()
  }

  #[inline]
  pub fn line_count(&self) -> usize {
    self.lines.len()
  }

  pub fn line(&self, index: usize) -> Result<&str> {
    Ok(self.lines.get(index)?)
  }

  pub fn line_len(&self, index: usize) -> Result<usize> {
    Ok(self.lines.line_len(index)?)
  }

  pub fn end_position(&self) -> Position {
    self.lines.end_position()
  }

  /// Every line, each followed by `\n`.
  pub fn entire_content(&self) -> String {
    self.lines.to_content()
  }

  /// Copies `len` codepoints starting at `pos`, counting each line break
  /// crossed as one codepoint.
  ///
  /// Spans running past the end of the document stop there. A start line
  /// past the end yields an empty result.
  pub fn content(&self, pos: impl Into<Position>, len: usize) -> Result<Extracted> {
    self.extract(pos.into(), Span::Codepoints(len))
  }

  /// Copies the rest of the line from `pos`, without its line break.
  pub fn content_to_line_end(&self, pos: impl Into<Position>) -> Result<Extracted> {
    self.extract(pos.into(), Span::ToLineEnd)
  }

  fn extract(&self, pos: Position, span: Span) -> Result<Extracted> {
    let region = Region::compute(&self.lines, pos, span, true)?;
    Ok(Extracted {
      text:       region.content.unwrap_or_default(),
      line_count: region.line_count,
    })
  }

  /// Number of codepoints from `start` to `end`, counting one per line break
  /// crossed.
  ///
  /// Both lines must exist. Columns past a line's end are clamped to it, so
  /// there is never a phantom line break after the last line.
  pub fn codepoint_distance(
    &self,
    start: impl Into<Position>,
    end: impl Into<Position>,
  ) -> Result<usize> {
    let (start, end) = (start.into(), end.into());
    if end < start {
      return Err(DocumentError::InvalidRange { start, end });
    }

    let start_len = self.lines.line_len(start.line)?;
    let end_len = self.lines.line_len(end.line)?;
    let start_col = start.col.min(start_len);
    let end_col = end.col.min(end_len);

    if start.line == end.line {
      return Ok(end_col.saturating_sub(start_col));
    }

    let mut distance = start_len - start_col + 1;
    for line in start.line + 1..end.line {
      distance += self.lines.line_len(line)? + 1;
    }
    Ok(distance + end_col)
  }

  /// Cached tokens of line `index`. Only lines below
  /// [`Document::highlighted_line_count`] are up to date.
  pub fn line_tokens(&self, index: usize) -> Result<&[Token]> {
    Ok(self.lines.line(index)?.tokens())
  }

  pub fn highlighted_line_count(&self) -> usize {
    self.highlight.highlighted_line_count()
  }

  fn ensure_writable(&self, flags: EditFlags) -> Result<()> {
    if self.flags.readonly && !flags.contains(EditFlags::FORCE) {
      return Err(DocumentError::Readonly);
    }
    Ok(())
  }

  pub fn insert(&mut self, text: &str, pos: impl Into<Position>) -> Result<()> {
    self.insert_with(text, pos, EditFlags::empty())
  }

  pub fn force_insert(&mut self, text: &str, pos: impl Into<Position>) -> Result<()> {
    self.insert_with(text, pos, EditFlags::FORCE)
  }

  /// Inserts `text` at `pos`.
  ///
  /// A line past the end of the document means the end of the document and
  /// a column past the end of its line means the end of that line. The
  /// recorded history entry uses the clamped position.
  pub fn insert_with(&mut self, text: &str, pos: impl Into<Position>, flags: EditFlags) -> Result<()> {
    self.ensure_writable(flags)?;
    if text.is_empty() {
      return Ok(());
    }

    let mut pos = pos.into();
    if pos.line >= self.lines.len() {
      pos = self.lines.end_position();
    }

    let region = Region::compute(&self.lines, pos, Span::Codepoints(0), false)?;
    let pos = region.start;
    let pieces = {
      let mut pieces: Vec<String> = text.split('\n').map(str::to_owned).collect();
      if let Some(first) = pieces.first_mut() {
        first.insert_str(0, region.before(&self.lines));
      }
      if let Some(last) = pieces.last_mut() {
        last.push_str(region.after(&self.lines));
      }
      pieces
    };
    let added = pieces.len() - 1;
    self.lines.replace_line(pos.line, pieces)?;

    let len = utf8::codepoint_len(text);
    tracing::trace!(%pos, len, added, "insert");
    if !flags.contains(EditFlags::NO_HISTORY) {
      self.history.record(TextOp::Insert {
        pos,
        text: Tendril::from(text),
        len,
      });
    }

    self.version = self.version.saturating_add(1);
    self.reset_highlighting(pos.line);
    Ok(())
  }

  pub fn delete(&mut self, pos: impl Into<Position>, len: usize) -> Result<()> {
    self.delete_with(pos, len, EditFlags::empty())
  }

  pub fn force_delete(&mut self, pos: impl Into<Position>, len: usize) -> Result<()> {
    self.delete_with(pos, len, EditFlags::FORCE)
  }

  /// Deletes `len` codepoints starting at `pos`, each line break counting
  /// as one.
  ///
  /// Deleting past the end of the document stops there; deleting at the
  /// very end is a no-op. The line of `pos` must exist.
  pub fn delete_with(&mut self, pos: impl Into<Position>, len: usize, flags: EditFlags) -> Result<()> {
    self.ensure_writable(flags)?;
    if len == 0 {
      return Ok(());
    }

    let pos = pos.into();
    self.lines.line(pos.line)?;

    let record = !flags.contains(EditFlags::NO_HISTORY);
    let region = Region::compute(&self.lines, pos, Span::Codepoints(len), record)?;
    if region.is_empty() {
      return Ok(());
    }

    self.lines.merge(
      region.start.line..=region.end_line,
      region.start_byte,
      region.end_byte,
    )?;

    tracing::trace!(
      pos = %region.start,
      len = region.consumed,
      removed = region.end_line - region.start.line,
      "delete"
    );
    if record {
      self.history.record(TextOp::Delete {
        pos:  region.start,
        text: region.content.map(Tendril::from).unwrap_or_default(),
        len:  region.consumed,
      });
    }

    self.version = self.version.saturating_add(1);
    self.reset_highlighting(region.start.line);
    Ok(())
  }

  /// Deletes everything, leaving a single empty line.
  pub fn clear_content(&mut self) -> Result<()> {
    self.clear_content_with(EditFlags::empty())
  }

  fn clear_content_with(&mut self, flags: EditFlags) -> Result<()> {
    let len = self.codepoint_distance(Position::zero(), self.end_position())?;
    self.delete_with(Position::zero(), len, flags)
  }

  /// Replaces the whole text as a single undo unit, bypassing the readonly
  /// flag.
  pub fn replace_content(&mut self, text: &str) -> Result<()> {
    self.history.begin_checkpoint(Position::zero());
    let result = self
      .clear_content_with(EditFlags::FORCE)
      .and_then(|()| self.insert_with(text, Position::zero(), EditFlags::FORCE));
    self.history.end_checkpoint(Position::zero().traverse(text));
    result
  }

  /// Opens an undo group; `pos` is the cursor before the grouped edits.
  pub fn begin_checkpoint(&mut self, pos: impl Into<Position>) {
    self.history.begin_checkpoint(pos.into());
  }

  /// Closes an undo group; `pos` is the cursor after the grouped edits.
  pub fn end_checkpoint(&mut self, pos: impl Into<Position>) {
    self.history.end_checkpoint(pos.into());
  }

  /// Undoes the most recent edit or checkpoint group.
  ///
  /// Returns the cursor to restore: where a group started, or where a lone
  /// edit happened. `None` when there is nothing to undo.
  pub fn undo(&mut self) -> Result<Option<Position>> {
    self.ensure_writable(EditFlags::empty())?;
    self.history.close_checkpoint();
    let Some(jump) = self.history.undo() else {
      return Ok(None);
    };

    self.apply_history_jump(&jump)?;
    self.history.apply_jump(&jump);
    tracing::debug!(ops = jump.len(), cursor = ?jump.cursor, "undo");

    Ok(
      jump
        .cursor
        .or_else(|| jump.ops.last().map(TextOp::position)),
    )
  }

  /// Redoes the most recently undone edit or checkpoint group.
  ///
  /// Returns the cursor to restore: where a group ended, or just after a
  /// lone edit. `None` when there is nothing to redo.
  pub fn redo(&mut self) -> Result<Option<Position>> {
    self.ensure_writable(EditFlags::empty())?;
    self.history.close_checkpoint();
    let Some(jump) = self.history.redo() else {
      return Ok(None);
    };

    self.apply_history_jump(&jump)?;
    self.history.apply_jump(&jump);
    tracing::debug!(ops = jump.len(), cursor = ?jump.cursor, "redo");

    Ok(
      jump
        .cursor
        .or_else(|| jump.ops.last().map(TextOp::end_position)),
    )
  }

  fn apply_history_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    let flags = EditFlags::FORCE | EditFlags::NO_HISTORY;
    for op in &jump.ops {
      match op {
        TextOp::Insert { pos, text, .. } => self.insert_with(text, *pos, flags)?,
        TextOp::Delete { pos, len, .. } => self.delete_with(*pos, *len, flags)?,
        TextOp::BeginCheckpoint { .. } | TextOp::EndCheckpoint { .. } => {},
      }
    }
    Ok(())
  }

  /// Writes the document to its path.
  pub fn save(&mut self) -> Result<()> {
    self.ensure_writable(EditFlags::empty())?;
    let path = self.path.clone().ok_or(DocumentError::NoPath)?;
    self.write_to(&path)
  }

  /// Writes the document to `path` and binds it to that path on success.
  pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
    self.ensure_writable(EditFlags::empty())?;
    let path = the_stdx::path::canonicalize(path);
    self.write_to(&path)?;
    self.path = Some(path);
    Ok(())
  }

  fn write_to(&mut self, path: &Path) -> Result<()> {
    let mut content = self.lines.to_content();
    if self.config.strip_trailing_newline && content.ends_with('\n') {
      content.pop();
    }

    std::fs::write(path, &content)?;
    self.history.mark_saved();
    tracing::debug!(path = %path.display(), bytes = content.len(), "saved document");
    Ok(())
  }

  /// Lowers the highlighting watermark after an edit on `start_line` and
  /// resets the highlighter's nested context when it moved.
  ///
  /// Best effort: highlighter failures are logged, never returned.
  pub fn reset_highlighting(&mut self, start_line: usize) {
    let Some(restart) = self.highlight.invalidate_from(&self.lines, start_line) else {
      return;
    };
    tracing::trace!(start_line, restart, "highlight watermark lowered");

    if let Some(highlighter) = self.highlighter.as_deref_mut()
      && let Err(err) = highlighter.reset()
    {
      tracing::warn!(%err, restart, "failed to reset highlighter");
    }
  }

  /// Runs one incremental highlighting step within the configured budget.
  pub fn highlight_step(&mut self) -> HighlightProgress {
    self.highlight_step_within(self.config.highlight_budget())
  }

  /// Highlights lines from the watermark on until all are done or `budget`
  /// has elapsed. Without a highlighter there is nothing to do.
  pub fn highlight_step_within(&mut self, budget: Duration) -> HighlightProgress {
    let Some(highlighter) = self.highlighter.as_deref_mut() else {
      return HighlightProgress::Done;
    };
    self.highlight.step(&mut self.lines, highlighter, budget)
  }

  /// Highlights every stale line in one go.
  pub fn highlight_all(&mut self) {
    while self.highlight_step_within(Duration::MAX) == HighlightProgress::Pending {}
  }
}
