//! Linear undo/redo log with checkpoint grouping.
//!
//! Every primitive edit is recorded as a [`TextOp`] carrying enough
//! information to reverse itself. Checkpoint markers bracket a run of
//! primitive edits (one insert-mode session, one compound command) so that
//! they undo and redo as a single unit.
//!
//! Like the document it belongs to, the history never mutates itself while
//! preparing a jump. [`History::undo`] and [`History::redo`] only describe the
//! operations to replay; the caller applies them and then commits the move
//! with [`History::apply_jump`]. If applying fails the history is untouched.
//!
//! # Modified state
//!
//! Each entry is stamped with a generation. New edits take a fresh, strictly
//! increasing generation; entries moved between the stacks keep theirs. The
//! document is modified when the generation on top of the undo stack differs
//! from the one recorded at the last save, so undoing back to the saved state
//! reads as unmodified again.

use crate::{
  Tendril,
  position::Position,
};

/// A recorded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOp {
  /// `text` (`len` codepoints) was inserted at `pos`.
  Insert {
    pos:  Position,
    text: Tendril,
    len:  usize,
  },
  /// `text` (`len` codepoints) was deleted starting at `pos`.
  Delete {
    pos:  Position,
    text: Tendril,
    len:  usize,
  },
  /// Cursor position before the grouped edits.
  BeginCheckpoint { pos: Position },
  /// Cursor position after the grouped edits.
  EndCheckpoint { pos: Position },
}

impl TextOp {
  pub fn position(&self) -> Position {
    match self {
      Self::Insert { pos, .. }
      | Self::Delete { pos, .. }
      | Self::BeginCheckpoint { pos }
      | Self::EndCheckpoint { pos } => *pos,
    }
  }

  pub fn is_marker(&self) -> bool {
    matches!(
      self,
      Self::BeginCheckpoint { .. } | Self::EndCheckpoint { .. }
    )
  }

  /// The operation undoing this one. Markers have no inverse.
  pub fn inverse(&self) -> Option<TextOp> {
    match self {
      Self::Insert { pos, text, len } => Some(Self::Delete {
        pos:  *pos,
        text: text.clone(),
        len:  *len,
      }),
      Self::Delete { pos, text, len } => Some(Self::Insert {
        pos:  *pos,
        text: text.clone(),
        len:  *len,
      }),
      Self::BeginCheckpoint { .. } | Self::EndCheckpoint { .. } => None,
    }
  }

  /// Where the cursor ends up right after this operation.
  pub fn end_position(&self) -> Position {
    match self {
      Self::Insert { pos, text, .. } => pos.traverse(text),
      _ => self.position(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
  op:         TextOp,
  generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDirection {
  Undo,
  Redo,
}

/// A pending move through history that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryJump {
  pub direction: JumpDirection,
  /// Operations to replay, in order. Already inverted for undo.
  pub ops:       Vec<TextOp>,
  /// Cursor stored by the checkpoint group, if a group was crossed.
  pub cursor:    Option<Position>,
  /// Number of stack entries the jump moves.
  entries:       usize,
}

impl HistoryJump {
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.ops.len()
  }
}

#[derive(Debug, Default, Clone)]
pub struct History {
  undo:             Vec<Entry>,
  redo:             Vec<Entry>,
  generation:       u64,
  saved_generation: u64,
  checkpoint_depth: usize,
}

impl History {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn undo_len(&self) -> usize {
    self.undo.len()
  }

  #[inline]
  pub fn redo_len(&self) -> usize {
    self.redo.len()
  }

  #[inline]
  pub fn can_undo(&self) -> bool {
    !self.undo.is_empty()
  }

  #[inline]
  pub fn can_redo(&self) -> bool {
    !self.redo.is_empty()
  }

  #[inline]
  pub fn in_checkpoint(&self) -> bool {
    self.checkpoint_depth > 0
  }

  /// Generation on top of the undo stack, `0` when it is empty.
  #[inline]
  pub fn head_generation(&self) -> u64 {
    self.undo.last().map_or(0, |entry| entry.generation)
  }

  pub fn is_modified(&self) -> bool {
    self.head_generation() != self.saved_generation
  }

  pub fn mark_saved(&mut self) {
    self.saved_generation = self.head_generation();
  }

  /// Iterates the undo stack from oldest to newest.
  pub fn undo_ops(&self) -> impl DoubleEndedIterator<Item = &TextOp> {
    self.undo.iter().map(|entry| &entry.op)
  }

  /// Iterates the redo stack from oldest to newest.
  pub fn redo_ops(&self) -> impl DoubleEndedIterator<Item = &TextOp> {
    self.redo.iter().map(|entry| &entry.op)
  }

  /// Drops both stacks. The document reads as modified afterwards unless it
  /// was saved while the undo stack was empty.
  pub fn clear(&mut self) {
    self.undo.clear();
    self.redo.clear();
    self.checkpoint_depth = 0;
  }

  /// Records a forward edit. Invalidates the redo stack.
  pub fn record(&mut self, op: TextOp) {
    debug_assert!(!op.is_marker());
    self.redo.clear();
    self.generation += 1;
    self.undo.push(Entry {
      op,
      generation: self.generation,
    });
  }

  /// Opens a checkpoint at the pre-edit cursor `pos`.
  ///
  /// Checkpoints do not nest: only the outermost begin/end pair emits
  /// markers.
  pub fn begin_checkpoint(&mut self, pos: Position) {
    self.checkpoint_depth += 1;
    if self.checkpoint_depth > 1 {
      return;
    }
    let generation = self.head_generation();
    self.undo.push(Entry {
      op: TextOp::BeginCheckpoint { pos },
      generation,
    });
  }

  /// Closes a checkpoint at the post-edit cursor `pos`.
  ///
  /// A group without edits collapses: its begin marker is discarded and the
  /// undo stack is left as it was before [`History::begin_checkpoint`].
  pub fn end_checkpoint(&mut self, pos: Position) {
    match self.checkpoint_depth {
      0 => {
        tracing::debug!(%pos, "end_checkpoint without an open checkpoint");
        return;
      },
      1 => self.checkpoint_depth = 0,
      _ => {
        self.checkpoint_depth -= 1;
        return;
      },
    }

    if let Some(Entry {
      op: TextOp::BeginCheckpoint { .. },
      ..
    }) = self.undo.last()
    {
      self.undo.pop();
      return;
    }

    let generation = self.head_generation();
    self.undo.push(Entry {
      op: TextOp::EndCheckpoint { pos },
      generation,
    });
  }

  /// Closes any open checkpoint before replaying history, placing the end
  /// marker after the last recorded edit.
  pub fn close_checkpoint(&mut self) {
    if self.checkpoint_depth == 0 {
      return;
    }
    let pos = self
      .undo
      .last()
      .map_or_else(Position::zero, |entry| entry.op.end_position());
    self.checkpoint_depth = 1;
    self.end_checkpoint(pos);
  }

  /// Prepares undoing the most recent unit without touching the stacks.
  ///
  /// A plain edit undoes alone. An end marker undoes everything back to its
  /// begin marker and reports the cursor stored there.
  pub fn undo(&self) -> Option<HistoryJump> {
    let top = self.undo.last()?;
    let mut jump = HistoryJump {
      direction: JumpDirection::Undo,
      ops:       Vec::new(),
      cursor:    None,
      entries:   1,
    };

    match &top.op {
      TextOp::EndCheckpoint { .. } => {
        for entry in self.undo.iter().rev().skip(1) {
          jump.entries += 1;
          match &entry.op {
            TextOp::BeginCheckpoint { pos } => {
              jump.cursor = Some(*pos);
              break;
            },
            op => jump.ops.extend(op.inverse()),
          }
        }
      },
      TextOp::BeginCheckpoint { pos } => jump.cursor = Some(*pos),
      op => jump.ops.extend(op.inverse()),
    }

    Some(jump)
  }

  /// Prepares redoing the most recently undone unit without touching the
  /// stacks.
  pub fn redo(&self) -> Option<HistoryJump> {
    let top = self.redo.last()?;
    let mut jump = HistoryJump {
      direction: JumpDirection::Redo,
      ops:       Vec::new(),
      cursor:    None,
      entries:   1,
    };

    match &top.op {
      TextOp::BeginCheckpoint { .. } => {
        for entry in self.redo.iter().rev().skip(1) {
          jump.entries += 1;
          match &entry.op {
            TextOp::EndCheckpoint { pos } => {
              jump.cursor = Some(*pos);
              break;
            },
            op if op.is_marker() => {},
            op => jump.ops.push(op.clone()),
          }
        }
      },
      TextOp::EndCheckpoint { pos } => jump.cursor = Some(*pos),
      op => jump.ops.push(op.clone()),
    }

    Some(jump)
  }

  /// Commits a jump once its operations were applied, moving the entries to
  /// the opposite stack in pop order.
  pub fn apply_jump(&mut self, jump: &HistoryJump) {
    let (from, to) = match jump.direction {
      JumpDirection::Undo => (&mut self.undo, &mut self.redo),
      JumpDirection::Redo => (&mut self.redo, &mut self.undo),
    };
    for _ in 0..jump.entries {
      let Some(entry) = from.pop() else {
        break;
      };
      to.push(entry);
    }
  }
}
