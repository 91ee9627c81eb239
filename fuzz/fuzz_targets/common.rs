use the_lib::{
  Document,
  Position,
  highlight::DelimitedHighlighter,
};

const MAX_INITIAL_BYTES: usize = 8 * 1024;
const MAX_OPS: usize = 128;
const MAX_INSERT_BYTES: usize = 256;

#[derive(Debug, Clone)]
pub enum EditOp {
  Insert { pos: Position, text: String },
  Delete { pos: Position, len: usize },
  BeginCheckpoint { pos: Position },
  EndCheckpoint { pos: Position },
  Undo,
  Redo,
  Highlight { steps: u8 },
}

pub struct FuzzSession {
  pub initial: String,
  pub doc:     Document,
  pub ops:     Vec<EditOp>,
}

pub fn session_from_bytes(data: &[u8]) -> FuzzSession {
  let mut cursor = ByteCursor::new(data);
  let initial_len = cursor.next_usize(MAX_INITIAL_BYTES);
  let initial = lossy_text(cursor.next_bytes(initial_len));
  let op_count = cursor.next_usize(MAX_OPS);

  let mut ops = Vec::with_capacity(op_count);
  for _ in 0..op_count {
    let kind = cursor.next_u8();
    let pos = Position::new(cursor.next_u16() as usize, cursor.next_u16() as usize);
    let op = match kind % 8 {
      0 | 1 => {
        let len = cursor.next_usize(MAX_INSERT_BYTES);
        EditOp::Insert {
          pos,
          text: lossy_text(cursor.next_bytes(len)),
        }
      },
      2 | 3 => EditOp::Delete {
        pos,
        len: cursor.next_u16() as usize,
      },
      4 => EditOp::BeginCheckpoint { pos },
      5 => EditOp::EndCheckpoint { pos },
      6 if kind & 0x80 == 0 => EditOp::Undo,
      6 => EditOp::Redo,
      _ => EditOp::Highlight {
        steps: cursor.next_u8(),
      },
    };
    ops.push(op);
  }

  let mut doc = Document::from_text(&initial);
  doc.set_highlighter(Box::new(DelimitedHighlighter::block_comments()));

  FuzzSession { initial, doc, ops }
}

/// Applies one operation. Out of range lines are folded into the document so
/// most operations actually edit something.
pub fn apply(doc: &mut Document, op: &EditOp) {
  match op {
    EditOp::Insert { pos, text } => {
      let pos = fold(*pos, doc);
      doc.insert(text, pos).unwrap();
    },
    EditOp::Delete { pos, len } => {
      let pos = fold(*pos, doc);
      doc.delete(pos, *len).unwrap();
    },
    EditOp::BeginCheckpoint { pos } => doc.begin_checkpoint(*pos),
    EditOp::EndCheckpoint { pos } => doc.end_checkpoint(*pos),
    EditOp::Undo => {
      doc.undo().unwrap();
    },
    EditOp::Redo => {
      doc.redo().unwrap();
    },
    EditOp::Highlight { steps } => {
      for _ in 0..*steps {
        doc.highlight_step();
      }
    },
  }
}

fn fold(pos: Position, doc: &Document) -> Position {
  Position::new(pos.line % doc.line_count(), pos.col)
}

fn lossy_text(bytes: &[u8]) -> String {
  String::from_utf8_lossy(bytes).into_owned()
}

struct ByteCursor<'a> {
  data: &'a [u8],
  pos:  usize,
}

impl<'a> ByteCursor<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  fn next_u8(&mut self) -> u8 {
    let value = self.data.get(self.pos).copied().unwrap_or(0);
    self.pos = self.pos.saturating_add(1);
    value
  }

  fn next_u16(&mut self) -> u16 {
    let lo = self.next_u8() as u16;
    let hi = self.next_u8() as u16;
    lo | (hi << 8)
  }

  fn next_usize(&mut self, max: usize) -> usize {
    if max == 0 {
      return 0;
    }
    (self.next_u16() as usize) % (max + 1)
  }

  fn next_bytes(&mut self, len: usize) -> &'a [u8] {
    let start = self.pos.min(self.data.len());
    let end = start.saturating_add(len).min(self.data.len());
    self.pos = end;
    &self.data[start..end]
  }
}
