//! Integration tests for loading, editing and saving documents.

use std::fs;

use the_lib::{
  Document,
  DocumentError,
  EditFlags,
  Position,
  config::DocumentConfig,
  highlight::{
    DelimitedHighlighter,
    HighlightProgress,
  },
};

const SAMPLE: &str = "hello world\nsecond line\n\nolá mundo -- em português";

#[test]
fn test_load_edit_save_roundtrip() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join("sample.txt");
  fs::write(&path, SAMPLE).expect("Failed to write sample");

  let mut doc = Document::from_file(&path).expect("Failed to load document");
  assert_eq!(doc.line_count(), 4);
  assert!(doc.path().is_some_and(|p| p.is_absolute()));
  assert!(!doc.is_modified());

  doc.insert("!", (0, 11)).expect("Failed to insert");
  assert!(doc.is_modified());
  doc.save().expect("Failed to save");
  assert!(!doc.is_modified());

  let saved = fs::read_to_string(&path).expect("Failed to read back");
  assert_eq!(
    saved,
    "hello world!\nsecond line\n\nolá mundo -- em português"
  );
}

#[test]
fn test_trailing_newline_survives_reload() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join("trailing.txt");

  let mut doc = Document::from_text("a\n");
  assert_eq!(doc.line_count(), 2);
  doc.save_as(&path).expect("Failed to save");
  assert_eq!(fs::read_to_string(&path).unwrap(), "a\n");

  let reloaded = Document::from_file(&path).expect("Failed to reload");
  assert_eq!(reloaded.entire_content(), doc.entire_content());
}

#[test]
fn test_keep_trailing_newline_when_configured() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join("keep.txt");

  let config = DocumentConfig::from_toml("strip-trailing-newline = false").unwrap();
  let mut doc = Document::from_text("a\nb").with_config(config);
  doc.save_as(&path).expect("Failed to save");
  assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
}

#[test]
fn test_save_as_binds_path() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join("bound.txt");

  let mut doc = Document::from_text("one");
  assert!(matches!(doc.save(), Err(DocumentError::NoPath)));
  doc.save_as(&path).expect("Failed to save");

  doc.delete((0, 0), 1).unwrap();
  doc.save().expect("Failed to save to bound path");
  assert_eq!(fs::read_to_string(&path).unwrap(), "ne");
}

#[test]
fn test_undo_past_save_is_modified() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join("undo.txt");

  let mut doc = Document::from_text("abc");
  doc.insert("1", (0, 3)).unwrap();
  doc.save_as(&path).expect("Failed to save");
  assert!(!doc.is_modified());

  doc.undo().unwrap();
  assert!(doc.is_modified());
  doc.redo().unwrap();
  assert!(!doc.is_modified());
}

#[test]
fn test_missing_file_is_io_error() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let result = Document::from_file(dir.path().join("missing.txt"));
  assert!(matches!(result, Err(DocumentError::Io(_))));
}

#[test]
fn test_invalid_utf8_is_rejected() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join("latin1.txt");
  fs::write(&path, [b'o', b'l', 0xe1]).unwrap();

  let result = Document::from_file(&path);
  assert!(matches!(result, Err(DocumentError::InvalidUtf8(_))));
}

#[test]
fn test_readonly_document_cannot_be_saved() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join("ro.txt");
  fs::write(&path, "locked").unwrap();

  let mut doc = Document::from_file(&path).unwrap();
  doc.set_readonly(true);
  assert!(matches!(doc.save(), Err(DocumentError::Readonly)));
  assert_eq!(fs::read_to_string(&path).unwrap(), "locked");
}

#[test]
fn test_insert_mode_session_is_one_undo_step() {
  let mut doc = Document::from_text(SAMPLE);
  doc.begin_checkpoint((1, 0));
  doc.insert("a", (1, 0)).unwrap();
  doc.insert("b", (1, 1)).unwrap();
  doc.insert("\n", (1, 2)).unwrap();
  doc.insert("c", (2, 0)).unwrap();
  doc.end_checkpoint((2, 1));
  assert_eq!(doc.line(1).unwrap(), "ab");
  assert_eq!(doc.line(2).unwrap(), "csecond line");

  assert_eq!(doc.undo().unwrap(), Some(Position::new(1, 0)));
  assert_eq!(doc.entire_content(), format!("{SAMPLE}\n"));
  assert_eq!(doc.undo().unwrap(), None);

  assert_eq!(doc.redo().unwrap(), Some(Position::new(2, 1)));
  assert_eq!(doc.line(2).unwrap(), "csecond line");
}

#[test]
fn test_delete_word_via_distance() {
  let mut doc = Document::from_text(SAMPLE);
  let len = doc
    .codepoint_distance((3, 4), (3, 9))
    .expect("Failed to compute distance");
  doc.begin_checkpoint((3, 4));
  doc.delete((3, 4), len).unwrap();
  doc.end_checkpoint((3, 4));
  assert_eq!(doc.line(3).unwrap(), "olá  -- em português");

  assert_eq!(doc.undo().unwrap(), Some(Position::new(3, 4)));
  assert_eq!(doc.line(3).unwrap(), "olá mundo -- em português");
}

#[test]
fn test_history_suppressed_edit() {
  let mut doc = Document::from_text("abc");
  doc
    .insert_with("x", (0, 0), EditFlags::NO_HISTORY)
    .unwrap();
  assert_eq!(doc.entire_content(), "xabc\n");
  assert_eq!(doc.undo().unwrap(), None);
}

#[test]
fn test_highlighting_catches_up_after_edits() {
  let config = DocumentConfig::from_toml("highlight-budget-ms = 0").unwrap();
  let mut doc = Document::from_text("a\n/* b\nc */\nd").with_config(config);
  doc.set_highlighter(Box::new(DelimitedHighlighter::block_comments()));

  let mut steps = 0;
  while doc.highlight_step() == HighlightProgress::Pending {
    steps += 1;
  }
  assert_eq!(steps, 3);
  assert_eq!(doc.highlighted_line_count(), 4);

  doc.delete((2, 0), 1).unwrap();
  assert_eq!(doc.highlighted_line_count(), 1);
  doc.highlight_all();
  assert_eq!(doc.highlighted_line_count(), 4);
}
