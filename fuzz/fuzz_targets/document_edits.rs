#![no_main]

mod common;

use libfuzzer_sys::fuzz_target;

use crate::common::{
  apply,
  session_from_bytes,
};

fuzz_target!(|data: &[u8]| {
  let mut session = session_from_bytes(data);
  let original = session.doc.entire_content();
  assert_eq!(original, format!("{}\n", session.initial));

  for op in &session.ops {
    apply(&mut session.doc, op);
    assert!(session.doc.line_count() >= 1);
    assert!(session.doc.highlighted_line_count() <= session.doc.line_count());
  }

  while session.doc.redo().unwrap().is_some() {}
  let edited = session.doc.entire_content();
  while session.doc.undo().unwrap().is_some() {}
  assert_eq!(session.doc.entire_content(), original);
  assert!(!session.doc.is_modified());

  while session.doc.redo().unwrap().is_some() {}
  assert_eq!(session.doc.entire_content(), edited);

  session.doc.highlight_all();
  assert_eq!(
    session.doc.highlighted_line_count(),
    session.doc.line_count()
  );
});
