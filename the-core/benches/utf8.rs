//! Benchmarks for codepoint addressing in the-core.
//!
//! Run with: `cargo bench -p the-core --bench utf8`

use divan::{
  Bencher,
  black_box,
};
use the_core::utf8::{
  byte_offset_for_column,
  codepoint_len,
  consume_codepoints,
};

fn main() {
  divan::main();
}

fn make_line(unit: &str, size: usize) -> String {
  let mut s = String::with_capacity(size + unit.len());
  while s.len() < size {
    s.push_str(unit);
  }
  s
}

const SIZES: &[usize] = &[80, 1_000, 10_000];

mod offset {
  use super::*;

  #[divan::bench(args = SIZES)]
  fn ascii(bencher: Bencher, size: usize) {
    let line = make_line("The quick brown fox jumps over the lazy dog. ", size);
    let column = codepoint_len(&line) / 2;
    bencher.bench(|| byte_offset_for_column(black_box(&line), black_box(column)));
  }

  #[divan::bench(args = SIZES)]
  fn cjk(bencher: Bencher, size: usize) {
    let line = make_line("漢字文字測試中文日本語", size);
    let column = codepoint_len(&line) / 2;
    bencher.bench(|| byte_offset_for_column(black_box(&line), black_box(column)));
  }
}

mod consume {
  use super::*;

  #[divan::bench(args = SIZES)]
  fn mixed(bencher: Bencher, size: usize) {
    let line = make_line("olá mundo -- em português ", size);
    let count = codepoint_len(&line);
    bencher.bench(|| consume_codepoints(black_box(&line), 0, black_box(count)));
  }
}
