use smartstring::{LazyCompact, SmartString};

pub mod config;
pub mod document;
pub mod highlight;
pub mod history;
pub mod line;
pub mod position;
pub mod region;

pub type Tendril = SmartString<LazyCompact>;

pub use document::{
  Document,
  DocumentError,
  EditFlags,
};
pub use position::Position;
