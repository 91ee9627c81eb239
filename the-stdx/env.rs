//! Functions for working with the host environment.

use std::path::PathBuf;

use eyre::{
  Result,
  WrapErr,
};
use parking_lot::RwLock;

// Resolved once per process; every later lookup returns the first result.
static CWD: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Get the current working directory.
///
/// Prefers `$PWD` when it refers to the same directory so that symlinked
/// directories are kept as the user typed them (`pwd -L`).
pub fn current_working_dir() -> Result<PathBuf> {
  if let Some(path) = &*CWD.read() {
    return Ok(path.clone());
  }

  let mut cwd = std::env::current_dir().wrap_err("failed to get current working directory")?;

  let pwd = std::env::var_os("PWD");
  #[cfg(windows)]
  let pwd = pwd.or_else(|| std::env::var_os("CD"));

  if let Some(pwd) = pwd.map(PathBuf::from)
    && pwd.canonicalize().ok().as_ref() == Some(&cwd)
  {
    cwd = pwd;
  }

  let mut dst = CWD.write();
  *dst = Some(cwd.clone());

  Ok(cwd)
}

/// Returns the user's home directory, if one can be determined.
pub fn home_dir() -> Option<PathBuf> {
  etcetera::home_dir().ok()
}
