//! Path helpers used when a document is bound to a file on disk.

use std::{
  borrow::Cow,
  path::{
    Component,
    Path,
    PathBuf,
  },
};

use crate::env::{
  current_working_dir,
  home_dir,
};

/// Replaces a leading `~` with the user's home directory.
///
/// Only the bare `~` component is expanded; `~user` forms are left alone.
pub fn expand_tilde<'a, P>(path: P) -> Cow<'a, Path>
where
  P: Into<Cow<'a, Path>>,
{
  let path = path.into();
  let mut components = path.components();
  if let Some(Component::Normal(c)) = components.next()
    && c == "~"
    && let Some(mut home) = home_dir()
  {
    home.push(components.as_path());
    return Cow::Owned(home);
  }
  path
}

/// Lexically resolves `.` and `..` components.
///
/// Unlike [`std::fs::canonicalize`] this never touches the filesystem and
/// does not resolve symlinks, so it works for files that do not exist yet.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
  let path = path.as_ref();
  let mut components = path.components().peekable();
  let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().copied() {
    components.next();
    PathBuf::from(c.as_os_str())
  } else {
    PathBuf::new()
  };

  for component in components {
    match component {
      Component::Prefix(..) => unreachable!(),
      Component::RootDir => ret.push(component.as_os_str()),
      Component::CurDir => {},
      // `/..` is `/`; a relative path keeps leading `..` parts.
      Component::ParentDir => match ret.components().next_back() {
        Some(Component::Normal(_)) => {
          ret.pop();
        },
        Some(Component::RootDir | Component::Prefix(_)) => {},
        _ => ret.push(".."),
      },
      Component::Normal(c) => ret.push(c),
    }
  }

  ret
}

/// Produces the absolute, normalized form of `path`.
///
/// Expands `~`, joins relative paths onto the current working directory and
/// resolves `.`/`..`. When the target exists, the result is simplified with
/// `dunce` so that Windows paths avoid the verbatim `\\?\` prefix.
pub fn canonicalize(path: impl AsRef<Path>) -> PathBuf {
  let path = expand_tilde(path.as_ref());
  let path = if path.is_relative() {
    match current_working_dir() {
      Ok(cwd) => Cow::Owned(cwd.join(path)),
      Err(_) => path,
    }
  } else {
    path
  };

  let normalized = normalize(&path);
  dunce::canonicalize(&normalized).unwrap_or(normalized)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_resolves_dots() {
    assert_eq!(normalize("/a/./b/../c"), PathBuf::from("/a/c"));
    assert_eq!(normalize("/../a"), PathBuf::from("/a"));
    assert_eq!(normalize("a/../../b"), PathBuf::from("../b"));
    assert_eq!(normalize("./a/b/."), PathBuf::from("a/b"));
    assert_eq!(normalize("../../a"), PathBuf::from("../../a"));
  }

  #[test]
  fn expand_tilde_uses_home() {
    let Some(home) = home_dir() else {
      return;
    };
    assert_eq!(expand_tilde(Path::new("~/notes.txt")), home.join("notes.txt"));
    assert_eq!(expand_tilde(Path::new("~")), home);
  }

  #[test]
  fn expand_tilde_ignores_other_paths() {
    assert_eq!(expand_tilde(Path::new("/tmp/~")), Path::new("/tmp/~"));
    assert_eq!(expand_tilde(Path::new("~user/x")), Path::new("~user/x"));
  }

  #[test]
  fn canonicalize_makes_relative_paths_absolute() {
    let path = canonicalize("does-not-exist/../file.txt");
    assert!(path.is_absolute());
    assert!(path.ends_with("file.txt"));
    assert!(!path.components().any(|c| c == Component::ParentDir));
  }

  #[test]
  fn canonicalize_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "x").unwrap();

    let dotted = dir.path().join(".").join("a.txt");
    assert_eq!(canonicalize(&dotted), dunce::canonicalize(&file).unwrap());
  }
}
