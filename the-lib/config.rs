use std::time::Duration;

use serde::{
  Deserialize,
  Serialize,
};

/// Per-document settings, usually read from the `[document]` table of the
/// user's config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct DocumentConfig {
  /// Time slice of one incremental highlighting step, in milliseconds.
  pub highlight_budget_ms:    u64,
  /// Drop the final `\n` of the serialized content when saving.
  pub strip_trailing_newline: bool,
  /// Open documents read-only.
  pub readonly:               bool,
}

impl Default for DocumentConfig {
  fn default() -> Self {
    Self {
      highlight_budget_ms:    13,
      strip_trailing_newline: true,
      readonly:               false,
    }
  }
}

impl DocumentConfig {
  pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(source)
  }

  #[inline]
  pub fn highlight_budget(&self) -> Duration {
    Duration::from_millis(self.highlight_budget_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::highlight::DEFAULT_HIGHLIGHT_BUDGET;

  #[test]
  fn empty_table_is_default() {
    let config = DocumentConfig::from_toml("").unwrap();
    assert_eq!(config, DocumentConfig::default());
    assert_eq!(config.highlight_budget(), DEFAULT_HIGHLIGHT_BUDGET);
  }

  #[test]
  fn keys_are_kebab_case() {
    let config = DocumentConfig::from_toml(
      r#"
      highlight-budget-ms = 4
      strip-trailing-newline = false
      "#,
    )
    .unwrap();
    assert_eq!(config.highlight_budget(), Duration::from_millis(4));
    assert!(!config.strip_trailing_newline);
    assert!(!config.readonly);
  }

  #[test]
  fn unknown_keys_are_rejected() {
    assert!(DocumentConfig::from_toml("tab-width = 4").is_err());
  }
}
