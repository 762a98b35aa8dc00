//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RevisionError, RevisionResult};

/// Settings for the revision layer, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig {
    /// Store payloads once in a shared arena and reference them by content
    /// id from serialized revision items.
    pub dedup_payloads: bool,
    /// Maximum number of generations walked by ancestor queries.
    pub max_history_depth: usize,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            dedup_payloads: false,
            max_history_depth: 256,
        }
    }
}

impl VcsConfig {
    /// Parse from TOML text. Missing keys take their default.
    pub fn from_toml_str(text: &str) -> RevisionResult<Self> {
        toml::from_str(text).map_err(|e| RevisionError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> RevisionResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RevisionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML text.
    pub fn to_toml_string(&self) -> RevisionResult<String> {
        toml::to_string(self).map_err(|e| RevisionError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_keys_take_defaults() {
        let config = VcsConfig::from_toml_str("max_history_depth = 8").unwrap();
        assert_eq!(config.max_history_depth, 8);
        assert!(!config.dedup_payloads);
        assert_eq!(VcsConfig::from_toml_str("").unwrap(), VcsConfig::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dedup_payloads = true").unwrap();
        writeln!(file, "max_history_depth = 32").unwrap();

        let config = VcsConfig::load(file.path()).unwrap();
        assert!(config.dedup_payloads);
        assert_eq!(config.max_history_depth, 32);
    }

    #[test]
    fn bad_input_is_a_config_error() {
        assert!(matches!(
            VcsConfig::from_toml_str("max_history_depth = \"deep\""),
            Err(RevisionError::Config(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VcsConfig::load(&dir.path().join("missing.toml")),
            Err(RevisionError::Config(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let config = VcsConfig {
            dedup_payloads: true,
            max_history_depth: 4,
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(VcsConfig::from_toml_str(&text).unwrap(), config);
    }
}
