//! Builder configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by a [`FileBuilder`](crate::FileBuilder) and the entry
/// builders it creates.
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes:
///
/// ```json
/// { "default_entry_name": "scan", "add_default_groups": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// Name used by [`FileBuilder::new_default_entry`](crate::FileBuilder::new_default_entry).
    pub default_entry_name: String,
    /// Name used by [`EntryBuilder::create_default_data`](crate::EntryBuilder::create_default_data).
    pub default_data_name: String,
    /// Create `instrument` and `sample` groups in every new entry.
    pub add_default_groups: bool,
    /// Written as the `name` field of each new entry's instrument.
    pub instrument_name: Option<String>,
    /// Entry in the `axes` attribute for dimensions without a default axis.
    pub axis_placeholder: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_entry_name: "entry".to_string(),
            default_data_name: "data".to_string(),
            add_default_groups: false,
            instrument_name: None,
            axis_placeholder: ".".to_string(),
        }
    }
}

impl BuilderConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default entry name.
    #[must_use]
    pub fn with_default_entry_name(mut self, name: &str) -> Self {
        self.default_entry_name = name.to_string();
        self
    }

    /// Sets the default NXdata group name.
    #[must_use]
    pub fn with_default_data_name(mut self, name: &str) -> Self {
        self.default_data_name = name.to_string();
        self
    }

    /// Enables or disables creation of default groups.
    #[must_use]
    pub fn with_default_groups(mut self, enabled: bool) -> Self {
        self.add_default_groups = enabled;
        self
    }

    /// Sets the instrument name.
    #[must_use]
    pub fn with_instrument_name(mut self, name: &str) -> Self {
        self.instrument_name = Some(name.to_string());
        self
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed, contains unknown keys, or
    /// the resulting configuration is invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not hold a valid
    /// configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that names are usable as node names.
    ///
    /// # Errors
    /// Returns [`Error::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        check_node_name("default_entry_name", &self.default_entry_name)?;
        check_node_name("default_data_name", &self.default_data_name)?;
        if self.axis_placeholder.is_empty() {
            return Err(Error::Config(
                "axis_placeholder must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_node_name(key: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(Error::Config(format!(
            "{key} must be a non-empty name without '/', got '{name}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.default_entry_name, "entry");
        assert_eq!(config.default_data_name, "data");
        assert_eq!(config.axis_placeholder, ".");
        assert!(!config.add_default_groups);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config =
            BuilderConfig::from_json_str(r#"{"default_entry_name": "scan", "add_default_groups": true}"#)
                .unwrap();
        assert_eq!(config.default_entry_name, "scan");
        assert!(config.add_default_groups);
        assert_eq!(config.default_data_name, "data");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = BuilderConfig::from_json_str(r#"{"entry_name": "scan"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let err = BuilderConfig::from_json_str(r#"{"default_data_name": "a/b"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"instrument_name": "i13"}}"#).unwrap();
        let config = BuilderConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.instrument_name.as_deref(), Some("i13"));
    }
}
