//! Scalar metadata providers.

use crate::Result;
use nxscribe_tree::{BaseClass, DataArray};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<MetadataValue> for DataArray {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::Bool(v) => DataArray::from(v),
            MetadataValue::Int(v) => DataArray::from(v),
            MetadataValue::Float(v) => DataArray::from(v),
            MetadataValue::String(v) => DataArray::from(v),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Supplies scalar fields that are written straight into a group.
pub trait NexusMetadataProvider {
    /// Group the fields go into; `None` means the entry itself.
    fn category(&self) -> Option<BaseClass> {
        None
    }

    /// Field names and values, in write order.
    fn metadata_entries(&self) -> Vec<(String, MetadataValue)>;
}

/// Metadata held in a sorted map.
///
/// ```
/// use nxscribe_builder::{MapMetadataProvider, NexusMetadataProvider};
///
/// let metadata = MapMetadataProvider::new()
///     .with_entry("title", "Test Scan")
///     .with_entry("scan_command", "scan x 0 10 1");
/// assert_eq!(metadata.metadata_entries().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapMetadataProvider {
    #[serde(default)]
    category: Option<BaseClass>,
    #[serde(default)]
    entries: BTreeMap<String, MetadataValue>,
}

impl MapMetadataProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes into the group registered for `category`.
    #[must_use]
    pub fn with_category(mut self, category: BaseClass) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_entry(mut self, name: &str, value: impl Into<MetadataValue>) -> Self {
        self.entries.insert(name.to_string(), value.into());
        self
    }

    /// Inserts or replaces one entry.
    pub fn insert(&mut self, name: &str, value: impl Into<MetadataValue>) -> Option<MetadataValue> {
        self.entries.insert(name.to_string(), value.into())
    }

    /// Parses `{"category": "NXinstrument", "entries": {...}}`.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or has unknown keys.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl NexusMetadataProvider for MapMetadataProvider {
    fn category(&self) -> Option<BaseClass> {
        self.category
    }

    fn metadata_entries(&self) -> Vec<(String, MetadataValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_values() {
        let metadata = MapMetadataProvider::from_json_str(
            r#"{"category": "NXinstrument", "entries": {"name": "i13", "energy": 12.5, "count": 3, "shutter": true}}"#,
        )
        .unwrap();
        assert_eq!(metadata.category(), Some(BaseClass::Instrument));

        let entries: BTreeMap<_, _> = metadata.metadata_entries().into_iter().collect();
        assert_eq!(entries["name"], MetadataValue::from("i13"));
        assert_eq!(entries["energy"], MetadataValue::Float(12.5));
        assert_eq!(entries["count"], MetadataValue::Int(3));
        assert_eq!(entries["shutter"], MetadataValue::Bool(true));
    }

    #[test]
    fn test_value_to_data_array() {
        let data = DataArray::from(MetadataValue::from("Test Scan"));
        assert_eq!(data.as_scalar_str(), Some("Test Scan"));
        assert_eq!(DataArray::from(MetadataValue::Int(7)).as_scalar_i64(), Some(7));
    }
}
