//! Data devices: how a provider's fields map into an `NXdata` group.

use crate::provider::NexusObjectProvider;
use std::collections::HashMap;

/// How destination names are derived when no per-field name is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldNaming {
    /// Use the source field name, e.g. `data`.
    #[default]
    SourceField,
    /// Use the device name (or its axis name). A device contributing several
    /// fields gets `<device>_<field>`.
    DeviceName,
}

#[derive(Debug, Clone, Default)]
struct FieldOptions {
    destination_name: Option<String>,
    dimension_mappings: Option<Vec<usize>>,
    default_axis_dimension: Option<usize>,
}

/// Wraps a provider with the options that control how its fields enter an
/// `NXdata` group.
///
/// Dimension mappings give, for each dimension of a field, the signal
/// dimension it indexes. They are written as the `<field>_indices`
/// attribute. A field that is the default axis for a signal dimension is
/// named in the group's `axes` attribute.
#[derive(Clone)]
pub struct DataDevice<'a> {
    provider: &'a dyn NexusObjectProvider,
    source_fields: Option<Vec<String>>,
    naming: FieldNaming,
    dimension_mappings: Option<Vec<usize>>,
    default_axis_dimension: Option<usize>,
    fields: HashMap<String, FieldOptions>,
}

impl<'a> DataDevice<'a> {
    pub fn new(provider: &'a dyn NexusObjectProvider) -> Self {
        Self {
            provider,
            source_fields: None,
            naming: FieldNaming::default(),
            dimension_mappings: None,
            default_axis_dimension: None,
            fields: HashMap::new(),
        }
    }

    /// Restricts the device to a subset of the provider's fields.
    #[must_use]
    pub fn with_source_fields(mut self, fields: &[&str]) -> Self {
        self.source_fields = Some(fields.iter().map(|f| (*f).to_string()).collect());
        self
    }

    #[must_use]
    pub fn with_naming(mut self, naming: FieldNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Dimension mappings for every field without its own.
    #[must_use]
    pub fn with_dimension_mappings(mut self, mappings: &[usize]) -> Self {
        self.dimension_mappings = Some(mappings.to_vec());
        self
    }

    /// Makes the provider's default axis field the default axis for `dimension`.
    #[must_use]
    pub fn with_default_axis_dimension(mut self, dimension: usize) -> Self {
        self.default_axis_dimension = Some(dimension);
        self
    }

    #[must_use]
    pub fn with_field_destination(mut self, field: &str, destination: &str) -> Self {
        self.field_options(field).destination_name = Some(destination.to_string());
        self
    }

    #[must_use]
    pub fn with_field_dimension_mappings(mut self, field: &str, mappings: &[usize]) -> Self {
        self.field_options(field).dimension_mappings = Some(mappings.to_vec());
        self
    }

    #[must_use]
    pub fn with_field_default_axis_dimension(mut self, field: &str, dimension: usize) -> Self {
        self.field_options(field).default_axis_dimension = Some(dimension);
        self
    }

    fn field_options(&mut self, field: &str) -> &mut FieldOptions {
        self.fields.entry(field.to_string()).or_default()
    }

    #[must_use]
    pub fn provider(&self) -> &'a dyn NexusObjectProvider {
        self.provider
    }

    #[must_use]
    pub fn naming(&self) -> FieldNaming {
        self.naming
    }

    /// Fields this device contributes: the override subset if set, otherwise
    /// every field the provider declares.
    #[must_use]
    pub fn source_fields(&self) -> Vec<String> {
        self.source_fields
            .clone()
            .unwrap_or_else(|| self.provider.field_names())
    }

    /// Field used as the signal when this is the primary device.
    #[must_use]
    pub fn primary_source_field(&self) -> String {
        self.source_fields
            .as_ref()
            .and_then(|fields| fields.first().cloned())
            .unwrap_or_else(|| self.provider.default_data_field_name().to_string())
    }

    /// Name of `field` inside the `NXdata` group when added as an axis device.
    #[must_use]
    pub fn destination_name(&self, field: &str) -> String {
        if let Some(name) = self.explicit_destination(field) {
            return name;
        }
        match self.naming {
            FieldNaming::SourceField => field.to_string(),
            FieldNaming::DeviceName => {
                let device = self.device_axis_name();
                if self.source_fields().len() == 1 {
                    device.to_string()
                } else {
                    format!("{device}_{field}")
                }
            }
        }
    }

    /// Name of the signal field when this is the primary device.
    #[must_use]
    pub fn primary_destination_name(&self, field: &str) -> String {
        if let Some(name) = self.explicit_destination(field) {
            return name;
        }
        match self.naming {
            FieldNaming::SourceField => field.to_string(),
            FieldNaming::DeviceName => self.device_axis_name().to_string(),
        }
    }

    fn explicit_destination(&self, field: &str) -> Option<String> {
        self.fields
            .get(field)
            .and_then(|options| options.destination_name.clone())
    }

    fn device_axis_name(&self) -> &str {
        self.provider
            .axis_name()
            .unwrap_or_else(|| self.provider.name())
    }

    /// Mappings set for `field` itself.
    #[must_use]
    pub fn field_dimension_mappings(&self, field: &str) -> Option<Vec<usize>> {
        self.fields
            .get(field)
            .and_then(|options| options.dimension_mappings.clone())
    }

    /// Mappings set for the whole device.
    #[must_use]
    pub fn device_dimension_mappings(&self) -> Option<Vec<usize>> {
        self.dimension_mappings.clone()
    }

    /// Explicit mappings for `field`, per-field first. `None` means the
    /// builder derives them.
    #[must_use]
    pub fn dimension_mapping(&self, field: &str) -> Option<Vec<usize>> {
        self.field_dimension_mappings(field)
            .or_else(|| self.device_dimension_mappings())
    }

    /// Signal dimension for which `field` is the default axis.
    #[must_use]
    pub fn default_axis_dimension(&self, field: &str) -> Option<usize> {
        if let Some(dimension) = self
            .fields
            .get(field)
            .and_then(|options| options.default_axis_dimension)
        {
            return Some(dimension);
        }
        if field == self.provider.default_axis_field_name() {
            self.default_axis_dimension
        } else {
            None
        }
    }
}

impl std::fmt::Debug for DataDevice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataDevice")
            .field("provider", &self.provider.name())
            .field("source_fields", &self.source_fields())
            .field("naming", &self.naming)
            .field("dimension_mappings", &self.dimension_mappings)
            .field("default_axis_dimension", &self.default_axis_dimension)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldProvider;
    use nxscribe_tree::{BaseClass, ElementType};

    fn polar_angle() -> FieldProvider {
        FieldProvider::new("polar_angle", BaseClass::Positioner)
            .with_default_data_field("rbv")
            .with_lazy_field("rbv", ElementType::Float64, &[50, 5])
            .with_lazy_field("demand", ElementType::Float64, &[50])
            .with_default_axis_field("demand")
    }

    #[test]
    fn test_source_field_naming() {
        let provider = FieldProvider::detector("det1", &[10]);
        let device = DataDevice::new(&provider);
        assert_eq!(device.source_fields(), vec!["data".to_string()]);
        assert_eq!(device.primary_source_field(), "data");
        assert_eq!(device.destination_name("data"), "data");
        assert_eq!(device.primary_destination_name("data"), "data");
    }

    #[test]
    fn test_device_naming() {
        let provider = FieldProvider::detector("det1", &[10]);
        let device = DataDevice::new(&provider).with_naming(FieldNaming::DeviceName);
        assert_eq!(device.primary_destination_name("data"), "det1");
        assert_eq!(device.destination_name("data"), "det1");

        let provider = polar_angle();
        let device = DataDevice::new(&provider)
            .with_naming(FieldNaming::DeviceName)
            .with_source_fields(&["rbv", "demand"]);
        assert_eq!(device.destination_name("rbv"), "polar_angle_rbv");
        assert_eq!(device.destination_name("demand"), "polar_angle_demand");
    }

    #[test]
    fn test_field_overrides_win() {
        let provider = polar_angle();
        let device = DataDevice::new(&provider)
            .with_naming(FieldNaming::DeviceName)
            .with_dimension_mappings(&[0, 1])
            .with_default_axis_dimension(0)
            .with_field_destination("rbv", "theta")
            .with_field_dimension_mappings("demand", &[1]);

        assert_eq!(device.destination_name("rbv"), "theta");
        assert_eq!(device.dimension_mapping("rbv"), Some(vec![0, 1]));
        assert_eq!(device.dimension_mapping("demand"), Some(vec![1]));
        assert_eq!(device.default_axis_dimension("demand"), Some(0));
        assert_eq!(device.default_axis_dimension("rbv"), None);
    }

    #[test]
    fn test_axis_name_override() {
        let provider = FieldProvider::positioner("smx", &[10]).with_axis_name("x");
        let device = DataDevice::new(&provider).with_naming(FieldNaming::DeviceName);
        assert_eq!(device.destination_name("value"), "x");
    }
}
