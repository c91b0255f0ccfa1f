//! Devices that contribute groups to a NeXus tree.
//!
//! A [`NexusObjectProvider`] represents one device (a detector, a motor, a
//! monitor...). It creates its group once, on first use, and reports
//! metadata the builders need to place the group and to wire its fields into
//! an `NXdata` group.

use crate::{Error, Result};
use nxscribe_tree::{BaseClass, DataArray, DataNode, ElementType, GroupNode, NodeFactory};
use std::cell::OnceCell;

/// Default name of the field holding a device's primary data.
pub const DEFAULT_DATA_FIELD: &str = "data";

/// Static description of a device plus its lazily created group.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    name: String,
    base_class: BaseClass,
    category: Option<BaseClass>,
    default_data_field: String,
    default_axis_field: Option<String>,
    axis_name: Option<String>,
    field_names: Vec<String>,
    realized: OnceCell<GroupNode>,
}

impl ProviderDescriptor {
    /// Creates a descriptor named `name`.
    pub fn new(name: impl Into<String>, base_class: BaseClass) -> Self {
        Self {
            name: name.into(),
            base_class,
            category: None,
            default_data_field: DEFAULT_DATA_FIELD.to_string(),
            default_axis_field: None,
            axis_name: None,
            field_names: Vec::new(),
            realized: OnceCell::new(),
        }
    }

    /// Creates a descriptor named after its base class, e.g. `"positioner"`.
    #[must_use]
    pub fn for_base_class(base_class: BaseClass) -> Self {
        Self::new(base_class.default_name(), base_class)
    }

    /// Places the group under the group registered for `category`.
    #[must_use]
    pub fn with_category(mut self, category: BaseClass) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_default_data_field(mut self, field: &str) -> Self {
        self.default_data_field = field.to_string();
        self
    }

    /// Field used when the device provides a default axis. Defaults to the
    /// default data field.
    #[must_use]
    pub fn with_default_axis_field(mut self, field: &str) -> Self {
        self.default_axis_field = Some(field.to_string());
        self
    }

    /// Name used for the device's fields in an `NXdata` group under
    /// [`FieldNaming::DeviceName`](crate::FieldNaming::DeviceName), instead
    /// of the device name.
    #[must_use]
    pub fn with_axis_name(mut self, name: &str) -> Self {
        self.axis_name = Some(name.to_string());
        self
    }

    /// Declares the fields this device exposes, in order.
    #[must_use]
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.field_names = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    fn declare_field(&mut self, field: &str) {
        if !self.field_names.iter().any(|f| f == field) {
            self.field_names.push(field.to_string());
        }
    }
}

/// A device that contributes one group to a NeXus tree.
///
/// Implementors supply a [`ProviderDescriptor`] and build their group in
/// [`create_nexus_object`](NexusObjectProvider::create_nexus_object). The
/// provided methods memoize the group so every caller sees the same node.
pub trait NexusObjectProvider {
    /// Static description of the device.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Builds the device's group. Called at most once per provider.
    ///
    /// # Errors
    /// Returns an error if the group cannot be assembled.
    fn create_nexus_object(&self, factory: &NodeFactory) -> Result<GroupNode>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn base_class(&self) -> BaseClass {
        self.descriptor().base_class
    }

    /// Explicit placement category, if any.
    fn category(&self) -> Option<BaseClass> {
        self.descriptor().category
    }

    fn default_data_field_name(&self) -> &str {
        &self.descriptor().default_data_field
    }

    fn default_axis_field_name(&self) -> &str {
        let descriptor = self.descriptor();
        descriptor
            .default_axis_field
            .as_deref()
            .unwrap_or(&descriptor.default_data_field)
    }

    /// Axis name override, if one was configured.
    fn axis_name(&self) -> Option<&str> {
        self.descriptor().axis_name.as_deref()
    }

    /// Declared field names. A device that declares none exposes just its
    /// default data field.
    fn field_names(&self) -> Vec<String> {
        let descriptor = self.descriptor();
        if descriptor.field_names.is_empty() {
            vec![descriptor.default_data_field.clone()]
        } else {
            descriptor.field_names.clone()
        }
    }

    /// Returns the device's group, creating it on first call.
    ///
    /// # Errors
    /// Propagates errors from [`create_nexus_object`](NexusObjectProvider::create_nexus_object).
    fn realize(&self, factory: &NodeFactory) -> Result<GroupNode> {
        let cell = &self.descriptor().realized;
        if let Some(group) = cell.get() {
            return Ok(group.clone());
        }
        let group = self.create_nexus_object(factory)?;
        if group.base_class() != self.base_class() {
            log::warn!(
                "device '{}' declared {} but created {}",
                self.name(),
                self.base_class(),
                group.nx_class()
            );
        }
        log::debug!("realized device '{}' as {}", self.name(), group.label());
        Ok(cell.get_or_init(|| group).clone())
    }

    /// The device's group if it has been realized.
    fn nexus_object(&self) -> Option<GroupNode> {
        self.descriptor().realized.get().cloned()
    }

    /// Looks up a declared field inside the realized group.
    ///
    /// # Errors
    /// Returns [`Error::NotRealized`] before [`realize`](NexusObjectProvider::realize),
    /// and [`Error::UnknownField`] if the field is undeclared or the group lacks it.
    fn field(&self, name: &str) -> Result<DataNode> {
        let unknown = || Error::UnknownField {
            provider: self.name().to_string(),
            field: name.to_string(),
        };
        if !self.field_names().iter().any(|f| f == name) {
            return Err(unknown());
        }
        let group = self
            .nexus_object()
            .ok_or_else(|| Error::NotRealized(self.name().to_string()))?;
        group.data_node(name).ok_or_else(unknown)
    }
}

/// A provider assembled from field definitions.
///
/// Covers the common case of a device whose group only holds datasets:
///
/// ```
/// use nxscribe_builder::{FieldProvider, NexusObjectProvider};
/// use nxscribe_tree::{BaseClass, NodeFactory};
///
/// let motor = FieldProvider::positioner("theta", &[50]);
/// let group = motor.realize(&NodeFactory::new()).unwrap();
/// assert_eq!(group.base_class(), BaseClass::Positioner);
/// assert_eq!(motor.field("value").unwrap().shape(), vec![50]);
/// ```
#[derive(Debug, Clone)]
pub struct FieldProvider {
    descriptor: ProviderDescriptor,
    fields: Vec<(String, DataArray)>,
}

impl FieldProvider {
    /// Creates a provider with no fields.
    pub fn new(name: impl Into<String>, base_class: BaseClass) -> Self {
        Self::from_descriptor(ProviderDescriptor::new(name, base_class))
    }

    /// Creates a provider from a prepared descriptor.
    #[must_use]
    pub fn from_descriptor(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            fields: Vec::new(),
        }
    }

    /// Detector with a lazy float `data` field.
    #[must_use]
    pub fn detector(name: &str, shape: &[usize]) -> Self {
        Self::new(name, BaseClass::Detector)
            .with_lazy_field(DEFAULT_DATA_FIELD, ElementType::Float64, shape)
    }

    /// Positioner with a lazy float `value` field as its default field.
    #[must_use]
    pub fn positioner(name: &str, shape: &[usize]) -> Self {
        Self::new(name, BaseClass::Positioner)
            .with_default_data_field("value")
            .with_lazy_field("value", ElementType::Float64, shape)
    }

    /// Monitor with a lazy float `data` field.
    #[must_use]
    pub fn monitor(name: &str, shape: &[usize]) -> Self {
        Self::new(name, BaseClass::Monitor)
            .with_lazy_field(DEFAULT_DATA_FIELD, ElementType::Float64, shape)
    }

    /// Adds a field holding `data` and declares it.
    #[must_use]
    pub fn with_field(mut self, name: &str, data: impl Into<DataArray>) -> Self {
        self.descriptor.declare_field(name);
        self.fields.push((name.to_string(), data.into()));
        self
    }

    /// Adds a lazy field of the given type and shape.
    #[must_use]
    pub fn with_lazy_field(self, name: &str, element_type: ElementType, shape: &[usize]) -> Self {
        self.with_field(name, DataArray::lazy(element_type, shape))
    }

    #[must_use]
    pub fn with_category(mut self, category: BaseClass) -> Self {
        self.descriptor = self.descriptor.with_category(category);
        self
    }

    #[must_use]
    pub fn with_default_data_field(mut self, field: &str) -> Self {
        self.descriptor = self.descriptor.with_default_data_field(field);
        self
    }

    #[must_use]
    pub fn with_default_axis_field(mut self, field: &str) -> Self {
        self.descriptor = self.descriptor.with_default_axis_field(field);
        self
    }

    #[must_use]
    pub fn with_axis_name(mut self, name: &str) -> Self {
        self.descriptor = self.descriptor.with_axis_name(name);
        self
    }
}

impl NexusObjectProvider for FieldProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn create_nexus_object(&self, factory: &NodeFactory) -> Result<GroupNode> {
        let group = factory.create_group(self.descriptor.base_class);
        for (name, data) in &self.fields {
            group.create_data(factory, name, data.clone())?;
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingProvider {
        descriptor: ProviderDescriptor,
        calls: Cell<usize>,
    }

    impl NexusObjectProvider for CountingProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        fn create_nexus_object(&self, factory: &NodeFactory) -> Result<GroupNode> {
            self.calls.set(self.calls.get() + 1);
            let group = factory.create_group(BaseClass::Source);
            group.create_data(factory, "data", 1.0)?;
            Ok(group)
        }
    }

    #[test]
    fn test_realize_is_memoized() {
        let provider = CountingProvider {
            descriptor: ProviderDescriptor::for_base_class(BaseClass::Source),
            calls: Cell::new(0),
        };
        let factory = NodeFactory::new();
        assert!(provider.nexus_object().is_none());

        let first = provider.realize(&factory).unwrap();
        let second = provider.realize(&factory).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(provider.calls.get(), 1);
        assert_eq!(provider.name(), "source");
    }

    #[test]
    fn test_field_lookup() {
        let provider = FieldProvider::detector("det1", &[50, 5, 1024]);
        assert!(matches!(provider.field("data"), Err(Error::NotRealized(_))));

        provider.realize(&NodeFactory::new()).unwrap();
        assert_eq!(provider.field("data").unwrap().rank(), 3);
        assert!(matches!(
            provider.field("image_key"),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_declared_but_missing_field() {
        let descriptor =
            ProviderDescriptor::new("sensor", BaseClass::Monitor).with_fields(&["data", "gain"]);
        let provider = FieldProvider::from_descriptor(descriptor).with_field("data", 0.5);
        provider.realize(&NodeFactory::new()).unwrap();

        assert!(provider.field("data").is_ok());
        assert!(matches!(
            provider.field("gain"),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_default_axis_field_falls_back_to_data_field() {
        let provider = FieldProvider::positioner("theta", &[10]);
        assert_eq!(provider.default_data_field_name(), "value");
        assert_eq!(provider.default_axis_field_name(), "value");
        assert_eq!(provider.field_names(), vec!["value".to_string()]);

        let provider = provider.with_default_axis_field("demand");
        assert_eq!(provider.default_axis_field_name(), "demand");
    }
}
