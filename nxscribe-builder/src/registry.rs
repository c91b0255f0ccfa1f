//! Lookup of provider constructors by base class.

use crate::provider::NexusObjectProvider;
use crate::{Error, Result};
use nxscribe_tree::BaseClass;
use std::collections::HashMap;

/// Constructs a named provider.
pub type ProviderFactory = Box<dyn Fn(&str) -> Box<dyn NexusObjectProvider>>;

/// Maps base classes to provider constructors.
///
/// Hosts register one constructor per base class and create devices by
/// class and name, e.g. from a scan description.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<BaseClass, ProviderFactory>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `base_class`, returning the one it replaces.
    pub fn register<F>(&mut self, base_class: BaseClass, factory: F) -> Option<ProviderFactory>
    where
        F: Fn(&str) -> Box<dyn NexusObjectProvider> + 'static,
    {
        self.factories.insert(base_class, Box::new(factory))
    }

    #[must_use]
    pub fn contains(&self, base_class: BaseClass) -> bool {
        self.factories.contains_key(&base_class)
    }

    /// Registered base classes, sorted.
    #[must_use]
    pub fn base_classes(&self) -> Vec<BaseClass> {
        let mut classes: Vec<_> = self.factories.keys().copied().collect();
        classes.sort();
        classes
    }

    /// Creates a provider of class `base_class` named `name`.
    ///
    /// # Errors
    /// Returns [`Error::NoProviderFactory`] if nothing is registered for the class.
    pub fn create(&self, base_class: BaseClass, name: &str) -> Result<Box<dyn NexusObjectProvider>> {
        let factory = self
            .factories
            .get(&base_class)
            .ok_or(Error::NoProviderFactory(base_class))?;
        Ok(factory(name))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("base_classes", &self.base_classes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldProvider;

    #[test]
    fn test_create_by_class() {
        let mut registry = ProviderRegistry::new();
        registry.register(BaseClass::Positioner, |name| {
            Box::new(FieldProvider::positioner(name, &[10]))
        });

        let provider = registry.create(BaseClass::Positioner, "x").unwrap();
        assert_eq!(provider.name(), "x");
        assert_eq!(provider.base_class(), BaseClass::Positioner);
        assert!(matches!(
            registry.create(BaseClass::Detector, "det"),
            Err(Error::NoProviderFactory(BaseClass::Detector))
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ProviderRegistry::new();
        assert!(registry
            .register(BaseClass::Monitor, |name| Box::new(FieldProvider::monitor(name, &[1])))
            .is_none());
        assert!(registry
            .register(BaseClass::Monitor, |name| Box::new(FieldProvider::monitor(name, &[2])))
            .is_some());
        assert_eq!(registry.base_classes(), vec![BaseClass::Monitor]);
    }
}
