//! Builds one `NXentry`: device placement, metadata, data groups and
//! application-definition subentries.

use crate::appdef::{
    ApplicationDefinition, ApplicationDefinitionValidator, ApplicationSchema,
    TomoApplicationBuilder,
};
use crate::config::BuilderConfig;
use crate::data_builder::DataBuilder;
use crate::metadata::NexusMetadataProvider;
use crate::provider::NexusObjectProvider;
use crate::validation::ValidationReport;
use crate::{Error, Result};
use nxscribe_tree::{BaseClass, DataNode, GroupNode, Node, NodeFactory};
use std::collections::HashSet;

const SAMPLE: &str = "sample";

/// One change applied by [`EntryBuilder::modify_entry`].
pub enum EntryModification<'a> {
    /// Place a device's group.
    Provider(&'a dyn NexusObjectProvider),
    /// Write scalar metadata fields.
    Metadata(&'a dyn NexusMetadataProvider),
    /// Edit the entry group directly.
    Custom(Box<dyn FnOnce(&GroupNode) -> Result<()> + 'a>),
}

impl std::fmt::Debug for EntryModification<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryModification::Provider(provider) => {
                f.debug_tuple("Provider").field(&provider.name()).finish()
            }
            EntryModification::Metadata(_) => f.write_str("Metadata"),
            EntryModification::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A validator bound to the subentry it checks.
#[derive(Debug)]
struct Application {
    name: String,
    subentry: GroupNode,
    validator: ApplicationDefinitionValidator,
}

/// Builds one `NXentry`.
///
/// Placement works on a list of target groups, starting with the entry
/// itself. [`add_default_groups`](Self::add_default_groups) appends the
/// `instrument` and `sample` groups. A device with an explicit category goes
/// into the target of that class; otherwise it goes into the first target
/// whose class accepts it.
#[derive(Debug)]
pub struct EntryBuilder {
    factory: NodeFactory,
    config: BuilderConfig,
    entry: GroupNode,
    targets: Vec<GroupNode>,
    instrument: Option<GroupNode>,
    sample: Option<GroupNode>,
    placed: Vec<GroupNode>,
    applications: Vec<Application>,
}

impl EntryBuilder {
    pub(crate) fn new(factory: NodeFactory, entry: GroupNode, config: BuilderConfig) -> Self {
        Self {
            factory,
            config,
            targets: vec![entry.clone()],
            entry,
            instrument: None,
            sample: None,
            placed: Vec::new(),
            applications: Vec::new(),
        }
    }

    /// The entry group.
    #[must_use]
    pub fn nx_entry(&self) -> &GroupNode {
        &self.entry
    }

    #[must_use]
    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    #[must_use]
    pub fn instrument(&self) -> Option<&GroupNode> {
        self.instrument.as_ref()
    }

    #[must_use]
    pub fn sample(&self) -> Option<&GroupNode> {
        self.sample.as_ref()
    }

    /// Creates the `instrument` and `sample` groups and registers them as
    /// placement targets.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if either name is already used.
    pub fn add_default_groups(&mut self) -> Result<()> {
        let instrument = self
            .entry
            .create_group(&self.factory, "instrument", BaseClass::Instrument)?;
        let sample = self
            .entry
            .create_group(&self.factory, SAMPLE, BaseClass::Sample)?;
        self.targets.push(instrument.clone());
        self.targets.push(sample.clone());
        self.instrument = Some(instrument);
        self.sample = Some(sample);
        Ok(())
    }

    /// Sets the instrument's `name` field, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`Error::NoGroupForCategory`] if there is no instrument group.
    pub fn set_instrument_name(&mut self, name: &str) -> Result<()> {
        let instrument = self
            .instrument
            .as_ref()
            .ok_or(Error::NoGroupForCategory(BaseClass::Instrument))?;
        instrument.set_child("name", &self.factory.create_data(name));
        Ok(())
    }

    /// Places a device's group in the entry.
    ///
    /// An `NXsample` device replaces the entry's sample group instead.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if an `NXsample` device would
    /// replace something under `sample` that is not an `NXsample` group.
    /// Returns [`Error::NoGroupForCategory`] or [`Error::NoAcceptingParent`]
    /// if no target fits, and [`Error::DuplicateName`] if the parent already
    /// holds a node under the device's name.
    pub fn add(&mut self, provider: &dyn NexusObjectProvider) -> Result<GroupNode> {
        let parent = if provider.base_class() == BaseClass::Sample {
            None
        } else {
            Some(self.parent_for(provider)?)
        };
        let group = provider.realize(&self.factory)?;

        match parent {
            None => self.replace_sample(&group)?,
            Some(parent) => {
                parent.ensure_free(provider.name())?;
                parent.add_group(provider.name(), &group)?;
                log::debug!(
                    "placed device '{}' ({}) under {}",
                    provider.name(),
                    provider.base_class(),
                    parent.label()
                );
            }
        }
        self.placed.push(group.clone());
        Ok(group)
    }

    /// Places several devices, stopping at the first failure.
    ///
    /// # Errors
    /// See [`add`](Self::add).
    pub fn add_all<'a>(
        &mut self,
        providers: impl IntoIterator<Item = &'a dyn NexusObjectProvider>,
    ) -> Result<()> {
        for provider in providers {
            self.add(provider)?;
        }
        Ok(())
    }

    fn parent_for(&self, provider: &dyn NexusObjectProvider) -> Result<GroupNode> {
        match provider.category() {
            Some(category) => self.group_for_category(category),
            None => {
                let base_class = provider.base_class();
                self.targets
                    .iter()
                    .find(|group| group.base_class().can_add_child(base_class))
                    .cloned()
                    .ok_or(Error::NoAcceptingParent(base_class))
            }
        }
    }

    fn group_for_category(&self, category: BaseClass) -> Result<GroupNode> {
        if category == BaseClass::Entry {
            return Ok(self.entry.clone());
        }
        self.targets
            .iter()
            .find(|group| group.base_class() == category)
            .cloned()
            .ok_or(Error::NoGroupForCategory(category))
    }

    fn replace_sample(&mut self, group: &GroupNode) -> Result<()> {
        let replaceable = match self.entry.child(SAMPLE) {
            None => true,
            Some(Node::Group(existing)) => existing.base_class() == BaseClass::Sample,
            Some(Node::Data(_)) => false,
        };
        if !replaceable {
            return Err(Error::DuplicateName {
                parent: self.entry.label(),
                name: SAMPLE.to_string(),
            });
        }
        if let Some(old) = self.sample.take() {
            self.targets.retain(|target| !target.ptr_eq(&old));
        }
        self.entry.set_child(SAMPLE, group);
        self.targets.push(group.clone());
        self.sample = Some(group.clone());
        log::debug!("replaced sample group with {}", group.label());
        Ok(())
    }

    /// Returns the group placed for `provider`.
    ///
    /// # Errors
    /// Returns [`Error::NotRealized`] if the provider was never added to this entry.
    pub fn nexus_object(&self, provider: &dyn NexusObjectProvider) -> Result<GroupNode> {
        provider
            .nexus_object()
            .filter(|group| self.placed.iter().any(|placed| placed.ptr_eq(group)))
            .ok_or_else(|| Error::NotRealized(provider.name().to_string()))
    }

    /// Writes metadata fields into the entry or the group for the
    /// provider's category. All names are checked before anything is written.
    ///
    /// # Errors
    /// Returns [`Error::NoGroupForCategory`] if the category has no group and
    /// [`Error::DuplicateName`] if a field name is taken.
    pub fn add_metadata(&mut self, metadata: &dyn NexusMetadataProvider) -> Result<()> {
        let group = match metadata.category() {
            None => self.entry.clone(),
            Some(category) => self.group_for_category(category)?,
        };
        let entries = metadata.metadata_entries();

        let mut seen = HashSet::new();
        for (name, _) in &entries {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateName {
                    parent: group.label(),
                    name: name.clone(),
                });
            }
            group.ensure_free(name)?;
        }
        for (name, value) in entries {
            group.create_data(&self.factory, &name, value)?;
        }
        Ok(())
    }

    /// Applies modifications in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the first error raised by a modification.
    pub fn modify_entry<'a>(
        &mut self,
        modifications: impl IntoIterator<Item = EntryModification<'a>>,
    ) -> Result<()> {
        for modification in modifications {
            match modification {
                EntryModification::Provider(provider) => {
                    self.add(provider)?;
                }
                EntryModification::Metadata(metadata) => self.add_metadata(metadata)?,
                EntryModification::Custom(edit) => edit(&self.entry)?,
            }
        }
        Ok(())
    }

    /// Resolves a data node by path relative to the entry.
    ///
    /// # Errors
    /// Returns a tree error if nothing, or a group, exists at `path`.
    pub fn data_node(&self, path: &str) -> Result<DataNode> {
        Ok(self.entry.find_data_node(path)?)
    }

    /// Creates a new `NXdata` group named `name`.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if `name` is taken.
    pub fn new_data(&mut self, name: &str) -> Result<DataBuilder> {
        let nx_data = self
            .entry
            .create_group(&self.factory, name, BaseClass::Data)?;
        Ok(DataBuilder::new(
            self.factory.clone(),
            nx_data,
            &self.config.axis_placeholder,
        ))
    }

    /// Creates the `NXdata` group with the configured default name.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if the name is taken.
    pub fn create_default_data(&mut self) -> Result<DataBuilder> {
        let name = self.config.default_data_name.clone();
        self.new_data(&name)
    }

    /// Creates the subentry for an application definition.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedApplicationDefinition`] for definitions
    /// other than `NXtomo`, and [`Error::DuplicateName`] if the subentry exists.
    pub fn new_application(
        &mut self,
        definition: ApplicationDefinition,
    ) -> Result<TomoApplicationBuilder> {
        if definition != ApplicationDefinition::Tomo {
            return Err(Error::UnsupportedApplicationDefinition(
                definition.name().to_string(),
            ));
        }
        let subentry = self.create_subentry(&ApplicationSchema::nx_tomo())?;
        let builder = TomoApplicationBuilder::new(self.factory.clone(), subentry.clone());
        self.applications.push(Application {
            name: ApplicationSchema::nx_tomo().subentry_name(),
            subentry,
            validator: builder.validator().clone(),
        });
        Ok(builder)
    }

    /// Creates a subentry for a custom definition and validates it with
    /// `schema` from then on.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if the subentry exists.
    pub fn add_application_schema(&mut self, schema: ApplicationSchema) -> Result<GroupNode> {
        let subentry = self.create_subentry(&schema)?;
        self.applications.push(Application {
            name: schema.subentry_name(),
            subentry: subentry.clone(),
            validator: ApplicationDefinitionValidator::new(schema),
        });
        Ok(subentry)
    }

    fn create_subentry(&mut self, schema: &ApplicationSchema) -> Result<GroupNode> {
        let name = schema.subentry_name();
        let subentry = self
            .entry
            .create_group(&self.factory, &name, BaseClass::Subentry)?;
        subentry.create_data(&self.factory, "definition", schema.name())?;
        log::debug!("created {} subentry '{}'", schema.name(), name);
        Ok(subentry)
    }

    /// Collects violations from every application subentry, with paths
    /// relative to the entry.
    #[must_use]
    pub fn validation_report(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for application in &self.applications {
            if let Err(violations) = application.validator.validate(&application.subentry) {
                report.merge_prefixed(&application.name, violations);
            }
        }
        report
    }

    /// Validates every application subentry.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] listing all violations.
    pub fn validate(&self) -> Result<()> {
        Ok(self.validation_report().into_result()?)
    }
}
