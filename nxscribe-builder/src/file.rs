//! Top-level builder owning the root group and its entries.

use crate::config::BuilderConfig;
use crate::entry::EntryBuilder;
use crate::validation::ValidationReport;
use crate::{Error, Result};
use nxscribe_tree::{BaseClass, GroupNode, NodeFactory, TreeWriter};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Attribute on the root group naming the target file.
pub const FILE_NAME_ATTR: &str = "file_name";

/// Builds a NeXus file: an `NXroot` group holding named entries.
///
/// ```
/// use nxscribe_builder::{FileBuilder, FieldProvider};
///
/// let mut file = FileBuilder::new("scan.nxs");
/// let entry = file.new_entry("entry").unwrap();
/// entry.add_default_groups().unwrap();
///
/// let detector = FieldProvider::detector("det1", &[100]);
/// entry.add(&detector).unwrap();
/// assert!(file.root().find_group("entry/instrument/det1").is_ok());
/// ```
#[derive(Debug)]
pub struct FileBuilder {
    path: PathBuf,
    factory: NodeFactory,
    config: BuilderConfig,
    root: GroupNode,
    entries: BTreeMap<String, EntryBuilder>,
}

impl FileBuilder {
    /// Creates a builder for the file at `path` with default settings.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::build(path.as_ref(), BuilderConfig::default())
    }

    /// Creates a builder with the given settings.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `config` fails [`BuilderConfig::validate`].
    pub fn with_config(path: impl AsRef<Path>, config: BuilderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(path.as_ref(), config))
    }

    fn build(path: &Path, config: BuilderConfig) -> Self {
        let path = path.to_path_buf();
        let factory = NodeFactory::new();
        let root = factory.create_group(BaseClass::Root);
        root.set_attribute(FILE_NAME_ATTR, path.to_string_lossy().into_owned());
        Self {
            path,
            factory,
            config,
            root,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `NXroot` group.
    #[must_use]
    pub fn root(&self) -> &GroupNode {
        &self.root
    }

    /// Factory shared by every node of this file.
    #[must_use]
    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Creates an entry named `name`.
    ///
    /// When the configuration asks for it, the entry gets its default groups
    /// and instrument name.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateEntryName`] if the name is taken.
    pub fn new_entry(&mut self, name: &str) -> Result<&mut EntryBuilder> {
        if self.entries.contains_key(name) || self.root.contains(name) {
            return Err(Error::DuplicateEntryName(name.to_string()));
        }
        let entry = self
            .root
            .create_group(&self.factory, name, BaseClass::Entry)?;
        let mut builder = EntryBuilder::new(self.factory.clone(), entry, self.config.clone());
        if self.config.add_default_groups {
            builder.add_default_groups()?;
            if let Some(instrument_name) = &self.config.instrument_name {
                builder.set_instrument_name(instrument_name)?;
            }
        }
        log::debug!("created entry '{name}'");
        Ok(self.entries.entry(name.to_string()).or_insert(builder))
    }

    /// Creates the entry with the configured default name.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateEntryName`] if it already exists.
    pub fn new_default_entry(&mut self) -> Result<&mut EntryBuilder> {
        let name = self.config.default_entry_name.clone();
        self.new_entry(&name)
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&EntryBuilder> {
        self.entries.get(name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut EntryBuilder> {
        self.entries.get_mut(name)
    }

    /// Entry names, sorted.
    #[must_use]
    pub fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Validates the application subentries of every entry.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] listing all violations, with paths
    /// relative to the root.
    pub fn validate(&self) -> Result<()> {
        let mut report = ValidationReport::new();
        for (name, entry) in &self.entries {
            report.merge_prefixed(name, entry.validation_report());
        }
        Ok(report.into_result()?)
    }

    /// Hands the finished tree to `writer`.
    ///
    /// # Errors
    /// Returns [`Error::Writer`] wrapping the first backend failure.
    pub fn save<W: TreeWriter>(&self, writer: &mut W) -> Result<()> {
        log::info!("saving NeXus tree to {}", self.path.display());
        writer
            .create_and_open_for_write(&self.path)
            .map_err(writer_error)?;
        writer.add_node("/", &self.root).map_err(writer_error)?;
        writer.flush().map_err(writer_error)?;
        Ok(())
    }
}

fn writer_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    Error::Writer(Box::new(err))
}
