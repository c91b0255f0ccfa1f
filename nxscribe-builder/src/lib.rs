//! nxscribe-builder: Builders for NeXus files.
//!
//! Turns a set of devices into a self-describing NeXus tree. Each device is
//! a [`NexusObjectProvider`] that creates one group; the builders place
//! those groups, link their fields into `NXdata` groups, and check
//! application-definition subentries.
//!
//! # Key Components
//!
//! - [`FileBuilder`] - owns the root group and its entries, hands the tree to a writer
//! - [`EntryBuilder`] - places device groups and metadata inside one `NXentry`
//! - [`DataBuilder`] - writes the `signal`, `axes` and `<field>_indices` attributes
//! - [`DataDevice`] - per-device options for naming and dimension mapping
//! - [`TomoApplicationBuilder`] - populates an `NXtomo` subentry
//! - [`ApplicationDefinitionValidator`] - checks a subentry against an [`ApplicationSchema`]
//!
//! # Example
//!
//! ```
//! use nxscribe_builder::{DataDevice, FieldProvider, FileBuilder};
//!
//! let detector = FieldProvider::detector("det", &[100]);
//! let x = FieldProvider::positioner("x", &[100]);
//!
//! let mut file = FileBuilder::new("scan.nxs");
//! let entry = file.new_entry("entry").unwrap();
//! entry.add_default_groups().unwrap();
//! entry.add(&detector).unwrap();
//! entry.add(&x).unwrap();
//!
//! let mut data = entry.create_default_data().unwrap();
//! data.set_primary_device(&DataDevice::new(&detector)).unwrap();
//! data.add_axis_provider(&x, Some(0), &[]).unwrap();
//! assert_eq!(data.axes().unwrap(), &["x".to_string()]);
//! ```

pub mod appdef;
pub mod config;
pub mod data_builder;
pub mod device;
pub mod entry;
pub mod error;
pub mod file;
pub mod metadata;
pub mod provider;
pub mod registry;
pub mod validation;

pub use appdef::{
    ApplicationDefinition, ApplicationDefinitionValidator, ApplicationSchema, Requirement,
    RequirementKind, TomoApplicationBuilder,
};
pub use config::BuilderConfig;
pub use data_builder::DataBuilder;
pub use device::{DataDevice, FieldNaming};
pub use entry::{EntryBuilder, EntryModification};
pub use error::{Error, ErrorKind, Result};
pub use file::FileBuilder;
pub use metadata::{MapMetadataProvider, MetadataValue, NexusMetadataProvider};
pub use provider::{FieldProvider, NexusObjectProvider, ProviderDescriptor};
pub use registry::{ProviderFactory, ProviderRegistry};
pub use validation::{Problem, ValidationReport, Violation};
