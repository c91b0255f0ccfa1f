//! nxscribe-tree: In-memory NeXus node tree.
//!
//! This crate provides the node model that the builders in `nxscribe-builder`
//! assemble: groups tagged with a NeXus base class, typed datasets, and the
//! attributes attached to both.
//!
//! # Key Components
//!
//! - [`GroupNode`] - ordered mapping of child name to child node, plus attributes
//! - [`DataNode`] - typed multi-dimensional array plus attributes
//! - [`BaseClass`] - NeXus base-class tag with the child compatibility table
//! - [`NodeFactory`] - hands out node ids for freshly created nodes
//! - [`TreeWriter`] - boundary to the serialization backend
//!
//! A data node may be registered under more than one group. This is how a
//! dataset is linked into an `NXdata` group without copying it.

pub mod attribute;
pub mod base_class;
pub mod data;
pub mod error;
pub mod node;
pub mod writer;

pub use attribute::{Attribute, AttributeValue};
pub use base_class::BaseClass;
pub use data::{DataArray, ElementType};
pub use error::{Error, Result};
pub use node::{DataNode, GroupNode, Node, NodeFactory, NodeId};
pub use writer::TreeWriter;

/// Name of the attribute carrying a group's NeXus class.
pub const NX_CLASS: &str = "NX_class";
