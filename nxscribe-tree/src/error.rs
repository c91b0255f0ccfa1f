//! Error types for nxscribe-tree.

use thiserror::Error;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while mutating or querying a node tree.
#[derive(Error, Debug)]
pub enum Error {
    /// A different node is already registered under this name.
    #[error("group {parent} already contains a node named '{name}'")]
    DuplicateName { parent: String, name: String },

    /// An attribute with this name already exists on the node.
    #[error("node {node} already has an attribute named '{name}'")]
    DuplicateAttribute { node: String, name: String },

    /// Path lookup failed.
    #[error("no node found at path: {0}")]
    NoSuchNode(String),

    /// Path resolved to a data node where a group was expected.
    #[error("node at path '{0}' is not a group")]
    NotAGroup(String),

    /// Path resolved to a group where a data node was expected.
    #[error("node at path '{0}' is not a data node")]
    NotADataNode(String),

    /// Array data does not fit the requested shape.
    #[error("invalid shape: {0}")]
    InvalidShape(String),
}
