//! Error types for nxscribe-builder.

use crate::validation::ValidationReport;
use nxscribe_tree::BaseClass;
use thiserror::Error;

/// Result type alias for builder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of builder errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Naming or placement conflict in the tree.
    Structural,
    /// Dimension mapping does not fit the signal dataset.
    Mapping,
    /// Operation called in the wrong builder state.
    State,
    /// Application-definition requirements not met.
    Validation,
    /// Configuration, serialization or writer failure.
    Io,
}

/// Builder error types.
#[derive(Error, Debug)]
pub enum Error {
    /// A different node already uses this name in the target group.
    #[error("group {parent} already contains a node named '{name}'")]
    DuplicateName { parent: String, name: String },

    /// The file already has an entry with this name.
    #[error("an entry with the name '{0}' already exists")]
    DuplicateEntryName(String),

    /// An explicit category has no registered target group.
    #[error("no group found for category {0}")]
    NoGroupForCategory(BaseClass),

    /// No registered group accepts a child of this base class.
    #[error("cannot find a parent group that accepts a {0}")]
    NoAcceptingParent(BaseClass),

    /// The provider does not expose the requested field.
    #[error("no such field for device '{provider}': {field}")]
    UnknownField { provider: String, field: String },

    /// The provider's group has not been created yet.
    #[error("device '{0}' has not been realized")]
    NotRealized(String),

    /// No provider factory is registered for this base class.
    #[error("no provider factory registered for {0}")]
    NoProviderFactory(BaseClass),

    /// Unknown application definition name.
    #[error("unsupported application definition: {0}")]
    UnsupportedApplicationDefinition(String),

    /// Number of dimension mappings differs from the field's rank.
    #[error(
        "the number of dimension mappings ({mappings}) must equal the rank ({rank}) of the field: {field}"
    )]
    RankMismatch {
        field: String,
        rank: usize,
        mappings: usize,
    },

    /// A dimension index does not address a dimension of the signal field.
    #[error("dimension index for '{field}' must be between 0 and {signal_rank} (exclusive), was {index}")]
    DimensionOutOfRange {
        field: String,
        index: usize,
        signal_rank: usize,
    },

    /// The primary (signal) device has already been set.
    #[error("data device already set: signal field is '{0}'")]
    PrimaryAlreadySet(String),

    /// An axis device was added before the primary device.
    #[error("the primary data device must be set before '{0}' can be added")]
    PrimaryNotSet(String),

    /// A dimension already has a default axis.
    #[error("dimension {dimension} already has the default axis '{existing}', cannot set it to '{requested}'")]
    DefaultAxisAlreadySet {
        dimension: usize,
        existing: String,
        requested: String,
    },

    /// Application-definition validation failed.
    #[error("validation failed with {} violation(s):\n{}", .0.len(), .0)]
    Validation(ValidationReport),

    /// Tree error other than a duplicate name.
    #[error("tree error: {0}")]
    Tree(nxscribe_tree::Error),

    /// The tree writer failed.
    #[error("writer error: {0}")]
    Writer(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DuplicateName { .. }
            | Error::DuplicateEntryName(_)
            | Error::NoGroupForCategory(_)
            | Error::NoAcceptingParent(_)
            | Error::UnknownField { .. }
            | Error::NotRealized(_)
            | Error::NoProviderFactory(_)
            | Error::UnsupportedApplicationDefinition(_)
            | Error::Tree(_) => ErrorKind::Structural,
            Error::RankMismatch { .. } | Error::DimensionOutOfRange { .. } => ErrorKind::Mapping,
            Error::PrimaryAlreadySet(_)
            | Error::PrimaryNotSet(_)
            | Error::DefaultAxisAlreadySet { .. } => ErrorKind::State,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Writer(_) | Error::Config(_) | Error::Json(_) | Error::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<nxscribe_tree::Error> for Error {
    fn from(err: nxscribe_tree::Error) -> Self {
        match err {
            nxscribe_tree::Error::DuplicateName { parent, name } => {
                Error::DuplicateName { parent, name }
            }
            other => Error::Tree(other),
        }
    }
}

impl From<ValidationReport> for Error {
    fn from(report: ValidationReport) -> Self {
        Error::Validation(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_duplicate_maps_to_structural() {
        let err: Error = nxscribe_tree::Error::DuplicateName {
            parent: "NXentry#0".to_string(),
            name: "sample".to_string(),
        }
        .into();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::PrimaryNotSet("x".to_string()).kind(),
            ErrorKind::State
        );
        assert_eq!(
            Error::RankMismatch {
                field: "x".to_string(),
                rank: 1,
                mappings: 2
            }
            .kind(),
            ErrorKind::Mapping
        );
        assert_eq!(
            Error::Validation(ValidationReport::default()).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_validation_message_lists_violations() {
        use crate::validation::{Problem, Violation};

        let mut report = ValidationReport::new();
        report.push(Violation::new("sample/name", Problem::Missing));
        report.push(Violation::new("control", Problem::Missing));
        let message = Error::Validation(report).to_string();
        assert!(message.starts_with("validation failed with 2 violation(s):\n"));
        assert!(message.contains("sample/name"));
        assert!(message.contains("control"));
    }
}
