//! Application definitions: subentries that follow a fixed NeXus layout.

pub mod schema;
pub mod tomo;

pub use schema::{ApplicationDefinitionValidator, ApplicationSchema, Requirement, RequirementKind};
pub use tomo::TomoApplicationBuilder;

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// Known NeXus application definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationDefinition {
    Tomo,
    Xas,
    Mx,
    Sas,
    Fluo,
    Stxm,
    Archive,
}

impl ApplicationDefinition {
    pub const ALL: [ApplicationDefinition; 7] = [
        ApplicationDefinition::Tomo,
        ApplicationDefinition::Xas,
        ApplicationDefinition::Mx,
        ApplicationDefinition::Sas,
        ApplicationDefinition::Fluo,
        ApplicationDefinition::Stxm,
        ApplicationDefinition::Archive,
    ];

    /// Definition name as written to the `definition` field.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ApplicationDefinition::Tomo => "NXtomo",
            ApplicationDefinition::Xas => "NXxas",
            ApplicationDefinition::Mx => "NXmx",
            ApplicationDefinition::Sas => "NXsas",
            ApplicationDefinition::Fluo => "NXfluo",
            ApplicationDefinition::Stxm => "NXstxm",
            ApplicationDefinition::Archive => "NXarchive",
        }
    }

    /// Built-in schema, if this definition is supported.
    #[must_use]
    pub fn schema(self) -> Option<ApplicationSchema> {
        match self {
            ApplicationDefinition::Tomo => Some(ApplicationSchema::nx_tomo()),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApplicationDefinition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationDefinition::ALL
            .iter()
            .copied()
            .find(|definition| definition.name() == s)
            .ok_or_else(|| Error::UnsupportedApplicationDefinition(s.to_string()))
    }
}
