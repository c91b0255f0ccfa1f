//! Schema-driven validation of application-definition subentries.

use crate::validation::{Problem, ValidationReport, Violation};
use nxscribe_tree::{BaseClass, GroupNode, Node};

/// What must exist at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementKind {
    /// A group of the given base class.
    Group(BaseClass),
    /// A field, optionally of a fixed rank.
    Field { rank: Option<usize> },
    /// A scalar string field with this exact value.
    FieldValue(String),
}

/// One required element of an application definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Path relative to the subentry.
    pub path: String,
    pub kind: RequirementKind,
}

/// Required elements of one application definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSchema {
    name: String,
    requirements: Vec<Requirement>,
}

impl ApplicationSchema {
    /// Creates an empty schema for the definition `name`, e.g. `"NXtomo"`.
    ///
    /// Every schema requires a `definition` field holding its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            requirements: vec![Requirement {
                path: "definition".to_string(),
                kind: RequirementKind::FieldValue(name.clone()),
            }],
            name,
        }
    }

    #[must_use]
    pub fn group(mut self, path: &str, base_class: BaseClass) -> Self {
        self.push(path, RequirementKind::Group(base_class));
        self
    }

    #[must_use]
    pub fn field(mut self, path: &str) -> Self {
        self.push(path, RequirementKind::Field { rank: None });
        self
    }

    #[must_use]
    pub fn field_with_rank(mut self, path: &str, rank: usize) -> Self {
        self.push(path, RequirementKind::Field { rank: Some(rank) });
        self
    }

    #[must_use]
    pub fn field_value(mut self, path: &str, value: &str) -> Self {
        self.push(path, RequirementKind::FieldValue(value.to_string()));
        self
    }

    fn push(&mut self, path: &str, kind: RequirementKind) {
        self.requirements.push(Requirement {
            path: path.to_string(),
            kind,
        });
    }

    /// Definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Name of the subentry holding this definition: `NXtomo` gives `tomo_entry`.
    #[must_use]
    pub fn subentry_name(&self) -> String {
        let short = self.name.strip_prefix("NX").unwrap_or(&self.name);
        format!("{}_entry", short.to_lowercase())
    }

    /// Schema of the `NXtomo` application definition.
    #[must_use]
    pub fn nx_tomo() -> Self {
        Self::new("NXtomo")
            .group("instrument", BaseClass::Instrument)
            .group("instrument/source", BaseClass::Source)
            .group("instrument/detector", BaseClass::Detector)
            .field_with_rank("instrument/detector/data", 3)
            .field_with_rank("instrument/detector/image_key", 1)
            .group("sample", BaseClass::Sample)
            .field("sample/name")
            .field_with_rank("sample/rotation_angle", 1)
            .group("control", BaseClass::Monitor)
            .field_with_rank("control/data", 1)
            .group("data", BaseClass::Data)
            .field_with_rank("data/data", 3)
            .field_with_rank("data/rotation_angle", 1)
            .field_with_rank("data/image_key", 1)
    }
}

/// Checks a subentry against an [`ApplicationSchema`].
#[derive(Debug, Clone)]
pub struct ApplicationDefinitionValidator {
    schema: ApplicationSchema,
}

impl ApplicationDefinitionValidator {
    #[must_use]
    pub fn new(schema: ApplicationSchema) -> Self {
        Self { schema }
    }

    #[must_use]
    pub fn schema(&self) -> &ApplicationSchema {
        &self.schema
    }

    /// Validates `subentry`, reporting every unmet requirement.
    ///
    /// # Errors
    /// Returns a report with one violation per unmet requirement. A missing
    /// group also reports each required element beneath it.
    pub fn validate(&self, subentry: &GroupNode) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::new();
        for requirement in self.schema.requirements() {
            if let Some(problem) = check(subentry, requirement) {
                report.push(Violation::new(&requirement.path, problem));
            }
        }
        if !report.is_empty() {
            log::warn!(
                "{} validation of {} found {} violation(s)",
                self.schema.name(),
                subentry.label(),
                report.len()
            );
        }
        report.into_result()
    }
}

fn check(subentry: &GroupNode, requirement: &Requirement) -> Option<Problem> {
    let Some(node) = subentry.find_node(&requirement.path) else {
        return Some(Problem::Missing);
    };
    match (&requirement.kind, node) {
        (RequirementKind::Group(expected), Node::Group(group)) => {
            let found = group.base_class();
            (found != *expected).then_some(Problem::WrongBaseClass {
                expected: *expected,
                found,
            })
        }
        (RequirementKind::Group(expected), Node::Data(_)) => Some(Problem::ExpectedGroup(*expected)),
        (RequirementKind::Field { .. } | RequirementKind::FieldValue(_), Node::Group(_)) => {
            Some(Problem::ExpectedField)
        }
        (RequirementKind::Field { rank }, Node::Data(data)) => {
            let found = data.rank();
            match rank {
                Some(expected) if *expected != found => Some(Problem::WrongRank {
                    expected: *expected,
                    found,
                }),
                _ => None,
            }
        }
        (RequirementKind::FieldValue(expected), Node::Data(data)) => {
            let found = data.read(|array| array.as_scalar_str().map(str::to_string));
            (found.as_deref() != Some(expected.as_str())).then(|| Problem::WrongValue {
                expected: expected.clone(),
                found,
            })
        }
    }
}
