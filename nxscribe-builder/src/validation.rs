//! Validation reports for application definitions.

use nxscribe_tree::BaseClass;
use std::fmt;

/// What is wrong with one required element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// Nothing exists at the required path.
    Missing,
    /// A group exists where a field is required.
    ExpectedField,
    /// A field exists where a group is required.
    ExpectedGroup(BaseClass),
    /// The group has the wrong base class.
    WrongBaseClass {
        expected: BaseClass,
        found: BaseClass,
    },
    /// The field has the wrong rank.
    WrongRank { expected: usize, found: usize },
    /// The field does not hold the required string value.
    WrongValue {
        expected: String,
        found: Option<String>,
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Missing => f.write_str("required element is missing"),
            Problem::ExpectedField => f.write_str("expected a field, found a group"),
            Problem::ExpectedGroup(class) => write!(f, "expected a {class} group, found a field"),
            Problem::WrongBaseClass { expected, found } => {
                write!(f, "expected a {expected} group, found {found}")
            }
            Problem::WrongRank { expected, found } => {
                write!(f, "expected rank {expected}, found rank {found}")
            }
            Problem::WrongValue { expected, found } => match found {
                Some(found) => write!(f, "expected value '{expected}', found '{found}'"),
                None => write!(f, "expected string value '{expected}'"),
            },
        }
    }
}

/// One unmet requirement, located by its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the offending element.
    pub path: String,
    /// What is wrong with it.
    pub problem: Problem,
}

impl Violation {
    pub fn new(path: impl Into<String>, problem: Problem) -> Self {
        Self {
            path: path.into(),
            problem,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

/// All violations found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Appends `other`, prefixing each path with `prefix/`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationReport) {
        self.violations
            .extend(other.violations.into_iter().map(|mut violation| {
                violation.path = nxscribe_tree::node::join_path(prefix, &violation.path);
                violation
            }));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true if some violation concerns exactly `path`.
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    /// `Ok(())` when empty, otherwise the report itself as the error.
    ///
    /// # Errors
    /// Returns `self` if it holds at least one violation.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {violation}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationReport {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefixed() {
        let mut inner = ValidationReport::new();
        inner.push(Violation::new("sample/rotation_angle", Problem::Missing));

        let mut outer = ValidationReport::new();
        outer.merge_prefixed("tomo_entry", inner);
        assert_eq!(outer.len(), 1);
        assert!(outer.contains_path("tomo_entry/sample/rotation_angle"));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationReport::new().into_result().is_ok());

        let mut report = ValidationReport::new();
        report.push(Violation::new(
            "data/data",
            Problem::WrongRank {
                expected: 3,
                found: 1,
            },
        ));
        let err = report.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "  - data/data: expected rank 3, found rank 1"
        );
    }
}
