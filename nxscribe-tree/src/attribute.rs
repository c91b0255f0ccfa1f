//! Node attributes.

use crate::data::ElementType;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value of an attribute: a scalar or a 1-D array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttributeValue {
    String(String),
    StringArray(Vec<String>),
    Int(i64),
    IntArray(Vec<i64>),
    Float(f64),
    FloatArray(Vec<f64>),
}

impl AttributeValue {
    /// Element type of the value.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            AttributeValue::String(_) | AttributeValue::StringArray(_) => ElementType::String,
            AttributeValue::Int(_) | AttributeValue::IntArray(_) => ElementType::Int64,
            AttributeValue::Float(_) | AttributeValue::FloatArray(_) => ElementType::Float64,
        }
    }

    /// Shape of the value: empty for scalars, `[len]` for arrays.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        match self {
            AttributeValue::String(_) | AttributeValue::Int(_) | AttributeValue::Float(_) => {
                Vec::new()
            }
            AttributeValue::StringArray(values) => vec![values.len()],
            AttributeValue::IntArray(values) => vec![values.len()],
            AttributeValue::FloatArray(values) => vec![values.len()],
        }
    }

    /// Returns true for scalar values.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.shape().is_empty()
    }

    /// Returns the string if this is a scalar string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the strings if this is a string array.
    #[must_use]
    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            AttributeValue::StringArray(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the integer if this is a scalar integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integers if this is an integer array.
    #[must_use]
    pub fn as_int_array(&self) -> Option<&[i64]> {
        match self {
            AttributeValue::IntArray(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the float if this is a scalar float.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        AttributeValue::StringArray(values)
    }
}

impl From<&[&str]> for AttributeValue {
    fn from(values: &[&str]) -> Self {
        AttributeValue::StringArray(values.iter().map(|s| (*s).to_string()).collect())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(values: Vec<i64>) -> Self {
        AttributeValue::IntArray(values)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(values: Vec<f64>) -> Self {
        AttributeValue::FloatArray(values)
    }
}

/// A named attribute attached to a group or data node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Attribute {
    /// Attribute name, unique per node.
    pub name: String,
    /// Attribute value.
    pub value: AttributeValue,
}

impl Attribute {
    /// Creates a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Insertion-ordered attribute storage with unique names.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    /// Adds an attribute; returns it back if the name is taken.
    pub(crate) fn add(&mut self, attribute: Attribute) -> Result<(), Attribute> {
        if self.contains(&attribute.name) {
            return Err(attribute);
        }
        self.attributes.push(attribute);
        Ok(())
    }

    /// Inserts or replaces an attribute, keeping its original position.
    pub(crate) fn set(&mut self, attribute: Attribute) -> Option<AttributeValue> {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, attribute.value)),
            None => {
                self.attributes.push(attribute);
                None
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub(crate) fn to_vec(&self) -> Vec<Attribute> {
        self.attributes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_shape() {
        assert!(AttributeValue::from("x").is_scalar());
        assert_eq!(AttributeValue::from(vec![0_i64, 1]).shape(), vec![2]);
        let axes: &[&str] = &[".", "tof"];
        let value = AttributeValue::from(axes);
        assert_eq!(value.shape(), vec![2]);
        assert_eq!(value.element_type(), ElementType::String);
    }

    #[test]
    fn test_attribute_set_unique_names() {
        let mut set = AttributeSet::default();
        assert!(set.add(Attribute::new("signal", "data")).is_ok());
        assert!(set.add(Attribute::new("signal", "other")).is_err());
        assert_eq!(set.get("signal").and_then(AttributeValue::as_str), Some("data"));

        let previous = set.set(Attribute::new("signal", "other"));
        assert_eq!(previous, Some(AttributeValue::from("data")));
        assert_eq!(set.to_vec().len(), 1);
        assert!(set.remove("signal").is_some());
        assert!(!set.contains("signal"));
    }
}
