//! Typed array payloads of data nodes.

use crate::{Error, Result};
use ndarray::{Array1, ArrayD, IxDyn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Element type of a dataset or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
}

impl ElementType {
    /// Short lowercase name, e.g. `"float64"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Bool => "bool",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::String => "string",
        }
    }
}

/// The array held by a data node.
///
/// `Lazy` describes a dataset whose values are written later (typically
/// point by point during a scan); only its element type and shape are known
/// while the tree is built.
#[derive(Debug, Clone, PartialEq)]
pub enum DataArray {
    Bool(ArrayD<bool>),
    Int(ArrayD<i64>),
    Float(ArrayD<f64>),
    Str(ArrayD<String>),
    Lazy {
        element_type: ElementType,
        shape: Vec<usize>,
    },
}

impl DataArray {
    /// Creates a lazy placeholder of the given element type and shape.
    #[must_use]
    pub fn lazy(element_type: ElementType, shape: &[usize]) -> Self {
        DataArray::Lazy {
            element_type,
            shape: shape.to_vec(),
        }
    }

    /// Creates a zero-filled float array of the given shape.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        DataArray::Float(ArrayD::zeros(IxDyn(shape)))
    }

    /// Creates a float array from a flat buffer and a shape.
    ///
    /// # Errors
    /// Returns an error if `values.len()` does not equal the product of `shape`.
    pub fn from_shape_f64(shape: &[usize], values: Vec<f64>) -> Result<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(DataArray::Float)
            .map_err(|e| Error::InvalidShape(format!("{shape:?}: {e}")))
    }

    /// Creates an integer array from a flat buffer and a shape.
    ///
    /// # Errors
    /// Returns an error if `values.len()` does not equal the product of `shape`.
    pub fn from_shape_i64(shape: &[usize], values: Vec<i64>) -> Result<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(DataArray::Int)
            .map_err(|e| Error::InvalidShape(format!("{shape:?}: {e}")))
    }

    /// Shape of the array.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        match self {
            DataArray::Bool(array) => array.shape().to_vec(),
            DataArray::Int(array) => array.shape().to_vec(),
            DataArray::Float(array) => array.shape().to_vec(),
            DataArray::Str(array) => array.shape().to_vec(),
            DataArray::Lazy { shape, .. } => shape.clone(),
        }
    }

    /// Number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        match self {
            DataArray::Bool(array) => array.ndim(),
            DataArray::Int(array) => array.ndim(),
            DataArray::Float(array) => array.ndim(),
            DataArray::Str(array) => array.ndim(),
            DataArray::Lazy { shape, .. } => shape.len(),
        }
    }

    /// Element type of the array.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            DataArray::Bool(_) => ElementType::Bool,
            DataArray::Int(_) => ElementType::Int64,
            DataArray::Float(_) => ElementType::Float64,
            DataArray::Str(_) => ElementType::String,
            DataArray::Lazy { element_type, .. } => *element_type,
        }
    }

    /// Returns true if the values have not been written yet.
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        matches!(self, DataArray::Lazy { .. })
    }

    /// Returns the value of a scalar (rank 0) string array.
    #[must_use]
    pub fn as_scalar_str(&self) -> Option<&str> {
        match self {
            DataArray::Str(array) if array.ndim() == 0 => array.first().map(String::as_str),
            _ => None,
        }
    }

    /// Returns the value of a scalar (rank 0) float array.
    #[must_use]
    pub fn as_scalar_f64(&self) -> Option<f64> {
        match self {
            DataArray::Float(array) if array.ndim() == 0 => array.first().copied(),
            _ => None,
        }
    }

    /// Returns the value of a scalar (rank 0) integer array.
    #[must_use]
    pub fn as_scalar_i64(&self) -> Option<i64> {
        match self {
            DataArray::Int(array) if array.ndim() == 0 => array.first().copied(),
            _ => None,
        }
    }
}

impl From<&str> for DataArray {
    fn from(value: &str) -> Self {
        DataArray::Str(ArrayD::from_elem(IxDyn(&[]), value.to_string()))
    }
}

impl From<String> for DataArray {
    fn from(value: String) -> Self {
        DataArray::Str(ArrayD::from_elem(IxDyn(&[]), value))
    }
}

impl From<f64> for DataArray {
    fn from(value: f64) -> Self {
        DataArray::Float(ArrayD::from_elem(IxDyn(&[]), value))
    }
}

impl From<i64> for DataArray {
    fn from(value: i64) -> Self {
        DataArray::Int(ArrayD::from_elem(IxDyn(&[]), value))
    }
}

impl From<bool> for DataArray {
    fn from(value: bool) -> Self {
        DataArray::Bool(ArrayD::from_elem(IxDyn(&[]), value))
    }
}

impl From<Vec<f64>> for DataArray {
    fn from(values: Vec<f64>) -> Self {
        DataArray::Float(Array1::from(values).into_dyn())
    }
}

impl From<Vec<i64>> for DataArray {
    fn from(values: Vec<i64>) -> Self {
        DataArray::Int(Array1::from(values).into_dyn())
    }
}

impl From<Vec<String>> for DataArray {
    fn from(values: Vec<String>) -> Self {
        DataArray::Str(Array1::from(values).into_dyn())
    }
}
