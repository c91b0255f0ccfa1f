//! HDF5 output for nxscribe trees.
//!
//! Groups carry their base class in the `NX_class` attribute. Datasets
//! with values are written in full; lazy datasets are created chunked (one
//! chunk per leading index) so values can be filled in later. A node that
//! appears under several parents is written once and hard-linked elsewhere.

use crate::{Error, Result};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use ndarray::{ArrayD, ArrayView1, IxDyn};
use nxscribe_tree::node::join_path;
use nxscribe_tree::{
    AttributeValue, DataArray, DataNode, ElementType, GroupNode, Node, NodeId, TreeWriter, NX_CLASS,
};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Dataset creation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hdf5WriteOptions {
    /// Deflate level for lazy datasets (0-9).
    pub compression: Option<u8>,
    /// Enable the shuffle filter for lazy datasets.
    pub shuffle: bool,
}

impl Default for Hdf5WriteOptions {
    fn default() -> Self {
        Self {
            compression: Some(1),
            shuffle: true,
        }
    }
}

/// Writes a tree to an HDF5 file.
#[derive(Debug, Default)]
pub struct Hdf5TreeWriter {
    options: Hdf5WriteOptions,
    file: Option<File>,
    written: HashMap<NodeId, String>,
}

impl Hdf5TreeWriter {
    #[must_use]
    pub fn new(options: Hdf5WriteOptions) -> Self {
        Self {
            options,
            file: None,
            written: HashMap::new(),
        }
    }

    fn write_group(&mut self, target: &Group, group: &GroupNode, path: &str) -> Result<()> {
        self.written.insert(group.id(), path.to_string());
        set_attr_str_group(target, NX_CLASS, group.nx_class())?;
        for attribute in group.attributes() {
            write_attribute(target, &attribute.name, &attribute.value)?;
        }

        for (name, child) in group.children() {
            let child_path = join_path(path, &name);
            if let Some(first) = self.written.get(&child.id()) {
                target.link_hard(first, &name)?;
                continue;
            }
            match &child {
                Node::Group(child_group) => {
                    let created = target.create_group(&name)?;
                    self.write_group(&created, child_group, &child_path)?;
                }
                Node::Data(data) => {
                    let dataset = self.write_dataset(target, &name, data)?;
                    for attribute in data.attributes() {
                        write_attribute(&dataset, &attribute.name, &attribute.value)?;
                    }
                    self.written.insert(data.id(), child_path);
                }
            }
        }
        Ok(())
    }

    fn write_dataset(&self, group: &Group, name: &str, data: &DataNode) -> Result<Dataset> {
        data.read(|array| match array {
            DataArray::Bool(values) => write_array(group, name, values),
            DataArray::Int(values) => write_array(group, name, values),
            DataArray::Float(values) => write_array(group, name, values),
            DataArray::Str(values) => {
                let converted = values
                    .iter()
                    .map(|value| to_var_len_unicode(value))
                    .collect::<Result<Vec<_>>>()?;
                let array = ArrayD::from_shape_vec(IxDyn(values.shape()), converted)
                    .map_err(|e| Error::InvalidFormat(format!("{name}: {e}")))?;
                write_array(group, name, &array)
            }
            DataArray::Lazy {
                element_type,
                shape,
            } => match element_type {
                ElementType::Bool => self.create_lazy_dataset::<bool>(group, name, shape),
                ElementType::Int32 => self.create_lazy_dataset::<i32>(group, name, shape),
                ElementType::Int64 => self.create_lazy_dataset::<i64>(group, name, shape),
                ElementType::Float32 => self.create_lazy_dataset::<f32>(group, name, shape),
                ElementType::Float64 => self.create_lazy_dataset::<f64>(group, name, shape),
                ElementType::String => {
                    self.create_lazy_dataset::<VarLenUnicode>(group, name, shape)
                }
            },
        })
    }

    fn create_lazy_dataset<T: H5Type>(
        &self,
        group: &Group,
        name: &str,
        shape: &[usize],
    ) -> Result<Dataset> {
        if shape.is_empty() {
            return Ok(group.new_dataset::<T>().shape(()).create(name)?);
        }
        let mut chunk = shape.to_vec();
        chunk[0] = 1;
        if chunk.iter().any(|&extent| extent == 0) {
            return Ok(group.new_dataset::<T>().shape(shape.to_vec()).create(name)?);
        }

        let mut builder = group
            .new_dataset::<T>()
            .shape(shape.to_vec())
            .chunk(IxDyn(&chunk));
        if let Some(level) = self.options.compression {
            builder = builder.deflate(level);
        }
        if self.options.shuffle {
            builder = builder.shuffle();
        }
        Ok(builder.create(name)?)
    }
}

impl TreeWriter for Hdf5TreeWriter {
    type Error = Error;

    fn create_and_open_for_write(&mut self, path: &Path) -> Result<()> {
        self.file = Some(File::create(path)?);
        self.written.clear();
        Ok(())
    }

    fn add_node(&mut self, mount_path: &str, group: &GroupNode) -> Result<()> {
        let file = self.file.as_ref().ok_or(Error::NotOpen)?;
        let target = if mount_path.split('/').all(str::is_empty) {
            file.group("/")?
        } else {
            file.create_group(mount_path)?
        };
        self.write_group(&target, group, mount_path)
    }

    fn flush(&mut self) -> Result<()> {
        let file = self.file.take().ok_or(Error::NotOpen)?;
        file.flush()?;
        log::debug!("flushed HDF5 file {}", file.filename());
        Ok(())
    }
}

fn write_array<T: H5Type>(group: &Group, name: &str, values: &ArrayD<T>) -> Result<Dataset> {
    let dataset = group
        .new_dataset::<T>()
        .shape(values.shape().to_vec())
        .create(name)?;
    dataset.write(values)?;
    Ok(dataset)
}

fn write_attribute(location: &hdf5::Location, name: &str, value: &AttributeValue) -> Result<()> {
    match value {
        AttributeValue::String(value) => {
            let value = to_var_len_unicode(value)?;
            location
                .new_attr::<VarLenUnicode>()
                .create(name)?
                .write_scalar(&value)?;
        }
        AttributeValue::StringArray(values) => {
            let values: Vec<VarLenUnicode> = values
                .iter()
                .map(|value| to_var_len_unicode(value))
                .collect::<Result<Vec<_>>>()?;
            location
                .new_attr::<VarLenUnicode>()
                .shape((values.len(),))
                .create(name)?
                .write(ArrayView1::from(values.as_slice()))?;
        }
        AttributeValue::Int(value) => {
            location.new_attr::<i64>().create(name)?.write_scalar(value)?;
        }
        AttributeValue::IntArray(values) => {
            location
                .new_attr::<i64>()
                .shape((values.len(),))
                .create(name)?
                .write(ArrayView1::from(values.as_slice()))?;
        }
        AttributeValue::Float(value) => {
            location.new_attr::<f64>().create(name)?.write_scalar(value)?;
        }
        AttributeValue::FloatArray(values) => {
            location
                .new_attr::<f64>()
                .shape((values.len(),))
                .create(name)?
                .write(ArrayView1::from(values.as_slice()))?;
        }
    }
    Ok(())
}

fn set_attr_str_group(group: &Group, name: &str, value: &str) -> Result<()> {
    write_attribute(group, name, &AttributeValue::from(value))
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 string: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxscribe_tree::{BaseClass, NodeFactory};
    use tempfile::NamedTempFile;

    #[test]
    fn test_hdf5_tree_with_link() {
        let factory = NodeFactory::new();
        let root = factory.create_group(BaseClass::Root);
        let entry = root.create_group(&factory, "entry", BaseClass::Entry).unwrap();
        let x = entry.create_data(&factory, "x", vec![1.0, 2.0, 3.0]).unwrap();
        x.set_units("mm");
        let nx_data = entry.create_group(&factory, "data", BaseClass::Data).unwrap();
        nx_data.add_data_node("x", &x).unwrap();
        nx_data.set_attribute("axes", vec!["x".to_string()]);
        nx_data.set_attribute("x_indices", vec![0_i64]);
        nx_data
            .create_data(&factory, "counts", DataArray::lazy(ElementType::Float64, &[3, 8]))
            .unwrap();

        let file = NamedTempFile::new().unwrap();
        let mut writer = Hdf5TreeWriter::default();
        writer.create_and_open_for_write(file.path()).unwrap();
        writer.add_node("/", &root).unwrap();
        writer.flush().unwrap();

        let h5 = File::open(file.path()).unwrap();
        let data = h5.group("entry/data").unwrap();
        let class: VarLenUnicode = data.attr(NX_CLASS).unwrap().read_scalar().unwrap();
        assert_eq!(class.as_str(), "NXdata");
        let linked = data.dataset("x").unwrap().read_raw::<f64>().unwrap();
        assert_eq!(linked, vec![1.0, 2.0, 3.0]);
        assert_eq!(data.dataset("counts").unwrap().shape(), vec![3, 8]);
        let indices = data.attr("x_indices").unwrap().read_raw::<i64>().unwrap();
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn test_nodes_from_separate_factories_are_not_linked() {
        let factory = NodeFactory::new();
        let root = factory.create_group(BaseClass::Root);
        let entry = root.create_group(&factory, "entry", BaseClass::Entry).unwrap();

        let other = NodeFactory::new();
        let detector = other.create_group(BaseClass::Detector);
        detector.create_data(&other, "data", vec![4.0, 5.0]).unwrap();
        entry.add_group("det", &detector).unwrap();

        let file = NamedTempFile::new().unwrap();
        let mut writer = Hdf5TreeWriter::default();
        writer.create_and_open_for_write(file.path()).unwrap();
        writer.add_node("/", &root).unwrap();
        writer.flush().unwrap();

        let h5 = File::open(file.path()).unwrap();
        let values = h5.dataset("entry/det/data").unwrap().read_raw::<f64>().unwrap();
        assert_eq!(values, vec![4.0, 5.0]);
    }
}
