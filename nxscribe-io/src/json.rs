//! JSON rendering of a node tree.
//!
//! Groups become objects with their `NX_class`, attributes and children.
//! Datasets carry their element type, shape and (unless lazy) their values
//! in row-major order:
//!
//! ```json
//! {
//!   "NX_class": "NXdata",
//!   "attributes": { "signal": "data", "axes": ["x"], "x_indices": [0] },
//!   "children": {
//!     "data": { "type": "float64", "shape": [100], "value": null },
//!     "x": { "link": "/entry/instrument/x/value" }
//!   }
//! }
//! ```
//!
//! A node reachable under several parents is rendered in full at its first
//! path (depth first, in child order) and as a `link` everywhere else.

use crate::{Error, Result};
use ndarray::ArrayD;
use nxscribe_tree::node::join_path;
use nxscribe_tree::{Attribute, DataArray, DataNode, GroupNode, Node, NodeId, TreeWriter};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Renders `root` and everything below it.
///
/// # Errors
/// Returns [`Error::Json`] if an attribute value cannot be serialized.
pub fn to_json_value(root: &GroupNode) -> Result<Value> {
    Renderer::default().group(root, "/")
}

#[derive(Default)]
struct Renderer {
    seen: HashMap<NodeId, String>,
}

impl Renderer {
    fn group(&mut self, group: &GroupNode, path: &str) -> Result<Value> {
        self.seen.insert(group.id(), path.to_string());
        let mut children = Map::new();
        for (name, child) in group.children() {
            let child_path = join_path(path, &name);
            let value = self.node(&child, &child_path)?;
            children.insert(name, value);
        }
        Ok(json!({
            "NX_class": group.nx_class(),
            "attributes": attributes(&group.attributes())?,
            "children": children,
        }))
    }

    fn node(&mut self, node: &Node, path: &str) -> Result<Value> {
        if let Some(first) = self.seen.get(&node.id()) {
            return Ok(json!({ "link": first }));
        }
        match node {
            Node::Group(group) => self.group(group, path),
            Node::Data(data) => {
                self.seen.insert(data.id(), path.to_string());
                dataset(data)
            }
        }
    }
}

fn attributes(attributes: &[Attribute]) -> Result<Value> {
    let mut map = Map::new();
    for attribute in attributes {
        map.insert(
            attribute.name.clone(),
            serde_json::to_value(&attribute.value)?,
        );
    }
    Ok(Value::Object(map))
}

fn dataset(data: &DataNode) -> Result<Value> {
    let value = data.read(|array| match array {
        DataArray::Bool(values) => values_json(values),
        DataArray::Int(values) => values_json(values),
        DataArray::Float(values) => values_json(values),
        DataArray::Str(values) => values_json(values),
        DataArray::Lazy { .. } => Value::Null,
    });
    Ok(json!({
        "type": data.element_type().name(),
        "shape": data.shape(),
        "value": value,
        "attributes": attributes(&data.attributes())?,
    }))
}

fn values_json<T: Clone + Into<Value>>(values: &ArrayD<T>) -> Value {
    if values.ndim() == 0 {
        return values.first().cloned().map_or(Value::Null, Into::into);
    }
    Value::Array(values.iter().cloned().map(Into::into).collect())
}

/// Writes a tree as a JSON document.
#[derive(Debug, Default)]
pub struct JsonTreeWriter {
    path: Option<PathBuf>,
    document: Option<Value>,
    pretty: bool,
}

impl JsonTreeWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent the output.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Document assembled so far.
    #[must_use]
    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    fn mount(&mut self, mount_path: &str, value: Value) -> Result<()> {
        let document = self.document.get_or_insert_with(|| {
            json!({ "NX_class": "NXroot", "attributes": {}, "children": {} })
        });
        let segments: Vec<&str> = mount_path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            *document = value;
            return Ok(());
        };

        let mut current = document;
        for segment in parents {
            current = current
                .get_mut("children")
                .and_then(|children| children.get_mut(*segment))
                .ok_or_else(|| {
                    Error::InvalidFormat(format!("no group at '{segment}' in mount path {mount_path}"))
                })?;
        }
        let children = current
            .get_mut("children")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| Error::InvalidFormat(format!("cannot mount below {mount_path}")))?;
        children.insert((*last).to_string(), value);
        Ok(())
    }
}

impl TreeWriter for JsonTreeWriter {
    type Error = Error;

    fn create_and_open_for_write(&mut self, path: &Path) -> Result<()> {
        File::create(path)?;
        self.path = Some(path.to_path_buf());
        self.document = None;
        Ok(())
    }

    fn add_node(&mut self, mount_path: &str, group: &GroupNode) -> Result<()> {
        if self.path.is_none() {
            return Err(Error::NotOpen);
        }
        self.mount(mount_path, to_json_value(group)?)
    }

    fn flush(&mut self) -> Result<()> {
        let path = self.path.as_ref().ok_or(Error::NotOpen)?;
        let document = self.document.as_ref().unwrap_or(&Value::Null);
        let mut writer = BufWriter::new(File::create(path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, document)?;
        } else {
            serde_json::to_writer(&mut writer, document)?;
        }
        writer.flush()?;
        log::debug!("wrote JSON tree to {}", path.display());
        Ok(())
    }
}
