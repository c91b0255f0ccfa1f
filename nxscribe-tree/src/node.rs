//! Group and data nodes.
//!
//! Nodes are reference-counted handles. Cloning a [`GroupNode`] or
//! [`DataNode`] yields another handle to the same node, and identity is
//! handle identity ([`GroupNode::ptr_eq`]). Registering one node under two
//! groups is allowed and is how links are expressed. A group must not be
//! registered below itself.
//!
//! The tree is single-threaded: handles are `!Send`, and a caller must not
//! mutate a tree while a writer walks it.

use crate::attribute::{Attribute, AttributeSet, AttributeValue};
use crate::data::{DataArray, ElementType};
use crate::{BaseClass, Error, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier handed out by a [`NodeFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw value of the id.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Creates group and data nodes.
///
/// Ids come from one process-wide counter, so nodes created through
/// different factories never share an id.
#[derive(Debug, Clone, Default)]
pub struct NodeFactory;

impl NodeFactory {
    /// Creates a new factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unused_self)]
    fn next_id(&self) -> NodeId {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an empty group of the given base class.
    #[must_use]
    pub fn create_group(&self, base_class: BaseClass) -> GroupNode {
        GroupNode(Rc::new(RefCell::new(GroupInner {
            id: self.next_id(),
            base_class,
            children: Vec::new(),
            attributes: AttributeSet::default(),
        })))
    }

    /// Creates a data node holding `data`.
    #[must_use]
    pub fn create_data(&self, data: impl Into<DataArray>) -> DataNode {
        DataNode(Rc::new(RefCell::new(DataInner {
            id: self.next_id(),
            data: data.into(),
            attributes: AttributeSet::default(),
        })))
    }
}

/// A node of the tree: either a group or a data node.
#[derive(Debug, Clone)]
pub enum Node {
    Group(GroupNode),
    Data(DataNode),
}

impl Node {
    /// Id of the node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Node::Group(group) => group.id(),
            Node::Data(data) => data.id(),
        }
    }

    /// Returns true if both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Group(a), Node::Group(b)) => a.ptr_eq(b),
            (Node::Data(a), Node::Data(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Returns the group, if this is a group.
    #[must_use]
    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Node::Group(group) => Some(group),
            Node::Data(_) => None,
        }
    }

    /// Returns the data node, if this is a data node.
    #[must_use]
    pub fn as_data(&self) -> Option<&DataNode> {
        match self {
            Node::Data(data) => Some(data),
            Node::Group(_) => None,
        }
    }

    /// Returns true if this is a group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    /// Returns true if this is a data node.
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self, Node::Data(_))
    }
}

impl From<GroupNode> for Node {
    fn from(group: GroupNode) -> Self {
        Node::Group(group)
    }
}

impl From<&GroupNode> for Node {
    fn from(group: &GroupNode) -> Self {
        Node::Group(group.clone())
    }
}

impl From<DataNode> for Node {
    fn from(data: DataNode) -> Self {
        Node::Data(data)
    }
}

impl From<&DataNode> for Node {
    fn from(data: &DataNode) -> Self {
        Node::Data(data.clone())
    }
}

struct GroupInner {
    id: NodeId,
    base_class: BaseClass,
    children: Vec<(String, Node)>,
    attributes: AttributeSet,
}

/// Handle to a group node.
#[derive(Clone)]
pub struct GroupNode(Rc<RefCell<GroupInner>>);

impl GroupNode {
    /// Id of the group.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.0.borrow().id
    }

    /// Base class of the group.
    #[must_use]
    pub fn base_class(&self) -> BaseClass {
        self.0.borrow().base_class
    }

    /// `NX_class` string of the group.
    #[must_use]
    pub fn nx_class(&self) -> &'static str {
        self.base_class().nx_class()
    }

    /// Short description used in error messages, e.g. `NXinstrument#4`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}{}", self.nx_class(), self.id())
    }

    /// Returns true if both handles refer to the same group.
    #[must_use]
    pub fn ptr_eq(&self, other: &GroupNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Registers `child` under `name`.
    ///
    /// Adding the very same node again under the same name is a no-op.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if a different node already uses `name`.
    pub fn add_child(&self, name: &str, child: impl Into<Node>) -> Result<()> {
        let child = child.into();
        if let Some(existing) = self.child(name) {
            if existing.ptr_eq(&child) {
                return Ok(());
            }
            return Err(Error::DuplicateName {
                parent: self.label(),
                name: name.to_string(),
            });
        }
        self.0.borrow_mut().children.push((name.to_string(), child));
        Ok(())
    }

    /// Registers `group` under `name`.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if a different node already uses `name`.
    pub fn add_group(&self, name: &str, group: &GroupNode) -> Result<()> {
        self.add_child(name, group)
    }

    /// Registers `data` under `name`.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if a different node already uses `name`.
    pub fn add_data_node(&self, name: &str, data: &DataNode) -> Result<()> {
        self.add_child(name, data)
    }

    /// Creates a new group of class `base_class` and registers it under `name`.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if `name` is taken.
    pub fn create_group(
        &self,
        factory: &NodeFactory,
        name: &str,
        base_class: BaseClass,
    ) -> Result<GroupNode> {
        self.ensure_free(name)?;
        let group = factory.create_group(base_class);
        self.add_group(name, &group)?;
        Ok(group)
    }

    /// Creates a new data node and registers it under `name`.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if `name` is taken.
    pub fn create_data(
        &self,
        factory: &NodeFactory,
        name: &str,
        data: impl Into<DataArray>,
    ) -> Result<DataNode> {
        self.ensure_free(name)?;
        let node = factory.create_data(data);
        self.add_data_node(name, &node)?;
        Ok(node)
    }

    /// Fails with [`Error::DuplicateName`] if `name` is already used.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if `name` is taken.
    pub fn ensure_free(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(Error::DuplicateName {
                parent: self.label(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Registers `child` under `name`, replacing whatever was there.
    ///
    /// A replaced child keeps its position. Returns the previous node.
    pub fn set_child(&self, name: &str, child: impl Into<Node>) -> Option<Node> {
        let child = child.into();
        let mut inner = self.0.borrow_mut();
        if let Some(slot) = inner.children.iter_mut().find(|(n, _)| n == name) {
            return Some(std::mem::replace(&mut slot.1, child));
        }
        inner.children.push((name.to_string(), child));
        None
    }

    /// Removes and returns the child registered under `name`.
    pub fn remove_child(&self, name: &str) -> Option<Node> {
        let mut inner = self.0.borrow_mut();
        let index = inner.children.iter().position(|(n, _)| n == name)?;
        Some(inner.children.remove(index).1)
    }

    /// Returns the child registered under `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Node> {
        self.0
            .borrow()
            .children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node.clone())
    }

    /// Returns the child group registered under `name`.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<GroupNode> {
        match self.child(name)? {
            Node::Group(group) => Some(group),
            Node::Data(_) => None,
        }
    }

    /// Returns the child data node registered under `name`.
    #[must_use]
    pub fn data_node(&self, name: &str) -> Option<DataNode> {
        match self.child(name)? {
            Node::Data(data) => Some(data),
            Node::Group(_) => None,
        }
    }

    /// Returns true if a child is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().children.iter().any(|(n, _)| n == name)
    }

    /// Names of all children, in insertion order.
    #[must_use]
    pub fn child_names(&self) -> Vec<String> {
        self.0
            .borrow()
            .children
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All children with their names, in insertion order.
    #[must_use]
    pub fn children(&self) -> Vec<(String, Node)> {
        self.0.borrow().children.clone()
    }

    /// Child groups with their names, in insertion order.
    #[must_use]
    pub fn group_children(&self) -> Vec<(String, GroupNode)> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|(name, node)| node.as_group().map(|g| (name.clone(), g.clone())))
            .collect()
    }

    /// Child data nodes with their names, in insertion order.
    #[must_use]
    pub fn data_children(&self) -> Vec<(String, DataNode)> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|(name, node)| node.as_data().map(|d| (name.clone(), d.clone())))
            .collect()
    }

    /// Returns the first child group of the given class.
    #[must_use]
    pub fn first_group_of_class(&self, base_class: BaseClass) -> Option<GroupNode> {
        self.group_children()
            .into_iter()
            .map(|(_, group)| group)
            .find(|group| group.base_class() == base_class)
    }

    /// Number of child groups.
    #[must_use]
    pub fn number_of_group_nodes(&self) -> usize {
        self.0
            .borrow()
            .children
            .iter()
            .filter(|(_, node)| node.is_group())
            .count()
    }

    /// Number of child data nodes.
    #[must_use]
    pub fn number_of_data_nodes(&self) -> usize {
        self.0
            .borrow()
            .children
            .iter()
            .filter(|(_, node)| node.is_data())
            .count()
    }

    /// Returns true if the group has neither children nor attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let inner = self.0.borrow();
        inner.children.is_empty() && inner.attributes.is_empty()
    }

    /// Adds an attribute.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateAttribute`] if the name is already used.
    pub fn add_attribute(&self, attribute: Attribute) -> Result<()> {
        let result = self.0.borrow_mut().attributes.add(attribute);
        result.map_err(|rejected| Error::DuplicateAttribute {
            node: self.label(),
            name: rejected.name,
        })
    }

    /// Inserts or replaces an attribute, returning the previous value.
    pub fn set_attribute(
        &self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.0
            .borrow_mut()
            .attributes
            .set(Attribute::new(name, value))
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attribute(&self, name: &str) -> Option<AttributeValue> {
        self.0.borrow_mut().attributes.remove(name)
    }

    /// Returns the value of the named attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.0.borrow().attributes.get(name).cloned()
    }

    /// Returns true if the named attribute exists.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.borrow().attributes.contains(name)
    }

    /// All attributes, in insertion order.
    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        self.0.borrow().attributes.to_vec()
    }

    /// Resolves a relative path such as `instrument/detector/data`.
    ///
    /// Empty segments are ignored, so leading and doubled slashes are harmless.
    #[must_use]
    pub fn find_node(&self, path: &str) -> Option<Node> {
        let mut current = Node::Group(self.clone());
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let next = current.as_group()?.child(segment)?;
            current = next;
        }
        Some(current)
    }

    /// Resolves a relative path to a data node.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchNode`] if nothing exists at `path`, or
    /// [`Error::NotADataNode`] if it is a group.
    pub fn find_data_node(&self, path: &str) -> Result<DataNode> {
        match self.find_node(path) {
            Some(Node::Data(data)) => Ok(data),
            Some(Node::Group(_)) => Err(Error::NotADataNode(path.to_string())),
            None => Err(Error::NoSuchNode(path.to_string())),
        }
    }

    /// Resolves a relative path to a group.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchNode`] if nothing exists at `path`, or
    /// [`Error::NotAGroup`] if it is a data node.
    pub fn find_group(&self, path: &str) -> Result<GroupNode> {
        match self.find_node(path) {
            Some(Node::Group(group)) => Ok(group),
            Some(Node::Data(_)) => Err(Error::NotAGroup(path.to_string())),
            None => Err(Error::NoSuchNode(path.to_string())),
        }
    }

    /// Value of a scalar string field, e.g. the `title` of an entry.
    #[must_use]
    pub fn string_field(&self, name: &str) -> Option<String> {
        self.data_node(name)?
            .read(|data| data.as_scalar_str().map(str::to_string))
    }

    /// Visits every node below this group depth first, parents before
    /// children, passing each node's path relative to `base_path`.
    pub fn walk(&self, base_path: &str, visitor: &mut dyn FnMut(&str, &Node)) {
        for (name, child) in self.children() {
            let path = join_path(base_path, &name);
            visitor(&path, &child);
            if let Node::Group(group) = &child {
                group.walk(&path, visitor);
            }
        }
    }
}

impl fmt::Debug for GroupNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("GroupNode")
            .field("id", &inner.id)
            .field("base_class", &inner.base_class)
            .field(
                "children",
                &inner.children.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

struct DataInner {
    id: NodeId,
    data: DataArray,
    attributes: AttributeSet,
}

/// Handle to a data node.
#[derive(Clone)]
pub struct DataNode(Rc<RefCell<DataInner>>);

impl DataNode {
    /// Id of the data node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.0.borrow().id
    }

    /// Returns true if both handles refer to the same data node.
    #[must_use]
    pub fn ptr_eq(&self, other: &DataNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Short description used in error messages.
    #[must_use]
    pub fn label(&self) -> String {
        format!("dataset{}", self.id())
    }

    /// Shape of the array.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.0.borrow().data.shape()
    }

    /// Rank of the array.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.0.borrow().data.rank()
    }

    /// Element type of the array.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.0.borrow().data.element_type()
    }

    /// Runs `f` with a borrow of the array.
    pub fn read<R>(&self, f: impl FnOnce(&DataArray) -> R) -> R {
        f(&self.0.borrow().data)
    }

    /// Replaces the array, e.g. once a lazy dataset has been filled in.
    pub fn set_data(&self, data: impl Into<DataArray>) {
        self.0.borrow_mut().data = data.into();
    }

    /// Adds an attribute.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateAttribute`] if the name is already used.
    pub fn add_attribute(&self, attribute: Attribute) -> Result<()> {
        let result = self.0.borrow_mut().attributes.add(attribute);
        result.map_err(|rejected| Error::DuplicateAttribute {
            node: self.label(),
            name: rejected.name,
        })
    }

    /// Inserts or replaces an attribute, returning the previous value.
    pub fn set_attribute(
        &self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.0
            .borrow_mut()
            .attributes
            .set(Attribute::new(name, value))
    }

    /// Sets the `units` attribute.
    pub fn set_units(&self, units: &str) {
        self.set_attribute("units", units);
    }

    /// Returns the value of the named attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.0.borrow().attributes.get(name).cloned()
    }

    /// All attributes, in insertion order.
    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        self.0.borrow().attributes.to_vec()
    }
}

impl fmt::Debug for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("DataNode")
            .field("id", &inner.id)
            .field("element_type", &inner.data.element_type())
            .field("shape", &inner.data.shape())
            .finish_non_exhaustive()
    }
}

/// Joins a parent path and a child name with a single `/`.
#[must_use]
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}
