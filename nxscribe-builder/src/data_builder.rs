//! Builds `NXdata` groups following the signal/axes/`_indices` convention.
//!
//! One primary device supplies the signal dataset. Every further device
//! contributes axis fields, each tagged with a `<name>_indices` attribute
//! that names the signal dimensions its own dimensions run along. A field
//! may also be the default axis of one signal dimension, in which case its
//! name replaces the placeholder at that position of the `axes` attribute.
//!
//! ```text
//! data:NXdata
//!   @signal = "data"
//!   @axes = ["x", "."]
//!   @x_indices = [0]
//!   @y_indices = [1]
//!   data[100, 20]
//!   x[100]   (linked from the x positioner)
//!   y[20]
//! ```
//!
//! Axis devices are applied atomically: every field is checked before any
//! node or attribute is written, so a failed call leaves the group as it was.

use crate::device::{DataDevice, FieldNaming};
use crate::provider::NexusObjectProvider;
use crate::{Error, Result};
use nxscribe_tree::{DataNode, GroupNode, NodeFactory};
use std::collections::HashMap;

/// Name of the attribute naming the signal field.
pub const SIGNAL_ATTR: &str = "signal";
/// Name of the attribute listing the default axis of each signal dimension.
pub const AXES_ATTR: &str = "axes";
/// Suffix of per-field dimension mapping attributes.
pub const INDICES_SUFFIX: &str = "_indices";

#[derive(Debug)]
struct Signal {
    field: String,
    rank: usize,
    axes: Vec<String>,
}

/// One axis field, checked and ready to be written.
struct PlannedAxis {
    destination: String,
    node: DataNode,
    indices: Vec<usize>,
    default_axis_dimension: Option<usize>,
}

/// Populates one `NXdata` group.
#[derive(Debug)]
pub struct DataBuilder {
    factory: NodeFactory,
    nx_data: GroupNode,
    placeholder: String,
    signal: Option<Signal>,
    axis_fields: Vec<String>,
}

impl DataBuilder {
    pub(crate) fn new(factory: NodeFactory, nx_data: GroupNode, placeholder: &str) -> Self {
        Self {
            factory,
            nx_data,
            placeholder: placeholder.to_string(),
            signal: None,
            axis_fields: Vec::new(),
        }
    }

    /// The `NXdata` group being built.
    #[must_use]
    pub fn nx_data(&self) -> &GroupNode {
        &self.nx_data
    }

    /// Name of the signal field once the primary device is set.
    #[must_use]
    pub fn signal_field(&self) -> Option<&str> {
        self.signal.as_ref().map(|s| s.field.as_str())
    }

    #[must_use]
    pub fn signal_rank(&self) -> Option<usize> {
        self.signal.as_ref().map(|s| s.rank)
    }

    /// Current contents of the `axes` attribute.
    #[must_use]
    pub fn axes(&self) -> Option<&[String]> {
        self.signal.as_ref().map(|s| s.axes.as_slice())
    }

    /// Axis field names, in the order they were added.
    #[must_use]
    pub fn axis_fields(&self) -> &[String] {
        &self.axis_fields
    }

    /// Sets the device whose field becomes the signal.
    ///
    /// # Errors
    /// Returns [`Error::PrimaryAlreadySet`] on a second call,
    /// [`Error::UnknownField`] if the provider lacks the field, or
    /// [`Error::DuplicateName`] if the group already holds the name.
    pub fn set_primary_device(&mut self, device: &DataDevice<'_>) -> Result<()> {
        if let Some(signal) = &self.signal {
            return Err(Error::PrimaryAlreadySet(signal.field.clone()));
        }
        let provider = device.provider();
        provider.realize(&self.factory)?;

        let source_field = device.primary_source_field();
        let node = provider.field(&source_field)?;
        let destination = device.primary_destination_name(&source_field);
        self.nx_data.ensure_free(&destination)?;

        let rank = node.rank();
        let axes = vec![self.placeholder.clone(); rank];
        self.nx_data.add_data_node(&destination, &node)?;
        self.nx_data.set_attribute(SIGNAL_ATTR, destination.as_str());
        self.nx_data.set_attribute(AXES_ATTR, axes.clone());

        log::debug!(
            "{}: signal '{}' of rank {} from device '{}'",
            self.nx_data.label(),
            destination,
            rank,
            provider.name()
        );
        self.signal = Some(Signal {
            field: destination,
            rank,
            axes,
        });
        Ok(())
    }

    /// Sets the primary device, naming the signal after the provider.
    ///
    /// # Errors
    /// See [`set_primary_device`](Self::set_primary_device).
    pub fn set_primary_provider(&mut self, provider: &dyn NexusObjectProvider) -> Result<()> {
        self.set_primary_device(&DataDevice::new(provider).with_naming(FieldNaming::DeviceName))
    }

    /// Adds the fields of an axis device.
    ///
    /// For each field the indices are, in order of precedence: the field's
    /// own mappings; `[d]` if the field is rank 1 and the default axis of
    /// dimension `d`; the device-wide mappings; the identity mapping.
    ///
    /// # Errors
    /// Returns [`Error::PrimaryNotSet`] before the primary device is set,
    /// [`Error::RankMismatch`] or [`Error::DimensionOutOfRange`] for invalid
    /// mappings, [`Error::DefaultAxisAlreadySet`] if a dimension already has a
    /// default axis, and [`Error::DuplicateName`] for name clashes. Nothing is
    /// written when an error is returned.
    pub fn add_data_device(&mut self, device: &DataDevice<'_>) -> Result<()> {
        let provider = device.provider();
        let Some(signal) = &self.signal else {
            return Err(Error::PrimaryNotSet(provider.name().to_string()));
        };
        provider.realize(&self.factory)?;

        let plan = self.plan_device(signal, device)?;

        for axis in &plan {
            self.nx_data.add_data_node(&axis.destination, &axis.node)?;
            self.nx_data.set_attribute(
                format!("{}{INDICES_SUFFIX}", axis.destination),
                to_attribute_indices(&axis.indices),
            );
            log::debug!(
                "{}: axis '{}' indices {:?}",
                self.nx_data.label(),
                axis.destination,
                axis.indices
            );
        }

        if let Some(signal) = self.signal.as_mut() {
            let mut axes_changed = false;
            for axis in &plan {
                if let Some(dimension) = axis.default_axis_dimension {
                    signal.axes[dimension].clone_from(&axis.destination);
                    axes_changed = true;
                }
            }
            if axes_changed {
                self.nx_data.set_attribute(AXES_ATTR, signal.axes.clone());
            }
        }
        self.axis_fields
            .extend(plan.into_iter().map(|axis| axis.destination));
        Ok(())
    }

    /// Adds an axis device named after the provider.
    ///
    /// `default_axis_dimension` makes the provider's default axis field the
    /// default axis of that signal dimension; empty `mappings` means the
    /// builder derives them.
    ///
    /// # Errors
    /// See [`add_data_device`](Self::add_data_device).
    pub fn add_axis_provider(
        &mut self,
        provider: &dyn NexusObjectProvider,
        default_axis_dimension: Option<usize>,
        mappings: &[usize],
    ) -> Result<()> {
        let mut device = DataDevice::new(provider).with_naming(FieldNaming::DeviceName);
        if let Some(dimension) = default_axis_dimension {
            device = device.with_default_axis_dimension(dimension);
        }
        if !mappings.is_empty() {
            device = device.with_dimension_mappings(mappings);
        }
        self.add_data_device(&device)
    }

    fn plan_device(&self, signal: &Signal, device: &DataDevice<'_>) -> Result<Vec<PlannedAxis>> {
        let provider = device.provider();
        let mut plan: Vec<PlannedAxis> = Vec::new();
        let mut claims: HashMap<usize, String> = HashMap::new();

        for field in device.source_fields() {
            let destination = device.destination_name(&field);
            if destination == signal.field
                || self.nx_data.contains(&destination)
                || plan.iter().any(|axis| axis.destination == destination)
            {
                return Err(Error::DuplicateName {
                    parent: self.nx_data.label(),
                    name: destination,
                });
            }

            let node = provider.field(&field)?;
            let rank = node.rank();
            let default_axis_dimension = device.default_axis_dimension(&field);

            if let Some(dimension) = default_axis_dimension {
                check_dimension(&destination, dimension, signal.rank)?;
                let existing = claims
                    .get(&dimension)
                    .or_else(|| Some(&signal.axes[dimension]).filter(|a| **a != self.placeholder));
                if let Some(existing) = existing {
                    return Err(Error::DefaultAxisAlreadySet {
                        dimension,
                        existing: existing.clone(),
                        requested: destination,
                    });
                }
                claims.insert(dimension, destination.clone());
            }

            let indices = if let Some(mappings) = device.field_dimension_mappings(&field) {
                mappings
            } else if let (Some(dimension), 1) = (default_axis_dimension, rank) {
                vec![dimension]
            } else if let Some(mappings) = device.device_dimension_mappings() {
                mappings
            } else {
                (0..rank).collect()
            };
            if indices.len() != rank {
                return Err(Error::RankMismatch {
                    field: destination,
                    rank,
                    mappings: indices.len(),
                });
            }
            for &index in &indices {
                check_dimension(&destination, index, signal.rank)?;
            }

            plan.push(PlannedAxis {
                destination,
                node,
                indices,
                default_axis_dimension,
            });
        }
        Ok(plan)
    }
}

fn check_dimension(field: &str, index: usize, signal_rank: usize) -> Result<()> {
    if index >= signal_rank {
        return Err(Error::DimensionOutOfRange {
            field: field.to_string(),
            index,
            signal_rank,
        });
    }
    Ok(())
}

fn to_attribute_indices(indices: &[usize]) -> Vec<i64> {
    indices
        .iter()
        .map(|&index| i64::try_from(index).unwrap_or(i64::MAX))
        .collect()
}
