//! Builder for `NXtomo` subentries.

use crate::appdef::schema::{ApplicationDefinitionValidator, ApplicationSchema};
use crate::provider::NexusObjectProvider;
use crate::validation::ValidationReport;
use crate::{Error, Result};
use nxscribe_tree::{BaseClass, DataNode, GroupNode, NodeFactory};

const INSTRUMENT: &str = "instrument";
const SAMPLE: &str = "sample";
const CONTROL: &str = "control";

/// Populates a `tomo_entry` subentry.
///
/// Devices are linked, not copied: the detector set here is the same group
/// the entry's instrument may also hold.
#[derive(Debug, Clone)]
pub struct TomoApplicationBuilder {
    factory: NodeFactory,
    subentry: GroupNode,
    validator: ApplicationDefinitionValidator,
}

impl TomoApplicationBuilder {
    pub(crate) fn new(factory: NodeFactory, subentry: GroupNode) -> Self {
        Self {
            factory,
            subentry,
            validator: ApplicationDefinitionValidator::new(ApplicationSchema::nx_tomo()),
        }
    }

    #[must_use]
    pub fn subentry(&self) -> &GroupNode {
        &self.subentry
    }

    pub(crate) fn validator(&self) -> &ApplicationDefinitionValidator {
        &self.validator
    }

    /// Creates the `instrument` and `sample` groups.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateName`] if either already exists.
    pub fn add_default_groups(&mut self) -> Result<()> {
        self.subentry
            .create_group(&self.factory, INSTRUMENT, BaseClass::Instrument)?;
        self.subentry
            .create_group(&self.factory, SAMPLE, BaseClass::Sample)?;
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) {
        self.set_title_node(&self.factory.create_data(title));
    }

    pub fn set_title_node(&mut self, title: &DataNode) {
        self.subentry.set_child("title", title);
    }

    /// Places the source group under `instrument/source`.
    ///
    /// # Errors
    /// Fails if the instrument group is missing or the provider cannot be realized.
    pub fn set_source(&mut self, source: &dyn NexusObjectProvider) -> Result<()> {
        let instrument = self.required_group(INSTRUMENT, BaseClass::Instrument)?;
        instrument.set_child("source", &source.realize(&self.factory)?);
        Ok(())
    }

    /// Places the detector group under `instrument/detector`.
    ///
    /// # Errors
    /// Fails if the instrument group is missing or the provider cannot be realized.
    pub fn set_detector(&mut self, detector: &dyn NexusObjectProvider) -> Result<()> {
        let instrument = self.required_group(INSTRUMENT, BaseClass::Instrument)?;
        instrument.set_child("detector", &detector.realize(&self.factory)?);
        Ok(())
    }

    /// Replaces the sample group with the provider's group.
    ///
    /// # Errors
    /// Fails if the provider cannot be realized.
    pub fn set_sample(&mut self, sample: &dyn NexusObjectProvider) -> Result<()> {
        self.subentry
            .set_child(SAMPLE, &sample.realize(&self.factory)?);
        Ok(())
    }

    /// Sets `sample/name`.
    ///
    /// # Errors
    /// Returns [`Error::NoGroupForCategory`] if the sample group is missing.
    pub fn set_sample_name(&mut self, name: &str) -> Result<()> {
        let sample = self.required_group(SAMPLE, BaseClass::Sample)?;
        sample.set_child("name", &self.factory.create_data(name));
        Ok(())
    }

    /// Links the positioner's default field as `sample/rotation_angle`.
    ///
    /// # Errors
    /// Fails if the sample group is missing or the provider lacks its default field.
    pub fn set_rotation_angle(&mut self, positioner: &dyn NexusObjectProvider) -> Result<()> {
        self.link_sample_field("rotation_angle", &self.default_field(positioner)?)
    }

    /// Links `node` as `sample/rotation_angle`.
    ///
    /// # Errors
    /// Returns [`Error::NoGroupForCategory`] if the sample group is missing.
    pub fn set_rotation_angle_node(&mut self, node: &DataNode) -> Result<()> {
        self.link_sample_field("rotation_angle", node)
    }

    /// Links the positioner's default field as `sample/x_translation`.
    ///
    /// # Errors
    /// Fails if the sample group is missing or the provider lacks its default field.
    pub fn set_x_translation(&mut self, positioner: &dyn NexusObjectProvider) -> Result<()> {
        self.link_sample_field("x_translation", &self.default_field(positioner)?)
    }

    /// # Errors
    /// Returns [`Error::NoGroupForCategory`] if the sample group is missing.
    pub fn set_x_translation_node(&mut self, node: &DataNode) -> Result<()> {
        self.link_sample_field("x_translation", node)
    }

    /// Links the positioner's default field as `sample/y_translation`.
    ///
    /// # Errors
    /// Fails if the sample group is missing or the provider lacks its default field.
    pub fn set_y_translation(&mut self, positioner: &dyn NexusObjectProvider) -> Result<()> {
        self.link_sample_field("y_translation", &self.default_field(positioner)?)
    }

    /// # Errors
    /// Returns [`Error::NoGroupForCategory`] if the sample group is missing.
    pub fn set_y_translation_node(&mut self, node: &DataNode) -> Result<()> {
        self.link_sample_field("y_translation", node)
    }

    /// Links the positioner's default field as `sample/z_translation`.
    ///
    /// # Errors
    /// Fails if the sample group is missing or the provider lacks its default field.
    pub fn set_z_translation(&mut self, positioner: &dyn NexusObjectProvider) -> Result<()> {
        self.link_sample_field("z_translation", &self.default_field(positioner)?)
    }

    /// # Errors
    /// Returns [`Error::NoGroupForCategory`] if the sample group is missing.
    pub fn set_z_translation_node(&mut self, node: &DataNode) -> Result<()> {
        self.link_sample_field("z_translation", node)
    }

    /// Links the device's default field as `control/data`, creating the
    /// `control` monitor group if needed.
    ///
    /// # Errors
    /// Fails if the provider lacks its default field, or if `control`
    /// exists but is not a group.
    pub fn set_control(&mut self, device: &dyn NexusObjectProvider) -> Result<()> {
        let data = self.default_field(device)?;
        let control = match self.subentry.group(CONTROL) {
            Some(control) => control,
            None => self
                .subentry
                .create_group(&self.factory, CONTROL, BaseClass::Monitor)?,
        };
        control.set_child("data", &data);
        Ok(())
    }

    /// Creates the `data` group linking the detector data, the rotation
    /// angle and the image key.
    ///
    /// # Errors
    /// Fails if any of the three linked fields is missing, or if `data`
    /// already exists.
    pub fn new_data(&mut self) -> Result<GroupNode> {
        let detector = self.subentry.find_group("instrument/detector")?;
        let data = detector.find_data_node("data")?;
        let image_key = detector.find_data_node("image_key")?;
        let rotation_angle = self.subentry.find_data_node("sample/rotation_angle")?;

        let nx_data = self
            .subentry
            .create_group(&self.factory, "data", BaseClass::Data)?;
        nx_data.add_data_node("data", &data)?;
        nx_data.add_data_node("rotation_angle", &rotation_angle)?;
        nx_data.add_data_node("image_key", &image_key)?;
        nx_data.set_attribute("signal", "data");
        log::debug!("{}: created NXtomo data group", self.subentry.label());
        Ok(nx_data)
    }

    /// Validates the subentry against the `NXtomo` schema.
    ///
    /// # Errors
    /// Returns every violation found.
    pub fn validate(&self) -> std::result::Result<(), ValidationReport> {
        self.validator.validate(&self.subentry)
    }

    fn required_group(&self, name: &str, base_class: BaseClass) -> Result<GroupNode> {
        self.subentry
            .group(name)
            .filter(|group| group.base_class() == base_class)
            .ok_or(Error::NoGroupForCategory(base_class))
    }

    fn default_field(&self, device: &dyn NexusObjectProvider) -> Result<DataNode> {
        device.realize(&self.factory)?;
        device.field(device.default_data_field_name())
    }

    fn link_sample_field(&self, name: &str, node: &DataNode) -> Result<()> {
        let sample = self.required_group(SAMPLE, BaseClass::Sample)?;
        sample.set_child(name, node);
        Ok(())
    }
}
