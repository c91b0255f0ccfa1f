//! NeXus base-class tags.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The NeXus base class of a group.
///
/// A group carries exactly one base class. The class decides which kinds of
/// child groups it may hold (see [`BaseClass::can_add_child`]) and is
/// serialized as the `NX_class` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BaseClass {
    #[cfg_attr(feature = "serde", serde(rename = "NXroot"))]
    Root,
    #[cfg_attr(feature = "serde", serde(rename = "NXentry"))]
    Entry,
    #[cfg_attr(feature = "serde", serde(rename = "NXsubentry"))]
    Subentry,
    #[cfg_attr(feature = "serde", serde(rename = "NXinstrument"))]
    Instrument,
    #[cfg_attr(feature = "serde", serde(rename = "NXsample"))]
    Sample,
    #[cfg_attr(feature = "serde", serde(rename = "NXdata"))]
    Data,
    #[cfg_attr(feature = "serde", serde(rename = "NXdetector"))]
    Detector,
    #[cfg_attr(feature = "serde", serde(rename = "NXpositioner"))]
    Positioner,
    #[cfg_attr(feature = "serde", serde(rename = "NXmonitor"))]
    Monitor,
    #[cfg_attr(feature = "serde", serde(rename = "NXsource"))]
    Source,
    #[cfg_attr(feature = "serde", serde(rename = "NXbeam"))]
    Beam,
    #[cfg_attr(feature = "serde", serde(rename = "NXmonochromator"))]
    Monochromator,
    #[cfg_attr(feature = "serde", serde(rename = "NXslit"))]
    Slit,
    #[cfg_attr(feature = "serde", serde(rename = "NXattenuator"))]
    Attenuator,
    #[cfg_attr(feature = "serde", serde(rename = "NXmirror"))]
    Mirror,
    #[cfg_attr(feature = "serde", serde(rename = "NXaperture"))]
    Aperture,
    #[cfg_attr(feature = "serde", serde(rename = "NXcollection"))]
    Collection,
    #[cfg_attr(feature = "serde", serde(rename = "NXnote"))]
    Note,
    #[cfg_attr(feature = "serde", serde(rename = "NXuser"))]
    User,
    #[cfg_attr(feature = "serde", serde(rename = "NXtransformations"))]
    Transformations,
    #[cfg_attr(feature = "serde", serde(rename = "NXlog"))]
    Log,
    #[cfg_attr(feature = "serde", serde(rename = "NXenvironment"))]
    Environment,
}

impl BaseClass {
    /// All known base classes.
    pub const ALL: [BaseClass; 22] = [
        BaseClass::Root,
        BaseClass::Entry,
        BaseClass::Subentry,
        BaseClass::Instrument,
        BaseClass::Sample,
        BaseClass::Data,
        BaseClass::Detector,
        BaseClass::Positioner,
        BaseClass::Monitor,
        BaseClass::Source,
        BaseClass::Beam,
        BaseClass::Monochromator,
        BaseClass::Slit,
        BaseClass::Attenuator,
        BaseClass::Mirror,
        BaseClass::Aperture,
        BaseClass::Collection,
        BaseClass::Note,
        BaseClass::User,
        BaseClass::Transformations,
        BaseClass::Log,
        BaseClass::Environment,
    ];

    /// Returns the `NX_class` string, e.g. `"NXpositioner"`.
    #[must_use]
    pub fn nx_class(self) -> &'static str {
        match self {
            BaseClass::Root => "NXroot",
            BaseClass::Entry => "NXentry",
            BaseClass::Subentry => "NXsubentry",
            BaseClass::Instrument => "NXinstrument",
            BaseClass::Sample => "NXsample",
            BaseClass::Data => "NXdata",
            BaseClass::Detector => "NXdetector",
            BaseClass::Positioner => "NXpositioner",
            BaseClass::Monitor => "NXmonitor",
            BaseClass::Source => "NXsource",
            BaseClass::Beam => "NXbeam",
            BaseClass::Monochromator => "NXmonochromator",
            BaseClass::Slit => "NXslit",
            BaseClass::Attenuator => "NXattenuator",
            BaseClass::Mirror => "NXmirror",
            BaseClass::Aperture => "NXaperture",
            BaseClass::Collection => "NXcollection",
            BaseClass::Note => "NXnote",
            BaseClass::User => "NXuser",
            BaseClass::Transformations => "NXtransformations",
            BaseClass::Log => "NXlog",
            BaseClass::Environment => "NXenvironment",
        }
    }

    /// Default group name for this class: the class name without the `NX`
    /// prefix, e.g. `"positioner"` for `NXpositioner`.
    #[must_use]
    pub fn default_name(self) -> &'static str {
        &self.nx_class()[2..]
    }

    /// Returns true if a group of this class may hold a child group of class `child`.
    ///
    /// This is the static compatibility table used when a device is placed
    /// without an explicit category.
    #[must_use]
    pub fn can_add_child(self, child: BaseClass) -> bool {
        use BaseClass::{
            Aperture, Attenuator, Beam, Collection, Data, Detector, Entry, Environment, Instrument,
            Log, Mirror, Monitor, Monochromator, Note, Positioner, Root, Sample, Slit, Source,
            Subentry, Transformations, User,
        };

        match self {
            Root => child == Entry,
            Entry | Subentry => matches!(
                child,
                Instrument | Sample | Data | Monitor | User | Note | Collection
            ) || (self == Entry && child == Subentry),
            Instrument => matches!(
                child,
                Detector
                    | Positioner
                    | Monitor
                    | Source
                    | Beam
                    | Monochromator
                    | Slit
                    | Attenuator
                    | Mirror
                    | Aperture
                    | Collection
                    | Note
            ),
            Sample => matches!(
                child,
                Positioner | Beam | Transformations | Environment | Log | Note | Collection
            ),
            Detector | Source | Monochromator | Slit | Attenuator | Mirror | Aperture => {
                matches!(child, Transformations | Collection | Note)
            }
            Positioner | Monitor | Beam => matches!(child, Transformations | Note),
            Environment => matches!(child, Positioner | Log | Note),
            Collection => !matches!(child, Root | Entry),
            Data | Note | User | Transformations | Log => false,
        }
    }
}

impl fmt::Display for BaseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nx_class())
    }
}

impl FromStr for BaseClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseClass::ALL
            .iter()
            .copied()
            .find(|class| class.nx_class() == s)
            .ok_or_else(|| format!("unknown NeXus base class: {s}"))
    }
}
