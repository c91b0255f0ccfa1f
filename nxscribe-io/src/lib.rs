//! nxscribe-io: Serialization backends for nxscribe trees.
//!
//! Each writer implements [`nxscribe_tree::TreeWriter`], so a finished tree
//! is saved with `FileBuilder::save(&mut writer)`.
//!
//! - [`JsonTreeWriter`] - JSON rendering of the logical tree, always available
//! - `Hdf5TreeWriter` - HDF5 file output (feature `hdf5`)

mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod json;

pub use error::{Error, Result};
#[cfg(feature = "hdf5")]
pub use hdf5::{Hdf5TreeWriter, Hdf5WriteOptions};
pub use json::{to_json_value, JsonTreeWriter};
