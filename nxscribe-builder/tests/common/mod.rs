//! Shared fixtures for the builder integration tests.
#![allow(dead_code)]

use nxscribe_builder::{DataBuilder, EntryBuilder, FieldProvider, FileBuilder};
use nxscribe_tree::{AttributeValue, ElementType};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A file with one entry holding the default groups.
pub fn file_with_entry() -> FileBuilder {
    init_logging();
    let mut file = FileBuilder::new("test.nxs");
    file.new_entry("entry")
        .and_then(EntryBuilder::add_default_groups)
        .unwrap();
    file
}

pub fn entry(file: &mut FileBuilder) -> &mut EntryBuilder {
    file.entry_mut("entry").unwrap()
}

/// A float positioner exposing a single lazy field.
pub fn axis(name: &str, shape: &[usize]) -> FieldProvider {
    FieldProvider::new(name, nxscribe_tree::BaseClass::Positioner)
        .with_default_data_field(name)
        .with_lazy_field(name, ElementType::Float64, shape)
}

pub fn string_array(values: &[&str]) -> AttributeValue {
    AttributeValue::StringArray(values.iter().map(|v| (*v).to_string()).collect())
}

pub fn indices(data: &DataBuilder, field: &str) -> Vec<i64> {
    data.nx_data()
        .attribute(&format!("{field}_indices"))
        .and_then(|value| value.as_int_array().map(<[i64]>::to_vec))
        .unwrap_or_default()
}
