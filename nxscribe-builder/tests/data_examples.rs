mod common;

use common::{axis, entry, file_with_entry, indices, string_array};
use nxscribe_builder::{
    DataDevice, Error, ErrorKind, FieldNaming, FieldProvider, NexusObjectProvider,
};
use nxscribe_tree::{AttributeValue, BaseClass, ElementType};

#[test]
fn test_single_axis() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[100]);
    let x = axis("x", &[100]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_device(&DataDevice::new(&detector)).unwrap();
    data.add_data_device(
        &DataDevice::new(&x)
            .with_dimension_mappings(&[0])
            .with_default_axis_dimension(0),
    )
    .unwrap();

    let group = data.nx_data();
    assert_eq!(group.attribute("signal"), Some(AttributeValue::from("data")));
    assert_eq!(group.attribute("axes"), Some(string_array(&["x"])));
    assert_eq!(indices(&data, "x"), vec![0]);
    assert!(group
        .data_node("x")
        .unwrap()
        .ptr_eq(&x.field("x").unwrap()));
}

#[test]
fn test_two_default_axes() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[100, 100_000]);
    let pressure = axis("pressure", &[100]);
    let tof = axis("tof", &[100_000]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();
    data.add_axis_provider(&pressure, Some(0), &[0]).unwrap();
    data.add_axis_provider(&tof, Some(1), &[1]).unwrap();

    assert_eq!(data.signal_field(), Some("det"));
    assert_eq!(
        data.nx_data().attribute("axes"),
        Some(string_array(&["pressure", "tof"]))
    );
    assert_eq!(indices(&data, "pressure"), vec![0]);
    assert_eq!(indices(&data, "tof"), vec![1]);
}

#[test]
fn test_multi_field_device_with_partial_defaults() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det1", &[50, 5, 1024]);
    let polar_angle = FieldProvider::new("polar_angle", BaseClass::Positioner)
        .with_default_data_field("rbv")
        .with_default_axis_field("demand")
        .with_lazy_field("rbv", ElementType::Float64, &[50, 5])
        .with_lazy_field("demand", ElementType::Float64, &[50]);
    let frame_number = axis("frame_number", &[5]);
    let time = axis("time", &[50, 5]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();
    data.add_data_device(
        &DataDevice::new(&polar_angle)
            .with_naming(FieldNaming::DeviceName)
            .with_dimension_mappings(&[0, 1])
            .with_default_axis_dimension(0),
    )
    .unwrap();
    data.add_axis_provider(&frame_number, Some(1), &[]).unwrap();
    data.add_axis_provider(&time, None, &[0, 1]).unwrap();

    assert_eq!(
        data.nx_data().attribute("axes"),
        Some(string_array(&["polar_angle_demand", "frame_number", "."]))
    );
    assert_eq!(indices(&data, "polar_angle_demand"), vec![0]);
    assert_eq!(indices(&data, "polar_angle_rbv"), vec![0, 1]);
    assert_eq!(indices(&data, "frame_number"), vec![1]);
    assert_eq!(indices(&data, "time"), vec![0, 1]);
    assert_eq!(
        data.axis_fields(),
        &["polar_angle_rbv", "polar_angle_demand", "frame_number", "time"]
    );
}

#[test]
fn test_axis_before_primary_fails() {
    let mut file = file_with_entry();
    let x = axis("x", &[100]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    let err = data.add_axis_provider(&x, Some(0), &[0]).unwrap_err();
    assert!(matches!(err, Error::PrimaryNotSet(_)));
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(data.nx_data().is_empty());
}

#[test]
fn test_rank_mismatch_leaves_group_unchanged() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[10, 20]);
    let stage = FieldProvider::new("stage", BaseClass::Positioner)
        .with_lazy_field("x", ElementType::Float64, &[10])
        .with_lazy_field("xy", ElementType::Float64, &[10, 20]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();
    let before = data.nx_data().attributes();

    let err = data
        .add_data_device(&DataDevice::new(&stage).with_dimension_mappings(&[0]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::RankMismatch {
            rank: 2,
            mappings: 1,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Mapping);
    assert_eq!(data.nx_data().attributes(), before);
    assert_eq!(data.nx_data().number_of_data_nodes(), 1);
}

#[test]
fn test_default_axis_claim_is_exclusive() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[100]);
    let x = axis("x", &[100]);
    let y = axis("y", &[100]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();
    data.add_axis_provider(&x, Some(0), &[]).unwrap();

    let err = data.add_axis_provider(&y, Some(0), &[]).unwrap_err();
    assert!(matches!(
        err,
        Error::DefaultAxisAlreadySet { dimension: 0, .. }
    ));
    assert_eq!(data.axes().unwrap(), &["x".to_string()]);
    assert_eq!(data.nx_data().attribute("axes"), Some(string_array(&["x"])));
    assert!(!data.nx_data().contains("y"));
    assert!(!data.nx_data().has_attribute("y_indices"));
}

#[test]
fn test_axis_without_default_keeps_placeholder() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[100]);
    let x = axis("x", &[100]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();
    data.add_axis_provider(&x, None, &[]).unwrap();

    assert_eq!(data.axes().unwrap(), &[".".to_string()]);
    assert_eq!(indices(&data, "x"), vec![0]);
}

#[test]
fn test_default_axis_dimension_out_of_range() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[100]);
    let x = axis("x", &[100]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();
    let err = data.add_axis_provider(&x, Some(1), &[]).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionOutOfRange {
            index: 1,
            signal_rank: 1,
            ..
        }
    ));
}

#[test]
fn test_axis_named_like_signal_fails() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[100]);
    let other = axis("det", &[100]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();
    assert!(matches!(
        data.add_axis_provider(&other, None, &[]),
        Err(Error::DuplicateName { .. })
    ));
}

#[test]
fn test_scalar_signal_has_empty_axes() {
    let mut file = file_with_entry();
    let counter = FieldProvider::monitor("counter", &[]);

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&counter).unwrap();
    assert_eq!(data.signal_rank(), Some(0));
    assert_eq!(
        data.nx_data().attribute("axes"),
        Some(AttributeValue::StringArray(Vec::new()))
    );
}

#[test]
fn test_signal_field_shared_with_instrument() {
    let mut file = file_with_entry();
    let detector = FieldProvider::detector("det", &[10]);
    entry(&mut file).add(&detector).unwrap();

    let mut data = entry(&mut file).create_default_data().unwrap();
    data.set_primary_provider(&detector).unwrap();

    let placed = file
        .root()
        .find_data_node("entry/instrument/det/data")
        .unwrap();
    let linked = file.root().find_data_node("entry/data/det").unwrap();
    assert!(placed.ptr_eq(&linked));
}
