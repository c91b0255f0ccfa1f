mod common;

use common::{entry, file_with_entry};
use nxscribe_builder::{
    ApplicationDefinition, ApplicationSchema, Error, ErrorKind, FieldProvider, FileBuilder,
    NexusObjectProvider, Problem, TomoApplicationBuilder,
};
use nxscribe_tree::{BaseClass, DataArray, ElementType};

fn tomo(file: &mut FileBuilder) -> TomoApplicationBuilder {
    let mut tomo = entry(file)
        .new_application(ApplicationDefinition::Tomo)
        .unwrap();
    tomo.add_default_groups().unwrap();
    tomo
}

fn detector() -> FieldProvider {
    FieldProvider::detector("pco", &[100, 2048, 2048])
        .with_lazy_field("image_key", ElementType::Int32, &[100])
        .with_field("x_pixel_size", 1.5)
        .with_field("y_pixel_size", 2.5)
        .with_field("distance", 0.75)
}

fn source() -> FieldProvider {
    FieldProvider::new("source", BaseClass::Source)
        .with_field("type", "Synchrotron X-ray Source")
        .with_field("name", "DLS")
        .with_field("probe", "x-ray")
}

/// Fills every element the NXtomo schema requires.
fn complete(tomo: &mut TomoApplicationBuilder) -> (FieldProvider, FieldProvider, FieldProvider) {
    let detector = detector();
    let rotation = FieldProvider::positioner("theta", &[100]);
    let control = FieldProvider::monitor("i0", &[100]);

    tomo.set_title("tomo scan");
    tomo.set_source(&source()).unwrap();
    tomo.set_detector(&detector).unwrap();
    tomo.set_sample_name("test sample").unwrap();
    tomo.set_rotation_angle(&rotation).unwrap();
    tomo.set_control(&control).unwrap();
    tomo.new_data().unwrap();
    (detector, rotation, control)
}

#[test]
fn test_subentry_created_with_definition() {
    let mut file = file_with_entry();
    let tomo = entry(&mut file)
        .new_application(ApplicationDefinition::Tomo)
        .unwrap();

    let subentry = file.root().find_group("entry/tomo_entry").unwrap();
    assert!(subentry.ptr_eq(tomo.subentry()));
    assert_eq!(subentry.base_class(), BaseClass::Subentry);
    assert_eq!(subentry.string_field("definition").as_deref(), Some("NXtomo"));
}

#[test]
fn test_second_tomo_subentry_fails() {
    let mut file = file_with_entry();
    entry(&mut file)
        .new_application(ApplicationDefinition::Tomo)
        .unwrap();
    let err = entry(&mut file)
        .new_application(ApplicationDefinition::Tomo)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateName { .. }));
}

#[test]
fn test_unsupported_definition() {
    let mut file = file_with_entry();
    let err = entry(&mut file)
        .new_application(ApplicationDefinition::Xas)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedApplicationDefinition(_)));
    assert!(!entry(&mut file).nx_entry().contains("xas_entry"));
}

#[test]
fn test_title_string_and_node() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    tomo.set_title("tomo appdef");
    assert_eq!(
        tomo.subentry().string_field("title").as_deref(),
        Some("tomo appdef")
    );

    let node = file.factory().create_data("replaced");
    tomo.set_title_node(&node);
    assert!(tomo.subentry().data_node("title").unwrap().ptr_eq(&node));
}

#[test]
fn test_source_and_detector_are_linked() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let source = source();
    let detector = detector();

    tomo.set_source(&source).unwrap();
    tomo.set_detector(&detector).unwrap();

    let instrument = tomo.subentry().group("instrument").unwrap();
    assert_eq!(
        instrument.group("source").unwrap().string_field("name").as_deref(),
        Some("DLS")
    );
    assert!(instrument
        .group("detector")
        .unwrap()
        .ptr_eq(&detector.nexus_object().unwrap()));
}

#[test]
fn test_detector_requires_instrument() {
    let mut file = file_with_entry();
    let mut tomo = entry(&mut file)
        .new_application(ApplicationDefinition::Tomo)
        .unwrap();
    assert!(matches!(
        tomo.set_detector(&detector()),
        Err(Error::NoGroupForCategory(BaseClass::Instrument))
    ));
}

#[test]
fn test_sample_device_replaces_sample() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let sample = FieldProvider::new("sample", BaseClass::Sample)
        .with_field("name", "my sample")
        .with_field("rotation_angle", 123.456);

    tomo.set_sample(&sample).unwrap();
    assert!(tomo
        .subentry()
        .group("sample")
        .unwrap()
        .ptr_eq(&sample.nexus_object().unwrap()));
}

#[test]
fn test_sample_positioners_are_linked() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let rotation = FieldProvider::positioner("theta", &[100]);
    let x = FieldProvider::positioner("x", &[100]);
    let y = FieldProvider::positioner("y", &[100]);
    let z = FieldProvider::positioner("z", &[100]);

    tomo.set_rotation_angle(&rotation).unwrap();
    tomo.set_x_translation(&x).unwrap();
    tomo.set_y_translation(&y).unwrap();
    tomo.set_z_translation(&z).unwrap();

    let sample = tomo.subentry().group("sample").unwrap();
    for (field, provider) in [
        ("rotation_angle", &rotation),
        ("x_translation", &x),
        ("y_translation", &y),
        ("z_translation", &z),
    ] {
        let linked = sample.data_node(field).unwrap();
        assert!(linked.ptr_eq(&provider.field("value").unwrap()), "{field}");
    }
}

#[test]
fn test_sample_fields_from_nodes() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let node = file
        .factory()
        .create_data(DataArray::lazy(ElementType::Float64, &[100]));

    tomo.set_x_translation_node(&node).unwrap();
    tomo.set_rotation_angle_node(&node).unwrap();
    let sample = tomo.subentry().group("sample").unwrap();
    assert!(sample.data_node("x_translation").unwrap().ptr_eq(&node));
    assert!(sample.data_node("rotation_angle").unwrap().ptr_eq(&node));
}

#[test]
fn test_control_monitor() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let control = FieldProvider::positioner("current", &[100]);

    tomo.set_control(&control).unwrap();
    let monitor = tomo.subentry().group("control").unwrap();
    assert_eq!(monitor.base_class(), BaseClass::Monitor);
    assert!(monitor
        .data_node("data")
        .unwrap()
        .ptr_eq(&control.field("value").unwrap()));
}

#[test]
fn test_new_data_links_three_fields() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let (detector, rotation, _) = complete(&mut tomo);

    let data = tomo.subentry().group("data").unwrap();
    assert!(data
        .data_node("data")
        .unwrap()
        .ptr_eq(&detector.field("data").unwrap()));
    assert!(data
        .data_node("image_key")
        .unwrap()
        .ptr_eq(&detector.field("image_key").unwrap()));
    assert!(data
        .data_node("rotation_angle")
        .unwrap()
        .ptr_eq(&rotation.field("value").unwrap()));
}

#[test]
fn test_new_data_without_detector_fails() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    assert!(matches!(tomo.new_data(), Err(Error::Tree(_))));
    assert!(!tomo.subentry().contains("data"));
}

#[test]
fn test_complete_subentry_validates() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let _devices = complete(&mut tomo);

    assert!(tomo.validate().is_ok());
    assert!(entry(&mut file).validate().is_ok());
    assert!(file.validate().is_ok());
}

#[test]
fn test_missing_elements_are_all_reported() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let detector = detector();
    let rotation = FieldProvider::positioner("theta", &[100]);
    tomo.set_source(&source()).unwrap();
    tomo.set_detector(&detector).unwrap();
    tomo.set_rotation_angle(&rotation).unwrap();
    tomo.set_control(&FieldProvider::monitor("i0", &[100])).unwrap();
    tomo.new_data().unwrap();

    // Two independent omissions: the sample name and the source group.
    tomo.subentry()
        .group("instrument")
        .unwrap()
        .remove_child("source");

    let report = tomo.validate().unwrap_err();
    assert_eq!(report.len(), 2, "{report}");
    assert!(report.contains_path("sample/name"));
    assert!(report.contains_path("instrument/source"));
    assert!(report
        .violations()
        .iter()
        .all(|violation| violation.problem == Problem::Missing));

    let err = file.validate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let Error::Validation(report) = err else {
        panic!("expected a validation error");
    };
    assert!(report.contains_path("entry/tomo_entry/sample/name"));
    assert!(report.contains_path("entry/tomo_entry/instrument/source"));
}

#[test]
fn test_wrong_rank_reported() {
    let mut file = file_with_entry();
    let mut tomo = tomo(&mut file);
    let _devices = complete(&mut tomo);
    let flat = file.factory().create_data(vec![1.0, 2.0]);
    tomo.subentry()
        .group("instrument")
        .unwrap()
        .group("detector")
        .unwrap()
        .set_child("data", &flat);

    let report = tomo.validate().unwrap_err();
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.violations()[0].problem,
        Problem::WrongRank {
            expected: 3,
            found: 1
        }
    );
}

#[test]
fn test_custom_schema_subentry() {
    let mut file = file_with_entry();
    let schema = ApplicationSchema::new("NXxas")
        .group("monochromator", BaseClass::Monochromator)
        .field_with_rank("monochromator/energy", 1);
    let subentry = entry(&mut file).add_application_schema(schema).unwrap();
    assert_eq!(subentry.string_field("definition").as_deref(), Some("NXxas"));

    let Err(Error::Validation(report)) = file.validate() else {
        panic!("expected validation to fail");
    };
    assert_eq!(report.len(), 2);
    assert!(report.contains_path("entry/xas_entry/monochromator"));

    let factory = file.factory().clone();
    let monochromator = subentry
        .create_group(&factory, "monochromator", BaseClass::Monochromator)
        .unwrap();
    monochromator
        .create_data(&factory, "energy", vec![7.0, 7.1, 7.2])
        .unwrap();
    assert!(file.validate().is_ok());
}
