use silguard::model::{
    ArchitectureType, Level, NewCategory, NewDevice, NewFaultType, NewMethod, NewProfile, Registry,
};
use silguard::validation::{self, ValidationError};

#[test]
fn test_validate_empty_registry() {
    let registry = Registry::new();
    assert!(validation::validate(&registry).is_ok());
}

#[test]
fn test_validate_consistent_registry() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Sensors")).unwrap();
    let device = registry.add_device(NewDevice::new("PT-1", category)).unwrap();
    let method = registry
        .add_method(NewMethod::new(category, "Comparison", 80.0, Level::Low))
        .unwrap();
    let fault = registry
        .add_fault_type(NewFaultType::new("F1", "Drift", category, Level::High))
        .unwrap();
    registry.link_method_fault(method, fault, Level::High).unwrap();
    registry.assign_method(device, method).unwrap();
    let profile = registry
        .add_profile(NewProfile::new("Unit 1", ArchitectureType::OneOutOfOne))
        .unwrap();
    registry.add_device_to_profile(profile, device).unwrap();
    registry.select_method(profile, device, method).unwrap();

    assert_eq!(validation::validate(&registry), Ok(()));
}

#[test]
fn test_detect_inconsistent_coverage_level() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Sensors")).unwrap();
    registry
        .add_method(NewMethod::new(category, "Comparison", 80.0, Level::High))
        .unwrap();

    let errors = validation::validate(&registry).unwrap_err();
    assert_eq!(
        errors,
        vec![ValidationError::InconsistentCoverageLevel {
            method: "Comparison".to_string(),
            coverage_percent: 80.0,
            declared: Level::High,
            expected: Level::Low,
        }]
    );
}

#[test]
fn test_detect_unsuitable_selection() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Sensors")).unwrap();
    let device = registry.add_device(NewDevice::new("PT-1", category)).unwrap();
    let method = registry
        .add_method(NewMethod::new(category, "Range check", 92.0, Level::Medium))
        .unwrap();
    let profile = registry
        .add_profile(NewProfile::new("Unit 1", ArchitectureType::OneOutOfOne))
        .unwrap();
    registry.add_device_to_profile(profile, device).unwrap();
    registry.select_method(profile, device, method).unwrap();

    let errors = validation::validate(&registry).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ValidationError::UnsuitableSelection {
            architecture: ArchitectureType::OneOutOfOne,
            ..
        }
    )));

    registry
        .set_profile_architecture(profile, ArchitectureType::OneOutOfTwo)
        .unwrap();
    assert!(validation::validate(&registry).is_ok());
}

#[test]
fn test_detect_unresolvable_fault() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Valves")).unwrap();
    let method = registry
        .add_method(NewMethod::new(category, "Partial stroke", 60.0, Level::Low))
        .unwrap();
    let fault = registry
        .add_fault_type(NewFaultType::new("F9", "Stuck closed", category, Level::High))
        .unwrap();
    registry.link_method_fault(method, fault, Level::Medium).unwrap();

    let errors = validation::validate(&registry).unwrap_err();
    assert_eq!(
        errors,
        vec![ValidationError::UnresolvableFault {
            code: "F9".to_string()
        }]
    );
}

#[test]
fn test_validation_error_display() {
    let error = ValidationError::UnresolvableFault {
        code: "F9".to_string(),
    };
    insta::assert_snapshot!(
        error.to_string(),
        @"Fault type 'F9' has no HIGH-effectiveness method and needs manual review"
    );

    let error = ValidationError::UnsuitableSelection {
        profile: "Unit 1".to_string(),
        device: "PT-1".to_string(),
        method: "Range check".to_string(),
        architecture: ArchitectureType::OneOutOfOne,
    };
    insta::assert_snapshot!(
        error.to_string(),
        @"Profile 'Unit 1' applies 'Range check' to 'PT-1', which 1oo1 does not admit"
    );

    let error = ValidationError::DanglingReference {
        entity_type: "Device".to_string(),
        entity_name: "PT-1".to_string(),
        reference_type: "category".to_string(),
        reference_id: 7,
    };
    let message = error.to_string();
    assert!(message.contains("PT-1"));
    assert!(message.contains("category 7"));
}

#[test]
fn test_rejected_cross_category_link_leaves_registry_valid() {
    let mut registry = Registry::new();
    let sensors = registry.add_category(NewCategory::named("Sensors")).unwrap();
    let valves = registry.add_category(NewCategory::named("Valves")).unwrap();
    let comparison = registry
        .add_method(NewMethod::new(sensors, "Comparison", 80.0, Level::Low))
        .unwrap();
    let stroke = registry
        .add_method(NewMethod::new(valves, "Partial stroke", 70.0, Level::Low))
        .unwrap();
    let fault = registry
        .add_fault_type(NewFaultType::new("F1", "Drift", sensors, Level::High))
        .unwrap();
    registry.link_method_fault(comparison, fault, Level::High).unwrap();

    assert!(registry.link_method_fault(stroke, fault, Level::High).is_err());
    assert_eq!(validation::validate(&registry), Ok(()));
}

#[test]
fn test_cross_category_link_display() {
    let error = ValidationError::CrossCategoryLink {
        method: "Partial stroke".to_string(),
        fault: "F1".to_string(),
    };
    insta::assert_snapshot!(
        error.to_string(),
        @"Diagnostic method 'Partial stroke' is linked to fault type 'F1' of another category"
    );
}
