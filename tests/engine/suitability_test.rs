use silguard::engine::{suitable_methods, Evaluator};
use silguard::error::{EngineError, RecordKind};
use silguard::model::{
    ArchitectureType, CategoryId, DeviceId, Level, MethodId, NewCategory, NewDevice, NewMethod,
    Registry,
};
use silguard::provider::RecordProvider;

struct Fixture {
    registry: Registry,
    device: DeviceId,
    high: MethodId,
    medium: MethodId,
    low: MethodId,
}

fn fixture() -> Fixture {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Sensors")).unwrap();
    let device = registry.add_device(NewDevice::new("PT-101", category)).unwrap();
    let high = registry
        .add_method(NewMethod::new(category, "Redundant comparison", 99.5, Level::High))
        .unwrap();
    let medium = registry
        .add_method(NewMethod::new(category, "Range check", 92.0, Level::Medium))
        .unwrap();
    let low = registry
        .add_method(NewMethod::new(category, "Rate of change", 60.0, Level::Low))
        .unwrap();
    Fixture {
        registry,
        device,
        high,
        medium,
        low,
    }
}

fn ids(methods: &[silguard::model::DiagnosticMethod]) -> Vec<MethodId> {
    methods.iter().map(|m| m.id).collect()
}

#[test]
fn test_one_out_of_one_excludes_medium() {
    let f = fixture();
    let evaluator = Evaluator::new(&f.registry);
    let methods = evaluator
        .suitable_methods(f.device, Some(ArchitectureType::OneOutOfOne))
        .unwrap();
    assert_eq!(ids(&methods), vec![f.low, f.high]);
}

#[test]
fn test_redundant_architectures_admit_everything() {
    let f = fixture();
    let evaluator = Evaluator::new(&f.registry);
    for arch in [ArchitectureType::OneOutOfTwo, ArchitectureType::TwoOutOfThree] {
        let methods = evaluator.suitable_methods(f.device, Some(arch)).unwrap();
        assert_eq!(ids(&methods), vec![f.low, f.medium, f.high], "{}", arch);
    }
}

#[test]
fn test_assigned_methods_are_not_duplicated() {
    let mut f = fixture();
    f.registry.assign_method(f.device, f.low).unwrap();
    let loaded = f.registry.load_device(f.device).unwrap();
    let methods = suitable_methods(&loaded, ArchitectureType::TwoOutOfThree);
    assert_eq!(methods.len(), 3);
}

#[test]
fn test_equal_coverage_ordered_by_id() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Sensors")).unwrap();
    let device = registry.add_device(NewDevice::new("LT-5", category)).unwrap();
    let first = registry
        .add_method(NewMethod::new(category, "Drift", 70.0, Level::Low))
        .unwrap();
    let second = registry
        .add_method(NewMethod::new(category, "Stuck signal", 70.0, Level::Low))
        .unwrap();

    let methods = Evaluator::new(&registry)
        .suitable_methods(device, Some(ArchitectureType::OneOutOfOne))
        .unwrap();
    assert_eq!(ids(&methods), vec![first, second]);
}

#[test]
fn test_other_categories_are_ignored() {
    let mut f = fixture();
    let valves = f.registry.add_category(NewCategory::named("Valves")).unwrap();
    f.registry
        .add_method(NewMethod::new(valves, "Partial stroke", 65.0, Level::Low))
        .unwrap();

    let methods = Evaluator::new(&f.registry)
        .suitable_methods(f.device, Some(ArchitectureType::TwoOutOfThree))
        .unwrap();
    assert_eq!(methods.len(), 3);
}

#[test]
fn test_missing_architecture_is_invalid() {
    let f = fixture();
    let result = Evaluator::new(&f.registry).suitable_methods(f.device, None);
    assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
}

#[test]
fn test_unknown_device_not_found() {
    let f = fixture();
    let result = Evaluator::new(&f.registry)
        .suitable_methods(DeviceId(999), Some(ArchitectureType::OneOutOfOne));
    assert!(matches!(result, Err(EngineError::NotFound { id: 999, .. })));
}

#[test]
fn test_coverage_of_methods_lookup_errors() {
    let mut f = fixture();
    let evaluator = Evaluator::new(&f.registry);
    assert_eq!(
        evaluator.coverage_of_methods(f.device, &[f.high, f.low]).unwrap(),
        99.8
    );

    let unknown = evaluator.coverage_of_methods(f.device, &[f.high, MethodId(999)]);
    assert!(matches!(
        unknown,
        Err(EngineError::NotFound {
            kind: RecordKind::Method,
            id: 999
        })
    ));

    assert_eq!(
        evaluator.coverage_of_methods(f.device, &[f.low, f.low]),
        Err(EngineError::DuplicateSelection { method: f.low.0 })
    );

    let valves = f.registry.add_category(NewCategory::named("Valves")).unwrap();
    let stroke = f
        .registry
        .add_method(NewMethod::new(valves, "Partial stroke", 65.0, Level::Low))
        .unwrap();
    assert_eq!(
        Evaluator::new(&f.registry).coverage_of_methods(f.device, &[stroke]),
        Err(EngineError::CategoryMismatch {
            method: stroke.0,
            device: f.device.0,
        })
    );
}

#[test]
fn test_unresolved_category_yields_nothing() {
    let f = fixture();
    let mut loaded = f.registry.load_device(f.device).unwrap();
    loaded.category = None;
    loaded.device.category = CategoryId(999);
    assert!(suitable_methods(&loaded, ArchitectureType::TwoOutOfThree).is_empty());
}

#[test]
fn test_method_level_helpers() {
    let f = fixture();
    let medium = f.registry.method(f.medium).unwrap();
    assert!(!medium.is_suitable_for(ArchitectureType::OneOutOfOne));
    assert!(medium.is_suitable_for(ArchitectureType::OneOutOfTwo));
    assert_eq!(medium.required_coverage(), 90.0);
}
