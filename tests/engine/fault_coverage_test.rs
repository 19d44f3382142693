use silguard::engine::{Evaluator, FaultVerdict};
use silguard::error::EngineError;
use silguard::model::{
    ArchitectureType, DeviceId, FaultTypeId, Level, MethodId, NewCategory, NewDevice,
    NewFaultType, NewMethod, NewProfile, ProfileId, Registry,
};

struct Fixture {
    registry: Registry,
    profile: ProfileId,
    device: DeviceId,
    fault: FaultTypeId,
    watchdog: MethodId,
    crosscheck: MethodId,
    plausibility: MethodId,
}

/// One fault with two HIGH links and one LOW link.
fn fixture() -> Fixture {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Logic solvers")).unwrap();
    let device = registry.add_device(NewDevice::new("LS-1", category)).unwrap();
    let fault = registry
        .add_fault_type(NewFaultType::new("CPU-HANG", "Processor hang", category, Level::High))
        .unwrap();
    let watchdog = registry
        .add_method(NewMethod::new(category, "Watchdog", 90.0, Level::Medium))
        .unwrap();
    let crosscheck = registry
        .add_method(NewMethod::new(category, "Cross-check", 95.0, Level::Medium))
        .unwrap();
    let plausibility = registry
        .add_method(NewMethod::new(category, "Plausibility", 60.0, Level::Low))
        .unwrap();
    registry.link_method_fault(watchdog, fault, Level::High).unwrap();
    registry.link_method_fault(crosscheck, fault, Level::High).unwrap();
    registry.link_method_fault(plausibility, fault, Level::Low).unwrap();

    let profile = registry
        .add_profile(NewProfile::new("Shutdown", ArchitectureType::OneOutOfTwo))
        .unwrap();
    registry.add_device_to_profile(profile, device).unwrap();

    Fixture {
        registry,
        profile,
        device,
        fault,
        watchdog,
        crosscheck,
        plausibility,
    }
}

#[test]
fn test_all_high_methods_cover_the_fault() {
    let mut f = fixture();
    let status = f
        .registry
        .set_fault_selection(f.profile, f.fault, vec![f.crosscheck, f.watchdog], None)
        .unwrap();
    assert!(status.covered());
    assert!(status.missing_ids.is_empty());
    assert!(f.registry.profile_fault(f.profile, f.fault).unwrap().covered);
}

#[test]
fn test_extra_methods_do_not_hurt() {
    let mut f = fixture();
    let status = f
        .registry
        .set_fault_selection(
            f.profile,
            f.fault,
            vec![f.plausibility, f.watchdog, f.crosscheck],
            None,
        )
        .unwrap();
    assert_eq!(status.verdict, FaultVerdict::Covered);
    assert_eq!(
        status.resolved_ids,
        vec![f.plausibility, f.watchdog, f.crosscheck]
    );
}

#[test]
fn test_partial_selection_reports_missing() {
    let mut f = fixture();
    let status = f
        .registry
        .set_fault_selection(f.profile, f.fault, vec![f.watchdog], Some("pending".into()))
        .unwrap();
    assert_eq!(status.verdict, FaultVerdict::NotCovered);
    assert_eq!(status.missing_ids, vec![f.crosscheck]);

    let record = f.registry.profile_fault(f.profile, f.fault).unwrap();
    assert!(!record.covered);
    assert_eq!(record.notes.as_deref(), Some("pending"));
}

#[test]
fn test_empty_selection_not_covered() {
    let mut f = fixture();
    let status = f
        .registry
        .set_fault_selection(f.profile, f.fault, Vec::new(), None)
        .unwrap();
    assert_eq!(status.verdict, FaultVerdict::NotCovered);
}

#[test]
fn test_duplicate_selection_rejected_without_storing() {
    let mut f = fixture();
    let result =
        f.registry
            .set_fault_selection(f.profile, f.fault, vec![f.watchdog, f.watchdog], None);
    assert_eq!(
        result,
        Err(EngineError::DuplicateSelection {
            method: f.watchdog.0
        })
    );
    assert!(f.registry.profile_fault(f.profile, f.fault).is_none());
}

#[test]
fn test_link_changes_re_resolve_records() {
    let mut f = fixture();
    f.registry
        .set_fault_selection(f.profile, f.fault, vec![f.watchdog], None)
        .unwrap();
    assert!(!f.registry.profile_fault(f.profile, f.fault).unwrap().covered);

    // Dropping the unselected HIGH link leaves the selection complete.
    assert!(f.registry.unlink_method_fault(f.crosscheck, f.fault).unwrap());
    assert!(f.registry.profile_fault(f.profile, f.fault).unwrap().covered);
    assert_eq!(
        f.registry.profile(f.profile).unwrap().metrics.fault_stats.covered_faults,
        1
    );

    // A new HIGH link the user has not picked uncovers it again.
    let category = f.registry.device(f.device).unwrap().category;
    let memory_test = f
        .registry
        .add_method(NewMethod::new(category, "Memory test", 99.0, Level::High))
        .unwrap();
    f.registry
        .link_method_fault(memory_test, f.fault, Level::High)
        .unwrap();
    let record = f.registry.profile_fault(f.profile, f.fault).unwrap();
    assert!(!record.covered);
    assert_eq!(record.verdict, FaultVerdict::NotCovered);
}

#[test]
fn test_duplicate_link_rejected() {
    let mut f = fixture();
    let err = f
        .registry
        .link_method_fault(f.watchdog, f.fault, Level::Low)
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateAssociation { .. }));
    assert!(err.is_data_integrity());
}

#[test]
fn test_link_across_categories_rejected() {
    let mut f = fixture();
    let valves = f.registry.add_category(NewCategory::named("Valves")).unwrap();
    let stroke = f
        .registry
        .add_method(NewMethod::new(valves, "Partial stroke", 70.0, Level::Low))
        .unwrap();

    let result = f.registry.link_method_fault(stroke, f.fault, Level::High);
    assert_eq!(
        result,
        Err(EngineError::FaultCategoryMismatch {
            method: stroke.0,
            fault: f.fault.0,
        })
    );
    assert!(!f
        .registry
        .method_fault_links()
        .any(|link| link.key.method == stroke));

    // The foreign method cannot stand in for the fault's own HIGH methods.
    let status = f
        .registry
        .set_fault_selection(f.profile, f.fault, vec![stroke], None)
        .unwrap();
    assert_eq!(status.verdict, FaultVerdict::NotCovered);
}

#[test]
fn test_lowering_link_effectiveness_re_resolves_records() {
    let mut f = fixture();
    f.registry
        .set_fault_selection(f.profile, f.fault, vec![f.watchdog], None)
        .unwrap();
    assert!(!f.registry.profile_fault(f.profile, f.fault).unwrap().covered);

    f.registry
        .set_link_effectiveness(f.crosscheck, f.fault, Level::Medium)
        .unwrap();
    let record = f.registry.profile_fault(f.profile, f.fault).unwrap();
    assert!(record.covered);
    assert_eq!(record.verdict, FaultVerdict::Covered);
    assert!(f.registry.metrics_are_current(f.profile).unwrap());
    assert_eq!(
        f.registry.profile(f.profile).unwrap().metrics.fault_stats.covered_faults,
        1
    );
}

#[test]
fn test_effectiveness_for_whole_fault() {
    let mut f = fixture();
    f.registry
        .set_fault_selection(f.profile, f.fault, vec![f.watchdog, f.crosscheck], None)
        .unwrap();

    let changed = f
        .registry
        .set_effectiveness_for_fault(f.fault, Level::Medium)
        .unwrap();
    assert_eq!(changed, 3);
    let record = f.registry.profile_fault(f.profile, f.fault).unwrap();
    assert_eq!(record.verdict, FaultVerdict::Unresolvable);
    assert!(!record.covered);
    assert!(f.registry.metrics_are_current(f.profile).unwrap());
}

#[test]
fn test_set_effectiveness_of_missing_link() {
    let mut f = fixture();
    let category = f.registry.device(f.device).unwrap().category;
    let other = f
        .registry
        .add_fault_type(NewFaultType::new("MEM-FLIP", "Bit flip", category, Level::Medium))
        .unwrap();
    let err = f
        .registry
        .set_link_effectiveness(f.watchdog, other, Level::High)
        .unwrap_err();
    assert!(matches!(err, EngineError::MissingAssociation { .. }));
}

#[test]
fn test_fault_without_high_link_is_unresolvable() {
    let mut f = fixture();
    let category = f.registry.device(f.device).unwrap().category;
    let orphan = f
        .registry
        .add_fault_type(NewFaultType::new("MEM-FLIP", "Bit flip", category, Level::Medium))
        .unwrap();
    f.registry
        .link_method_fault(f.plausibility, orphan, Level::Medium)
        .unwrap();

    let status = f
        .registry
        .set_fault_selection(f.profile, orphan, vec![f.plausibility], None)
        .unwrap();
    assert_eq!(status.verdict, FaultVerdict::Unresolvable);
    assert!(!status.covered());
    assert_eq!(
        status.require_resolvable(orphan),
        Err(EngineError::UnresolvableFault { fault: orphan.0 })
    );

    let stats = f.registry.fault_coverage_stats(f.profile).unwrap();
    assert_eq!(stats.unresolvable_faults, 1);
    assert_eq!(stats.covered_faults, 0);
}

#[test]
fn test_evaluator_resolves_without_storing() {
    let f = fixture();
    let evaluator = Evaluator::new(&f.registry);
    let status = evaluator
        .fault_status(f.fault, &[f.watchdog, f.crosscheck])
        .unwrap();
    assert!(status.covered());
    assert!(f.registry.profile_fault(f.profile, f.fault).is_none());
}

#[test]
fn test_clear_fault_selection() {
    let mut f = fixture();
    f.registry
        .set_fault_selection(f.profile, f.fault, vec![f.watchdog, f.crosscheck], None)
        .unwrap();
    assert_eq!(
        f.registry.fault_coverage_stats(f.profile).unwrap().coverage_percentage,
        100.0
    );

    assert!(f.registry.clear_fault_selection(f.profile, f.fault).unwrap());
    assert!(!f.registry.clear_fault_selection(f.profile, f.fault).unwrap());
    let stats = f.registry.fault_coverage_stats(f.profile).unwrap();
    assert_eq!(stats.total_faults, 0);
    assert_eq!(stats.coverage_percentage, 0.0);
}
