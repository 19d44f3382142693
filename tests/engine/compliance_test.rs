use silguard::config::{ComplianceSettings, Settings, SilSettings};
use silguard::engine::compliance::{coverage_verdict, derived_sil_with, is_coverage_compliant_with};
use silguard::engine::{derived_sil, is_coverage_compliant, SilLevel};
use silguard::error::EngineError;
use silguard::model::{ArchitectureType, NewCategory, NewDevice, NewProfile, Registry};

#[test]
fn test_threshold_is_inclusive() {
    assert!(is_coverage_compliant(99.0, ArchitectureType::OneOutOfOne));
    assert!(!is_coverage_compliant(98.99, ArchitectureType::OneOutOfOne));
    assert!(is_coverage_compliant(90.0, ArchitectureType::OneOutOfTwo));
    assert!(!is_coverage_compliant(89.99, ArchitectureType::OneOutOfTwo));
    assert!(is_coverage_compliant(60.0, ArchitectureType::TwoOutOfThree));
    assert!(!is_coverage_compliant(59.99, ArchitectureType::TwoOutOfThree));
}

#[test]
fn test_same_aggregate_differs_by_architecture() {
    assert!(!is_coverage_compliant(94.0, ArchitectureType::OneOutOfOne));
    assert!(is_coverage_compliant(94.0, ArchitectureType::OneOutOfTwo));
    assert!(is_coverage_compliant(94.0, ArchitectureType::TwoOutOfThree));
}

#[test]
fn test_configured_thresholds() {
    let settings = ComplianceSettings {
        one_out_of_two: 95.0,
        ..ComplianceSettings::default()
    };
    assert!(!is_coverage_compliant_with(94.0, ArchitectureType::OneOutOfTwo, &settings));

    let verdict = coverage_verdict(96.5, ArchitectureType::OneOutOfTwo, &settings);
    assert!(verdict.compliant);
    assert_eq!(verdict.required, 95.0);
    assert_eq!(verdict.margin(), 1.5);
}

#[test]
fn test_sil_band_bounds_belong_to_safer_band() {
    assert_eq!(derived_sil(1e-5).unwrap(), SilLevel::Sil4);
    assert_eq!(derived_sil(2e-5).unwrap(), SilLevel::Sil3);
    assert_eq!(derived_sil(1e-3).unwrap(), SilLevel::Sil2);
    assert_eq!(derived_sil(0.5).unwrap(), SilLevel::Sil0);
    assert!(!SilLevel::Sil0.is_compliant());
    assert!(SilLevel::Sil1.is_compliant());
}

#[test]
fn test_just_past_a_bound_falls_to_next_band() {
    let after = |bound: f64| f64::from_bits(bound.to_bits() + 1);
    assert_eq!(derived_sil(after(1e-5)).unwrap(), SilLevel::Sil3);
    assert_eq!(derived_sil(1.0000001e-5).unwrap(), SilLevel::Sil3);
    assert_eq!(derived_sil(after(1e-4)).unwrap(), SilLevel::Sil2);
    assert_eq!(derived_sil(after(1e-3)).unwrap(), SilLevel::Sil1);
    assert_eq!(derived_sil(after(1e-2)).unwrap(), SilLevel::Sil0);
}

#[test]
fn test_configured_sil_bands() {
    let bands = SilSettings {
        sil1: 5e-2,
        ..SilSettings::default()
    };
    assert_eq!(derived_sil_with(0.03, &bands).unwrap(), SilLevel::Sil1);
    assert_eq!(derived_sil(0.03).unwrap(), SilLevel::Sil0);
}

#[test]
fn test_nan_probability_rejected() {
    assert!(matches!(
        derived_sil(f64::NAN),
        Err(EngineError::InvalidProbability { .. })
    ));
}

#[test]
fn test_profile_sil_follows_worst_device() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Transmitters")).unwrap();
    let pt = registry.add_device(NewDevice::new("PT-1", category)).unwrap();
    let tt = registry.add_device(NewDevice::new("TT-1", category)).unwrap();
    let profile = registry
        .add_profile(NewProfile::new("Loop 7", ArchitectureType::OneOutOfTwo))
        .unwrap();
    registry.add_device_to_profile(profile, pt).unwrap();
    registry.add_device_to_profile(profile, tt).unwrap();

    registry.set_pfd_estimate(pt, Some(2e-5)).unwrap();
    registry.set_pfd_estimate(tt, Some(4e-4)).unwrap();

    let metrics = &registry.profile(profile).unwrap().metrics;
    assert_eq!(metrics.pfd_max, 4e-4);
    assert!((metrics.pfd_avg - 2.1e-4).abs() < 1e-12);
    assert_eq!(metrics.sil_level, Some(SilLevel::Sil2));
}

#[test]
fn test_missing_estimate_counts_as_zero() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Transmitters")).unwrap();
    let device = registry.add_device(NewDevice::new("PT-1", category)).unwrap();
    let profile = registry
        .add_profile(NewProfile::new("Loop 8", ArchitectureType::OneOutOfOne))
        .unwrap();
    registry.add_device_to_profile(profile, device).unwrap();

    let metrics = &registry.profile(profile).unwrap().metrics;
    assert_eq!(metrics.pfd_max, 0.0);
    assert_eq!(metrics.sil_level, Some(SilLevel::Sil4));
}

#[test]
fn test_invalid_estimate_is_rejected_and_not_stored() {
    let mut registry = Registry::new();
    let category = registry.add_category(NewCategory::named("Valves")).unwrap();
    let device = registry.add_device(NewDevice::new("XV-1", category)).unwrap();

    assert_eq!(
        registry.set_pfd_estimate(device, Some(-0.1)),
        Err(EngineError::InvalidProbability { value: -0.1 })
    );
    assert_eq!(registry.device(device).unwrap().pfd_estimate, None);
}

#[test]
fn test_registry_uses_configured_thresholds() {
    let settings = Settings::from_toml_str("[compliance]\ntwo_out_of_three = 70.0\n").unwrap();
    let registry = Registry::with_settings(settings);
    assert_eq!(
        registry
            .settings()
            .compliance
            .required_coverage(ArchitectureType::TwoOutOfThree),
        70.0
    );
}
