//! Consistency checks over a registry.
//!
//! The registry rejects bad input as it arrives; these checks catch what
//! can only be judged across records: declared levels that disagree with
//! their percentages, selections the profile architecture does not admit,
//! faults no method can cover and stale derived fields.

use crate::engine::coverage::{is_level_consistent, level_for_percent};
use crate::engine::suitability::admits;
use crate::model::{ArchitectureType, Level, Registry};

/// Validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A method's coverage level disagrees with its coverage percentage.
    InconsistentCoverageLevel {
        method: String,
        coverage_percent: f64,
        declared: Level,
        expected: Level,
    },
    /// Reference to a record that does not exist.
    DanglingReference {
        entity_type: String,
        entity_name: String,
        reference_type: String,
        reference_id: u64,
    },
    /// Only one side of a two-sided relation is recorded.
    OneSidedLink {
        entity_type: String,
        entity_name: String,
        reference_type: String,
        reference_id: u64,
    },
    /// A selected method whose coverage level the profile's architecture
    /// does not admit.
    UnsuitableSelection {
        profile: String,
        device: String,
        method: String,
        architecture: ArchitectureType,
    },
    /// A method linked to a fault type of another device category.
    CrossCategoryLink { method: String, fault: String },
    /// A fault type with no HIGH-effectiveness method.
    UnresolvableFault { code: String },
    /// Stored derived fields no longer match the profile's associations.
    StaleMetrics { profile: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InconsistentCoverageLevel {
                method,
                coverage_percent,
                declared,
                expected,
            } => {
                write!(
                    f,
                    "Diagnostic method '{}' declares coverage level {} but {}% falls in {}",
                    method, declared, coverage_percent, expected
                )
            }
            ValidationError::DanglingReference {
                entity_type,
                entity_name,
                reference_type,
                reference_id,
            } => {
                write!(
                    f,
                    "{} '{}' references missing {} {}",
                    entity_type, entity_name, reference_type, reference_id
                )
            }
            ValidationError::OneSidedLink {
                entity_type,
                entity_name,
                reference_type,
                reference_id,
            } => {
                write!(
                    f,
                    "{} '{}' links {} {} but the reverse link is missing",
                    entity_type, entity_name, reference_type, reference_id
                )
            }
            ValidationError::UnsuitableSelection {
                profile,
                device,
                method,
                architecture,
            } => {
                write!(
                    f,
                    "Profile '{}' applies '{}' to '{}', which {} does not admit",
                    profile, method, device, architecture
                )
            }
            ValidationError::CrossCategoryLink { method, fault } => {
                write!(
                    f,
                    "Diagnostic method '{}' is linked to fault type '{}' of another category",
                    method, fault
                )
            }
            ValidationError::UnresolvableFault { code } => {
                write!(
                    f,
                    "Fault type '{}' has no HIGH-effectiveness method and needs manual review",
                    code
                )
            }
            ValidationError::StaleMetrics { profile } => {
                write!(f, "Derived fields of profile '{}' are out of date", profile)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a registry, collecting every problem found.
pub fn validate(registry: &Registry) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_coverage_levels(registry, &mut errors);
    validate_references(registry, &mut errors);
    validate_selections(registry, &mut errors);
    validate_fault_links(registry, &mut errors);
    validate_fault_resolvability(registry, &mut errors);
    validate_metrics(registry, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_coverage_levels(registry: &Registry, errors: &mut Vec<ValidationError>) {
    let bands = &registry.settings().coverage;
    for method in registry.methods() {
        if !is_level_consistent(method.coverage_percent, method.coverage_level, bands) {
            errors.push(ValidationError::InconsistentCoverageLevel {
                method: method.name.clone(),
                coverage_percent: method.coverage_percent,
                declared: method.coverage_level,
                expected: level_for_percent(method.coverage_percent, bands),
            });
        }
    }
}

fn validate_references(registry: &Registry, errors: &mut Vec<ValidationError>) {
    for device in registry.devices() {
        if registry.category(device.category).is_err() {
            errors.push(dangling("Device", &device.name, "category", device.category.0));
        }
        for &method_id in &device.method_ids {
            match registry.method(method_id) {
                Ok(method) if !method.device_ids.contains(&device.id) => {
                    errors.push(ValidationError::OneSidedLink {
                        entity_type: "Device".to_string(),
                        entity_name: device.name.clone(),
                        reference_type: "diagnostic method".to_string(),
                        reference_id: method_id.0,
                    });
                }
                Ok(_) => {}
                Err(_) => errors.push(dangling(
                    "Device",
                    &device.name,
                    "diagnostic method",
                    method_id.0,
                )),
            }
        }
        for &profile_id in &device.profile_ids {
            match registry.profile(profile_id) {
                Ok(profile) if !profile.device_ids.contains(&device.id) => {
                    errors.push(ValidationError::OneSidedLink {
                        entity_type: "Device".to_string(),
                        entity_name: device.name.clone(),
                        reference_type: "profile".to_string(),
                        reference_id: profile_id.0,
                    });
                }
                Ok(_) => {}
                Err(_) => errors.push(dangling("Device", &device.name, "profile", profile_id.0)),
            }
        }
    }

    for method in registry.methods() {
        if registry.category(method.category).is_err() {
            errors.push(dangling(
                "Diagnostic method",
                &method.name,
                "category",
                method.category.0,
            ));
        }
    }

    for fault in registry.fault_types() {
        if registry.category(fault.category).is_err() {
            errors.push(dangling("Fault type", &fault.code, "category", fault.category.0));
        }
    }

    for profile in registry.profiles() {
        for &device_id in &profile.device_ids {
            if registry.device(device_id).is_err() {
                errors.push(dangling("Profile", &profile.name, "device", device_id.0));
            }
        }
    }
}

fn validate_selections(registry: &Registry, errors: &mut Vec<ValidationError>) {
    for profile in registry.profiles() {
        for key in registry.profile_selections(profile.id) {
            let (Ok(device), Ok(method)) = (registry.device(key.device), registry.method(key.method))
            else {
                errors.push(dangling(
                    "Profile",
                    &profile.name,
                    "selection",
                    key.method.0,
                ));
                continue;
            };
            if !admits(method.coverage_level, profile.architecture) {
                errors.push(ValidationError::UnsuitableSelection {
                    profile: profile.name.clone(),
                    device: device.name.clone(),
                    method: method.name.clone(),
                    architecture: profile.architecture,
                });
            }
        }
    }
}

fn validate_fault_links(registry: &Registry, errors: &mut Vec<ValidationError>) {
    for link in registry.method_fault_links() {
        let method = match registry.method(link.key.method) {
            Ok(method) => method,
            Err(_) => {
                errors.push(dangling(
                    "Method-fault link",
                    &link.key.fault.to_string(),
                    "diagnostic method",
                    link.key.method.0,
                ));
                continue;
            }
        };
        let fault = match registry.fault_type(link.key.fault) {
            Ok(fault) => fault,
            Err(_) => {
                errors.push(dangling(
                    "Method-fault link",
                    &method.name,
                    "fault type",
                    link.key.fault.0,
                ));
                continue;
            }
        };
        if method.category != fault.category {
            errors.push(ValidationError::CrossCategoryLink {
                method: method.name.clone(),
                fault: fault.code.clone(),
            });
        }
    }
}

fn validate_fault_resolvability(registry: &Registry, errors: &mut Vec<ValidationError>) {
    for fault in registry.fault_types() {
        let resolvable = registry
            .method_fault_links()
            .any(|link| link.key.fault == fault.id && link.effectiveness == Level::High);
        if !resolvable {
            errors.push(ValidationError::UnresolvableFault {
                code: fault.code.clone(),
            });
        }
    }
}

fn validate_metrics(registry: &Registry, errors: &mut Vec<ValidationError>) {
    for profile in registry.profiles() {
        if !registry.metrics_are_current(profile.id).unwrap_or(false) {
            errors.push(ValidationError::StaleMetrics {
                profile: profile.name.clone(),
            });
        }
    }
}

fn dangling(
    entity_type: &str,
    entity_name: &str,
    reference_type: &str,
    reference_id: u64,
) -> ValidationError {
    ValidationError::DanglingReference {
        entity_type: entity_type.to_string(),
        entity_name: entity_name.to_string(),
        reference_type: reference_type.to_string(),
        reference_id,
    }
}
