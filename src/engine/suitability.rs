//! Which diagnostic methods are admissible for a device under an architecture.
//!
//! A method's coverage level gates it:
//!
//! | coverage level | 1oo1 | 1oo2 | 2oo3 |
//! |----------------|------|------|------|
//! | HIGH           | yes  | yes  | yes  |
//! | MEDIUM         | no   | yes  | yes  |
//! | LOW            | yes  | yes  | yes  |
//!
//! The table is not monotonic across architectures and is reproduced as is.

use std::collections::BTreeMap;

use crate::model::{ArchitectureType, DiagnosticMethod, Level, MethodId};
use crate::provider::LoadedDevice;

/// Whether a method with `coverage_level` may be used under `architecture`.
pub fn admits(coverage_level: Level, architecture: ArchitectureType) -> bool {
    if coverage_level == Level::High {
        return true;
    }
    match architecture {
        ArchitectureType::OneOutOfOne => coverage_level == Level::Low,
        ArchitectureType::OneOutOfTwo => matches!(coverage_level, Level::Low | Level::Medium),
        ArchitectureType::TwoOutOfThree => true,
    }
}

/// Admissible methods for `device` under `architecture`, lowest coverage first.
///
/// Candidates are the methods assigned directly to the device plus those
/// registered against its category, de-duplicated by id. A device whose
/// category did not resolve has no admissible methods.
pub fn suitable_methods(
    device: &LoadedDevice,
    architecture: ArchitectureType,
) -> Vec<&DiagnosticMethod> {
    if device.category.is_none() {
        return Vec::new();
    }

    let mut candidates: BTreeMap<MethodId, &DiagnosticMethod> = BTreeMap::new();
    for method in device
        .assigned_methods
        .iter()
        .chain(device.category_methods.iter())
    {
        candidates.entry(method.id).or_insert(method);
    }

    let mut admissible: Vec<&DiagnosticMethod> = candidates
        .into_values()
        .filter(|method| method.is_suitable_for(architecture))
        .collect();
    admissible.sort_by(|a, b| {
        a.coverage_percent
            .total_cmp(&b.coverage_percent)
            .then(a.id.cmp(&b.id))
    });
    admissible
}
