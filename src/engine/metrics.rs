//! Derived profile figures, recomputed from a profile's associations.

use serde::{Deserialize, Serialize};

use crate::cache::DerivedSnapshot;
use crate::config::Settings;
use crate::engine::compliance::{check_probability, derived_sil_with, is_coverage_compliant_with, SilLevel};
use crate::engine::coverage::aggregate_coverage_with;
use crate::engine::fault_coverage::{fault_coverage_stats, FaultCoverageStats};
use crate::error::EngineResult;
use crate::provider::ProfileAssociations;

/// The memoized figures of a profile.
///
/// Never authoritative: always recomputable from the associations, and
/// `fingerprint` identifies the inputs they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetrics {
    /// Combined coverage of every (device, method) selection
    pub aggregate_coverage: f64,
    pub compliant: bool,
    pub pfd_avg: f64,
    pub pfd_max: f64,
    /// `None` while the profile has no devices
    pub sil_level: Option<SilLevel>,
    pub fault_stats: FaultCoverageStats,
    pub fingerprint: String,
}

impl Default for ProfileMetrics {
    fn default() -> Self {
        Self {
            aggregate_coverage: 0.0,
            compliant: false,
            pfd_avg: 0.0,
            pfd_max: 0.0,
            sil_level: None,
            fault_stats: fault_coverage_stats(&[]),
            fingerprint: String::new(),
        }
    }
}

/// The inputs [`compute_metrics`] reads, in fingerprint order.
pub fn snapshot_of(associations: &ProfileAssociations, settings: &Settings) -> DerivedSnapshot {
    let profile = &associations.profile;
    DerivedSnapshot {
        architecture: profile.architecture,
        selections: associations
            .method_selections
            .iter()
            .map(|(key, method)| (key.device, key.method, method.coverage_percent))
            .collect(),
        devices: associations
            .devices
            .iter()
            .map(|device| (device.id, device.pfd_estimate))
            .collect(),
        faults: associations
            .fault_selections
            .iter()
            .map(|record| (record.key.fault, record.verdict))
            .collect(),
        required_coverage: settings.compliance.required_coverage(profile.architecture),
        sil_bounds: settings.sil.bounds(),
    }
    .normalized()
}

/// Recompute every derived field of a profile.
///
/// Each (device, method) selection contributes its method's coverage once,
/// so a method applied to two devices counts twice. A profile without
/// selections has zero coverage and is not compliant. Devices without a
/// PFD estimate contribute `0.0`.
pub fn compute_metrics(
    associations: &ProfileAssociations,
    settings: &Settings,
) -> EngineResult<ProfileMetrics> {
    let profile = &associations.profile;
    let places = settings.coverage.decimal_places;

    let coverages: Vec<f64> = associations
        .method_selections
        .iter()
        .map(|(_, method)| method.coverage_percent)
        .collect();
    let (aggregate_coverage, compliant) = if coverages.is_empty() {
        (0.0, false)
    } else {
        let aggregate = aggregate_coverage_with(&coverages, places)?;
        let compliant =
            is_coverage_compliant_with(aggregate, profile.architecture, &settings.compliance);
        (aggregate, compliant)
    };

    let (pfd_avg, pfd_max, sil_level) = if associations.devices.is_empty() {
        (0.0, 0.0, None)
    } else {
        let mut total = 0.0;
        let mut max = 0.0_f64;
        for device in &associations.devices {
            let pfd = check_probability(device.pfd_estimate.unwrap_or(0.0))?;
            total += pfd;
            max = max.max(pfd);
        }
        let avg = total / associations.devices.len() as f64;
        (avg, max, Some(derived_sil_with(max, &settings.sil)?))
    };

    let fingerprint = snapshot_of(associations, settings).fingerprint()?;

    Ok(ProfileMetrics {
        aggregate_coverage,
        compliant,
        pfd_avg,
        pfd_max,
        sil_level,
        fault_stats: fault_coverage_stats(&associations.fault_selections),
        fingerprint,
    })
}
