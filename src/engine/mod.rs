//! The coverage-and-compliance engine.
//!
//! Every function here is pure over already-loaded data:
//!
//! ```text
//! Device + architecture ─▶ [suitability] ─▶ admissible methods
//!                                                 │
//! selected methods ──────▶ [coverage] ───▶ aggregate coverage
//!                                                 │
//! architecture ──────────▶ [compliance] ──▶ compliant? / SIL
//!
//! fault candidates + selection ─▶ [fault_coverage] ─▶ covered?
//! ```
//!
//! [`Evaluator`] wires the pieces to a [`RecordProvider`].

pub mod compliance;
pub mod coverage;
pub mod fault_coverage;
pub mod metrics;
pub mod suitability;

pub use compliance::{
    coverage_verdict, derived_sil, derived_sil_with, is_coverage_compliant,
    is_coverage_compliant_with, required_coverage, CoverageVerdict, SilLevel,
};
pub use coverage::{aggregate_coverage, aggregate_coverage_with, round_half_up};
pub use fault_coverage::{
    check_unique_selection, fault_coverage_stats, fault_coverage_status, FaultCoverageStats,
    FaultCoverageStatus, FaultVerdict,
};
pub use metrics::{compute_metrics, ProfileMetrics};
pub use suitability::suitable_methods;

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};
use crate::model::{ArchitectureType, DeviceId, DiagnosticMethod, FaultTypeId, MethodId, ProfileId};
use crate::provider::RecordProvider;

/// Runs the engine against records loaded through a [`RecordProvider`].
pub struct Evaluator<'a, P: RecordProvider + ?Sized> {
    provider: &'a P,
    settings: Settings,
}

impl<'a, P: RecordProvider + ?Sized> Evaluator<'a, P> {
    /// An evaluator using the default thresholds.
    pub fn new(provider: &'a P) -> Self {
        Self::with_settings(provider, Settings::default())
    }

    pub fn with_settings(provider: &'a P, settings: Settings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Admissible methods for a stored device, lowest coverage first.
    pub fn suitable_methods(
        &self,
        device: DeviceId,
        architecture: Option<ArchitectureType>,
    ) -> EngineResult<Vec<DiagnosticMethod>> {
        let architecture = architecture.ok_or_else(|| {
            EngineError::InvalidArgument("an architecture is required to filter methods".into())
        })?;
        let loaded = self.provider.load_device(device)?;
        Ok(suitable_methods(&loaded, architecture)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Aggregate coverage of stored methods, looked up by id.
    ///
    /// Ids are looked up among the methods of `device`'s category. An id
    /// that names no method at all is `NotFound`; one that names a method of
    /// another category is `CategoryMismatch`.
    pub fn coverage_of_methods(&self, device: DeviceId, methods: &[MethodId]) -> EngineResult<f64> {
        check_unique_selection(methods)?;
        let loaded = self.provider.load_device(device)?;
        let mut coverages = Vec::with_capacity(methods.len());
        for id in methods {
            let found = loaded
                .category_methods
                .iter()
                .chain(loaded.assigned_methods.iter())
                .find(|m| m.id == *id);
            match found {
                Some(method) => coverages.push(method.coverage_percent),
                None => {
                    self.provider.load_method(*id)?;
                    return Err(EngineError::CategoryMismatch {
                        method: id.0,
                        device: device.0,
                    });
                }
            }
        }
        aggregate_coverage_with(&coverages, self.settings.coverage.decimal_places)
    }

    /// Recompute a profile's derived fields without storing them.
    pub fn evaluate_profile(&self, profile: ProfileId) -> EngineResult<ProfileMetrics> {
        let associations = self.provider.load_profile_associations(profile)?;
        compute_metrics(&associations, &self.settings)
    }

    /// Whether `selected` covers the fault type `fault`.
    pub fn fault_status(
        &self,
        fault: FaultTypeId,
        selected: &[MethodId],
    ) -> EngineResult<FaultCoverageStatus> {
        let candidates = self.provider.load_methods_for_fault(fault)?;
        fault_coverage_status(&candidates, selected)
    }
}
