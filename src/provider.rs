//! Data-access contracts the engine reads through.
//!
//! The engine performs no I/O. A persistence layer implements
//! [`RecordProvider`] to hand it consistent, already-loaded snapshots and
//! [`DerivedFieldSink`] to store the figures it computes. The in-memory
//! [`Registry`](crate::model::Registry) implements both.
//!
//! # Example
//!
//! ```ignore
//! use silguard::engine::Evaluator;
//! use silguard::provider::RecordProvider;
//!
//! fn report(provider: &impl RecordProvider, profile: ProfileId) -> EngineResult<()> {
//!     let evaluator = Evaluator::new(provider);
//!     let metrics = evaluator.evaluate_profile(profile)?;
//!     println!("{} -> {}", metrics.aggregate_coverage, metrics.compliant);
//!     Ok(())
//! }
//! ```

use crate::engine::metrics::ProfileMetrics;
use crate::error::EngineResult;
use crate::model::{
    CategoryId, Device, DeviceCategory, DeviceId, DiagnosticMethod, FaultTypeId, Level, MethodId,
    Profile, ProfileFault, ProfileId, ProfileMethodKey,
};

/// A device together with the relations suitability filtering needs.
#[derive(Debug, Clone)]
pub struct LoadedDevice {
    pub device: Device,
    /// `None` when the category reference did not resolve
    pub category: Option<DeviceCategory>,
    /// Methods assigned directly to the device
    pub assigned_methods: Vec<DiagnosticMethod>,
    /// Methods registered against the device's category
    pub category_methods: Vec<DiagnosticMethod>,
}

/// A profile with every association its derived fields depend on.
#[derive(Debug, Clone)]
pub struct ProfileAssociations {
    pub profile: Profile,
    pub devices: Vec<Device>,
    /// Each (device, method) selection with the selected method
    pub method_selections: Vec<(ProfileMethodKey, DiagnosticMethod)>,
    pub fault_selections: Vec<ProfileFault>,
}

/// Read side of the persistence layer.
pub trait RecordProvider {
    /// Load a device with its category and directly assigned methods.
    fn load_device(&self, id: DeviceId) -> EngineResult<LoadedDevice>;

    fn load_method(&self, id: MethodId) -> EngineResult<DiagnosticMethod>;

    /// All methods registered against a category.
    fn load_methods_for_category(&self, id: CategoryId) -> EngineResult<Vec<DiagnosticMethod>>;

    /// Methods linked to a fault type, each with the effectiveness of its link.
    fn load_methods_for_fault(
        &self,
        id: FaultTypeId,
    ) -> EngineResult<Vec<(DiagnosticMethod, Level)>>;

    /// A consistent snapshot of a profile and its associations.
    fn load_profile_associations(&self, id: ProfileId) -> EngineResult<ProfileAssociations>;
}

/// Write side: the only write an engine result triggers.
pub trait DerivedFieldSink {
    fn persist_profile_derived_fields(
        &mut self,
        id: ProfileId,
        metrics: &ProfileMetrics,
    ) -> EngineResult<()>;
}
