// src/model/profile.rs
use crate::engine::fault_coverage::FaultVerdict;
use crate::engine::metrics::ProfileMetrics;
use crate::model::types::{ArchitectureType, DeviceId, FaultTypeId, MethodId, ProfileId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A compliance profile: devices plus the diagnostic methods chosen for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    /// Unique across the registry
    pub name: String,
    pub description: String,
    pub architecture: ArchitectureType,
    pub test_interval_days: Option<u32>,
    pub device_ids: BTreeSet<DeviceId>,
    /// Derived from the associations; recomputed after every mutation
    pub metrics: ProfileMetrics,
}

/// Fields of a profile before the registry assigns it an id.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub description: String,
    pub architecture: ArchitectureType,
    pub test_interval_days: Option<u32>,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, architecture: ArchitectureType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            architecture,
            test_interval_days: None,
        }
    }
}

/// Field changes to a stored profile; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub architecture: Option<ArchitectureType>,
    pub test_interval_days: Option<u32>,
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Profile {}

/// Composite key of a (profile, device, method) selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileMethodKey {
    pub profile: ProfileId,
    pub device: DeviceId,
    pub method: MethodId,
}

/// A diagnostic method applied to one device within one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDiagnosticMethod {
    pub key: ProfileMethodKey,
}

/// Composite key of a per-fault record in a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileFaultKey {
    pub profile: ProfileId,
    pub fault: FaultTypeId,
}

/// Whether a fault type is covered within a profile, and by which methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFault {
    pub key: ProfileFaultKey,
    pub covered: bool,
    pub verdict: FaultVerdict,
    /// Methods the user attached to this fault, in selection order
    pub method_ids: Vec<MethodId>,
    pub notes: Option<String>,
}

impl PartialEq for ProfileFault {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ProfileFault {}
