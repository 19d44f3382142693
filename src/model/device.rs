// src/model/device.rs
use crate::model::types::{ArchitectureType, CategoryId, DeviceId, MethodId, ProfileId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A safety device.
///
/// `method_ids` and `profile_ids` are the reverse sides of the
/// device ↔ method and profile ↔ device relations. They are only mutated
/// through the registry, which keeps both sides in step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Unique across the registry
    pub name: String,
    pub description: String,
    /// Number of channels, at least 1
    pub channel_count: u32,
    pub architecture: ArchitectureType,
    pub category: CategoryId,
    /// Directly assigned diagnostic methods
    pub method_ids: BTreeSet<MethodId>,
    /// Profiles that include this device
    pub profile_ids: BTreeSet<ProfileId>,
    /// Externally supplied probability of failure on demand
    pub pfd_estimate: Option<f64>,
}

/// Fields of a device before the registry assigns it an id.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub name: String,
    pub description: String,
    pub channel_count: u32,
    pub architecture: ArchitectureType,
    pub category: CategoryId,
}

impl NewDevice {
    pub fn new(name: impl Into<String>, category: CategoryId) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            channel_count: 1,
            architecture: ArchitectureType::OneOutOfOne,
            category,
        }
    }

    pub fn with_architecture(mut self, architecture: ArchitectureType) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_channels(mut self, channel_count: u32) -> Self {
        self.channel_count = channel_count;
        self
    }
}

/// Field changes to a stored device; `None` leaves a field as is.
///
/// The category is fixed once the device exists.
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub channel_count: Option<u32>,
    pub architecture: Option<ArchitectureType>,
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}
