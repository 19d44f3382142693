// src/model/registry.rs
//! The entity arena.
//!
//! Entities live in ordered maps keyed by their ids; association entities
//! live in maps keyed by their composite keys and only hold foreign ids.
//! Every operation that touches both sides of a relation updates them in
//! the same call, and every mutation that can change a profile's derived
//! fields recomputes them before returning.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::engine::compliance::check_probability;
use crate::engine::coverage::{check_coverage, round_half_up};
use crate::engine::fault_coverage::{
    check_unique_selection, fault_coverage_stats, fault_coverage_status, FaultCoverageStats,
    FaultCoverageStatus, FaultVerdict,
};
use crate::engine::metrics::{compute_metrics, snapshot_of, ProfileMetrics};
use crate::error::{EngineError, EngineResult, RecordKind};
use crate::model::category::{CategoryUpdate, DeviceCategory, NewCategory};
use crate::model::device::{Device, DeviceUpdate, NewDevice};
use crate::model::fault::{
    DiagnosticMethodFault, FaultType, FaultTypeUpdate, MethodFaultKey, NewFaultType,
};
use crate::model::method::{DiagnosticMethod, MethodUpdate, NewMethod};
use crate::model::profile::{
    NewProfile, Profile, ProfileDiagnosticMethod, ProfileFault, ProfileFaultKey, ProfileMethodKey,
    ProfileUpdate,
};
use crate::model::types::{
    ArchitectureType, CategoryId, DeviceId, FaultTypeId, Level, MethodId, ProfileId,
};
use crate::provider::{DerivedFieldSink, LoadedDevice, ProfileAssociations, RecordProvider};

/// A fault type of a device's category with its status in one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFaultStatus {
    pub fault: FaultType,
    pub covered: bool,
    /// `None` when the profile has no record for this fault yet
    pub verdict: Option<FaultVerdict>,
    pub notes: Option<String>,
}

/// In-memory store of every entity and association.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    settings: Settings,
    next_id: u64,
    categories: BTreeMap<CategoryId, DeviceCategory>,
    devices: BTreeMap<DeviceId, Device>,
    methods: BTreeMap<MethodId, DiagnosticMethod>,
    faults: BTreeMap<FaultTypeId, FaultType>,
    profiles: BTreeMap<ProfileId, Profile>,
    method_faults: BTreeMap<MethodFaultKey, DiagnosticMethodFault>,
    profile_methods: BTreeMap<ProfileMethodKey, ProfileDiagnosticMethod>,
    profile_faults: BTreeMap<ProfileFaultKey, ProfileFault>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn category(&self, id: CategoryId) -> EngineResult<&DeviceCategory> {
        self.categories
            .get(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Category, id))
    }

    pub fn device(&self, id: DeviceId) -> EngineResult<&Device> {
        self.devices
            .get(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Device, id))
    }

    pub fn method(&self, id: MethodId) -> EngineResult<&DiagnosticMethod> {
        self.methods
            .get(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Method, id))
    }

    pub fn fault_type(&self, id: FaultTypeId) -> EngineResult<&FaultType> {
        self.faults
            .get(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::FaultType, id))
    }

    pub fn profile(&self, id: ProfileId) -> EngineResult<&Profile> {
        self.profiles
            .get(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Profile, id))
    }

    pub fn categories(&self) -> impl Iterator<Item = &DeviceCategory> {
        self.categories.values()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn methods(&self) -> impl Iterator<Item = &DiagnosticMethod> {
        self.methods.values()
    }

    pub fn fault_types(&self) -> impl Iterator<Item = &FaultType> {
        self.faults.values()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn method_fault_links(&self) -> impl Iterator<Item = &DiagnosticMethodFault> {
        self.method_faults.values()
    }

    /// Every (device, method) selection of a profile.
    pub fn profile_selections(
        &self,
        profile: ProfileId,
    ) -> impl Iterator<Item = &ProfileMethodKey> {
        self.profile_methods
            .keys()
            .filter(move |key| key.profile == profile)
    }

    /// Methods selected for one device within a profile.
    pub fn selected_methods(&self, profile: ProfileId, device: DeviceId) -> Vec<MethodId> {
        self.profile_selections(profile)
            .filter(|key| key.device == device)
            .map(|key| key.method)
            .collect()
    }

    /// Every fault record of a profile.
    pub fn profile_faults(&self, profile: ProfileId) -> impl Iterator<Item = &ProfileFault> {
        self.profile_faults
            .values()
            .filter(move |record| record.key.profile == profile)
    }

    pub fn profile_fault(&self, profile: ProfileId, fault: FaultTypeId) -> Option<&ProfileFault> {
        self.profile_faults.get(&ProfileFaultKey { profile, fault })
    }

    pub fn devices_in_category(&self, category: CategoryId) -> impl Iterator<Item = &Device> {
        self.devices
            .values()
            .filter(move |device| device.category == category)
    }

    pub fn methods_in_category(
        &self,
        category: CategoryId,
    ) -> impl Iterator<Item = &DiagnosticMethod> {
        self.methods
            .values()
            .filter(move |method| method.category == category)
    }

    pub fn faults_in_category(&self, category: CategoryId) -> impl Iterator<Item = &FaultType> {
        self.faults
            .values()
            .filter(move |fault| fault.category == category)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub fn add_category(&mut self, new: NewCategory) -> EngineResult<CategoryId> {
        require_name(&new.name, "category name")?;
        if self.categories.values().any(|c| c.name == new.name) {
            return Err(EngineError::NameConflict {
                kind: RecordKind::Category,
                name: new.name,
            });
        }

        let id = CategoryId(self.allocate());
        self.categories.insert(
            id,
            DeviceCategory {
                id,
                name: new.name,
                description: new.description,
                standard_reference: new.standard_reference,
            },
        );
        Ok(id)
    }

    pub fn add_device(&mut self, new: NewDevice) -> EngineResult<DeviceId> {
        require_name(&new.name, "device name")?;
        self.category(new.category)?;
        if new.channel_count == 0 {
            return Err(EngineError::InvalidArgument(format!(
                "device '{}' must have at least one channel",
                new.name
            )));
        }
        if self.devices.values().any(|d| d.name == new.name) {
            return Err(EngineError::NameConflict {
                kind: RecordKind::Device,
                name: new.name,
            });
        }

        let id = DeviceId(self.allocate());
        self.devices.insert(
            id,
            Device {
                id,
                name: new.name,
                description: new.description,
                channel_count: new.channel_count,
                architecture: new.architecture,
                category: new.category,
                method_ids: BTreeSet::new(),
                profile_ids: BTreeSet::new(),
                pfd_estimate: None,
            },
        );
        Ok(id)
    }

    /// Register a method. Its coverage is stored with the configured precision.
    pub fn add_method(&mut self, new: NewMethod) -> EngineResult<MethodId> {
        require_name(&new.name, "method name")?;
        self.category(new.category)?;
        let coverage_percent = round_half_up(
            check_coverage(new.coverage_percent)?,
            self.settings.coverage.decimal_places,
        );
        if self
            .methods_in_category(new.category)
            .any(|m| m.name == new.name)
        {
            return Err(EngineError::NameConflict {
                kind: RecordKind::Method,
                name: new.name,
            });
        }

        let id = MethodId(self.allocate());
        self.methods.insert(
            id,
            DiagnosticMethod {
                id,
                category: new.category,
                name: new.name,
                description: new.description,
                effectiveness: new.effectiveness,
                suitability: new.suitability,
                implementation_complexity: new.implementation_complexity,
                coverage_percent,
                coverage_level: new.coverage_level,
                standard_reference: new.standard_reference,
                device_ids: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    pub fn add_fault_type(&mut self, new: NewFaultType) -> EngineResult<FaultTypeId> {
        require_name(&new.code, "fault code")?;
        self.category(new.category)?;
        if self.faults.values().any(|f| f.code == new.code) {
            return Err(EngineError::NameConflict {
                kind: RecordKind::FaultType,
                name: new.code,
            });
        }

        let id = FaultTypeId(self.allocate());
        self.faults.insert(
            id,
            FaultType {
                id,
                code: new.code,
                name: new.name,
                description: new.description,
                category: new.category,
                coverage_requirement: new.coverage_requirement,
                standard_reference: new.standard_reference,
            },
        );
        Ok(id)
    }

    pub fn add_profile(&mut self, new: NewProfile) -> EngineResult<ProfileId> {
        require_name(&new.name, "profile name")?;
        if self.profiles.values().any(|p| p.name == new.name) {
            return Err(EngineError::NameConflict {
                kind: RecordKind::Profile,
                name: new.name,
            });
        }

        let id = ProfileId(self.allocate());
        self.profiles.insert(
            id,
            Profile {
                id,
                name: new.name,
                description: new.description,
                architecture: new.architecture,
                test_interval_days: new.test_interval_days,
                device_ids: BTreeSet::new(),
                metrics: ProfileMetrics::default(),
            },
        );
        self.recompute_profile(id)?;
        Ok(id)
    }

    /// Change the declared architecture; compliance follows.
    pub fn set_profile_architecture(
        &mut self,
        profile: ProfileId,
        architecture: ArchitectureType,
    ) -> EngineResult<&ProfileMetrics> {
        self.update_profile(
            profile,
            ProfileUpdate {
                architecture: Some(architecture),
                ..Default::default()
            },
        )
    }

    /// Store the externally supplied PFD estimate of a device.
    pub fn set_pfd_estimate(&mut self, device: DeviceId, estimate: Option<f64>) -> EngineResult<()> {
        if let Some(value) = estimate {
            check_probability(value)?;
        }
        let entry = self
            .devices
            .get_mut(&device)
            .ok_or_else(|| EngineError::not_found(RecordKind::Device, device))?;
        entry.pfd_estimate = estimate;
        let profiles: Vec<ProfileId> = entry.profile_ids.iter().copied().collect();
        self.recompute_profiles(profiles)
    }

    // =========================================================================
    // Updates
    // =========================================================================

    pub fn update_category(
        &mut self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> EngineResult<&DeviceCategory> {
        self.category(id)?;
        if let Some(name) = &update.name {
            require_name(name, "category name")?;
            if self.categories.values().any(|c| c.id != id && c.name == *name) {
                return Err(EngineError::NameConflict {
                    kind: RecordKind::Category,
                    name: name.clone(),
                });
            }
        }

        if let Some(category) = self.categories.get_mut(&id) {
            if let Some(name) = update.name {
                category.name = name;
            }
            if let Some(description) = update.description {
                category.description = description;
            }
            if update.standard_reference.is_some() {
                category.standard_reference = update.standard_reference;
            }
        }
        self.category(id)
    }

    /// Change a device's descriptive fields. Its category never changes.
    pub fn update_device(&mut self, id: DeviceId, update: DeviceUpdate) -> EngineResult<&Device> {
        self.device(id)?;
        if let Some(name) = &update.name {
            require_name(name, "device name")?;
            if self.devices.values().any(|d| d.id != id && d.name == *name) {
                return Err(EngineError::NameConflict {
                    kind: RecordKind::Device,
                    name: name.clone(),
                });
            }
        }
        if update.channel_count == Some(0) {
            return Err(EngineError::InvalidArgument(format!(
                "device {} must have at least one channel",
                id
            )));
        }

        if let Some(device) = self.devices.get_mut(&id) {
            if let Some(name) = update.name {
                device.name = name;
            }
            if let Some(description) = update.description {
                device.description = description;
            }
            if let Some(channel_count) = update.channel_count {
                device.channel_count = channel_count;
            }
            if let Some(architecture) = update.architecture {
                device.architecture = architecture;
            }
        }
        self.device(id)
    }

    /// Change a method's fields and recompute every profile that selects it.
    ///
    /// A new coverage percentage is checked and stored with the configured
    /// precision. The category never changes.
    pub fn update_method(
        &mut self,
        id: MethodId,
        update: MethodUpdate,
    ) -> EngineResult<&DiagnosticMethod> {
        let category = self.method(id)?.category;
        if let Some(name) = &update.name {
            require_name(name, "method name")?;
            if self
                .methods_in_category(category)
                .any(|m| m.id != id && m.name == *name)
            {
                return Err(EngineError::NameConflict {
                    kind: RecordKind::Method,
                    name: name.clone(),
                });
            }
        }
        let places = self.settings.coverage.decimal_places;
        let coverage_percent = update
            .coverage_percent
            .map(|value| check_coverage(value).map(|value| round_half_up(value, places)))
            .transpose()?;

        if let Some(method) = self.methods.get_mut(&id) {
            if let Some(name) = update.name {
                method.name = name;
            }
            if let Some(description) = update.description {
                method.description = description;
            }
            if let Some(effectiveness) = update.effectiveness {
                method.effectiveness = effectiveness;
            }
            if let Some(suitability) = update.suitability {
                method.suitability = suitability;
            }
            if let Some(complexity) = update.implementation_complexity {
                method.implementation_complexity = complexity;
            }
            if let Some(percent) = coverage_percent {
                method.coverage_percent = percent;
            }
            if let Some(level) = update.coverage_level {
                method.coverage_level = level;
            }
            if update.standard_reference.is_some() {
                method.standard_reference = update.standard_reference;
            }
        }

        let touched: BTreeSet<ProfileId> = self
            .profile_methods
            .keys()
            .filter(|key| key.method == id)
            .map(|key| key.profile)
            .collect();
        info!(method = id.0, profiles = touched.len(), "updated diagnostic method");
        self.recompute_profiles(touched)?;
        self.method(id)
    }

    pub fn update_fault_type(
        &mut self,
        id: FaultTypeId,
        update: FaultTypeUpdate,
    ) -> EngineResult<&FaultType> {
        self.fault_type(id)?;
        if let Some(code) = &update.code {
            require_name(code, "fault code")?;
            if self.faults.values().any(|f| f.id != id && f.code == *code) {
                return Err(EngineError::NameConflict {
                    kind: RecordKind::FaultType,
                    name: code.clone(),
                });
            }
        }

        if let Some(fault) = self.faults.get_mut(&id) {
            if let Some(code) = update.code {
                fault.code = code;
            }
            if let Some(name) = update.name {
                fault.name = name;
            }
            if let Some(description) = update.description {
                fault.description = description;
            }
            if let Some(requirement) = update.coverage_requirement {
                fault.coverage_requirement = requirement;
            }
            if update.standard_reference.is_some() {
                fault.standard_reference = update.standard_reference;
            }
        }
        self.fault_type(id)
    }

    /// Change a profile's fields and recompute its derived fields.
    pub fn update_profile(
        &mut self,
        id: ProfileId,
        update: ProfileUpdate,
    ) -> EngineResult<&ProfileMetrics> {
        self.profile(id)?;
        if let Some(name) = &update.name {
            require_name(name, "profile name")?;
            if self.profiles.values().any(|p| p.id != id && p.name == *name) {
                return Err(EngineError::NameConflict {
                    kind: RecordKind::Profile,
                    name: name.clone(),
                });
            }
        }

        let profile = self.profile_mut(id)?;
        if let Some(name) = update.name {
            profile.name = name;
        }
        if let Some(description) = update.description {
            profile.description = description;
        }
        if let Some(architecture) = update.architecture {
            profile.architecture = architecture;
        }
        if update.test_interval_days.is_some() {
            profile.test_interval_days = update.test_interval_days;
        }
        self.recompute_profile(id)
    }

    // =========================================================================
    // Device <-> method
    // =========================================================================

    /// Assign a method directly to a device of the same category.
    pub fn assign_method(&mut self, device: DeviceId, method: MethodId) -> EngineResult<()> {
        self.check_same_category(device, method)?;
        if self.device(device)?.method_ids.contains(&method) {
            return Err(EngineError::DuplicateAssociation {
                kind: RecordKind::Method,
                key: format!("device {}, method {}", device, method),
            });
        }

        if let Some(d) = self.devices.get_mut(&device) {
            d.method_ids.insert(method);
        }
        if let Some(m) = self.methods.get_mut(&method) {
            m.device_ids.insert(device);
        }
        Ok(())
    }

    /// Returns whether an assignment was removed.
    pub fn unassign_method(&mut self, device: DeviceId, method: MethodId) -> EngineResult<bool> {
        self.device(device)?;
        self.method(method)?;
        let removed = self
            .devices
            .get_mut(&device)
            .map_or(false, |d| d.method_ids.remove(&method));
        if let Some(m) = self.methods.get_mut(&method) {
            m.device_ids.remove(&device);
        }
        Ok(removed)
    }

    // =========================================================================
    // Method <-> fault
    // =========================================================================

    /// Record how effective `method` is against `fault`.
    pub fn link_method_fault(
        &mut self,
        method: MethodId,
        fault: FaultTypeId,
        effectiveness: Level,
    ) -> EngineResult<()> {
        let method_category = self.method(method)?.category;
        if self.fault_type(fault)?.category != method_category {
            return Err(EngineError::FaultCategoryMismatch {
                method: method.0,
                fault: fault.0,
            });
        }
        let key = MethodFaultKey { method, fault };
        if self.method_faults.contains_key(&key) {
            return Err(EngineError::DuplicateAssociation {
                kind: RecordKind::MethodFault,
                key: format!("method {}, fault type {}", method, fault),
            });
        }

        self.method_faults.insert(key, DiagnosticMethodFault { key, effectiveness });
        self.refresh_fault_records(fault)
    }

    /// Returns whether a link was removed.
    pub fn unlink_method_fault(&mut self, method: MethodId, fault: FaultTypeId) -> EngineResult<bool> {
        let removed = self
            .method_faults
            .remove(&MethodFaultKey { method, fault })
            .is_some();
        if removed {
            self.refresh_fault_records(fault)?;
        }
        Ok(removed)
    }

    /// Re-rate an existing link and re-resolve the fault's profile records.
    pub fn set_link_effectiveness(
        &mut self,
        method: MethodId,
        fault: FaultTypeId,
        effectiveness: Level,
    ) -> EngineResult<()> {
        let link = self
            .method_faults
            .get_mut(&MethodFaultKey { method, fault })
            .ok_or_else(|| EngineError::MissingAssociation {
                kind: RecordKind::MethodFault,
                key: format!("method {}, fault type {}", method, fault),
            })?;
        link.effectiveness = effectiveness;
        self.refresh_fault_records(fault)
    }

    /// Re-rate every link of a fault type. Returns the number of links changed.
    pub fn set_effectiveness_for_fault(
        &mut self,
        fault: FaultTypeId,
        effectiveness: Level,
    ) -> EngineResult<usize> {
        self.fault_type(fault)?;
        let mut changed = 0;
        for link in self
            .method_faults
            .values_mut()
            .filter(|link| link.key.fault == fault)
        {
            link.effectiveness = effectiveness;
            changed += 1;
        }
        info!(fault = fault.0, links = changed, ?effectiveness, "re-rated fault links");
        self.refresh_fault_records(fault)?;
        Ok(changed)
    }

    // =========================================================================
    // Profile <-> device
    // =========================================================================

    pub fn add_device_to_profile(
        &mut self,
        profile: ProfileId,
        device: DeviceId,
    ) -> EngineResult<&ProfileMetrics> {
        self.device(device)?;
        if self.profile(profile)?.device_ids.contains(&device) {
            return Err(EngineError::DuplicateAssociation {
                kind: RecordKind::Device,
                key: format!("profile {}, device {}", profile, device),
            });
        }

        self.link_profile_device(profile, device);
        self.recompute_profile(profile)
    }

    /// Remove a device and its method selections from a profile.
    pub fn remove_device_from_profile(
        &mut self,
        profile: ProfileId,
        device: DeviceId,
    ) -> EngineResult<&ProfileMetrics> {
        self.require_device_in_profile(profile, device)?;
        self.profile_methods
            .retain(|key, _| !(key.profile == profile && key.device == device));
        self.unlink_profile_device(profile, device);
        self.recompute_profile(profile)
    }

    fn link_profile_device(&mut self, profile: ProfileId, device: DeviceId) {
        if let Some(p) = self.profiles.get_mut(&profile) {
            p.device_ids.insert(device);
        }
        if let Some(d) = self.devices.get_mut(&device) {
            d.profile_ids.insert(profile);
        }
    }

    fn unlink_profile_device(&mut self, profile: ProfileId, device: DeviceId) {
        if let Some(p) = self.profiles.get_mut(&profile) {
            p.device_ids.remove(&device);
        }
        if let Some(d) = self.devices.get_mut(&device) {
            d.profile_ids.remove(&profile);
        }
    }

    // =========================================================================
    // Profile method selections
    // =========================================================================

    /// Apply `method` to `device` within `profile`.
    pub fn select_method(
        &mut self,
        profile: ProfileId,
        device: DeviceId,
        method: MethodId,
    ) -> EngineResult<&ProfileMetrics> {
        self.require_device_in_profile(profile, device)?;
        self.check_same_category(device, method)?;
        let key = ProfileMethodKey {
            profile,
            device,
            method,
        };
        if self.profile_methods.contains_key(&key) {
            return Err(EngineError::DuplicateAssociation {
                kind: RecordKind::ProfileMethod,
                key: format!("profile {}, device {}, method {}", profile, device, method),
            });
        }

        self.profile_methods
            .insert(key, ProfileDiagnosticMethod { key });
        self.recompute_profile(profile)
    }

    pub fn deselect_method(
        &mut self,
        profile: ProfileId,
        device: DeviceId,
        method: MethodId,
    ) -> EngineResult<&ProfileMetrics> {
        self.profile(profile)?;
        self.profile_methods.remove(&ProfileMethodKey {
            profile,
            device,
            method,
        });
        self.recompute_profile(profile)
    }

    /// Replace every selection of `device` within `profile`.
    ///
    /// All methods are checked before anything changes.
    pub fn replace_device_methods(
        &mut self,
        profile: ProfileId,
        device: DeviceId,
        methods: &[MethodId],
    ) -> EngineResult<&ProfileMetrics> {
        self.require_device_in_profile(profile, device)?;
        check_unique_selection(methods)?;
        for method in methods {
            self.check_same_category(device, *method)?;
        }

        self.profile_methods
            .retain(|key, _| !(key.profile == profile && key.device == device));
        for &method in methods {
            let key = ProfileMethodKey {
                profile,
                device,
                method,
            };
            self.profile_methods
                .insert(key, ProfileDiagnosticMethod { key });
        }
        self.recompute_profile(profile)
    }

    // =========================================================================
    // Profile fault selections
    // =========================================================================

    /// Record which methods the user attached to `fault` within `profile`.
    ///
    /// The covered flag is resolved from the fault's HIGH-effectiveness
    /// methods, never taken from the caller.
    pub fn set_fault_selection(
        &mut self,
        profile: ProfileId,
        fault: FaultTypeId,
        method_ids: Vec<MethodId>,
        notes: Option<String>,
    ) -> EngineResult<FaultCoverageStatus> {
        self.profile(profile)?;
        self.fault_type(fault)?;
        for id in &method_ids {
            self.method(*id)?;
        }

        let candidates = self.load_methods_for_fault(fault)?;
        let status = fault_coverage_status(&candidates, &method_ids)?;
        if status.verdict == FaultVerdict::Unresolvable {
            warn!(
                profile = profile.0,
                fault = fault.0,
                "fault type has no HIGH-effectiveness method and cannot be covered"
            );
        }

        let key = ProfileFaultKey { profile, fault };
        self.profile_faults.insert(
            key,
            ProfileFault {
                key,
                covered: status.covered(),
                verdict: status.verdict,
                method_ids,
                notes,
            },
        );
        self.recompute_profile(profile)?;
        Ok(status)
    }

    /// Returns whether a record was removed.
    pub fn clear_fault_selection(
        &mut self,
        profile: ProfileId,
        fault: FaultTypeId,
    ) -> EngineResult<bool> {
        self.profile(profile)?;
        let removed = self
            .profile_faults
            .remove(&ProfileFaultKey { profile, fault })
            .is_some();
        if removed {
            self.recompute_profile(profile)?;
        }
        Ok(removed)
    }

    /// Re-resolve every profile record of `fault` after its links changed.
    fn refresh_fault_records(&mut self, fault: FaultTypeId) -> EngineResult<()> {
        let candidates = self.load_methods_for_fault(fault)?;
        let mut touched = Vec::new();
        for record in self
            .profile_faults
            .values_mut()
            .filter(|record| record.key.fault == fault)
        {
            let status = fault_coverage_status(&candidates, &record.method_ids)?;
            record.covered = status.covered();
            record.verdict = status.verdict;
            touched.push(record.key.profile);
        }
        self.recompute_profiles(touched)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove a category that nothing references any more.
    pub fn remove_category(&mut self, id: CategoryId) -> EngineResult<()> {
        self.category(id)?;
        let reason = if self.devices_in_category(id).next().is_some() {
            Some("it contains one or more devices")
        } else if self.methods_in_category(id).next().is_some() {
            Some("it contains one or more diagnostic methods")
        } else if self.faults_in_category(id).next().is_some() {
            Some("it contains one or more fault types")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(EngineError::InUse {
                kind: RecordKind::Category,
                id: id.0,
                reason: reason.to_string(),
            });
        }

        self.categories.remove(&id);
        Ok(())
    }

    /// Remove a device and every association that references it.
    pub fn remove_device(&mut self, id: DeviceId) -> EngineResult<()> {
        let device = self
            .devices
            .remove(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Device, id))?;

        for method in &device.method_ids {
            if let Some(m) = self.methods.get_mut(method) {
                m.device_ids.remove(&id);
            }
        }
        for profile in &device.profile_ids {
            if let Some(p) = self.profiles.get_mut(profile) {
                p.device_ids.remove(&id);
            }
        }
        self.profile_methods.retain(|key, _| key.device != id);

        info!(
            device = id.0,
            profiles = device.profile_ids.len(),
            "removed device and its associations"
        );
        self.recompute_profiles(device.profile_ids)
    }

    /// Remove a method, its links, selections and fault attachments.
    pub fn remove_method(&mut self, id: MethodId) -> EngineResult<()> {
        let method = self
            .methods
            .remove(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Method, id))?;

        for device in &method.device_ids {
            if let Some(d) = self.devices.get_mut(device) {
                d.method_ids.remove(&id);
            }
        }

        let mut touched: BTreeSet<ProfileId> = self
            .profile_methods
            .keys()
            .filter(|key| key.method == id)
            .map(|key| key.profile)
            .collect();
        self.profile_methods.retain(|key, _| key.method != id);

        let faults: Vec<FaultTypeId> = self
            .method_faults
            .keys()
            .filter(|key| key.method == id)
            .map(|key| key.fault)
            .collect();
        self.method_faults.retain(|key, _| key.method != id);

        for record in self.profile_faults.values_mut() {
            let before = record.method_ids.len();
            record.method_ids.retain(|m| *m != id);
            if record.method_ids.len() != before {
                touched.insert(record.key.profile);
            }
        }

        info!(
            method = id.0,
            links = faults.len(),
            "removed diagnostic method and its associations"
        );
        for fault in faults {
            self.refresh_fault_records(fault)?;
        }
        self.recompute_profiles(touched)
    }

    /// Remove a fault type, its method links and its profile records.
    pub fn remove_fault_type(&mut self, id: FaultTypeId) -> EngineResult<()> {
        self.faults
            .remove(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::FaultType, id))?;

        self.method_faults.retain(|key, _| key.fault != id);
        let touched: BTreeSet<ProfileId> = self
            .profile_faults
            .keys()
            .filter(|key| key.fault == id)
            .map(|key| key.profile)
            .collect();
        self.profile_faults.retain(|key, _| key.fault != id);

        info!(fault = id.0, profiles = touched.len(), "removed fault type");
        self.recompute_profiles(touched)
    }

    /// Remove a profile and its selections; devices stay.
    pub fn remove_profile(&mut self, id: ProfileId) -> EngineResult<()> {
        let profile = self
            .profiles
            .remove(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Profile, id))?;

        for device in &profile.device_ids {
            if let Some(d) = self.devices.get_mut(device) {
                d.profile_ids.remove(&id);
            }
        }
        self.profile_methods.retain(|key, _| key.profile != id);
        self.profile_faults.retain(|key, _| key.profile != id);

        info!(profile = id.0, "removed profile");
        Ok(())
    }

    // =========================================================================
    // Derived fields and views
    // =========================================================================

    /// Recompute and store a profile's derived fields.
    pub fn recompute_profile(&mut self, id: ProfileId) -> EngineResult<&ProfileMetrics> {
        let associations = self.load_profile_associations(id)?;
        let metrics = compute_metrics(&associations, &self.settings)?;
        debug!(
            profile = id.0,
            aggregate_coverage = metrics.aggregate_coverage,
            compliant = metrics.compliant,
            sil = ?metrics.sil_level,
            "recomputed profile metrics"
        );
        self.persist_profile_derived_fields(id, &metrics)?;
        Ok(&self.profile(id)?.metrics)
    }

    fn recompute_profiles(&mut self, ids: impl IntoIterator<Item = ProfileId>) -> EngineResult<()> {
        let ids: BTreeSet<ProfileId> = ids.into_iter().collect();
        for id in ids {
            if self.profiles.contains_key(&id) {
                self.recompute_profile(id)?;
            }
        }
        Ok(())
    }

    /// Whether the stored derived fields still match the associations.
    pub fn metrics_are_current(&self, id: ProfileId) -> EngineResult<bool> {
        let stored = &self.profile(id)?.metrics.fingerprint;
        let associations = self.load_profile_associations(id)?;
        let current = snapshot_of(&associations, &self.settings).fingerprint()?;
        Ok(*stored == current)
    }

    /// Methods of the device's category, flagged when selected in the profile.
    pub fn available_methods(
        &self,
        profile: ProfileId,
        device: DeviceId,
    ) -> EngineResult<Vec<(DiagnosticMethod, bool)>> {
        self.require_device_in_profile(profile, device)?;
        let category = self.device(device)?.category;
        let selected: HashSet<MethodId> =
            self.selected_methods(profile, device).into_iter().collect();
        Ok(self
            .methods_in_category(category)
            .map(|m| (m.clone(), selected.contains(&m.id)))
            .collect())
    }

    /// Every fault type of the device's category with its status in the profile.
    pub fn device_fault_view(
        &self,
        profile: ProfileId,
        device: DeviceId,
    ) -> EngineResult<Vec<DeviceFaultStatus>> {
        self.require_device_in_profile(profile, device)?;
        let category = self.device(device)?.category;
        Ok(self
            .faults_in_category(category)
            .map(|fault| {
                let record = self.profile_fault(profile, fault.id);
                DeviceFaultStatus {
                    fault: fault.clone(),
                    covered: record.map_or(false, |r| r.covered),
                    verdict: record.map(|r| r.verdict),
                    notes: record.and_then(|r| r.notes.clone()),
                }
            })
            .collect())
    }

    pub fn fault_coverage_stats(&self, profile: ProfileId) -> EngineResult<FaultCoverageStats> {
        self.profile(profile)?;
        Ok(fault_coverage_stats(self.profile_faults(profile)))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn profile_mut(&mut self, id: ProfileId) -> EngineResult<&mut Profile> {
        self.profiles
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Profile, id))
    }

    fn require_device_in_profile(&self, profile: ProfileId, device: DeviceId) -> EngineResult<()> {
        self.device(device)?;
        if self.profile(profile)?.device_ids.contains(&device) {
            Ok(())
        } else {
            Err(EngineError::DeviceNotInProfile {
                profile: profile.0,
                device: device.0,
            })
        }
    }

    fn check_same_category(&self, device: DeviceId, method: MethodId) -> EngineResult<()> {
        let device_category = self.device(device)?.category;
        if self.method(method)?.category == device_category {
            Ok(())
        } else {
            Err(EngineError::CategoryMismatch {
                method: method.0,
                device: device.0,
            })
        }
    }
}

fn require_name(name: &str, what: &str) -> EngineResult<()> {
    if name.trim().is_empty() {
        Err(EngineError::InvalidArgument(format!("{} must not be empty", what)))
    } else {
        Ok(())
    }
}

impl RecordProvider for Registry {
    fn load_device(&self, id: DeviceId) -> EngineResult<LoadedDevice> {
        let device = self.device(id)?.clone();
        let category = self.categories.get(&device.category).cloned();
        let assigned_methods = device
            .method_ids
            .iter()
            .filter_map(|m| self.methods.get(m).cloned())
            .collect();
        let category_methods = match &category {
            Some(c) => self.methods_in_category(c.id).cloned().collect(),
            None => Vec::new(),
        };
        Ok(LoadedDevice {
            device,
            category,
            assigned_methods,
            category_methods,
        })
    }

    fn load_method(&self, id: MethodId) -> EngineResult<DiagnosticMethod> {
        self.method(id).cloned()
    }

    fn load_methods_for_category(&self, id: CategoryId) -> EngineResult<Vec<DiagnosticMethod>> {
        self.category(id)?;
        Ok(self.methods_in_category(id).cloned().collect())
    }

    fn load_methods_for_fault(
        &self,
        id: FaultTypeId,
    ) -> EngineResult<Vec<(DiagnosticMethod, Level)>> {
        self.fault_type(id)?;
        Ok(self
            .method_faults
            .values()
            .filter(|link| link.key.fault == id)
            .filter_map(|link| {
                self.methods
                    .get(&link.key.method)
                    .map(|m| (m.clone(), link.effectiveness))
            })
            .collect())
    }

    fn load_profile_associations(&self, id: ProfileId) -> EngineResult<ProfileAssociations> {
        let profile = self.profile(id)?.clone();
        let devices = profile
            .device_ids
            .iter()
            .filter_map(|d| self.devices.get(d).cloned())
            .collect();
        let method_selections = self
            .profile_selections(id)
            .filter_map(|key| self.methods.get(&key.method).map(|m| (*key, m.clone())))
            .collect();
        let fault_selections = self.profile_faults(id).cloned().collect();
        Ok(ProfileAssociations {
            profile,
            devices,
            method_selections,
            fault_selections,
        })
    }
}

impl DerivedFieldSink for Registry {
    fn persist_profile_derived_fields(
        &mut self,
        id: ProfileId,
        metrics: &ProfileMetrics,
    ) -> EngineResult<()> {
        self.profile_mut(id)?.metrics = metrics.clone();
        Ok(())
    }
}
