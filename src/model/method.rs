// src/model/method.rs
use crate::engine::suitability;
use crate::model::types::{ArchitectureType, CategoryId, DeviceId, Level, MethodId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A diagnostic method registered against a device category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticMethod {
    pub id: MethodId,
    pub category: CategoryId,
    /// Unique within the category
    pub name: String,
    pub description: String,
    pub effectiveness: Level,
    pub suitability: Level,
    pub implementation_complexity: Level,
    /// Share of dangerous failures detected, 0..=100 with two decimals
    pub coverage_percent: f64,
    /// Banding of `coverage_percent`; gates architecture suitability
    pub coverage_level: Level,
    pub standard_reference: Option<String>,
    /// Devices this method is directly assigned to
    pub device_ids: BTreeSet<DeviceId>,
}

impl DiagnosticMethod {
    /// Minimum coverage the method is expected to reach for its effectiveness.
    pub fn required_coverage(&self) -> f64 {
        match self.effectiveness {
            Level::High => 99.0,
            Level::Medium => 90.0,
            Level::Low => 60.0,
        }
    }

    /// Whether the method's coverage level is admissible for `architecture`.
    pub fn is_suitable_for(&self, architecture: ArchitectureType) -> bool {
        suitability::admits(self.coverage_level, architecture)
    }
}

/// Fields of a diagnostic method before the registry assigns it an id.
#[derive(Debug, Clone)]
pub struct NewMethod {
    pub category: CategoryId,
    pub name: String,
    pub description: String,
    pub effectiveness: Level,
    pub suitability: Level,
    pub implementation_complexity: Level,
    pub coverage_percent: f64,
    pub coverage_level: Level,
    pub standard_reference: Option<String>,
}

impl NewMethod {
    /// A method with MEDIUM ratings and the given coverage.
    pub fn new(
        category: CategoryId,
        name: impl Into<String>,
        coverage_percent: f64,
        coverage_level: Level,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            description: String::new(),
            effectiveness: Level::Medium,
            suitability: Level::Medium,
            implementation_complexity: Level::Medium,
            coverage_percent,
            coverage_level,
            standard_reference: None,
        }
    }

    pub fn with_effectiveness(mut self, effectiveness: Level) -> Self {
        self.effectiveness = effectiveness;
        self
    }
}

/// Field changes to a stored method; `None` leaves a field as is.
///
/// The category is fixed once the method exists.
#[derive(Debug, Clone, Default)]
pub struct MethodUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub effectiveness: Option<Level>,
    pub suitability: Option<Level>,
    pub implementation_complexity: Option<Level>,
    pub coverage_percent: Option<f64>,
    pub coverage_level: Option<Level>,
    pub standard_reference: Option<String>,
}

impl MethodUpdate {
    /// Change the coverage figure together with its declared level.
    pub fn coverage(coverage_percent: f64, coverage_level: Level) -> Self {
        Self {
            coverage_percent: Some(coverage_percent),
            coverage_level: Some(coverage_level),
            ..Default::default()
        }
    }
}

impl PartialEq for DiagnosticMethod {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DiagnosticMethod {}
