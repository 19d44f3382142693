// src/model/fault.rs
use crate::model::types::{CategoryId, FaultTypeId, Level, MethodId};
use serde::{Deserialize, Serialize};

/// A category-specific failure mode that diagnostic methods must detect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultType {
    pub id: FaultTypeId,
    /// Unique across the registry
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: CategoryId,
    /// Coverage a profile must reach for this fault
    pub coverage_requirement: Level,
    pub standard_reference: Option<String>,
}

/// Fields of a fault type before the registry assigns it an id.
#[derive(Debug, Clone)]
pub struct NewFaultType {
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: CategoryId,
    pub coverage_requirement: Level,
    pub standard_reference: Option<String>,
}

impl NewFaultType {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        category: CategoryId,
        coverage_requirement: Level,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: String::new(),
            category,
            coverage_requirement,
            standard_reference: None,
        }
    }
}

/// Field changes to a stored fault type; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct FaultTypeUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub coverage_requirement: Option<Level>,
    pub standard_reference: Option<String>,
}

impl PartialEq for FaultType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FaultType {}

/// Composite key of a method ↔ fault link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodFaultKey {
    pub method: MethodId,
    pub fault: FaultTypeId,
}

/// How effective one method is against one fault type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMethodFault {
    pub key: MethodFaultKey,
    pub effectiveness: Level,
}
