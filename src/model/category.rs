// src/model/category.rs
use crate::model::types::CategoryId;
use serde::{Deserialize, Serialize};

/// A device category. Owns devices, diagnostic methods and fault types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCategory {
    pub id: CategoryId,
    /// Unique across the registry
    pub name: String,
    pub description: String,
    /// External standard reference (e.g. a GOST or IEC clause)
    pub standard_reference: Option<String>,
}

/// Fields of a category before the registry assigns it an id.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub standard_reference: Option<String>,
}

impl NewCategory {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Field changes to a stored category; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub standard_reference: Option<String>,
}

impl PartialEq for DeviceCategory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DeviceCategory {}
