//! Error types for the compliance engine.
//!
//! Every engine error is local and final: it stems from bad input or from
//! inconsistent records, never from a transient condition, so none of them
//! is worth retrying. The calling layer decides what the user sees.

use std::fmt;

/// Result type for engine and registry operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Category,
    Device,
    Method,
    FaultType,
    Profile,
    MethodFault,
    ProfileMethod,
    ProfileFault,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Category => "device category",
            RecordKind::Device => "device",
            RecordKind::Method => "diagnostic method",
            RecordKind::FaultType => "fault type",
            RecordKind::Profile => "profile",
            RecordKind::MethodFault => "method-fault link",
            RecordKind::ProfileMethod => "profile method selection",
            RecordKind::ProfileFault => "profile fault record",
        };
        f.write_str(name)
    }
}

/// Errors raised by the engine and by the entity registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A required input was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A coverage percentage outside [0, 100] (or not a number).
    #[error("Coverage value {value} is outside the range [0, 100]")]
    CoverageOutOfRange { value: f64 },

    /// A failure-on-demand probability that is negative or not finite.
    #[error("Failure probability {value} must be a finite, non-negative number")]
    InvalidProbability { value: f64 },

    /// An association with the same composite key already exists.
    #[error("Duplicate {kind}: {key}")]
    DuplicateAssociation { kind: RecordKind, key: String },

    /// The same method id was selected more than once for one fault.
    #[error("Method {method} was selected more than once")]
    DuplicateSelection { method: u64 },

    /// A fault type has no HIGH-effectiveness method and can never be covered.
    #[error("Fault type {fault} has no HIGH-effectiveness method; it needs manual review")]
    UnresolvableFault { fault: u64 },

    /// A referenced record does not exist.
    #[error("No {kind} with id {id}")]
    NotFound { kind: RecordKind, id: u64 },

    /// A unique name (or code) is already taken.
    #[error("A {kind} named '{name}' already exists")]
    NameConflict { kind: RecordKind, name: String },

    /// A record cannot be removed while others still depend on it.
    #[error("Cannot remove {kind} {id}: {reason}")]
    InUse {
        kind: RecordKind,
        id: u64,
        reason: String,
    },

    /// A method from another category was applied to a device.
    #[error("Diagnostic method {method} does not belong to the category of device {device}")]
    CategoryMismatch { method: u64, device: u64 },

    /// A method and a fault type of different categories were linked.
    #[error("Diagnostic method {method} and fault type {fault} belong to different device categories")]
    FaultCategoryMismatch { method: u64, fault: u64 },

    /// An association expected to exist does not.
    #[error("No {kind} for {key}")]
    MissingAssociation { kind: RecordKind, key: String },

    /// A device-level operation on a profile that does not contain the device.
    #[error("Device {device} is not part of profile {profile}")]
    DeviceNotInProfile { profile: u64, device: u64 },
}

impl EngineError {
    pub(crate) fn not_found(kind: RecordKind, id: impl Into<u64>) -> Self {
        EngineError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for the data-integrity family: the stored data is inconsistent,
    /// so the caller may prefer to flag the record instead of rejecting it.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            EngineError::CoverageOutOfRange { .. }
                | EngineError::InvalidProbability { .. }
                | EngineError::DuplicateAssociation { .. }
                | EngineError::DuplicateSelection { .. }
                | EngineError::UnresolvableFault { .. }
        )
    }
}
