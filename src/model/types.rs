//! Identifiers and shared enums of the domain model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

macro_rules! record_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identity of a [`DeviceCategory`](super::DeviceCategory).
    CategoryId
);
record_id!(
    /// Identity of a [`Device`](super::Device).
    DeviceId
);
record_id!(
    /// Identity of a [`DiagnosticMethod`](super::DiagnosticMethod).
    MethodId
);
record_id!(
    /// Identity of a [`FaultType`](super::FaultType).
    FaultTypeId
);
record_id!(
    /// Identity of a [`Profile`](super::Profile).
    ProfileId
);

/// Redundancy architecture of a device or a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArchitectureType {
    /// 1oo1: a single channel.
    OneOutOfOne,
    /// 1oo2: two channels, either one can trip.
    OneOutOfTwo,
    /// 2oo3: three channels with majority voting.
    TwoOutOfThree,
}

impl ArchitectureType {
    pub const ALL: [ArchitectureType; 3] = [
        ArchitectureType::OneOutOfOne,
        ArchitectureType::OneOutOfTwo,
        ArchitectureType::TwoOutOfThree,
    ];

    /// Short voting code, e.g. `1oo2`.
    pub fn code(&self) -> &'static str {
        match self {
            ArchitectureType::OneOutOfOne => "1oo1",
            ArchitectureType::OneOutOfTwo => "1oo2",
            ArchitectureType::TwoOutOfThree => "2oo3",
        }
    }
}

impl fmt::Display for ArchitectureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ArchitectureType {
    type Err = EngineError;

    /// Accepts the voting code (`1oo1`) or the enum name (`ONE_OUT_OF_ONE`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1oo1" | "one_out_of_one" => Ok(ArchitectureType::OneOutOfOne),
            "1oo2" | "one_out_of_two" => Ok(ArchitectureType::OneOutOfTwo),
            "2oo3" | "two_out_of_three" => Ok(ArchitectureType::TwoOutOfThree),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown architecture type '{}'",
                other
            ))),
        }
    }
}

/// Three-step rating used for coverage levels, effectiveness, suitability
/// and implementation complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::Medium => "MEDIUM",
            Level::High => "HIGH",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Level::Low),
            "MEDIUM" => Ok(Level::Medium),
            "HIGH" => Ok(Level::High),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown level '{}'",
                other
            ))),
        }
    }
}
