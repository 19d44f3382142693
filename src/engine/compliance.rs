//! Compliance verdicts: coverage against the architecture threshold, and the
//! safety integrity level implied by a failure-on-demand probability.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ComplianceSettings, SilSettings};
use crate::error::{EngineError, EngineResult};
use crate::model::ArchitectureType;

/// Safety integrity level, 0 meaning "no level reached".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SilLevel {
    Sil0,
    Sil1,
    Sil2,
    Sil3,
    Sil4,
}

impl SilLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            SilLevel::Sil0 => 0,
            SilLevel::Sil1 => 1,
            SilLevel::Sil2 => 2,
            SilLevel::Sil3 => 3,
            SilLevel::Sil4 => 4,
        }
    }

    /// SIL 0 means the probability is outside every band.
    pub fn is_compliant(self) -> bool {
        self != SilLevel::Sil0
    }
}

impl From<SilLevel> for u8 {
    fn from(level: SilLevel) -> u8 {
        level.as_u8()
    }
}

impl TryFrom<u8> for SilLevel {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SilLevel::Sil0),
            1 => Ok(SilLevel::Sil1),
            2 => Ok(SilLevel::Sil2),
            3 => Ok(SilLevel::Sil3),
            4 => Ok(SilLevel::Sil4),
            other => Err(EngineError::InvalidArgument(format!(
                "SIL level {} is outside 0..=4",
                other
            ))),
        }
    }
}

impl fmt::Display for SilLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIL {}", self.as_u8())
    }
}

/// Outcome of comparing an aggregate coverage with its required threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageVerdict {
    pub architecture: ArchitectureType,
    pub aggregate: f64,
    pub required: f64,
    pub compliant: bool,
}

impl CoverageVerdict {
    /// Distance to the threshold; negative when short of it.
    pub fn margin(&self) -> f64 {
        self.aggregate - self.required
    }
}

/// Coverage an architecture requires under the default thresholds.
pub fn required_coverage(architecture: ArchitectureType) -> f64 {
    ComplianceSettings::default().required_coverage(architecture)
}

/// Whether `aggregate` meets the threshold of `architecture` (inclusive).
///
/// A missing aggregate, a missing architecture or a NaN aggregate is never
/// compliant.
pub fn is_coverage_compliant(
    aggregate: impl Into<Option<f64>>,
    architecture: impl Into<Option<ArchitectureType>>,
) -> bool {
    is_coverage_compliant_with(aggregate, architecture, &ComplianceSettings::default())
}

/// [`is_coverage_compliant`] against explicit thresholds.
pub fn is_coverage_compliant_with(
    aggregate: impl Into<Option<f64>>,
    architecture: impl Into<Option<ArchitectureType>>,
    settings: &ComplianceSettings,
) -> bool {
    match (aggregate.into(), architecture.into()) {
        (Some(aggregate), Some(architecture)) => {
            aggregate >= settings.required_coverage(architecture)
        }
        _ => false,
    }
}

/// Full verdict for reporting.
pub fn coverage_verdict(
    aggregate: f64,
    architecture: ArchitectureType,
    settings: &ComplianceSettings,
) -> CoverageVerdict {
    let required = settings.required_coverage(architecture);
    CoverageVerdict {
        architecture,
        aggregate,
        required,
        compliant: is_coverage_compliant_with(aggregate, architecture, settings),
    }
}

/// SIL implied by a maximum probability of failure on demand.
///
/// Each bound belongs to the safer band: exactly `1e-5` is SIL 4.
pub fn derived_sil(max_probability: f64) -> EngineResult<SilLevel> {
    derived_sil_with(max_probability, &SilSettings::default())
}

/// [`derived_sil`] against explicit band bounds.
pub fn derived_sil_with(max_probability: f64, bands: &SilSettings) -> EngineResult<SilLevel> {
    check_probability(max_probability)?;

    let level = if max_probability <= bands.sil4 {
        SilLevel::Sil4
    } else if max_probability <= bands.sil3 {
        SilLevel::Sil3
    } else if max_probability <= bands.sil2 {
        SilLevel::Sil2
    } else if max_probability <= bands.sil1 {
        SilLevel::Sil1
    } else {
        SilLevel::Sil0
    };
    Ok(level)
}

/// Reject a probability that is negative or not finite.
pub fn check_probability(value: f64) -> EngineResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidProbability { value })
    }
}
