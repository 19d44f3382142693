//! Fingerprints for the memoized profile fields.
//!
//! A profile's derived fields (aggregate coverage, compliance, PFD, SIL,
//! fault statistics) are a cache over its associations. Each computation
//! records a fingerprint of exactly the inputs it read, so a stale cache is
//! detectable by recomputing the fingerprint and comparing.
//!
//! # Snapshot contents
//!
//! ```text
//! architecture                            -> "ONE_OUT_OF_TWO"
//! selections  [(device, method, percent)] -> sorted by (device, method)
//! devices     [(device, pfd estimate)]    -> sorted by device
//! faults      [(fault, verdict)]          -> sorted by fault
//! thresholds  (required coverage, SIL bounds)
//! ```

mod hash;
pub use hash::compute_hash;

use serde::Serialize;

use crate::engine::fault_coverage::FaultVerdict;
use crate::error::{EngineError, EngineResult};
use crate::model::{ArchitectureType, DeviceId, FaultTypeId, MethodId};

/// Everything a profile's derived fields are computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSnapshot {
    pub architecture: ArchitectureType,
    pub selections: Vec<(DeviceId, MethodId, f64)>,
    pub devices: Vec<(DeviceId, Option<f64>)>,
    pub faults: Vec<(FaultTypeId, FaultVerdict)>,
    pub required_coverage: f64,
    pub sil_bounds: [f64; 4],
}

impl DerivedSnapshot {
    /// Sort every list so equal inputs always hash equally.
    pub fn normalized(mut self) -> Self {
        self.selections.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        self.devices.sort_by_key(|(id, _)| *id);
        self.faults.sort_by_key(|(id, _)| *id);
        self
    }

    pub fn fingerprint(&self) -> EngineResult<String> {
        compute_hash(self).map_err(|e| {
            EngineError::InvalidArgument(format!("cannot fingerprint profile inputs: {}", e))
        })
    }
}
