//! Per-fault coverage decisions within a profile.
//!
//! A fault is covered when every method rated HIGH for that fault is among
//! the methods the user attached to it. This is a containment check on
//! method ids, not a coverage-percentage threshold.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::engine::coverage::{round_half_up, COVERAGE_SCALE};
use crate::error::{EngineError, EngineResult};
use crate::model::{DiagnosticMethod, FaultTypeId, Level, MethodId, ProfileFault};

/// Outcome of resolving one fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultVerdict {
    Covered,
    NotCovered,
    /// No HIGH-effectiveness method exists for the fault, so no selection
    /// can ever cover it. Needs manual attention.
    Unresolvable,
}

/// Coverage status of a fault for one selection of methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultCoverageStatus {
    pub verdict: FaultVerdict,
    /// Selected ids that are candidates for the fault, in selection order
    pub resolved_ids: Vec<MethodId>,
    /// HIGH-effectiveness methods that were not selected
    pub missing_ids: Vec<MethodId>,
}

impl FaultCoverageStatus {
    pub fn covered(&self) -> bool {
        self.verdict == FaultVerdict::Covered
    }

    /// Turn an unresolvable verdict into a data-integrity error for `fault`.
    pub fn require_resolvable(self, fault: FaultTypeId) -> EngineResult<Self> {
        match self.verdict {
            FaultVerdict::Unresolvable => Err(EngineError::UnresolvableFault { fault: fault.0 }),
            _ => Ok(self),
        }
    }
}

/// Reject a selection that names the same method twice.
pub fn check_unique_selection(selected: &[MethodId]) -> EngineResult<()> {
    let mut seen = HashSet::with_capacity(selected.len());
    for id in selected {
        if !seen.insert(*id) {
            return Err(EngineError::DuplicateSelection { method: id.0 });
        }
    }
    Ok(())
}

/// Resolve a fault's coverage from its candidates and the user's selection.
///
/// `candidates` are the methods linked to the fault together with the
/// effectiveness of that particular link. Selected ids that are not
/// candidates are ignored.
pub fn fault_coverage_status(
    candidates: &[(DiagnosticMethod, Level)],
    selected: &[MethodId],
) -> EngineResult<FaultCoverageStatus> {
    check_unique_selection(selected)?;

    let candidate_ids: BTreeSet<MethodId> = candidates.iter().map(|(m, _)| m.id).collect();
    let required: BTreeSet<MethodId> = candidates
        .iter()
        .filter(|(_, effectiveness)| *effectiveness == Level::High)
        .map(|(m, _)| m.id)
        .collect();

    let resolved_ids: Vec<MethodId> = selected
        .iter()
        .copied()
        .filter(|id| candidate_ids.contains(id))
        .collect();
    let chosen: HashSet<MethodId> = resolved_ids.iter().copied().collect();
    let missing_ids: Vec<MethodId> = required
        .iter()
        .copied()
        .filter(|id| !chosen.contains(id))
        .collect();

    let verdict = if required.is_empty() {
        FaultVerdict::Unresolvable
    } else if missing_ids.is_empty() {
        FaultVerdict::Covered
    } else {
        FaultVerdict::NotCovered
    };

    Ok(FaultCoverageStatus {
        verdict,
        resolved_ids,
        missing_ids,
    })
}

/// Covered-fault counts of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultCoverageStats {
    pub total_faults: usize,
    pub covered_faults: usize,
    pub unresolvable_faults: usize,
    /// `covered / total * 100`, two decimals; `0.0` without records
    pub coverage_percentage: f64,
}

/// Summarise a profile's fault records.
pub fn fault_coverage_stats<'a>(
    records: impl IntoIterator<Item = &'a ProfileFault>,
) -> FaultCoverageStats {
    let mut total_faults = 0;
    let mut covered_faults = 0;
    let mut unresolvable_faults = 0;
    for record in records {
        total_faults += 1;
        if record.covered {
            covered_faults += 1;
        }
        if record.verdict == FaultVerdict::Unresolvable {
            unresolvable_faults += 1;
        }
    }

    let coverage_percentage = if total_faults > 0 {
        round_half_up(
            covered_faults as f64 / total_faults as f64 * 100.0,
            COVERAGE_SCALE,
        )
    } else {
        0.0
    };

    FaultCoverageStats {
        total_faults,
        covered_faults,
        unresolvable_faults,
        coverage_percentage,
    }
}
