//! # Silguard
//!
//! Diagnostic-coverage and SIL compliance engine for safety instrumented
//! systems.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Registry (model)                        │
//! │  categories, devices, methods, fault types, profiles     │
//! │  + association records keyed by composite ids            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [RecordProvider]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Engine                              │
//! │  suitability ─ coverage ─ compliance ─ fault coverage    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [DerivedFieldSink]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Profile metrics (+ fingerprint in cache)          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Thresholds come from [`config::Settings`]; the defaults are the
//! standard tables. Events are emitted through `tracing`.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod provider;
pub mod validation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::engine::{
        aggregate_coverage, derived_sil, is_coverage_compliant, required_coverage,
        suitable_methods, Evaluator, FaultCoverageStatus, FaultVerdict, ProfileMetrics, SilLevel,
    };
    pub use crate::error::{EngineError, EngineResult, RecordKind};
    pub use crate::model::{
        ArchitectureType, CategoryId, DeviceId, FaultTypeId, Level, MethodId, NewCategory,
        NewDevice, NewFaultType, NewMethod, NewProfile, ProfileId, Registry,
    };
    pub use crate::provider::{DerivedFieldSink, RecordProvider};
}

// Also export at crate root for convenience
pub use config::Settings;
pub use engine::Evaluator;
pub use error::{EngineError, EngineResult};
pub use model::Registry;
