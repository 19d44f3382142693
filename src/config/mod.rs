//! Configuration module for silguard.
//!
//! Handles compliance thresholds, SIL bands, coverage bands and the
//! environment lookup of the config file.

mod settings;

pub use settings::{
    expand_env_vars, ComplianceSettings, CoverageSettings, Settings, SettingsError, SilSettings,
};
