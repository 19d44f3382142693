//! TOML-based configuration for silguard.
//!
//! Supports a config file (silguard.toml) whose path may come from an
//! environment variable with `${VAR}` expansion. Every section is optional;
//! an empty file yields the standard tables.
//!
//! Example configuration:
//! ```toml
//! [compliance]
//! one_out_of_one = 99.0
//! one_out_of_two = 90.0
//! two_out_of_three = 60.0
//!
//! [sil]
//! sil4 = 1e-5
//! sil3 = 1e-4
//! sil2 = 1e-3
//! sil1 = 1e-2
//!
//! [coverage]
//! medium_min = 90.0
//! high_min = 99.0
//! decimal_places = 2
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::ArchitectureType;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Required coverage per architecture.
    pub compliance: ComplianceSettings,

    /// SIL band bounds.
    pub sil: SilSettings,

    /// Coverage-level bands and rounding.
    pub coverage: CoverageSettings,
}

/// Required aggregate coverage per architecture, in percent.
///
/// The least redundant architecture carries the highest requirement.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComplianceSettings {
    pub one_out_of_one: f64,
    pub one_out_of_two: f64,
    pub two_out_of_three: f64,
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            one_out_of_one: 99.0,
            one_out_of_two: 90.0,
            two_out_of_three: 60.0,
        }
    }
}

impl ComplianceSettings {
    pub fn required_coverage(&self, architecture: ArchitectureType) -> f64 {
        match architecture {
            ArchitectureType::OneOutOfOne => self.one_out_of_one,
            ArchitectureType::OneOutOfTwo => self.one_out_of_two,
            ArchitectureType::TwoOutOfThree => self.two_out_of_three,
        }
    }
}

/// Inclusive upper PFD bound of each SIL band.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SilSettings {
    pub sil4: f64,
    pub sil3: f64,
    pub sil2: f64,
    pub sil1: f64,
}

impl Default for SilSettings {
    fn default() -> Self {
        Self {
            sil4: 1e-5,
            sil3: 1e-4,
            sil2: 1e-3,
            sil1: 1e-2,
        }
    }
}

impl SilSettings {
    /// Bounds from the safest band down.
    pub fn bounds(&self) -> [f64; 4] {
        [self.sil4, self.sil3, self.sil2, self.sil1]
    }
}

/// Coverage-level bands used to check a method's declared level.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoverageSettings {
    /// Lowest percentage banded as MEDIUM.
    pub medium_min: f64,

    /// Lowest percentage banded as HIGH.
    pub high_min: f64,

    /// Decimal places of stored and reported percentages.
    pub decimal_places: u32,
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            medium_min: 90.0,
            high_min: 99.0,
            decimal_places: 2,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SILGUARD_CONFIG`
    /// 2. `./silguard.toml`
    /// 3. `~/.config/silguard/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SILGUARD_CONFIG") {
            return Self::from_file(expand_env_vars(&path)?);
        }

        let local_config = PathBuf::from("silguard.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("silguard").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for arch in ArchitectureType::ALL {
            let required = self.compliance.required_coverage(arch);
            if !(0.0..=100.0).contains(&required) {
                return Err(SettingsError::InvalidConfig(format!(
                    "required coverage for {} must be within [0, 100], got {}",
                    arch, required
                )));
            }
        }

        let bounds = self.sil.bounds();
        if bounds.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(SettingsError::InvalidConfig(
                "SIL bounds must be finite and non-negative".to_string(),
            ));
        }
        if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SettingsError::InvalidConfig(
                "SIL bounds must increase from sil4 to sil1".to_string(),
            ));
        }

        let coverage = &self.coverage;
        if !(0.0 <= coverage.medium_min
            && coverage.medium_min <= coverage.high_min
            && coverage.high_min <= 100.0)
        {
            return Err(SettingsError::InvalidConfig(format!(
                "coverage bands must satisfy 0 <= medium_min ({}) <= high_min ({}) <= 100",
                coverage.medium_min, coverage.high_min
            )));
        }
        if coverage.decimal_places > 6 {
            return Err(SettingsError::InvalidConfig(format!(
                "decimal_places must be at most 6, got {}",
                coverage.decimal_places
            )));
        }

        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
