//! Configuration management for CrabGate
//!
//! Provides loading, saving and validation of the accepted age range,
//! capture encoding settings and the external service endpoints.

use crate::errors::VerifyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    pub verification: VerificationConfig,
    pub capture: CaptureConfig,
    pub services: ServicesConfig,
}

/// Acceptance rule and what happens after an accepted result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerificationConfig {
    /// Lowest accepted age, inclusive
    pub min_age: u32,
    /// Highest accepted age, inclusive
    pub max_age: u32,
    /// Redirect target after success
    pub success_destination: String,
    /// Confirmation shown after success
    pub success_notice: String,
}

/// Live capture settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Requested stream width
    pub ideal_width: u32,
    /// Requested stream height
    pub ideal_height: u32,
}

/// Classifier and persistence endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServicesConfig {
    pub classifier_url: String,
    pub persistence_url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            min_age: 13,
            max_age: 17,
            success_destination: "/dashboard".to_string(),
            success_notice: "Age verified successfully!".to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            classifier_url: "http://localhost:8000/predict".to_string(),
            persistence_url: "http://localhost:5000/api/verifications".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            verification: VerificationConfig::default(),
            capture: CaptureConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

impl VerificationConfig {
    pub fn age_range(&self) -> RangeInclusive<u32> {
        self.min_age..=self.max_age
    }

    pub fn accepts(&self, age: u32) -> bool {
        self.age_range().contains(&age)
    }
}

impl GateConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, VerifyError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| VerifyError::Config(format!("Failed to read config file: {}", e)))?;

        let config: GateConfig = toml::from_str(&contents)
            .map_err(|e| VerifyError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(VerifyError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), VerifyError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VerifyError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| VerifyError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| VerifyError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabgate.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.verification.min_age > self.verification.max_age {
            return Err(format!(
                "min_age ({}) must not exceed max_age ({})",
                self.verification.min_age, self.verification.max_age
            ));
        }
        if self.verification.success_destination.trim().is_empty() {
            return Err("success_destination must not be empty".to_string());
        }

        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        if self.capture.ideal_width == 0 || self.capture.ideal_height == 0 {
            return Err("Invalid capture resolution".to_string());
        }

        if self.services.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert_eq!(config.verification.age_range(), 13..=17);
        assert_eq!(config.capture.jpeg_quality, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_accepts_inclusive_bounds() {
        let config = VerificationConfig::default();
        assert!(config.accepts(13));
        assert!(config.accepts(17));
        assert!(!config.accepts(12));
        assert!(!config.accepts(18));
    }

    #[test]
    fn test_config_validation() {
        let mut bad_range = GateConfig::default();
        bad_range.verification.min_age = 20;
        assert!(bad_range.validate().is_err());

        let mut bad_quality = GateConfig::default();
        bad_quality.capture.jpeg_quality = 0;
        assert!(bad_quality.validate().is_err());

        let mut bad_timeout = GateConfig::default();
        bad_timeout.services.request_timeout_ms = 0;
        assert!(bad_timeout.validate().is_err());
    }

    #[test]
    fn test_config_toml_format() {
        let toml_string = toml::to_string_pretty(&GateConfig::default()).unwrap();
        assert!(toml_string.contains("[verification]"));
        assert!(toml_string.contains("[capture]"));
        assert!(toml_string.contains("[services]"));
        assert!(toml_string.contains("min_age"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GateConfig = toml::from_str("[verification]\nmax_age = 18\n").unwrap();
        assert_eq!(config.verification.max_age, 18);
        assert_eq!(config.verification.min_age, 13);
        assert_eq!(config.capture.jpeg_quality, 90);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = GateConfig::load_from_file("nonexistent_crabgate.toml");
        assert_eq!(result.unwrap(), GateConfig::default());
    }
}
