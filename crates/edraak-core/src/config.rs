//! Settings for the ForUs validator and the University ID app
//!
//! Loaded from JSON. Every section has defaults except the ForUs secret,
//! which may also come from the `FORUS_AUTH_SECRET_KEY` environment variable.

use std::path::Path;

use crate::choices::Choices;
use crate::{Error, Result};

/// Environment variable that overrides `forus.secret_key`
pub const SECRET_KEY_ENV: &str = "FORUS_AUTH_SECRET_KEY";

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    pub forus: ForUsSettings,
    pub choices: Choices,
    pub features: Features,
}

/// ForUs request validation knobs
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ForUsSettings {
    /// Shared HMAC key, must match the partner's signing key
    pub secret_key: String,
    /// Number of accepted birth years, counting back from the current year
    pub year_of_birth_span: i32,
    /// Maximum request age
    pub freshness_hours: i64,
}

impl Default for ForUsSettings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            year_of_birth_span: 120,
            freshness_hours: 24,
        }
    }
}

/// Widest accepted birth-year range
pub const MAX_YEAR_OF_BIRTH_SPAN: i32 = 1000;

/// Longest accepted freshness window (one hundred years)
pub const MAX_FRESHNESS_HOURS: i64 = 24 * 366 * 100;

impl ForUsSettings {
    /// Reject limits that are non-positive or wider than the platform can use
    pub fn check_limits(&self) -> Result<()> {
        if !(1..=MAX_YEAR_OF_BIRTH_SPAN).contains(&self.year_of_birth_span) {
            return Err(Error::ConfigError(format!(
                "forus.year_of_birth_span must be between 1 and {}, got {}",
                MAX_YEAR_OF_BIRTH_SPAN, self.year_of_birth_span
            )));
        }
        if !(1..=MAX_FRESHNESS_HOURS).contains(&self.freshness_hours) {
            return Err(Error::ConfigError(format!(
                "forus.freshness_hours must be between 1 and {}, got {}",
                MAX_FRESHNESS_HOURS, self.freshness_hours
            )));
        }
        Ok(())
    }
}

/// Platform feature flags for the University ID app
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Features {
    pub university_app: bool,
    pub university_csv_export: bool,
}

impl Settings {
    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))?;
        settings.forus.check_limits()?;
        Ok(settings)
    }

    /// Load settings from a JSON file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        let mut settings = Self::from_json(&text)?;
        settings.apply_env();
        Ok(settings)
    }

    /// Replace the secret with `FORUS_AUTH_SECRET_KEY` when it is set
    pub fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(SECRET_KEY_ENV) {
            if !secret.is_empty() {
                tracing::debug!("using ForUs secret from {}", SECRET_KEY_ENV);
                self.forus.secret_key = secret;
            }
        }
    }

    /// The configured secret, or an error if none is set
    pub fn secret_key(&self) -> Result<&str> {
        if self.forus.secret_key.is_empty() {
            return Err(Error::ConfigError(format!(
                "forus.secret_key is not set (and {} is empty)",
                SECRET_KEY_ENV
            )));
        }
        Ok(&self.forus.secret_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings.forus.year_of_birth_span, 120);
        assert_eq!(settings.forus.freshness_hours, 24);
        assert!(!settings.features.university_app);
        assert!(settings.secret_key().is_err());
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::from_json(
            r#"{"forus": {"secret_key": "s3cret"}, "features": {"university_app": true}}"#,
        )
        .unwrap();
        assert_eq!(settings.secret_key().unwrap(), "s3cret");
        assert_eq!(settings.forus.freshness_hours, 24);
        assert!(settings.features.university_app);
        assert!(!settings.features.university_csv_export);
    }

    #[test]
    fn test_malformed_json() {
        let err = Settings::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_out_of_range_limits() {
        for json in [
            r#"{"forus": {"freshness_hours": 9223372036854775807}}"#,
            r#"{"forus": {"freshness_hours": 0}}"#,
            r#"{"forus": {"freshness_hours": -24}}"#,
            r#"{"forus": {"year_of_birth_span": 2147483647}}"#,
            r#"{"forus": {"year_of_birth_span": -2147483648}}"#,
            r#"{"forus": {"year_of_birth_span": 0}}"#,
        ] {
            let err = Settings::from_json(json).unwrap_err();
            assert!(matches!(err, Error::ConfigError(_)), "{} should be rejected", json);
        }

        let widest = format!(
            r#"{{"forus": {{"freshness_hours": {}, "year_of_birth_span": {}}}}}"#,
            MAX_FRESHNESS_HOURS, MAX_YEAR_OF_BIRTH_SPAN
        );
        assert!(Settings::from_json(&widest).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
