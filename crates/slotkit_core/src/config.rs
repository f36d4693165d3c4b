//! Pipeline configuration
//!
//! Configuration can be built in code or loaded from TOML:
//!
//! ```rust
//! use slotkit_core::PipelineConfig;
//!
//! let config = PipelineConfig::from_toml_str("max_tasks_per_drain = 64").unwrap();
//! assert_eq!(config.max_tasks_per_drain, 64);
//! assert!(config.warn_on_missing_slot);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Runtime knobs shared by the scheduler, the content observer and components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on tasks executed by a single scheduler drain
    pub max_tasks_per_drain: usize,
    /// Log a warning when a component has no default slot
    pub warn_on_missing_slot: bool,
    /// Skip content notifications whose nodes match the previous delivery
    pub dedupe_content: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_drain: 10_000,
            warn_on_missing_slot: true,
            dedupe_content: true,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a config from TOML. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_tasks_per_drain == 0 {
            return Err(ConfigError::Invalid {
                field: "max_tasks_per_drain",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// Set the drain bound
    pub fn max_tasks_per_drain(mut self, max: usize) -> Self {
        self.max_tasks_per_drain = max;
        self
    }

    /// Set whether a missing default slot is logged
    pub fn warn_on_missing_slot(mut self, warn: bool) -> Self {
        self.warn_on_missing_slot = warn;
        self
    }

    /// Set whether identical content deliveries are suppressed
    pub fn dedupe_content(mut self, dedupe: bool) -> Self {
        self.dedupe_content = dedupe;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = PipelineConfig::from_toml_str(
            r#"
            warn_on_missing_slot = false
            dedupe_content = false
            "#,
        )
        .unwrap();

        assert!(!config.warn_on_missing_slot);
        assert!(!config.dedupe_content);
        assert_eq!(config.max_tasks_per_drain, 10_000);
    }

    #[test]
    fn test_zero_drain_bound_rejected() {
        let err = PipelineConfig::from_toml_str("max_tasks_per_drain = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_tasks_per_drain",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = PipelineConfig::from_toml_str("max_tasks_per_drain = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_builder_methods() {
        let config = PipelineConfig::default()
            .max_tasks_per_drain(8)
            .dedupe_content(false);
        assert_eq!(config.max_tasks_per_drain, 8);
        assert!(!config.dedupe_content);
        assert!(config.validate().is_ok());
    }
}
