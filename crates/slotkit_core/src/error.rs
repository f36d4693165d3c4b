//! Error and diagnostic types

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML source could not be parsed
    #[error("Failed to parse pipeline config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value outside its allowed range
    #[error("Invalid pipeline config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Non-fatal diagnostics raised while assembling or running a component.
///
/// These are logged and kept on the component; they never interrupt rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    /// The component's shadow tree has no default (unnamed) slot
    #[error(
        "{component} expects a shadow tree that includes a default (unnamed) slot; content will be null"
    )]
    MissingContentSlot { component: String },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
