//! Configuration errors.
//!
//! The combat API itself never fails: lookups that find nothing return
//! `None`/`false`. Only loading and validating configuration can error.

/// Errors raised while loading or validating an `EngineConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed into a configuration.
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tuning value is outside its permitted range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
