//! Errors raised while loading configuration and fixture data.
//!
//! Enumeration, progress refresh and filtering never fail; only the loading
//! boundaries report errors.
use thiserror::Error;

/// Errors raised when checklist configuration is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("completion epsilon must be positive and finite (got {0})")]
    CompletionEpsilon(f32),
    #[error("refresh interval must be at least 1ms")]
    RefreshInterval,
}

/// Errors raised when fixture data cannot be turned into host collaborators.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("context references unknown body '{0}'")]
    UnknownBody(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            ConfigError::CompletionEpsilon(-1.0).to_string(),
            "completion epsilon must be positive and finite (got -1)"
        );
        assert_eq!(
            FixtureError::UnknownBody("Eeloo".to_string()).to_string(),
            "context references unknown body 'Eeloo'"
        );
    }

    #[test]
    fn json_errors_convert() {
        let err: FixtureError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, FixtureError::Json(_)));
        assert!(err.to_string().starts_with("fixture is not valid JSON"));
    }
}
