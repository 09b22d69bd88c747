use thiserror::Error;

/// Errors returned by observation store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Observation not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),
}

/// Errors that can occur while fetching observations for aggregation
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Observation source responded with status {0}")]
    Status(u16),

    #[error("Failed to decode observations: {0}")]
    Decode(String),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        assert_eq!(
            StoreError::NotFound("abc".to_string()).to_string(),
            "Observation not found: abc"
        );
        assert_eq!(
            StoreError::InvalidState("nope".to_string()).to_string(),
            "nope"
        );
    }

    #[test]
    fn test_fetch_status_message() {
        assert_eq!(
            FetchError::Status(503).to_string(),
            "Observation source responded with status 503"
        );
    }
}
