use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SharedError {
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<config::ConfigError> for SharedError {
    fn from(err: config::ConfigError) -> Self {
        SharedError::ConfigurationError(err.to_string())
    }
}
