//! Application layer errors

use thiserror::Error;

use crate::domain::duration::DurationParseError;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors.
///
/// The display text is shown to the invoking user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    PermissionDenied(String),
}

impl From<DurationParseError> for CommandError {
    fn from(err: DurationParseError) -> Self {
        CommandError::InvalidArgs(err.to_string())
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_error_is_user_facing() {
        let err: CommandError = DurationParseError::InvalidFormat.into();
        assert_eq!(
            err.to_string(),
            "Invalid time format. Use '10s', '5m', '1h30m', '2d', etc."
        );
    }

    #[test]
    fn test_wrapping() {
        let err: BotError = CommandError::NotFound("spree".to_string()).into();
        assert_eq!(err.to_string(), "Command error: Unknown command: spree");
    }
}
