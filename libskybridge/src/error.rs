//! Error types for Skybridge

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BridgeError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BridgeError::InvalidInput(_) => 3,
            BridgeError::Platform(PlatformError::Authentication(_)) => 2,
            BridgeError::Platform(_) => 1,
            BridgeError::Config(_) => 1,
            BridgeError::Database(_) => 1,
        }
    }

    /// True for failures that are expected to clear on a later tick
    /// (network trouble, upstream rate limiting). The poll loop retries
    /// these automatically by doing nothing special at all.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::Platform(PlatformError::Network(_))
                | BridgeError::Platform(PlatformError::RateLimit(_))
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = BridgeError::InvalidInput("Empty account handle".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let platform_error = PlatformError::Authentication("Bad app password".to_string());
        let error = BridgeError::Platform(platform_error);
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_errors() {
        let posting = BridgeError::Platform(PlatformError::Posting("timeout".to_string()));
        assert_eq!(posting.exit_code(), 1);

        let config = BridgeError::Config(ConfigError::MissingField("x.api_key".to_string()));
        assert_eq!(config.exit_code(), 1);

        let db = BridgeError::Database(DbError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        )));
        assert_eq!(db.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting() {
        let error = BridgeError::Platform(PlatformError::Authentication(
            "Bluesky login failed".to_string(),
        ));
        assert_eq!(
            format!("{}", error),
            "Platform error: Authentication failed: Bluesky login failed"
        );

        let error = BridgeError::Config(ConfigError::MissingField("database.path".to_string()));
        assert_eq!(
            format!("{}", error),
            "Configuration error: Missing required field: database.path"
        );
    }

    #[test]
    fn test_error_conversions() {
        let config_error = ConfigError::MissingField("bluesky.handle".to_string());
        let error: BridgeError = config_error.into();
        assert!(matches!(error, BridgeError::Config(_)));

        let platform_error = PlatformError::Posting("rejected".to_string());
        let error: BridgeError = platform_error.into();
        assert!(matches!(error, BridgeError::Platform(_)));
    }

    #[test]
    fn test_transient_classification() {
        let network = BridgeError::Platform(PlatformError::Network("reset".to_string()));
        assert!(network.is_transient());

        let rate_limit = BridgeError::Platform(PlatformError::RateLimit("429".to_string()));
        assert!(rate_limit.is_transient());

        let auth = BridgeError::Platform(PlatformError::Authentication("nope".to_string()));
        assert!(!auth.is_transient());

        let invalid = BridgeError::InvalidInput("bad".to_string());
        assert!(!invalid.is_transient());
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::Network("Connection failed".to_string());
        let cloned = original.clone();
        assert_eq!(format!("{}", original), format!("{}", cloned));
    }
}
