//! Error types and handling for address discovery.
//!
//! Most discovery failures are absorbed where they happen and show up as
//! fewer addresses. The types here cover what is left: an unsupported
//! platform, configuration problems, malformed keys and I/O at the edges.

use thiserror::Error;

/// Result type alias for the addrscout library
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Top-level error type for all addrscout operations
#[derive(Error, Debug, Clone)]
pub enum ScoutError {
    /// Platform lookup errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Configuration and I/O errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Key parsing and encoding errors
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A blocking discovery task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),

    /// Generic error for unexpected conditions
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Platform table errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The running operating system has no entry in the platform table
    #[error("Unsupported platform: {platform}")]
    Unsupported { platform: String },
}

/// Configuration and setup errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Missing required configuration
    #[error("Missing configuration: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration parsing error
    #[error("Configuration parse error: {reason}")]
    ParseError { reason: String },

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Node key errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key string does not start with the expected prefix
    #[error("Invalid key prefix: expected {expected}")]
    InvalidPrefix { expected: &'static str },

    /// The key body is not valid hex
    #[error("Invalid key encoding: {reason}")]
    InvalidEncoding { reason: String },

    /// The decoded key has the wrong size
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl ScoutError {
    /// Creates a new unexpected error with a custom message
    pub fn unexpected<S: Into<String>>(msg: S) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Returns true if this error means the host platform is not in the
    /// platform table
    pub fn is_unsupported_platform(&self) -> bool {
        matches!(self, Self::Platform(PlatformError::Unsupported { .. }))
    }
}

impl From<std::io::Error> for ScoutError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ScoutError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

impl From<hex::FromHexError> for ScoutError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Key(KeyError::InvalidEncoding {
            reason: err.to_string(),
        })
    }
}
