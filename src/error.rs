//! Custom error types for formprobe
//!
//! Probe-level failures are absorbed inside the engine; these types surface
//! only where a caller has to decide (startup, configuration, client setup).

use thiserror::Error;

/// Main error type for formprobe operations
#[derive(Error, Debug)]
pub enum FormprobeError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Scanner errors
    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingField(String),
}

/// HTTP client errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Scanner errors
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Field '{field}' is not part of form '{action}'")]
    FieldNotInForm { field: String, action: String },

    #[error("Worker pool is closed")]
    PoolClosed,

    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),
}

impl FormprobeError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FormprobeError::Config(e) => format!("Configuration problem: {}", e.user_hint()),
            FormprobeError::Http(e) => format!("Network issue: {}", e.user_hint()),
            FormprobeError::Scanner(e) => format!("Scanner issue: {}", e.user_hint()),
            FormprobeError::Io(e) => format!("File system issue: {}", e),
        }
    }
}

/// Trait for providing user-friendly hints
pub trait UserHint {
    fn user_hint(&self) -> String;
}

impl UserHint for ConfigError {
    fn user_hint(&self) -> String {
        match self {
            ConfigError::ReadError { path, .. } => {
                format!("Could not read '{}'. Check if the file exists and you have read permissions.", path)
            }
            ConfigError::ParseError(_) => {
                "The configuration file has invalid syntax. Check for TOML formatting errors.".into()
            }
            ConfigError::ValidationError { field, reason } => {
                format!("Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingField(field) if field.starts_with("login.") => {
                format!("Required setting '{}' is missing. Login mode needs every login field.", field)
            }
            ConfigError::MissingField(field) => format!("Required setting '{}' is missing.", field),
        }
    }
}

impl UserHint for HttpError {
    fn user_hint(&self) -> String {
        match self {
            HttpError::Timeout(ms) => {
                format!("Request timed out after {}ms. The server may be slow or unresponsive.", ms)
            }
            HttpError::InvalidUrl(url) => {
                format!("'{}' is not a valid URL. Check the format.", url)
            }
            _ => self.to_string(),
        }
    }
}

impl UserHint for ScannerError {
    fn user_hint(&self) -> String {
        match self {
            ScannerError::LoginFailed(reason) => {
                format!("Could not log in before scanning: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}
