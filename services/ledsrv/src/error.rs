//! Error types for the LED bridge service
//!
//! Every failure is local to one display's worker; these types exist so the
//! worker can log precisely what went wrong and decide whether to commit.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Service-level result type
pub type Result<T> = std::result::Result<T, LedSrvError>;

/// Errors raised while turning a value into a device frame
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Custom packet length byte cannot describe the payload
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// `max_chars` does not map onto a writable register block
    #[error("Invalid register count: max_chars {max_chars} needs {count} registers (allowed 1..={max})")]
    InvalidRegisterCount {
        max_chars: usize,
        count: usize,
        max: usize,
    },

    /// Character outside the repertoire of the protocol
    #[error("Unsupported character {ch:?} at position {position} for {protocol}")]
    UnsupportedCharacter {
        ch: char,
        position: usize,
        protocol: &'static str,
    },
}

/// Errors raised while delivering a frame to a display controller
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// TCP connect refused or failed
    #[error("Connection to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    /// Connect, write or read exceeded the configured timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Socket read/write error after connecting
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed or mismatched protocol response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Device answered with a Modbus exception
    #[error("Modbus exception response: FC={function_code:02X} code={code:02X}")]
    Exception { function_code: u8, code: u8 },
}

impl TransportError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        TransportError::Protocol(msg.into())
    }
}

/// Errors raised by the data source
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// Pool could not be created or a connection could not be acquired
    #[error("Data source connection error: {0}")]
    Connection(String),

    /// The query itself failed
    #[error("Query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for DataSourceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DataSourceError::Connection(err.to_string())
            },
            sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => {
                DataSourceError::Connection(err.to_string())
            },
            other => DataSourceError::Query(other.to_string()),
        }
    }
}

/// Display definition that cannot be used as-is
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A field is outside its allowed range or malformed
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// A registry record could not be parsed at all
    #[error("Malformed display record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the display registry store
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry document is not valid: {0}")]
    Parse(String),

    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("Registry is full: at most {max} displays")]
    CapacityExceeded { max: usize },

    #[error("Display already exists: {0}")]
    Duplicate(String),

    #[error("Display not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Parse(err.to_string())
    }
}

/// Top-level service error
#[derive(Debug, Error)]
pub enum LedSrvError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Common(#[from] common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Admin API error, rendered as `{"error": message, "status": code}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Invalid(_) | RegistryError::CapacityExceeded { .. } => {
                ApiError::BadRequest(err.to_string())
            },
            RegistryError::Duplicate(_) => ApiError::Conflict(err.to_string()),
            RegistryError::NotFound(_) => ApiError::NotFound(err.to_string()),
            RegistryError::Io(_) | RegistryError::Parse(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Internal(msg) => {
                tracing::error!("Admin API internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Registry unavailable".to_string(),
                )
            },
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
