use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Caller-visible authentication failures.
///
/// These are the only errors a login caller is expected to branch on; audit
/// and configuration failures degrade to warnings or defaults before they
/// reach this layer.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Account blocked until {until}")]
    Blocked { until: DateTime<Utc> },

    #[error("Persistence selection failed: {0}")]
    PersistenceSelectionFailed(String),

    #[error("Credential verification failed: {0}")]
    VerificationFailed(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parameter source unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// The block expiry, when this error denies a login because of an active
    /// block window. Lets a client render "retry after <time>" without
    /// pattern-matching the whole taxonomy.
    pub fn blocked_until(&self) -> Option<DateTime<Utc>> {
        match self {
            Error::Auth(AuthError::Blocked { until }) => Some(*until),
            _ => None,
        }
    }
}
