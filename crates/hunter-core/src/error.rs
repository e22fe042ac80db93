//! Core error types for hunter-core.
//!
//! This module defines the error hierarchy using thiserror. Every failure in
//! the library degrades to one of these values; nothing here is fatal to the
//! process.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hunter-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Daily quest errors
    #[error("Quest error: {0}")]
    Quest(#[from] QuestError),

    /// Account errors
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Progress errors
    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// A required field was left empty
    #[error("Missing value for '{0}'")]
    Missing(String),

    /// A field expected a positive finite number
    #[error("Invalid numeric value for '{field}': {value:?}")]
    NotNumeric { field: String, value: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Daily quest errors.
#[derive(Error, Debug, PartialEq)]
pub enum QuestError {
    /// No quest with this id belongs to the user
    #[error("Quest not found: {0}")]
    NotFound(String),

    /// The quest was already completed
    #[error("Quest already completed: {0}")]
    AlreadyCompleted(String),

    /// A rest timer is still counting down
    #[error("Resting: {remaining_secs}s left before the next quest can be completed")]
    RestActive { remaining_secs: u64 },

    /// No user is signed in
    #[error("Not signed in")]
    NotSignedIn,
}

/// Account errors.
#[derive(Error, Debug, PartialEq)]
pub enum AccountError {
    /// Email already registered
    #[error("This email is already in use.")]
    EmailInUse,

    /// Email/password pair rejected
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Password below the minimum length
    #[error("Password must be at least {min} characters.")]
    PasswordTooShort { min: usize },

    /// One or more profile fields missing
    #[error("Please complete all profile fields.")]
    IncompleteProfile,
}

/// Progress errors.
#[derive(Error, Debug, PartialEq)]
pub enum ProgressError {
    /// No points left to spend
    #[error("You have no available points to upgrade.")]
    NoPoints,

    /// Unknown stat name
    #[error("Unknown stat: {0}")]
    UnknownStat(String),

    /// No user record
    #[error("User not found: {0}")]
    UserNotFound(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_active_message_includes_seconds() {
        let err = QuestError::RestActive { remaining_secs: 12 };
        assert!(err.to_string().contains("12s"));
    }

    #[test]
    fn rusqlite_error_maps_to_query_failed() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }

    #[test]
    fn nested_errors_convert_to_core() {
        let err: CoreError = ProgressError::NoPoints.into();
        assert!(matches!(err, CoreError::Progress(ProgressError::NoPoints)));
    }
}
