//! Error types for preflight.
//!
//! This module defines all error types used throughout the preflight crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::checklist::ItemKind;

/// The main error type for preflight operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The key-value store could not serve a request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Checklist and Mission Errors ===
    /// Two checklist items share an identifier.
    #[error("duplicate checklist item id '{id}'")]
    DuplicateItem {
        /// The repeated identifier.
        id: String,
    },

    /// Only toggle items may carry sub-fields.
    #[error("checklist item '{id}' has sub-fields but is not a toggle")]
    MisplacedSubFields {
        /// The offending item identifier.
        id: String,
    },

    /// The item id is not part of the checklist.
    #[error("unknown checklist item '{id}'")]
    UnknownItem {
        /// The identifier that was not found.
        id: String,
    },

    /// The sub-field does not belong to the given item.
    #[error("checklist item '{item}' has no sub-field '{subfield}'")]
    UnknownSubField {
        /// The parent item identifier.
        item: String,
        /// The sub-field identifier that was not found.
        subfield: String,
    },

    /// The item exists but is not answered that way.
    #[error("checklist item '{id}' is a {kind} item")]
    WrongItemKind {
        /// The item identifier.
        id: String,
        /// The item's actual kind.
        kind: ItemKind,
    },

    /// A numeric sub-field was given something that is not a number.
    #[error("sub-field '{item}.{subfield}' expects a number, got '{value}'")]
    InvalidSubFieldValue {
        /// The parent item identifier.
        item: String,
        /// The sub-field identifier.
        subfield: String,
        /// The rejected input.
        value: String,
    },

    /// Identity fields required to save a mission are blank.
    #[error("please fill in {}", .fields.join(", "))]
    MissingIdentity {
        /// Human-readable names of the blank fields.
        fields: Vec<&'static str>,
    },

    /// Required checklist items are still open.
    #[error("required checklist items incomplete: {satisfied}/{total} ({percentage}%)")]
    ChecklistIncomplete {
        /// Number of required items satisfied.
        satisfied: usize,
        /// Number of required items in the checklist.
        total: usize,
        /// Rounded completion percentage.
        percentage: u8,
    },

    /// No aircraft profile carries the given id.
    #[error("unknown aircraft profile '{id}'")]
    UnknownProfile {
        /// The identifier that was not found.
        id: String,
    },

    /// No saved mission carries the given number.
    #[error("no saved mission numbered '{number}'")]
    MissionNotFound {
        /// The mission number that was requested.
        number: String,
    },

    // === Weather Errors ===
    /// The current position could not be determined.
    #[error("location unavailable: {0}")]
    GeolocationUnavailable(String),

    /// A coordinate is outside the valid range.
    #[error("invalid coordinate {latitude},{longitude}")]
    InvalidCoordinate {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },

    /// A weather fetch is already in progress.
    #[error("a weather fetch is already in progress")]
    WeatherBusy,

    /// The forecast service answered with a non-success status.
    #[error("weather service returned {status}: {message}")]
    WeatherHttp {
        /// The HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The forecast service could not be reached.
    #[error("weather service unreachable: {0}")]
    WeatherNetwork(String),

    /// The forecast response did not have the expected shape.
    #[error("malformed weather response: {0}")]
    WeatherMalformed(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },
}

/// A specialized Result type for preflight operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::WeatherHttp {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            Self::WeatherMalformed(err.to_string())
        } else {
            Self::WeatherNetwork(err.to_string())
        }
    }
}

impl Error {
    /// Create a new storage-unavailable error.
    #[must_use]
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    /// Create an unknown-item error.
    #[must_use]
    pub fn unknown_item(id: impl Into<String>) -> Self {
        Self::UnknownItem { id: id.into() }
    }

    /// Create an unknown-profile error.
    #[must_use]
    pub fn unknown_profile(id: impl Into<String>) -> Self {
        Self::UnknownProfile { id: id.into() }
    }

    /// Create a malformed-weather-response error.
    #[must_use]
    pub fn weather_malformed(message: impl Into<String>) -> Self {
        Self::WeatherMalformed(message.into())
    }

    /// Check if this error rejected a mission save.
    ///
    /// Rejected saves leave the draft untouched and can be retried once the
    /// form is completed.
    #[must_use]
    pub fn is_save_rejected(&self) -> bool {
        matches!(
            self,
            Self::MissingIdentity { .. } | Self::ChecklistIncomplete { .. }
        )
    }

    /// Check if this error came from the weather lookup path.
    #[must_use]
    pub fn is_weather_error(&self) -> bool {
        matches!(
            self,
            Self::GeolocationUnavailable(_)
                | Self::InvalidCoordinate { .. }
                | Self::WeatherBusy
                | Self::WeatherHttp { .. }
                | Self::WeatherNetwork(_)
                | Self::WeatherMalformed(_)
                | Self::Timeout { .. }
        )
    }
}
