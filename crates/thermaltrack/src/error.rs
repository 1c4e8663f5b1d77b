//! Error types for thermaltrack.
//!
//! This module defines all error types used throughout the thermaltrack crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for thermaltrack operations.
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

    // === Record Errors ===
    /// A submitted record failed validation; nothing was stored.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// A record with this id already exists in the collection.
    #[error("duplicate id '{id}' in {collection}")]
    DuplicateId {
        /// Collection key.
        collection: &'static str,
        /// The conflicting id.
        id: String,
    },

    /// No record with this id exists in the collection.
    #[error("no record with id '{id}' in {collection}")]
    NotFound {
        /// Collection key.
        collection: &'static str,
        /// The missing id.
        id: String,
    },

    // === Image Errors ===
    /// Reading or encoding an image file failed.
    #[error("failed to decode image {path}: {message}")]
    ImageDecode {
        /// Path of the image file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// The image file type is not supported.
    #[error("unsupported image type for {path}")]
    UnsupportedImage {
        /// Path of the image file.
        path: PathBuf,
    },

    /// The image file exceeds the configured size limit.
    #[error("image {path} is {size} bytes, limit is {limit}")]
    ImageTooLarge {
        /// Path of the image file.
        path: PathBuf,
        /// Actual file size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// A supplied data URL is malformed.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    // === I/O Errors ===
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
}

/// A specialized Result type for thermaltrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error.
    #[must_use]
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Create a new image decode error.
    #[must_use]
    pub fn image_decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ImageDecode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from reading an image.
    #[must_use]
    pub fn is_image_error(&self) -> bool {
        matches!(
            self,
            Self::ImageDecode { .. }
                | Self::UnsupportedImage { .. }
                | Self::ImageTooLarge { .. }
                | Self::InvalidDataUrl(_)
        )
    }
}
