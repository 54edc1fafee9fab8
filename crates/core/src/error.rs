//! Error types for quire operations.
//!
//! This module defines the main error type [`QuireError`] returned by the
//! configuration and resolution entry points, the [`ContentError`] raised by
//! [`ContentSource`](crate::content::ContentSource) implementations, and the
//! [`MetadataError`] produced while cooking raw metadata.
//!
//! # Example
//!
//! ```rust
//! use quire_core::{QuireError, Result, UrlTemplate};
//!
//! fn check(template: &str) -> Result<UrlTemplate> {
//!     if template.is_empty() {
//!         return Err(QuireError::ConfigError("empty template".to_string()));
//!     }
//!     UrlTemplate::parse(template)
//! }
//! # assert!(check("").is_err());
//! ```

use crate::metadata::MetadataField;
use thiserror::Error;

#[cfg(feature = "xml")]
use sxd_xpath::ExecutionError;

/// Main error type for quire operations.
///
/// Configuration problems surface from the compile/build steps before any
/// URL is examined; content and extraction problems surface per file while
/// resolving an archival unit.
#[derive(Error, Debug)]
pub enum QuireError {
    /// Invalid or incomplete configuration.
    ///
    /// Returned for missing AU variables, empty aspects, and unknown
    /// directive values.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed URL template.
    ///
    /// Returned when a template's placeholders disagree with its variable
    /// list, or a substituted value does not fit its conversion.
    #[error("Invalid template '{template}': {reason}")]
    TemplateError { template: String, reason: String },

    /// Regular expression that does not compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    PatternError {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Plugin definition file errors.
    ///
    /// Returned when parsing a plugin directive file fails. The message
    /// carries the offending line number.
    #[error("Plugin configuration error: {0}")]
    PluginConfigError(String),

    /// No metadata schema is registered under the requested id.
    #[error("Unknown metadata schema: {0}")]
    UnknownSchema(String),

    /// A role name that is neither built in nor written as `custom(name)`.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A metadata field key that is not recognised.
    #[error("Unknown metadata field: {0}")]
    UnknownField(String),

    /// Content source failures (missing file, cancelled fetch, I/O).
    #[error(transparent)]
    ContentError(#[from] ContentError),

    /// A source file could not be parsed into raw metadata.
    #[error("Failed to extract metadata from {url}: {reason}")]
    ExtractionError { url: String, reason: String },

    /// XPath evaluation errors.
    ///
    /// This variant is only available when the `xml` feature is enabled.
    #[cfg(feature = "xml")]
    #[error("XPath error: {0}")]
    XPathError(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[cfg(feature = "xml")]
impl From<ExecutionError> for QuireError {
    fn from(err: ExecutionError) -> Self {
        QuireError::XPathError(err.to_string())
    }
}

impl QuireError {
    /// Whether this error came from reading content rather than parsing it.
    ///
    /// Content failures discard the article being resolved; parse failures
    /// only lose the metadata of one file.
    pub fn is_content_failure(&self) -> bool {
        matches!(self, QuireError::ContentError(_))
    }
}

/// Errors raised by a content source while serving one URL.
#[derive(Error, Debug)]
pub enum ContentError {
    /// The URL is not part of the archival unit.
    #[error("No content stored for {0}")]
    NotFound(String),

    /// The fetch backing this URL was cancelled.
    #[error("Fetch cancelled for {0}")]
    Cancelled(String),

    /// Reading the stored content failed.
    #[error("Failed to read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced while writing values into cooked metadata.
///
/// These never abort cooking; they are collected and reported alongside the
/// cooked record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The raw value failed the field's validator.
    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue { field: MetadataField, value: String, reason: String },

    /// A single-valued field already holds a different valid value.
    #[error("{field} already holds '{existing}', ignoring '{value}'")]
    CardinalityError { field: MetadataField, existing: String, value: String },
}

/// Result type alias for QuireError.
///
/// This is a convenience alias for `std::result::Result<T, QuireError>`.
pub type Result<T> = std::result::Result<T, QuireError>;
