// src/error.rs

//! Error types shared by every poolkeeper module

use thiserror::Error;

/// Errors raised while parsing, validating or analyzing archive metadata
#[derive(Error, Debug)]
pub enum Error {
    /// One or more lines of a control record could not be parsed
    #[error("Unparseable control record lines:\n{}", .lines.join("\n"))]
    Format { lines: Vec<String> },

    /// The payload contained no lines at all
    #[error("Empty control record")]
    EmptyRecord,

    /// Strict (source descriptor) parsing hit a misplaced blank line
    #[error("Invalid source descriptor: unexpected blank line at line {line}")]
    InvalidDsc { line: usize },

    /// Mandatory upload manifest fields are absent
    #[error("Missing mandatory field(s) in changes file: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The record has no file list under the requested field
    #[error("No '{0}' field in control record")]
    NoFilesField(String),

    /// A file list line had the wrong number of tokens
    #[error("Malformed file list line: '{0}'")]
    FileList(String),

    /// The Format field of an upload manifest is not `major.minor`
    #[error("Unknown changes format '{0}'")]
    UnknownChangesFormat(String),

    /// The Format field is well formed but outside the supported range
    #[error("Unsupported changes format '{format}' for field '{field}'")]
    UnsupportedChangesFormat { format: String, field: String },

    /// A dependency field could not be parsed
    #[error("Cannot parse dependency '{text}': {reason}")]
    Dependency { text: String, reason: String },

    /// A package version string is malformed
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// Signature verification failed or was impossible
    #[error("Signature verification failed: {0}")]
    Verification(String),

    /// Requested suite, architecture or package does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration file is unreadable or contains invalid values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Control record payload is not valid UTF-8
    #[error("Control record is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// SQLite error from the metadata store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, Error>;
