use std::{io, path::PathBuf};

use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors returned by a log call.
#[derive(Debug, Error)]
pub enum LogError {
    /// Settings are incomplete or rejected. Nothing was written.
    #[error("configuration error: {0}")]
    Config(#[from] SettingsError),

    /// The log directory could not be created.
    #[error("unable to create log directory {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The log directory exists but cannot be written to.
    #[error("log directory {} is not writable", .path.display())]
    NotWritable { path: PathBuf },

    /// Appending the line failed.
    #[error("unable to append to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A named operation that is not one of the log levels.
    #[error("unsupported operation `{0}`")]
    UnsupportedOperation(String),

    /// A pattern placeholder failed under strict formatting.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Errors raised by the settings store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("no storage root configured (set `path` or EASTLOG_PATH)")]
    MissingPath,

    #[error("no application configured (set `application` or EASTLOG_APPLICATION)")]
    MissingApplication,

    #[error("unknown settings key `{0}`")]
    UnknownKey(String),

    #[error("unable to read environment defaults: {0}")]
    Environment(String),
}

/// Errors raised while expanding a pattern placeholder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A date specifier ending in a lone backslash.
    #[error("date format `{0}` ends with a dangling escape")]
    TrailingEscape(String),

    /// A custom pattern callback rejected its parameter.
    #[error("pattern `{kind}` failed: {reason}")]
    Pattern { kind: String, reason: String },
}
