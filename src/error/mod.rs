//! Error handling for the ETL pipeline.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// IO error tied to a specific path
    #[error("IO error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error encoding or decoding Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The selected data profile has no section in the configuration
    #[error("Profile '{0}' is not defined in the configuration")]
    MissingProfile(String),

    /// A batch does not have the expected shape
    #[error("Schema error: {0}")]
    Schema(String),

    /// A filter expression could not be evaluated
    #[error("Filter error: {0}")]
    Filter(String),

    /// The storage location uses a scheme no backend serves
    #[error("Unsupported storage location: {0}")]
    UnsupportedStorage(String),

    /// A remote storage location was configured without credentials
    #[error("Storage location {0} requires credentials")]
    MissingCredentials(String),

    /// An input glob matched nothing
    #[error("No input files matched '{pattern}' under {root}")]
    NoInputFiles { pattern: String, root: PathBuf },

    /// A table destination exists and the write mode forbids replacing it
    #[error("Table output already exists: {0}")]
    TableExists(PathBuf),
}

impl EtlError {
    /// Create a schema error from any message
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a configuration error from any message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a filter error from any message
    pub fn filter(message: impl Into<String>) -> Self {
        Self::Filter(message.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, EtlError>;
