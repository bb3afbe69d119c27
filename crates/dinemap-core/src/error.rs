//! Error types for dinemap core
//!
//! Provides error handling for:
//! - Record construction from raw query bindings
//! - Dashboard configuration loading

use std::path::PathBuf;

/// Errors building a record (or any other typed row) from raw bindings
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// Required binding absent from the row
    #[error("missing required field '{field}'{}", uri_suffix(.uri))]
    MissingField {
        /// Variable name of the missing binding
        field: &'static str,
        /// Record identifier, when the row had one
        uri: Option<String>,
    },

    /// Binding present but not parseable as the expected number
    #[error("field '{field}' is not a valid number: '{value}'")]
    InvalidNumber {
        /// Variable name of the binding
        field: &'static str,
        /// Raw textual value
        value: String,
    },

    /// Coordinate outside the valid latitude/longitude range
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate {
        /// Latitude
        lat: f64,
        /// Longitude
        lon: f64,
    },

    /// Score outside the 0..=5 range
    #[error("score '{field}' out of range: {value}")]
    ScoreOutOfRange {
        /// Score axis name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Record identifier already present in the store
    #[error("duplicate record identifier: {0}")]
    DuplicateId(String),
}

fn uri_suffix(uri: &Option<String>) -> String {
    uri.as_ref().map(|u| format!(" for {u}")).unwrap_or_default()
}

impl RecordError {
    /// Create missing-field error
    pub fn missing(field: &'static str, uri: Option<&str>) -> Self {
        Self::MissingField {
            field,
            uri: uri.map(str::to_string),
        }
    }

    /// Create invalid-number error
    pub fn invalid_number(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            field,
            value: value.into(),
        }
    }
}

/// Errors loading dashboard configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the configuration file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value rejected by validation
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for record construction
pub type RecordResult<T> = Result<T, RecordError>;
