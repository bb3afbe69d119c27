//! Error types for the dashboard engine

use dinemap_core::RecordError;
use dinemap_query::QueryError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Fetch failed
    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    /// Row could not be turned into a typed value
    #[error("malformed row: {0}")]
    Record(#[from] RecordError),

    /// Record row rejected under the abort policy
    #[error("malformed record row {row}: {source}")]
    MalformedRow {
        /// Zero-based row index in the response
        row: usize,
        #[source]
        source: RecordError,
    },

    /// The record store was already loaded this session
    #[error("record store already loaded")]
    AlreadyLoaded,
}

impl EngineError {
    /// Whether the error came from the remote service rather than the data
    #[inline]
    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_errors_are_fetch_failures() {
        let err: EngineError = QueryError::Unavailable("down".into()).into();
        assert!(err.is_fetch_failure());

        let err: EngineError = RecordError::missing("lat", None).into();
        assert!(!err.is_fetch_failure());
    }

    #[test]
    fn malformed_row_display() {
        let err = EngineError::MalformedRow {
            row: 3,
            source: RecordError::missing("city", Some("urn:r")),
        };
        assert_eq!(
            err.to_string(),
            "malformed record row 3: missing required field 'city' for urn:r"
        );
    }
}
