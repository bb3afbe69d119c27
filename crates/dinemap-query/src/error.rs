//! Error types for the query layer

/// Errors issuing a query or decoding its result
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Transport-level failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Leading part of the response body
        body: String,
    },

    /// Response body is not a SPARQL JSON result set
    #[error("malformed result set: {0}")]
    Decode(#[from] serde_json::Error),

    /// Identifier cannot be embedded as an IRI reference
    #[error("identifier is not a valid IRI reference: '{0}'")]
    InvalidIri(String),

    /// Endpoint URL rejected
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Configured endpoint
        endpoint: String,
        /// Parser message
        reason: String,
    },

    /// Service unavailable for a reason outside HTTP
    #[error("query service unavailable: {0}")]
    Unavailable(String),
}

impl QueryError {
    /// Create status error, truncating the body for display
    pub fn status(status: u16, body: &str) -> Self {
        const MAX_BODY: usize = 512;
        let body = match body.char_indices().nth(MAX_BODY) {
            Some((cut, _)) => format!("{}…", &body[..cut]),
            None => body.to_string(),
        };
        Self::Status { status, body }
    }
}

/// Result alias for query operations
pub type QueryResult<T> = Result<T, QueryError>;
