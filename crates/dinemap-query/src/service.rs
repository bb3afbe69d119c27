//! Query service seam and its HTTP implementation

use crate::error::{QueryError, QueryResult};
use crate::results::ResultSet;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use std::sync::Arc;

/// Media type of SPARQL JSON results
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Remote query endpoint
///
/// Accepts query text and returns the tabular result. Implementations do not
/// validate query syntax.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Run a SELECT query
    async fn select(&self, query: &str) -> QueryResult<ResultSet>;
}

#[async_trait]
impl<T: QueryService + ?Sized> QueryService for Arc<T> {
    async fn select(&self, query: &str) -> QueryResult<ResultSet> {
        (**self).select(query).await
    }
}

/// SPARQL protocol client over HTTP
///
/// Posts the query form-encoded. No timeout is configured: a stalled request
/// stays pending until the endpoint answers.
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    client: Client,
    endpoint: Url,
}

impl HttpQueryService {
    /// Create client for an endpoint URL
    pub fn new(endpoint: &str) -> QueryResult<Self> {
        Self::with_client(Client::new(), endpoint)
    }

    /// Create with a preconfigured reqwest client
    pub fn with_client(client: Client, endpoint: &str) -> QueryResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| QueryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { client, endpoint })
    }

    /// Endpoint URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn select(&self, query: &str) -> QueryResult<ResultSet> {
        tracing::debug!(endpoint = %self.endpoint, bytes = query.len(), "issuing query");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            tracing::warn!(status = status.as_u16(), "query rejected by endpoint");
            return Err(QueryError::status(status.as_u16(), &text));
        }

        let results = decode_results(&body)?;
        tracing::debug!(rows = results.len(), "query answered");
        Ok(results)
    }
}

/// Decode a SPARQL JSON results document
pub fn decode_results(body: &[u8]) -> QueryResult<ResultSet> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_endpoint() {
        let err = HttpQueryService::new("not a url").unwrap_err();
        assert!(matches!(err, QueryError::InvalidEndpoint { .. }));
    }

    #[test]
    fn keeps_endpoint() {
        let service =
            HttpQueryService::new("http://127.0.0.1:3030/European_restaurants/query").unwrap();
        assert_eq!(service.endpoint().path(), "/European_restaurants/query");
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(matches!(
            decode_results(b"<html>oops</html>"),
            Err(QueryError::Decode(_))
        ));
    }
}
