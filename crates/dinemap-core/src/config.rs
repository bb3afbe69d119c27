//! Dashboard configuration
//!
//! Builder-style struct with serde support; loadable from TOML.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default SPARQL endpoint
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3030/European_restaurants/query";

/// What to do with a row missing a required field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Drop the row, log it and count it
    #[default]
    Skip,
    /// Fail the whole load
    Abort,
}

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// SPARQL query endpoint URL
    pub endpoint: String,
    /// Named graph to query, if any
    pub named_graph: Option<String>,
    /// Row limit of the initial record query
    pub record_limit: usize,
    /// Maximum identifiers embedded in one tag batch query
    pub tag_batch_size: usize,
    /// Handling of malformed record rows
    pub malformed_rows: MalformedRowPolicy,
    /// Marker circle radius in meters
    pub marker_radius_m: f64,
    /// Bars in the top-cuisines panel
    pub top_cuisines: usize,
    /// Bars in the top-meals panel
    pub top_meals: usize,
}

impl DashboardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With named graph
    #[must_use]
    pub fn with_named_graph(mut self, graph: impl Into<String>) -> Self {
        self.named_graph = Some(graph.into());
        self
    }

    /// With tag batch size
    #[inline]
    #[must_use]
    pub fn with_tag_batch_size(mut self, size: usize) -> Self {
        self.tag_batch_size = size;
        self
    }

    /// With record limit
    #[inline]
    #[must_use]
    pub fn with_record_limit(mut self, limit: usize) -> Self {
        self.record_limit = limit;
        self
    }

    /// With malformed-row policy
    #[inline]
    #[must_use]
    pub fn with_malformed_rows(mut self, policy: MalformedRowPolicy) -> Self {
        self.malformed_rows = policy;
        self
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.record_limit == 0 {
            return Err(ConfigError::Invalid("record_limit must be positive".into()));
        }
        if self.tag_batch_size == 0 {
            return Err(ConfigError::Invalid("tag_batch_size must be positive".into()));
        }
        if !(self.marker_radius_m.is_finite() && self.marker_radius_m > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "marker_radius_m must be positive, got {}",
                self.marker_radius_m
            )));
        }
        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            named_graph: None,
            record_limit: 5000,
            tag_batch_size: 5000,
            malformed_rows: MalformedRowPolicy::Skip,
            marker_radius_m: 500.0,
            top_cuisines: 15,
            top_meals: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.record_limit, 5000);
        assert_eq!(config.top_cuisines, 15);
        assert_eq!(config.top_meals, 10);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
            endpoint = "http://example.org/sparql"
            malformed_rows = "abort"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "http://example.org/sparql");
        assert_eq!(config.malformed_rows, MalformedRowPolicy::Abort);
        assert_eq!(config.tag_batch_size, 5000);
    }

    #[test]
    fn rejects_zero_batch_size() {
        let err = DashboardConfig::from_toml_str("tag_batch_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = DashboardConfig::from_toml_str(r#"malformed_rows = "ignore""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "named_graph = \"http://ltr.european-restaurants.org\"").unwrap();

        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(
            config.named_graph.as_deref(),
            Some("http://ltr.european-restaurants.org")
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let err = DashboardConfig::load("/nonexistent/dinemap.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
