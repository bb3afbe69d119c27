//! dinemap Query - the remote graph-data endpoint
//!
//! - [`QueryService`]: the async seam every fetch goes through
//! - [`HttpQueryService`]: SPARQL protocol over HTTP (reqwest)
//! - [`SparqlQueries`]: the query texts the dashboard issues
//! - [`ResultSet`]: SPARQL 1.1 JSON results

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod queries;
pub mod results;
pub mod service;

pub use error::{QueryError, QueryResult};
pub use queries::{iri_ref, tag_var, vars, SparqlQueries, DEFAULT_NAMESPACE, TAG_SEPARATOR};
pub use results::{ResultSet, Row, Term, TermKind};
pub use service::{decode_results, HttpQueryService, QueryService, SPARQL_RESULTS_JSON};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
