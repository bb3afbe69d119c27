//! dinemap Core - restaurant records and filtering
//!
//! The pure part of the dashboard:
//! - Record model with lazily loaded tag attributes
//! - Filter configuration and the filter predicate
//! - Rating buckets, coordinates and viewport bounds
//! - Dashboard configuration
//!
//! # Example
//!
//! ```rust
//! use dinemap_core::{matches, CategoryField, FilterConfig, LatLon, Record};
//!
//! let record = Record::new("urn:r1", "Da Mario", "Via Roma 1", LatLon::new(45.4, 9.2).unwrap())
//!     .with_rating(4.2)
//!     .with_place("Italy", "Milan");
//!
//! let config = FilterConfig::new()
//!     .with_min_rating(4.0)
//!     .with_selector(CategoryField::City, "Milan");
//!
//! assert!(matches(&record, &config, None));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod rating;
pub mod record;

pub use config::{DashboardConfig, MalformedRowPolicy, DEFAULT_ENDPOINT};
pub use error::{ConfigError, RecordError, RecordResult};
pub use filter::{matches, CategoryField, FilterConfig, Selector, ALL_SENTINEL};
pub use geo::{Bounds, LatLon};
pub use rating::RatingBucket;
pub use record::{
    DietaryFlags, LazyAttribute, Record, RecordId, ReviewCounts, ScoreBreakdown, TagSet,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with dinemap records
    pub use crate::{
        matches, Bounds, CategoryField, DashboardConfig, FilterConfig, LatLon, LazyAttribute,
        RatingBucket, Record, RecordId, Selector, TagSet,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
