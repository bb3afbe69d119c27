//! dinemap Engine - filtering and presentation
//!
//! Drives the map dashboard:
//! - [`RecordStore`]: every record, loaded once, in stable order
//! - [`TagLoader`]: lazy multi-valued attributes with at most one fetch in flight
//! - [`Dashboard`]: render passes, filter and viewport events, marker details
//! - Statistics panels and selector option lists
//!
//! Presentation goes through the [`MapSurface`], [`ChartRenderer`] and
//! [`FilterControls`] traits; data comes from a
//! [`QueryService`](dinemap_query::QueryService).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod charts;
pub mod dashboard;
pub mod error;
pub mod marker;
pub mod options;
pub mod render;
pub mod stats;
pub mod store;
pub mod surface;
pub mod tags;

pub use charts::{
    reviews_chart, scores_chart, Bar, BarChart, ChartScale, ChartSlot, ChartTarget, DetailSurface,
    StatPanel,
};
pub use dashboard::{Dashboard, FetchReport, FilterOutcome, StartupReport, Surfaces};
pub use error::{EngineError, EngineResult};
pub use marker::{ChartRegions, DetailContent, Marker, MarkerId, MarkerLayer, MarkerPlacement};
pub use options::{load_options, options_from_results, options_from_values};
pub use render::{plan_markers, RenderSummary};
pub use stats::{load_panel, panel_chart, panel_query, rating_chart, top_n_chart};
pub use store::{record_from_row, LoadReport, MergeReport, RecordStore, SkippedRow};
pub use surface::{ChartRenderer, FilterControls, MapSurface, SelectOption};
pub use tags::{split_tag_list, tags_from_row, TagLoad, TagLoader, TagReport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a dashboard
    pub use crate::{
        ChartRenderer, ChartTarget, Dashboard, FilterControls, FilterOutcome, MapSurface,
        MarkerId, RecordStore, Surfaces,
    };
    pub use dinemap_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
