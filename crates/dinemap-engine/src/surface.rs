//! Presentation collaborators
//!
//! The engine draws through these traits and never touches a concrete map,
//! chart library, or form.

use crate::charts::{BarChart, ChartTarget};
use crate::marker::Marker;
use dinemap_core::{Bounds, CategoryField, FilterConfig};
use serde::Serialize;

/// One entry of a selector's option list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Value written into the filter configuration
    pub value: String,
    /// Text shown to the user
    pub label: String,
}

impl SelectOption {
    /// Option whose label is its value
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }

    /// Leading "ALL" option
    #[must_use]
    pub fn all() -> Self {
        Self {
            value: dinemap_core::ALL_SENTINEL.to_string(),
            label: "All".to_string(),
        }
    }
}

/// Base map with a marker layer
pub trait MapSurface: Send + Sync {
    /// Current viewport
    fn bounds(&self) -> Bounds;

    /// Remove every marker
    fn clear_markers(&self);

    /// Add one marker
    fn place_marker(&self, marker: &Marker);
}

/// Bar chart drawing primitive
pub trait ChartRenderer: Send + Sync {
    /// Draw `chart` into `target`, replacing whatever was there
    fn draw(&self, target: ChartTarget, chart: &BarChart);
}

/// Filter form
pub trait FilterControls: Send + Sync {
    /// Live configuration
    fn current(&self) -> FilterConfig;

    /// Overwrite every control
    fn apply(&self, config: &FilterConfig);

    /// Replace a selector's option list
    fn set_options(&self, field: CategoryField, options: &[SelectOption]) {
        let _ = (field, options);
    }
}
