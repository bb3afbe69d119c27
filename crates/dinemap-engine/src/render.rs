//! Render pass planning

use crate::marker::Marker;
use crate::store::RecordStore;
use dinemap_core::{matches, Bounds, FilterConfig};
use serde::Serialize;
use std::sync::Arc;

/// Result of one render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    /// Render pass number, starting at 1
    pub pass: u64,
    /// Markers placed
    pub visible: usize,
    /// Records evaluated
    pub total: usize,
}

/// Markers for every record passing `config`, in store order
///
/// `viewport` is only consulted when `config.in_view` is set.
#[must_use]
pub fn plan_markers(
    store: &RecordStore,
    config: &FilterConfig,
    viewport: Option<&Bounds>,
    radius_m: f64,
) -> Vec<Arc<Marker>> {
    store
        .iter_indexed()
        .filter(|(_, record)| matches(record, config, viewport))
        .map(|(index, record)| Arc::new(Marker::for_record(index, record, radius_m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerId;
    use dinemap_core::{CategoryField, LatLon, Record};

    fn store() -> RecordStore {
        let at = |lat, lon| LatLon::new(lat, lon).unwrap();
        RecordStore::from_records([
            Record::new("urn:a", "A", "-", at(45.0, 9.0))
                .with_rating(4.6)
                .with_place("Italy", "Milan"),
            Record::new("urn:b", "B", "-", at(48.8, 2.3))
                .with_rating(3.0)
                .with_place("France", "Paris"),
            Record::new("urn:c", "C", "-", at(45.4, 9.2))
                .with_rating(2.0)
                .with_place("Italy", "Milan"),
        ])
        .unwrap()
    }

    fn ids(markers: &[Arc<Marker>]) -> Vec<MarkerId> {
        markers.iter().map(|m| m.id()).collect()
    }

    #[test]
    fn marker_ids_are_store_positions() {
        let config = FilterConfig::new().with_selector(CategoryField::Country, "Italy");
        let markers = plan_markers(&store(), &config, None, 500.0);
        assert_eq!(ids(&markers), vec![MarkerId(0), MarkerId(2)]);
        assert_eq!(markers[1].color(), "#D2042D");
    }

    #[test]
    fn same_inputs_plan_same_markers() {
        let store = store();
        let config = FilterConfig::new().with_min_rating(2.5);
        let first = plan_markers(&store, &config, None, 500.0);
        let second = plan_markers(&store, &config, None, 500.0);

        let placements = |m: &[Arc<Marker>]| m.iter().map(|m| m.placement()).collect::<Vec<_>>();
        assert_eq!(placements(&first), placements(&second));
    }

    #[test]
    fn viewport_applies_only_when_enabled() {
        let store = store();
        let paris = Bounds::from_corners(
            LatLon::new(48.0, 2.0).unwrap(),
            LatLon::new(49.0, 3.0).unwrap(),
        );

        let off = plan_markers(&store, &FilterConfig::new(), Some(&paris), 500.0);
        assert_eq!(off.len(), 3);

        let on = plan_markers(&store, &FilterConfig::new().with_in_view(true), Some(&paris), 500.0);
        assert_eq!(ids(&on), vec![MarkerId(1)]);
    }
}
