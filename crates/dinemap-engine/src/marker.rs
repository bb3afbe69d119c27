//! Map markers and their detail surfaces
//!
//! A [`Marker`] is built for every record that passes the filter. It owns the
//! text shown in its tooltip and popup, and the typed chart regions inside
//! them. Chart data is computed the first time a surface opens.

use crate::charts::{reviews_chart, scores_chart, BarChart, ChartSlot, ChartTarget, DetailSurface};
use crate::surface::ChartRenderer;
use dinemap_core::{LatLon, RatingBucket, Record, RecordId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Marker identity: the record's position in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MarkerId(pub usize);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

/// Text content of a tooltip or popup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailContent {
    pub name: String,
    pub address: String,
    pub avg_rating: f64,
    /// Present only when non-empty
    pub keywords: Option<String>,
    /// Present only when non-empty
    pub open_hours: Option<String>,
    /// Cross-reference link, present only for chains
    pub wikidata: Option<String>,
}

impl DetailContent {
    /// Build content for a record
    #[must_use]
    pub fn for_record(record: &Record) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        Self {
            name: record.name.clone(),
            address: record.address.clone(),
            avg_rating: record.avg_rating,
            keywords: non_empty(&record.keywords),
            open_hours: non_empty(&record.open_hours),
            wikidata: record
                .same_as
                .as_ref()
                .filter(|_| record.is_chain())
                .cloned(),
        }
    }

    /// Render as an HTML fragment with one empty container per chart slot
    #[must_use]
    pub fn to_html(&self, marker: MarkerId, surface: DetailSurface) -> String {
        let mut html = format!(
            "<div class=\"rt-tip\"><div class=\"name\">{}</div>\
             <div class=\"addr\">Address: {}</div>\
             <div class=\"meta\">Average Rating: {}</div>",
            escape(&self.name),
            escape(&self.address),
            self.avg_rating
        );
        if let Some(keywords) = &self.keywords {
            html.push_str(&format!(
                "<div class=\"meta\">Keywords: {}</div>",
                escape(keywords)
            ));
        }
        if let Some(hours) = &self.open_hours {
            html.push_str(&format!(
                "<div class=\"meta\">Opening Hours: {}</div>",
                escape(hours)
            ));
        }
        if let Some(link) = &self.wikidata {
            let link = escape(link);
            html.push_str(&format!(
                "<div class=\"meta\">Wikidata: <a href=\"{link}\" target=\"_blank\">{link}</a></div>"
            ));
        }
        for slot in [ChartSlot::Reviews, ChartSlot::Scores] {
            html.push_str(&format!(
                "<div class=\"chartTitle\">{}</div><div data-marker=\"{}\" data-surface=\"{}\" data-slot=\"{}\"></div>",
                slot.title(),
                marker.0,
                surface_name(surface),
                slot_name(slot),
            ));
        }
        html.push_str("</div>");
        html
    }
}

fn surface_name(surface: DetailSurface) -> &'static str {
    match surface {
        DetailSurface::Tooltip => "tooltip",
        DetailSurface::Popup => "popup",
    }
}

fn slot_name(slot: ChartSlot) -> &'static str {
    match slot {
        ChartSlot::Reviews => "reviews",
        ChartSlot::Scores => "scores",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Chart regions of one detail surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartRegions {
    pub reviews: ChartTarget,
    pub scores: ChartTarget,
}

#[derive(Debug)]
struct DetailCharts {
    reviews: BarChart,
    scores: BarChart,
}

/// Placement data handed to the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPlacement {
    pub id: MarkerId,
    pub record: RecordId,
    pub name: String,
    pub position: LatLon,
    pub avg_rating: f64,
    pub color: &'static str,
}

/// A visible marker
#[derive(Debug)]
pub struct Marker {
    id: MarkerId,
    record: Record,
    bucket: RatingBucket,
    radius_m: f64,
    detail: DetailContent,
    charts: OnceLock<DetailCharts>,
}

impl Marker {
    /// Build marker for the record at `index` in the store
    #[must_use]
    pub fn for_record(index: usize, record: &Record, radius_m: f64) -> Self {
        Self {
            id: MarkerId(index),
            bucket: RatingBucket::from_rating(record.avg_rating),
            radius_m,
            detail: DetailContent::for_record(record),
            record: record.clone(),
            charts: OnceLock::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> MarkerId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> LatLon {
        self.record.position
    }

    #[inline]
    #[must_use]
    pub fn bucket(&self) -> RatingBucket {
        self.bucket
    }

    /// Fill and stroke color
    #[inline]
    #[must_use]
    pub fn color(&self) -> &'static str {
        self.bucket.color()
    }

    /// Circle radius in meters
    #[inline]
    #[must_use]
    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    #[inline]
    #[must_use]
    pub fn detail(&self) -> &DetailContent {
        &self.detail
    }

    /// Tooltip markup
    #[must_use]
    pub fn tooltip_html(&self) -> String {
        self.detail.to_html(self.id, DetailSurface::Tooltip)
    }

    /// Popup markup
    #[must_use]
    pub fn popup_html(&self) -> String {
        self.detail.to_html(self.id, DetailSurface::Popup)
    }

    /// Chart regions inside a surface
    #[must_use]
    pub fn regions(&self, surface: DetailSurface) -> ChartRegions {
        let target = |slot| ChartTarget::Marker {
            marker: self.id,
            surface,
            slot,
        };
        ChartRegions {
            reviews: target(ChartSlot::Reviews),
            scores: target(ChartSlot::Scores),
        }
    }

    /// Draw both charts into a surface that just became visible
    pub fn render_detail(&self, surface: DetailSurface, renderer: &dyn ChartRenderer) {
        let charts = self.charts.get_or_init(|| DetailCharts {
            reviews: reviews_chart(&self.record.reviews),
            scores: scores_chart(&self.record.scores),
        });
        let regions = self.regions(surface);
        renderer.draw(regions.reviews, &charts.reviews);
        renderer.draw(regions.scores, &charts.scores);
    }

    /// Whether chart data has been computed
    #[inline]
    #[must_use]
    pub fn charts_built(&self) -> bool {
        self.charts.get().is_some()
    }

    #[must_use]
    pub fn placement(&self) -> MarkerPlacement {
        MarkerPlacement {
            id: self.id,
            record: self.record.id.clone(),
            name: self.record.name.clone(),
            position: self.record.position,
            avg_rating: self.record.avg_rating,
            color: self.color(),
        }
    }
}

/// Markers placed by the last render pass
#[derive(Debug, Default)]
pub struct MarkerLayer {
    markers: BTreeMap<MarkerId, Arc<Marker>>,
}

impl MarkerLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the markers of a new render pass
    pub fn replace(&mut self, markers: impl IntoIterator<Item = Arc<Marker>>) {
        self.markers = markers.into_iter().map(|m| (m.id(), m)).collect();
    }

    #[must_use]
    pub fn get(&self, id: MarkerId) -> Option<Arc<Marker>> {
        self.markers.get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Placements in marker order
    #[must_use]
    pub fn placements(&self) -> Vec<MarkerPlacement> {
        self.markers.values().map(|m| m.placement()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartScale;
    use dinemap_core::{ReviewCounts, ScoreBreakdown};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Captured(Mutex<Vec<(ChartTarget, BarChart)>>);

    impl ChartRenderer for Captured {
        fn draw(&self, target: ChartTarget, chart: &BarChart) {
            self.0.lock().push((target, chart.clone()));
        }
    }

    fn record() -> Record {
        Record::new(
            "http://x/r1",
            "Bistro <Chez Paul>",
            "1 Rue & Co",
            LatLon::new(48.85, 2.35).unwrap(),
        )
        .with_rating(4.5)
        .with_keywords("wine, bistro")
        .with_reviews(ReviewCounts {
            excellent: 8,
            very_good: 4,
            average: 2,
            poor: 0,
            terrible: 0,
        })
        .with_scores(ScoreBreakdown::new(4.5, 4.0, 3.5, 5.0).unwrap())
    }

    #[test]
    fn color_follows_rating_bucket() {
        let marker = Marker::for_record(3, &record(), 500.0);
        assert_eq!(marker.id(), MarkerId(3));
        assert_eq!(marker.bucket(), RatingBucket::Excellent);
        assert_eq!(marker.color(), "#9400D3");
    }

    #[test]
    fn detail_omits_empty_optionals() {
        let detail = DetailContent::for_record(&record());
        assert_eq!(detail.keywords.as_deref(), Some("wine, bistro"));
        assert_eq!(detail.open_hours, None);
        assert_eq!(detail.wikidata, None);

        let html = detail.to_html(MarkerId(0), DetailSurface::Tooltip);
        assert!(html.contains("Bistro &lt;Chez Paul&gt;"));
        assert!(html.contains("Address: 1 Rue &amp; Co"));
        assert!(html.contains("Average Rating: 4.5"));
        assert!(!html.contains("Opening Hours"));
        assert!(!html.contains("Wikidata"));
    }

    #[test]
    fn chain_gets_wikidata_link() {
        let record = record().with_same_as("http://www.wikidata.org/entity/Q38076");
        let html = Marker::for_record(0, &record, 500.0).popup_html();
        assert!(html.contains("href=\"http://www.wikidata.org/entity/Q38076\""));
        assert!(html.contains("data-surface=\"popup\""));
    }

    #[test]
    fn charts_are_built_on_first_visibility_and_redrawn_after() {
        let marker = Marker::for_record(7, &record(), 500.0);
        let renderer = Captured::default();
        assert!(!marker.charts_built());

        marker.render_detail(DetailSurface::Tooltip, &renderer);
        assert!(marker.charts_built());
        marker.render_detail(DetailSurface::Popup, &renderer);

        let drawn = renderer.0.lock();
        assert_eq!(drawn.len(), 4);
        assert_eq!(
            drawn[0].0,
            ChartTarget::Marker {
                marker: MarkerId(7),
                surface: DetailSurface::Tooltip,
                slot: ChartSlot::Reviews,
            }
        );
        assert_eq!(drawn[0].1.max_value(), 8.0);
        assert_eq!(drawn[1].1.scale, ChartScale::Fixed(5.0));
        assert_eq!(
            drawn[3].0,
            ChartTarget::Marker {
                marker: MarkerId(7),
                surface: DetailSurface::Popup,
                slot: ChartSlot::Scores,
            }
        );
    }

    #[test]
    fn layer_replaces_previous_pass() {
        let mut layer = MarkerLayer::new();
        layer.replace([
            Arc::new(Marker::for_record(0, &record(), 500.0)),
            Arc::new(Marker::for_record(2, &record(), 500.0)),
        ]);
        assert_eq!(layer.len(), 2);

        layer.replace([Arc::new(Marker::for_record(1, &record(), 500.0))]);
        assert_eq!(layer.len(), 1);
        assert!(layer.get(MarkerId(0)).is_none());
        assert!(layer.get(MarkerId(1)).is_some());
    }
}
