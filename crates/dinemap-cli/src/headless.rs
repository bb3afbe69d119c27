//! Terminal stand-ins for the map, chart and form surfaces

use dinemap_core::{Bounds, CategoryField, FilterConfig};
use dinemap_engine::{
    BarChart, ChartRenderer, ChartTarget, FilterControls, MapSurface, Marker, MarkerPlacement,
    SelectOption, StatPanel,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;

const BAR_WIDTH: usize = 40;

/// Map with a fixed viewport; markers are read back from the dashboard
#[derive(Debug)]
pub(crate) struct HeadlessMap {
    bounds: Bounds,
}

impl HeadlessMap {
    pub(crate) fn new(bounds: Option<Bounds>) -> Self {
        Self {
            bounds: bounds.unwrap_or_else(Bounds::world),
        }
    }
}

impl MapSurface for HeadlessMap {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn clear_markers(&self) {}

    fn place_marker(&self, marker: &Marker) {
        tracing::trace!(marker = %marker.id(), color = marker.color(), "marker placed");
    }
}

/// Keeps the latest chart drawn into each statistics panel
#[derive(Debug, Default)]
pub(crate) struct PanelCollector {
    panels: Mutex<BTreeMap<StatPanel, BarChart>>,
}

impl PanelCollector {
    pub(crate) fn panels(&self) -> BTreeMap<StatPanel, BarChart> {
        self.panels.lock().clone()
    }
}

impl ChartRenderer for PanelCollector {
    fn draw(&self, target: ChartTarget, chart: &BarChart) {
        if let ChartTarget::Statistics(panel) = target {
            self.panels.lock().insert(panel, chart.clone());
        }
    }
}

/// Form holding the configuration given on the command line
#[derive(Debug, Default)]
pub(crate) struct ArgControls {
    config: Mutex<FilterConfig>,
}

impl ArgControls {
    pub(crate) fn set(&self, config: FilterConfig) {
        *self.config.lock() = config;
    }
}

impl FilterControls for ArgControls {
    fn current(&self) -> FilterConfig {
        self.config.lock().clone()
    }

    fn apply(&self, config: &FilterConfig) {
        self.set(config.clone());
    }

    fn set_options(&self, field: CategoryField, options: &[SelectOption]) {
        tracing::debug!(selector = field.name(), options = options.len(), "selector options");
    }
}

/// Marker table, one row per marker
pub(crate) fn marker_table(markers: &[MarkerPlacement]) -> String {
    let mut out = format!(
        "{:>6}  {:<40}  {:>6}  {:>9}  {:>10}  {}\n",
        "ID", "NAME", "RATING", "LAT", "LON", "COLOR"
    );
    for m in markers {
        out.push_str(&format!(
            "{:>6}  {:<40}  {:>6.1}  {:>9.4}  {:>10.4}  {}\n",
            m.id.0,
            truncate(&m.name, 40),
            m.avg_rating,
            m.position.lat,
            m.position.lon,
            m.color
        ));
    }
    out.push_str(&format!("{} markers\n", markers.len()));
    out
}

/// One panel as horizontal text bars
pub(crate) fn chart_text(title: &str, chart: &BarChart) -> String {
    let mut out = format!("{title}\n");
    if chart.is_empty() {
        out.push_str("  No data\n");
        return out;
    }
    let width = chart
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);
    let bar_width = BAR_WIDTH;
    for bar in &chart.bars {
        // Rounded bar length; fraction is within 0..=1.
        let filled = (chart.fraction(bar) * BAR_WIDTH as f64).round() as usize;
        out.push_str(&format!(
            "  {:<width$}  {:<bar_width$}  {}\n",
            bar.label,
            "#".repeat(filled),
            bar.value
        ));
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max - 1).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinemap_engine::{Bar, MarkerId};
    use dinemap_core::{LatLon, RecordId};

    #[test]
    fn empty_chart_prints_no_data() {
        let text = chart_text("Top meals", &BarChart::auto(Vec::new()));
        assert_eq!(text, "Top meals\n  No data\n");
    }

    #[test]
    fn bars_scale_to_widest() {
        let chart = BarChart::auto(vec![Bar::new("Italian", 10.0), Bar::new("French", 5.0)]);
        let text = chart_text("Top cuisines", &chart);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1].matches('#').count(), BAR_WIDTH);
        assert_eq!(lines[2].matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn table_lists_every_marker() {
        let placement = MarkerPlacement {
            id: MarkerId(4),
            record: RecordId::new("urn:r4"),
            name: "A very long restaurant name that will not fit in the column".into(),
            position: LatLon::new(45.0, 9.0).unwrap(),
            avg_rating: 4.5,
            color: "#9400D3",
        };
        let table = marker_table(&[placement]);
        assert!(table.contains("#9400D3"));
        assert!(table.contains('…'));
        assert!(table.ends_with("1 markers\n"));
    }

    #[test]
    fn controls_keep_applied_config() {
        let controls = ArgControls::default();
        controls.apply(&FilterConfig::new().with_min_rating(3.0));
        assert_eq!(controls.current().min_rating, 3.0);
    }
}
