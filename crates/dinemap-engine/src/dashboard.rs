//! Dashboard controller
//!
//! Owns the record store, the tag loader and the marker layer, and turns UI
//! events into render passes:
//! - startup loads records, statistics and selector options concurrently
//! - filter changes render directly or after one tag fetch
//! - viewport changes render only while the viewport filter is on
//! - opening a tooltip or popup draws that marker's charts

use crate::charts::{ChartTarget, DetailSurface, StatPanel};
use crate::error::{EngineError, EngineResult};
use crate::marker::{Marker, MarkerId, MarkerLayer, MarkerPlacement};
use crate::options::load_options;
use crate::render::{plan_markers, RenderSummary};
use crate::stats::load_panel;
use crate::store::{LoadReport, RecordStore};
use crate::surface::{ChartRenderer, FilterControls, MapSurface, SelectOption};
use crate::tags::{TagLoad, TagLoader, TagReport};
use dinemap_core::{CategoryField, DashboardConfig, FilterConfig};
use dinemap_query::{QueryService, SparqlQueries};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Presentation collaborators
#[derive(Clone)]
pub struct Surfaces {
    pub map: Arc<dyn MapSurface>,
    pub charts: Arc<dyn ChartRenderer>,
    pub controls: Arc<dyn FilterControls>,
}

impl Surfaces {
    pub fn new(
        map: Arc<dyn MapSurface>,
        charts: Arc<dyn ChartRenderer>,
        controls: Arc<dyn FilterControls>,
    ) -> Self {
        Self {
            map,
            charts,
            controls,
        }
    }
}

impl std::fmt::Debug for Surfaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surfaces").finish_non_exhaustive()
    }
}

/// Per-item outcome of a group of independent fetches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchReport<K> {
    pub loaded: Vec<K>,
    pub failed: Vec<(K, String)>,
}

impl<K> Default for FetchReport<K> {
    fn default() -> Self {
        Self {
            loaded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// What startup did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartupReport {
    pub load: LoadReport,
    /// First render, after any tags the live filter needs
    pub outcome: FilterOutcome,
    pub panels: FetchReport<StatPanel>,
    pub selectors: FetchReport<CategoryField>,
}

/// What a filter change did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum FilterOutcome {
    /// Rendered without fetching
    Rendered(RenderSummary),
    /// Fetched tags, then rendered once
    Fetched {
        report: TagReport,
        render: RenderSummary,
    },
    /// A tag fetch was already running; its trailing render covers this change
    Dropped,
    /// Records are not loaded yet; the load ends with its own render
    NotLoaded,
}

impl FilterOutcome {
    /// Render performed by this change, if any
    #[must_use]
    pub fn render(&self) -> Option<RenderSummary> {
        match self {
            Self::Rendered(render) | Self::Fetched { render, .. } => Some(*render),
            Self::Dropped | Self::NotLoaded => None,
        }
    }
}

/// The map dashboard
pub struct Dashboard {
    config: DashboardConfig,
    queries: SparqlQueries,
    service: Arc<dyn QueryService>,
    surfaces: Surfaces,
    store: RwLock<RecordStore>,
    tags: TagLoader,
    layer: Mutex<MarkerLayer>,
    render_passes: AtomicU64,
    loaded: AtomicBool,
    ready: AtomicBool,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("config", &self.config)
            .field("records", &self.record_count())
            .field("tags", &self.tags)
            .field("render_passes", &self.render_passes())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Create dashboard with an empty store
    pub fn new(config: DashboardConfig, service: Arc<dyn QueryService>, surfaces: Surfaces) -> Self {
        let queries = SparqlQueries::from_config(&config);
        let tags = TagLoader::new(Arc::clone(&service), queries.clone(), config.tag_batch_size);
        Self {
            config,
            queries,
            service,
            surfaces,
            store: RwLock::new(RecordStore::new()),
            tags,
            layer: Mutex::new(MarkerLayer::new()),
            render_passes: AtomicU64::new(0),
            loaded: AtomicBool::new(false),
            ready: AtomicBool::new(false),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Load everything and render once
    ///
    /// # Workflow
    /// 1. Record load, statistics panels and selector options run concurrently
    /// 2. Each panel and selector is drawn as soon as its own fetch completes
    /// 3. The record load ends like a filter change: tags the live filter
    ///    needs are fetched first, then the first render pass runs
    ///
    /// Only a record load failure fails startup; panel and selector failures
    /// are logged and reported.
    pub async fn start(&self) -> EngineResult<StartupReport> {
        let (records, panels, selectors) = futures::join!(
            self.load_records(),
            self.load_statistics(),
            self.load_selector_options()
        );
        let (load, outcome) = records?;
        Ok(StartupReport {
            load,
            outcome,
            panels,
            selectors,
        })
    }

    /// Fetch the record set and render; allowed once per session
    ///
    /// A filter already set when the records arrive is honoured: lazy tags it
    /// needs are fetched before the first render. If that fetch fails the
    /// records stay loaded, nothing is rendered and the error is returned.
    pub async fn load_records(&self) -> EngineResult<(LoadReport, FilterOutcome)> {
        if self.loaded.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyLoaded);
        }

        let (store, report) =
            match RecordStore::load_all(self.service.as_ref(), &self.queries, &self.config).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    self.loaded.store(false, Ordering::Release);
                    tracing::warn!(error = %e, "record load failed");
                    return Err(e);
                }
            };
        *self.store.write() = store;
        self.ready.store(true, Ordering::Release);

        let outcome = self.render_with_tags().await?;
        Ok((report, outcome))
    }

    /// Fetch and draw every statistics panel
    pub async fn load_statistics(&self) -> FetchReport<StatPanel> {
        let fetches = StatPanel::ALL.map(|panel| async move {
            let result =
                load_panel(panel, self.service.as_ref(), &self.queries, &self.config).await;
            if let Ok(chart) = &result {
                self.surfaces
                    .charts
                    .draw(ChartTarget::Statistics(panel), chart);
            }
            (panel, result)
        });

        let mut report = FetchReport::default();
        for (panel, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(_) => report.loaded.push(panel),
                Err(e) => {
                    tracing::warn!(panel = %panel, error = %e, "statistics fetch failed");
                    report.failed.push((panel, e.to_string()));
                }
            }
        }
        report
    }

    /// Fetch and install every selector's option list
    pub async fn load_selector_options(&self) -> FetchReport<CategoryField> {
        let fetches = CategoryField::ALL.map(|field| async move {
            let result = load_options(field, self.service.as_ref(), &self.queries).await;
            let options = match &result {
                Ok(options) => options.clone(),
                Err(_) => vec![SelectOption::all()],
            };
            self.surfaces.controls.set_options(field, &options);
            (field, result)
        });

        let mut report = FetchReport::default();
        for (field, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(_) => report.loaded.push(field),
                Err(e) => {
                    tracing::warn!(selector = field.name(), error = %e, "selector option fetch failed");
                    report.failed.push((field, e.to_string()));
                }
            }
        }
        report
    }

    /// Re-evaluate every record against the live filter and redraw markers
    pub fn refresh(&self) -> RenderSummary {
        let config = self.surfaces.controls.current();
        let viewport = config.in_view.then(|| self.surfaces.map.bounds());

        let (markers, total) = {
            let store = self.store.read();
            let markers = plan_markers(
                &store,
                &config,
                viewport.as_ref(),
                self.config.marker_radius_m,
            );
            (markers, store.len())
        };

        // Serializes passes so two renders never interleave on the map.
        let mut layer = self.layer.lock();
        let map = &self.surfaces.map;
        map.clear_markers();
        for marker in &markers {
            map.place_marker(marker);
        }
        let visible = markers.len();
        layer.replace(markers);
        let pass = self.render_passes.fetch_add(1, Ordering::AcqRel) + 1;
        drop(layer);

        tracing::debug!(pass, visible, total, "render pass");
        RenderSummary {
            pass,
            visible,
            total,
        }
    }

    /// Handle any filter control change
    ///
    /// Fetch errors are returned after the in-flight flag has been cleared;
    /// no render happens in that case.
    pub async fn on_filter_change(&self) -> EngineResult<FilterOutcome> {
        if !self.records_ready() {
            tracing::debug!("filter change before records loaded, ignored");
            return Ok(FilterOutcome::NotLoaded);
        }
        self.render_with_tags().await
    }

    async fn render_with_tags(&self) -> EngineResult<FilterOutcome> {
        let needed = self.surfaces.controls.current().needed_attributes();
        let outcome = self
            .tags
            .ensure_tags_for(&self.store, &needed, || self.refresh())
            .await?;

        Ok(match outcome {
            TagLoad::NotNeeded | TagLoad::AlreadyLoaded => FilterOutcome::Rendered(self.refresh()),
            TagLoad::InFlight => FilterOutcome::Dropped,
            TagLoad::Fetched { report, rendered } => FilterOutcome::Fetched {
                report,
                render: rendered,
            },
        })
    }

    /// Handle a pan or zoom; renders only while the viewport filter is on
    pub fn on_viewport_change(&self) -> Option<RenderSummary> {
        if self.surfaces.controls.current().in_view {
            Some(self.refresh())
        } else {
            tracing::debug!("viewport change ignored, viewport filter off");
            None
        }
    }

    /// Put every control back to its default and render once
    pub fn reset(&self) -> RenderSummary {
        self.surfaces.controls.apply(&FilterConfig::default());
        self.refresh()
    }

    /// Draw charts for a tooltip that just opened
    pub fn on_tooltip_open(&self, id: MarkerId) -> bool {
        self.open_detail(id, DetailSurface::Tooltip)
    }

    /// Draw charts for a popup that just opened
    pub fn on_popup_open(&self, id: MarkerId) -> bool {
        self.open_detail(id, DetailSurface::Popup)
    }

    fn open_detail(&self, id: MarkerId, surface: DetailSurface) -> bool {
        let Some(marker) = self.layer.lock().get(id) else {
            tracing::debug!(marker = %id, "detail opened for marker no longer visible");
            return false;
        };
        marker.render_detail(surface, self.surfaces.charts.as_ref());
        true
    }

    /// Placements from the last render pass
    #[must_use]
    pub fn visible_markers(&self) -> Vec<MarkerPlacement> {
        self.layer.lock().placements()
    }

    /// Visible marker by id
    #[must_use]
    pub fn marker(&self, id: MarkerId) -> Option<Arc<Marker>> {
        self.layer.lock().get(id)
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.store.read().len()
    }

    /// Whether the record load has completed
    #[must_use]
    pub fn records_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Whether every loaded record carries its tags
    ///
    /// False until records are loaded; true for a loaded empty store.
    #[must_use]
    pub fn tags_loaded(&self) -> bool {
        self.records_ready() && self.store.read().all_tags_loaded()
    }

    /// Logical tag fetches issued
    #[must_use]
    pub fn tag_fetches(&self) -> u64 {
        self.tags.fetch_count()
    }

    #[must_use]
    pub fn tag_fetch_in_flight(&self) -> bool {
        self.tags.is_in_flight()
    }

    #[must_use]
    pub fn render_passes(&self) -> u64 {
        self.render_passes.load(Ordering::Acquire)
    }

    /// Run `f` against the current store
    pub fn with_store<R>(&self, f: impl FnOnce(&RecordStore) -> R) -> R {
        f(&self.store.read())
    }
}
