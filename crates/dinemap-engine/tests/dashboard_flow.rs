//! Startup, render passes, viewport and marker details against in-memory fakes

use dinemap_core::{CategoryField, DashboardConfig, FilterConfig, MalformedRowPolicy, Selector};
use dinemap_engine::{
    ChartScale, ChartSlot, ChartTarget, DetailSurface, EngineError, FilterControls, FilterOutcome,
    MarkerId, StatPanel,
};
use dinemap_query::vars;
use dinemap_test_utils::{
    record_results, sample_restaurants, FakeQueryService, Restaurant, TestDashboard,
    RECORDS_QUERY, TAG_QUERY, TOP_MEALS_QUERY,
};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn startup_loads_renders_and_populates_panels() {
    let t = TestDashboard::sample();

    let report = t.dashboard.start().await.unwrap();

    assert_eq!(report.load.loaded, 6);
    let render = report.outcome.render().unwrap();
    assert_eq!(render.pass, 1);
    assert_eq!(render.visible, 6);
    assert_eq!(t.map.placed().len(), 6);
    assert!(report.panels.failed.is_empty());
    assert!(report.selectors.failed.is_empty());
    assert_eq!(t.service.calls_matching(RECORDS_QUERY), 1);

    let countries: Vec<_> = t
        .controls
        .options(CategoryField::Country)
        .unwrap()
        .into_iter()
        .map(|o| o.value)
        .collect();
    assert_eq!(countries, vec!["ALL", "France", "Italy", "Spain"]);

    let cuisines = t.controls.options(CategoryField::Cuisine).unwrap();
    assert_eq!(cuisines[0].label, "All");
    assert!(cuisines.iter().any(|o| o.value == "Neapolitan"));
}

#[tokio::test]
async fn statistics_panels_are_drawn() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();

    let cuisines = t
        .charts
        .drawn_into(ChartTarget::Statistics(StatPanel::TopCuisines));
    assert_eq!(cuisines.len(), 1);
    assert_eq!(cuisines[0].bars[0].label, "Italian");
    assert_eq!(cuisines[0].bars[0].value, 3.0);

    let ratings = t
        .charts
        .drawn_into(ChartTarget::Statistics(StatPanel::RatingDistribution));
    let bars: Vec<_> = ratings[0]
        .bars
        .iter()
        .map(|b| (b.label.as_str(), b.value))
        .collect();
    assert_eq!(
        bars,
        vec![("<2.5", 1.0), ("2.5-3.5", 1.0), ("3.5-4.5", 2.0), (">=4.5", 2.0)]
    );
}

#[tokio::test]
async fn failed_panel_leaves_others_intact() {
    let service = FakeQueryService::for_restaurants(&sample_restaurants());
    service.fail(TOP_MEALS_QUERY, "endpoint timeout");
    let t = TestDashboard::new(service);

    let report = t.dashboard.start().await.unwrap();

    assert_eq!(report.panels.failed.len(), 1);
    assert_eq!(report.panels.failed[0].0, StatPanel::TopMeals);
    assert!(t
        .charts
        .drawn_into(ChartTarget::Statistics(StatPanel::TopMeals))
        .is_empty());
    assert_eq!(
        t.charts
            .drawn_into(ChartTarget::Statistics(StatPanel::TopCuisines))
            .len(),
        1
    );
    assert_eq!(report.outcome.render().unwrap().visible, 6);
}

#[tokio::test]
async fn records_load_once_per_session() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();

    let err = t.dashboard.load_records().await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyLoaded));
    assert_eq!(t.service.calls_matching(RECORDS_QUERY), 1);
}

#[tokio::test]
async fn consecutive_refreshes_are_identical() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();
    t.controls.set(FilterConfig::new().with_min_rating(3.5));

    let first = t.dashboard.refresh();
    let placed_first = t.map.placed();
    let second = t.dashboard.refresh();

    assert_eq!(first.visible, second.visible);
    assert_eq!(second.pass, first.pass + 1);
    assert_eq!(placed_first, t.map.placed());
    assert_eq!(t.dashboard.visible_markers(), placed_first);
}

#[tokio::test]
async fn scalar_filters_render_without_fetching() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();

    t.controls.update(|c| {
        c.gluten_free = true;
        c.country = Selector::parse("France");
    });
    let outcome = t.dashboard.on_filter_change().await.unwrap();

    assert!(matches!(outcome, FilterOutcome::Rendered(_)));
    assert_eq!(t.map.placed_names(), vec!["Le Petit Zinc"]);
    assert_eq!(t.dashboard.tag_fetches(), 0);
}

#[tokio::test]
async fn rating_floor_is_inclusive() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();

    t.controls.set(FilterConfig::new().with_min_rating(4.5));
    t.dashboard.on_filter_change().await.unwrap();

    assert_eq!(
        t.map.placed_names(),
        vec!["Le Petit Zinc", "Trattoria Milanese"]
    );
}

#[tokio::test]
async fn chain_only_keeps_records_with_cross_reference() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();

    t.controls.update(|c| c.chain_only = true);
    t.dashboard.on_filter_change().await.unwrap();

    assert_eq!(t.map.placed_names(), vec!["Burger Corner"]);
}

#[tokio::test]
async fn reset_restores_defaults_and_renders_everything() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();
    t.controls.set(
        FilterConfig::new()
            .with_min_rating(4.0)
            .with_in_view(true)
            .with_selector(CategoryField::City, "Paris"),
    );
    t.dashboard.on_filter_change().await.unwrap();
    let before = t.dashboard.render_passes();

    let summary = t.dashboard.reset();

    assert_eq!(t.controls.current(), FilterConfig::default());
    assert_eq!(t.controls.applied_count(), 1);
    assert_eq!(summary.visible, 6);
    assert_eq!(t.dashboard.render_passes(), before + 1);
}

#[tokio::test]
async fn viewport_changes_render_only_when_restricted() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();
    t.map.set_bounds((48.0, 2.0), (49.0, 3.0));

    assert_eq!(t.dashboard.on_viewport_change(), None);
    assert_eq!(t.map.placed().len(), 6);

    t.controls.update(|c| c.in_view = true);
    let summary = t.dashboard.on_viewport_change().unwrap();

    assert_eq!(summary.visible, 2);
    assert_eq!(t.map.placed_names(), vec!["Burger Corner", "Le Petit Zinc"]);

    t.map.set_bounds((35.0, -10.0), (42.0, 5.0));
    t.dashboard.on_viewport_change().unwrap();
    assert_eq!(
        t.map.placed_names(),
        vec!["Casa Verde", "Taberna Sin Etiquetas"]
    );
}

#[tokio::test]
async fn detail_charts_draw_when_surface_opens() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();

    let marker = t.dashboard.marker(MarkerId(0)).unwrap();
    assert!(!marker.charts_built());

    assert!(t.dashboard.on_tooltip_open(MarkerId(0)));
    assert!(marker.charts_built());

    let reviews = ChartTarget::Marker {
        marker: MarkerId(0),
        surface: DetailSurface::Tooltip,
        slot: ChartSlot::Reviews,
    };
    let scores = ChartTarget::Marker {
        marker: MarkerId(0),
        surface: DetailSurface::Tooltip,
        slot: ChartSlot::Scores,
    };
    let drawn = t.charts.drawn_into(reviews);
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].max_value(), 12.0);
    assert_eq!(t.charts.drawn_into(scores)[0].scale, ChartScale::Fixed(5.0));

    assert!(t.dashboard.on_tooltip_open(MarkerId(0)));
    assert_eq!(t.charts.drawn_into(reviews).len(), 2);

    assert!(t.dashboard.on_popup_open(MarkerId(0)));
    let popup_reviews = ChartTarget::Marker {
        marker: MarkerId(0),
        surface: DetailSurface::Popup,
        slot: ChartSlot::Reviews,
    };
    assert_eq!(t.charts.drawn_into(popup_reviews).len(), 1);
}

#[tokio::test]
async fn hidden_marker_has_no_detail() {
    let t = TestDashboard::sample();
    t.dashboard.start().await.unwrap();

    t.controls
        .set(FilterConfig::new().with_selector(CategoryField::Country, "France"));
    t.dashboard.on_filter_change().await.unwrap();

    assert!(!t.dashboard.on_popup_open(MarkerId(0)));
    assert!(t.dashboard.on_popup_open(MarkerId(2)));
}

#[tokio::test]
async fn malformed_rows_are_skipped_by_default() {
    let mut restaurants = sample_restaurants();
    restaurants.truncate(3);
    let mut results = record_results(&restaurants);
    let broken = Restaurant::new("restaurant_99", "No Coordinates")
        .record_row()
        .with_literal(vars::LAT, "n/a");
    results.results.bindings.insert(1, broken);

    let service = FakeQueryService::for_restaurants(&restaurants);
    service.respond(RECORDS_QUERY, results);
    let t = TestDashboard::new(service);

    let report = t.dashboard.start().await.unwrap();

    assert_eq!(report.load.rows, 4);
    assert_eq!(report.load.loaded, 3);
    assert_eq!(report.load.skipped.len(), 1);
    assert_eq!(report.load.skipped[0].row, 1);
    assert_eq!(t.dashboard.record_count(), 3);
}

#[tokio::test]
async fn abort_policy_fails_startup() {
    let mut results = record_results(&sample_restaurants());
    results.results.bindings[2] = Restaurant::new("restaurant_99", "Broken")
        .record_row()
        .with_literal(vars::FOOD, "7.5");
    let service = FakeQueryService::for_restaurants(&sample_restaurants());
    service.respond(RECORDS_QUERY, results);
    let config = DashboardConfig::default().with_malformed_rows(MalformedRowPolicy::Abort);
    let t = TestDashboard::with_config(config, service);

    let err = t.dashboard.start().await.unwrap_err();

    assert!(matches!(err, EngineError::MalformedRow { row: 2, .. }));
    assert_eq!(t.dashboard.record_count(), 0);
    assert_eq!(t.dashboard.render_passes(), 0);
}

#[tokio::test]
async fn failed_record_load_can_be_retried() {
    let service = FakeQueryService::for_restaurants(&sample_restaurants());
    service.fail(RECORDS_QUERY, "connection refused");
    let t = TestDashboard::new(service);

    let err = t.dashboard.start().await.unwrap_err();
    assert!(err.is_fetch_failure());

    t.service
        .respond(RECORDS_QUERY, record_results(&sample_restaurants()));
    let (load, outcome) = t.dashboard.load_records().await.unwrap();
    assert_eq!(load.loaded, 6);
    assert_eq!(outcome.render().unwrap().visible, 6);
}

#[tokio::test]
async fn lazy_selector_set_before_startup_fetches_tags_first() {
    let t = TestDashboard::sample();
    t.controls
        .set(FilterConfig::new().with_selector(CategoryField::Cuisine, "Italian"));

    let report = t.dashboard.start().await.unwrap();

    let FilterOutcome::Fetched { report: tags, render } = report.outcome else {
        panic!("expected a tag fetch, got {:?}", report.outcome);
    };
    assert_eq!(tags.records, 6);
    assert_eq!(render.pass, 1);
    assert_eq!(render.visible, 3);
    assert_eq!(t.dashboard.render_passes(), 1);
    assert_eq!(t.dashboard.tag_fetches(), 1);
    assert_eq!(t.service.calls_matching(TAG_QUERY), 1);
    assert!(t.dashboard.tags_loaded());
    assert_eq!(
        t.map.placed_names(),
        vec!["Casa Verde", "Pizzeria Napoli", "Trattoria Milanese"]
    );
}

#[tokio::test]
async fn filter_change_before_records_load_does_nothing() {
    let t = TestDashboard::sample();
    t.controls
        .set(FilterConfig::new().with_selector(CategoryField::Meal, "Dinner"));

    let outcome = t.dashboard.on_filter_change().await.unwrap();

    assert_eq!(outcome, FilterOutcome::NotLoaded);
    assert_eq!(outcome.render(), None);
    assert_eq!(t.dashboard.render_passes(), 0);
    assert_eq!(t.dashboard.tag_fetches(), 0);
    assert!(!t.dashboard.records_ready());
    assert!(!t.dashboard.tags_loaded());
}

#[tokio::test]
async fn loaded_empty_store_counts_as_tagged() {
    let service = FakeQueryService::for_restaurants(&[]);
    let t = TestDashboard::new(service);
    t.dashboard.load_records().await.unwrap();

    assert!(t.dashboard.records_ready());
    assert!(t.dashboard.tags_loaded());

    t.controls
        .set(FilterConfig::new().with_selector(CategoryField::Award, "Travellers Choice"));
    let outcome = t.dashboard.on_filter_change().await.unwrap();
    assert!(matches!(outcome, FilterOutcome::Rendered(_)));
    assert_eq!(t.service.calls_matching(TAG_QUERY), 0);
}
