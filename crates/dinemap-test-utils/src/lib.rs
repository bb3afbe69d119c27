//! Testing utilities for the dinemap workspace
//!
//! Restaurant fixtures, SPARQL response builders, and in-memory fakes of
//! every collaborator the dashboard talks to.

#![allow(missing_docs)]

use async_trait::async_trait;
use dinemap_core::{
    Bounds, CategoryField, DashboardConfig, FilterConfig, LatLon, LazyAttribute, RatingBucket,
};
use dinemap_engine::{
    BarChart, ChartRenderer, ChartTarget, Dashboard, FilterControls, MapSurface, Marker,
    MarkerPlacement, SelectOption, Surfaces,
};
use dinemap_query::{
    tag_var, vars, QueryError, QueryResult, QueryService, ResultSet, Row, Term, TAG_SEPARATOR,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::watch;

/// Substring identifying the full record query
pub const RECORDS_QUERY: &str = ":restaurantName";
/// Substring identifying a tag batch query
pub const TAG_QUERY: &str = "GROUP_CONCAT";
/// Substring identifying the top cuisines query
pub const TOP_CUISINES_QUERY: &str = "SELECT ?cuisine";
/// Substring identifying the rating distribution query
pub const RATING_QUERY: &str = "SELECT ?bucket";
/// Substring identifying the top meals query
pub const TOP_MEALS_QUERY: &str = "SELECT ?meal";

/// Substring identifying the distinct-values query of a selector
pub fn options_query(field: CategoryField) -> String {
    format!(":{} ?s", field.property())
}

/// Restaurant fixture that renders to response rows
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub uri: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub rating: f64,
    pub country: String,
    pub city: String,
    pub price: String,
    pub gluten_free: bool,
    pub vegan: bool,
    pub vegetarian: bool,
    pub same_as: Option<String>,
    pub keywords: String,
    pub open_hours: String,
    pub cuisines: Vec<String>,
    pub meals: Vec<String>,
    pub features: Vec<String>,
    pub awards: Vec<String>,
}

impl Restaurant {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            uri: format!("http://ltr.european-restaurants.org/{id}"),
            name: name.to_string(),
            address: format!("{name} street 1"),
            lat: 45.0,
            lon: 9.0,
            rating: 4.0,
            country: "Italy".to_string(),
            city: "Milan".to_string(),
            price: "€€-€€€".to_string(),
            gluten_free: false,
            vegan: false,
            vegetarian: false,
            same_as: None,
            keywords: String::new(),
            open_hours: String::new(),
            cuisines: Vec::new(),
            meals: Vec::new(),
            features: Vec::new(),
            awards: Vec::new(),
        }
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    pub fn rated(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn in_city(mut self, country: &str, city: &str) -> Self {
        self.country = country.to_string();
        self.city = city.to_string();
        self
    }

    pub fn priced(mut self, price: &str) -> Self {
        self.price = price.to_string();
        self
    }

    pub fn gluten_free(mut self) -> Self {
        self.gluten_free = true;
        self
    }

    pub fn vegan(mut self) -> Self {
        self.vegan = true;
        self
    }

    pub fn vegetarian(mut self) -> Self {
        self.vegetarian = true;
        self
    }

    pub fn chain(mut self, wikidata: &str) -> Self {
        self.same_as = Some(format!("http://www.wikidata.org/entity/{wikidata}"));
        self
    }

    pub fn with_cuisines(mut self, cuisines: &[&str]) -> Self {
        self.cuisines = cuisines.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_meals(mut self, meals: &[&str]) -> Self {
        self.meals = meals.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_awards(mut self, awards: &[&str]) -> Self {
        self.awards = awards.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn values(&self, attribute: LazyAttribute) -> &[String] {
        match attribute {
            LazyAttribute::Cuisine => &self.cuisines,
            LazyAttribute::Meal => &self.meals,
            LazyAttribute::Feature => &self.features,
            LazyAttribute::Award => &self.awards,
        }
    }

    /// Row of the full record query
    pub fn record_row(&self) -> Row {
        let flag = |b: bool| if b { "true" } else { "false" };
        let mut row = Row::new()
            .with(vars::RECORD, Term::uri(&self.uri))
            .with_literal(vars::NAME, &self.name)
            .with_literal(vars::ADDRESS, &self.address)
            .with_literal(vars::LAT, self.lat.to_string())
            .with_literal(vars::LON, self.lon.to_string())
            .with_literal(vars::AVG_RATING, self.rating.to_string())
            .with_literal(vars::GLUTEN_FREE, flag(self.gluten_free))
            .with_literal(vars::VEGAN_OPTIONS, flag(self.vegan))
            .with_literal(vars::VEGETARIAN_FRIENDLY, flag(self.vegetarian))
            .with_literal(vars::COUNTRY, &self.country)
            .with_literal(vars::CITY, &self.city)
            .with_literal(vars::PRICE_LEVEL, &self.price)
            .with_literal(vars::EXCELLENT_COUNT, "12")
            .with_literal(vars::VERY_GOOD_COUNT, "6")
            .with_literal(vars::AVERAGE_COUNT, "3")
            .with_literal(vars::POOR_COUNT, "1")
            .with_literal(vars::TERRIBLE_COUNT, "0")
            .with_literal(vars::FOOD, "4.5")
            .with_literal(vars::SERVICE, "4.0")
            .with_literal(vars::VALUE, "4.0")
            .with_literal(vars::ATMOSPHERE, "3.5");
        if !self.keywords.is_empty() {
            row = row.with_literal(vars::KEYWORDS, &self.keywords);
        }
        if !self.open_hours.is_empty() {
            row = row.with_literal(vars::OPEN_HOURS, &self.open_hours);
        }
        if let Some(same_as) = &self.same_as {
            row = row.with(vars::SAME_AS, Term::uri(same_as));
        }
        row
    }

    /// Row of a tag batch response, `None` when the restaurant has no tags
    pub fn tag_row(&self) -> Option<Row> {
        if LazyAttribute::ALL.iter().all(|&a| self.values(a).is_empty()) {
            return None;
        }
        let mut row = Row::new().with(vars::RECORD, Term::uri(&self.uri));
        for attribute in LazyAttribute::ALL {
            let values = self.values(attribute);
            if !values.is_empty() {
                row = row.with_literal(tag_var(attribute), values.join(TAG_SEPARATOR));
            }
        }
        Some(row)
    }
}

/// Six restaurants across three countries with mixed tags
pub fn sample_restaurants() -> Vec<Restaurant> {
    vec![
        Restaurant::new("restaurant_1", "Trattoria Milanese")
            .at(45.46, 9.19)
            .rated(4.6)
            .in_city("Italy", "Milan")
            .vegetarian()
            .with_cuisines(&["Italian", "Pizza"])
            .with_meals(&["Lunch", "Dinner"])
            .with_awards(&["Certificate of Excellence 2019"]),
        Restaurant::new("restaurant_2", "Pizzeria Napoli")
            .at(40.85, 14.27)
            .rated(3.9)
            .in_city("Italy", "Naples")
            .priced("€")
            .with_cuisines(&["Italian", "Pizza", "Neapolitan"])
            .with_meals(&["Dinner"]),
        Restaurant::new("restaurant_3", "Le Petit Zinc")
            .at(48.85, 2.33)
            .rated(4.5)
            .in_city("France", "Paris")
            .priced("€€€€")
            .gluten_free()
            .with_cuisines(&["French"])
            .with_meals(&["Dinner"])
            .with_features(&["Reservations"]),
        Restaurant::new("restaurant_4", "Burger Corner")
            .at(48.86, 2.35)
            .rated(2.4)
            .in_city("France", "Paris")
            .priced("€")
            .chain("Q38076")
            .with_cuisines(&["American", "Fast food"]),
        Restaurant::new("restaurant_5", "Casa Verde")
            .at(41.39, 2.17)
            .rated(3.5)
            .in_city("Spain", "Barcelona")
            .vegan()
            .vegetarian()
            .with_cuisines(&["Spanish", "Italian"])
            .with_meals(&["Lunch"]),
        Restaurant::new("restaurant_6", "Taberna Sin Etiquetas")
            .at(40.42, -3.70)
            .rated(3.0)
            .in_city("Spain", "Madrid"),
    ]
}

/// Full record query response
pub fn record_results(restaurants: &[Restaurant]) -> ResultSet {
    ResultSet::from_rows(
        [vars::RECORD, vars::NAME, vars::LAT, vars::LON, vars::AVG_RATING],
        restaurants.iter().map(Restaurant::record_row).collect(),
    )
}

/// Tag batch response
pub fn tag_results(restaurants: &[Restaurant]) -> ResultSet {
    let mut head = vec![vars::RECORD];
    head.extend(LazyAttribute::ALL.map(tag_var));
    ResultSet::from_rows(
        head,
        restaurants.iter().filter_map(Restaurant::tag_row).collect(),
    )
}

fn count_rows(label_var: &str, counts: impl IntoIterator<Item = (String, usize)>) -> ResultSet {
    let rows = counts
        .into_iter()
        .map(|(label, n)| {
            Row::new()
                .with_literal(label_var, label)
                .with(
                    vars::COUNT,
                    Term::typed(n.to_string(), "http://www.w3.org/2001/XMLSchema#integer"),
                )
        })
        .collect();
    ResultSet::from_rows([label_var, vars::COUNT], rows)
}

fn top_counts(restaurants: &[Restaurant], attribute: LazyAttribute, limit: usize) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in restaurants {
        let distinct: BTreeSet<&String> = r.values(attribute).iter().collect();
        for value in distinct {
            *counts.entry(value.clone()).or_default() += 1;
        }
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

/// Top cuisines response
pub fn top_cuisine_results(restaurants: &[Restaurant], limit: usize) -> ResultSet {
    count_rows(vars::CUISINE, top_counts(restaurants, LazyAttribute::Cuisine, limit))
}

/// Top meals response
pub fn top_meal_results(restaurants: &[Restaurant], limit: usize) -> ResultSet {
    count_rows(vars::MEAL, top_counts(restaurants, LazyAttribute::Meal, limit))
}

/// Rating distribution response, ordered by label like the endpoint does
pub fn rating_results(restaurants: &[Restaurant]) -> ResultSet {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in restaurants {
        let label = RatingBucket::from_rating(r.rating).label();
        *counts.entry(label.to_string()).or_default() += 1;
    }
    count_rows(vars::BUCKET, counts)
}

/// Distinct-values response for a selector
pub fn option_results(restaurants: &[Restaurant], field: CategoryField) -> ResultSet {
    let values: BTreeSet<String> = restaurants
        .iter()
        .flat_map(|r| match field.lazy_attribute() {
            Some(attribute) => r.values(attribute).to_vec(),
            None => vec![match field {
                CategoryField::Country => r.country.clone(),
                CategoryField::City => r.city.clone(),
                _ => r.price.clone(),
            }],
        })
        .collect();
    let rows = values
        .into_iter()
        .map(|v| Row::new().with_literal(vars::DISTINCT_VALUE, v))
        .collect();
    ResultSet::from_rows([vars::DISTINCT_VALUE], rows)
}

/// Holds matching queries until opened
#[derive(Debug)]
pub struct Gate(watch::Sender<bool>);

impl Gate {
    /// Release every query waiting on this gate, now and later
    pub fn open(&self) {
        self.0.send_replace(true);
    }
}

#[derive(Debug, Clone)]
struct Route {
    needle: String,
    response: Result<ResultSet, String>,
    gate: Option<watch::Receiver<bool>>,
}

/// Scriptable query service
///
/// Queries are routed to the first registered response whose needle is a
/// substring of the query text. Unrouted queries fail.
#[derive(Debug)]
pub struct FakeQueryService {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
    issued: watch::Sender<usize>,
}

impl Default for FakeQueryService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeQueryService {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            issued: watch::Sender::new(0),
        }
    }

    /// Service answering every dashboard query from `restaurants`
    pub fn for_restaurants(restaurants: &[Restaurant]) -> Self {
        let config = DashboardConfig::default();
        let service = Self::new();
        service.respond(RECORDS_QUERY, record_results(restaurants));
        service.respond(TAG_QUERY, tag_results(restaurants));
        service.respond(
            TOP_CUISINES_QUERY,
            top_cuisine_results(restaurants, config.top_cuisines),
        );
        service.respond(RATING_QUERY, rating_results(restaurants));
        service.respond(TOP_MEALS_QUERY, top_meal_results(restaurants, config.top_meals));
        for field in CategoryField::ALL {
            service.respond(&options_query(field), option_results(restaurants, field));
        }
        service
    }

    /// Answer queries containing `needle` with `results`
    ///
    /// Routes registered later for the same needle take precedence.
    pub fn respond(&self, needle: &str, results: ResultSet) {
        self.push_route(needle, Ok(results), None);
    }

    /// Fail queries containing `needle`
    pub fn fail(&self, needle: &str, message: &str) {
        self.push_route(needle, Err(message.to_string()), None);
    }

    /// Hold queries containing `needle` until the returned gate opens
    pub fn gate(&self, needle: &str) -> Gate {
        let (tx, rx) = watch::channel(false);
        let mut routes = self.routes.lock();
        if let Some(route) = routes.iter_mut().find(|r| r.needle == needle) {
            route.gate = Some(rx);
        }
        Gate(tx)
    }

    fn push_route(&self, needle: &str, response: Result<ResultSet, String>, gate: Option<watch::Receiver<bool>>) {
        self.routes.lock().insert(
            0,
            Route {
                needle: needle.to_string(),
                response,
                gate,
            },
        );
    }

    /// Every query text received, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of received queries containing `needle`
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls.lock().iter().filter(|q| q.contains(needle)).count()
    }

    /// Wait until at least `n` queries containing `needle` were received
    pub async fn wait_for_calls(&self, needle: &str, n: usize) {
        let mut rx = self.issued.subscribe();
        let _ = rx.wait_for(|_| self.calls_matching(needle) >= n).await;
    }
}

#[async_trait]
impl QueryService for FakeQueryService {
    async fn select(&self, query: &str) -> QueryResult<ResultSet> {
        self.calls.lock().push(query.to_string());
        self.issued.send_modify(|n| *n += 1);

        let route = self
            .routes
            .lock()
            .iter()
            .find(|r| query.contains(&r.needle))
            .cloned();
        let Some(route) = route else {
            return Err(QueryError::Unavailable(format!("no fake route for query: {query}")));
        };

        if let Some(mut gate) = route.gate {
            let _ = gate.wait_for(|open| *open).await;
        }
        route.response.map_err(QueryError::Unavailable)
    }
}

/// Map that records what was drawn
#[derive(Debug)]
pub struct RecordingMap {
    bounds: Mutex<Bounds>,
    placed: Mutex<Vec<MarkerPlacement>>,
    clears: Mutex<usize>,
}

impl Default for RecordingMap {
    fn default() -> Self {
        Self {
            bounds: Mutex::new(Bounds::world()),
            placed: Mutex::new(Vec::new()),
            clears: Mutex::new(0),
        }
    }
}

impl RecordingMap {
    pub fn set_bounds(&self, south_west: (f64, f64), north_east: (f64, f64)) {
        let corner = |(lat, lon): (f64, f64)| LatLon::new(lat, lon).unwrap();
        *self.bounds.lock() = Bounds::from_corners(corner(south_west), corner(north_east));
    }

    /// Markers currently on the map
    pub fn placed(&self) -> Vec<MarkerPlacement> {
        self.placed.lock().clone()
    }

    /// Names of markers currently on the map, sorted
    pub fn placed_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.placed.lock().iter().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    pub fn clear_count(&self) -> usize {
        *self.clears.lock()
    }
}

impl MapSurface for RecordingMap {
    fn bounds(&self) -> Bounds {
        *self.bounds.lock()
    }

    fn clear_markers(&self) {
        self.placed.lock().clear();
        *self.clears.lock() += 1;
    }

    fn place_marker(&self, marker: &Marker) {
        self.placed.lock().push(marker.placement());
    }
}

/// Chart renderer that records every draw
#[derive(Debug, Default)]
pub struct RecordingCharts {
    drawn: Mutex<Vec<(ChartTarget, BarChart)>>,
}

impl RecordingCharts {
    pub fn drawn(&self) -> Vec<(ChartTarget, BarChart)> {
        self.drawn.lock().clone()
    }

    /// Charts drawn into one target, oldest first
    pub fn drawn_into(&self, target: ChartTarget) -> Vec<BarChart> {
        self.drawn
            .lock()
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

impl ChartRenderer for RecordingCharts {
    fn draw(&self, target: ChartTarget, chart: &BarChart) {
        self.drawn.lock().push((target, chart.clone()));
    }
}

/// Filter form held in memory
#[derive(Debug, Default)]
pub struct MemoryControls {
    config: Mutex<FilterConfig>,
    options: Mutex<HashMap<CategoryField, Vec<SelectOption>>>,
    applied: Mutex<usize>,
}

impl MemoryControls {
    /// Change the form as a user would
    pub fn update(&self, f: impl FnOnce(&mut FilterConfig)) {
        f(&mut self.config.lock());
    }

    pub fn set(&self, config: FilterConfig) {
        *self.config.lock() = config;
    }

    /// Option list last installed for a selector
    pub fn options(&self, field: CategoryField) -> Option<Vec<SelectOption>> {
        self.options.lock().get(&field).cloned()
    }

    /// Times the whole form was overwritten
    pub fn applied_count(&self) -> usize {
        *self.applied.lock()
    }
}

impl FilterControls for MemoryControls {
    fn current(&self) -> FilterConfig {
        self.config.lock().clone()
    }

    fn apply(&self, config: &FilterConfig) {
        *self.config.lock() = config.clone();
        *self.applied.lock() += 1;
    }

    fn set_options(&self, field: CategoryField, options: &[SelectOption]) {
        self.options.lock().insert(field, options.to_vec());
    }
}

/// Dashboard wired to fakes, with handles to each of them
pub struct TestDashboard {
    pub service: Arc<FakeQueryService>,
    pub map: Arc<RecordingMap>,
    pub charts: Arc<RecordingCharts>,
    pub controls: Arc<MemoryControls>,
    pub dashboard: Arc<Dashboard>,
}

impl TestDashboard {
    /// Dashboard over `service` with default configuration
    pub fn new(service: FakeQueryService) -> Self {
        Self::with_config(DashboardConfig::default(), service)
    }

    /// Dashboard serving the sample restaurants
    pub fn sample() -> Self {
        Self::new(FakeQueryService::for_restaurants(&sample_restaurants()))
    }

    pub fn with_config(config: DashboardConfig, service: FakeQueryService) -> Self {
        let service = Arc::new(service);
        let map = Arc::new(RecordingMap::default());
        let charts = Arc::new(RecordingCharts::default());
        let controls = Arc::new(MemoryControls::default());
        let surfaces = Surfaces::new(map.clone(), charts.clone(), controls.clone());
        let dashboard = Arc::new(Dashboard::new(config, service.clone(), surfaces));
        Self {
            service,
            map,
            charts,
            controls,
            dashboard,
        }
    }
}
