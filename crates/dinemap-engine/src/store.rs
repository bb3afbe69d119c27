//! Record store
//!
//! Owns every record fetched at startup. Records keep their insertion
//! position for the whole session, which is what marker identity is built on.
//! The only mutation after loading is the tag merge.

use crate::error::{EngineError, EngineResult};
use dinemap_core::{
    DashboardConfig, DietaryFlags, LatLon, MalformedRowPolicy, Record, RecordError, RecordId,
    RecordResult, ReviewCounts, ScoreBreakdown, TagSet,
};
use dinemap_query::{vars, QueryService, ResultSet, Row, SparqlQueries};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Row rejected during loading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// Zero-based row index in the response
    pub row: usize,
    /// Why it was rejected
    pub reason: String,
}

/// Outcome of the initial load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Rows in the response
    pub rows: usize,
    /// Records kept
    pub loaded: usize,
    /// Rows dropped as malformed
    pub skipped: Vec<SkippedRow>,
    /// Rows dropped because their identifier was already loaded
    pub duplicates: usize,
}

/// Outcome of a tag merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Records that had tags in the fetched batch
    pub tagged: usize,
    /// Records absent from the batch, now loaded with empty tags
    pub untagged: usize,
}

/// In-memory collection of records, keyed and ordered
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: IndexMap<RecordId, Record>,
}

impl RecordStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, rejecting duplicate identifiers
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> RecordResult<Self> {
        let mut store = Self::new();
        for record in records {
            match store.records.entry(record.id.clone()) {
                Entry::Occupied(e) => return Err(RecordError::DuplicateId(e.key().to_string())),
                Entry::Vacant(e) => {
                    e.insert(record);
                }
            }
        }
        Ok(store)
    }

    /// Fetch and parse the full record set
    pub async fn load_all(
        service: &dyn QueryService,
        queries: &SparqlQueries,
        config: &DashboardConfig,
    ) -> EngineResult<(Self, LoadReport)> {
        let results = service.select(&queries.records(config.record_limit)).await?;
        let (store, report) = Self::from_result_set(&results, config.malformed_rows)?;

        tracing::info!(
            rows = report.rows,
            loaded = report.loaded,
            skipped = report.skipped.len(),
            duplicates = report.duplicates,
            "record store loaded"
        );
        Ok((store, report))
    }

    /// Parse a record query response
    pub fn from_result_set(
        results: &ResultSet,
        policy: MalformedRowPolicy,
    ) -> EngineResult<(Self, LoadReport)> {
        let mut store = Self::new();
        let mut report = LoadReport {
            rows: results.len(),
            ..LoadReport::default()
        };

        for (index, row) in results.rows().iter().enumerate() {
            let record = match record_from_row(row) {
                Ok(record) => record,
                Err(source) => match policy {
                    MalformedRowPolicy::Abort => {
                        return Err(EngineError::MalformedRow { row: index, source })
                    }
                    MalformedRowPolicy::Skip => {
                        tracing::warn!(row = index, error = %source, "skipping malformed record row");
                        report.skipped.push(SkippedRow {
                            row: index,
                            reason: source.to_string(),
                        });
                        continue;
                    }
                },
            };

            match store.records.entry(record.id.clone()) {
                Entry::Occupied(e) => {
                    tracing::debug!(id = %e.key(), row = index, "duplicate record row ignored");
                    report.duplicates += 1;
                }
                Entry::Vacant(e) => {
                    e.insert(record);
                }
            }
        }

        report.loaded = store.len();
        Ok((store, report))
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record by identifier
    #[inline]
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    /// Record by stable position
    #[inline]
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Record> {
        self.records.get_index(index).map(|(_, r)| r)
    }

    /// Records in load order
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Records with their stable positions
    pub fn iter_indexed(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records.values().enumerate()
    }

    /// Identifiers in load order
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.keys()
    }

    /// Whether every record has its lazy attributes
    ///
    /// True for an empty store.
    #[must_use]
    pub fn all_tags_loaded(&self) -> bool {
        self.records.values().all(Record::tags_loaded)
    }

    /// Apply a fetched tag batch to every record
    ///
    /// Records missing from `fetched` receive empty tags. Every record ends up
    /// loaded. Entries for unknown identifiers are ignored.
    pub fn merge_tags(&mut self, mut fetched: HashMap<RecordId, TagSet>) -> MergeReport {
        let mut report = MergeReport::default();
        for (id, record) in &mut self.records {
            match fetched.remove(id) {
                Some(tags) => {
                    record.assign_tags(tags);
                    report.tagged += 1;
                }
                None => {
                    record.assign_tags(TagSet::loaded_empty());
                    report.untagged += 1;
                }
            }
        }
        if !fetched.is_empty() {
            tracing::debug!(unknown = fetched.len(), "tag rows for unknown records ignored");
        }
        report
    }
}

/// Typed access to one response row
struct RowReader<'a> {
    row: &'a Row,
    uri: Option<&'a str>,
}

impl<'a> RowReader<'a> {
    fn new(row: &'a Row) -> Self {
        Self {
            row,
            uri: row.value(vars::RECORD),
        }
    }

    fn text(&self, var: &'static str) -> RecordResult<&'a str> {
        self.row
            .value(var)
            .ok_or_else(|| RecordError::missing(var, self.uri))
    }

    fn optional(&self, var: &'static str) -> &'a str {
        self.row.value(var).unwrap_or_default()
    }

    fn float(&self, var: &'static str) -> RecordResult<f64> {
        let raw = self.text(var)?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RecordError::invalid_number(var, raw))
    }

    /// Non-negative integer; an all-zero fraction such as `12.0` is accepted
    fn count(&self, var: &'static str) -> RecordResult<u32> {
        let raw = self.text(var)?;
        let (whole, fraction) = raw.trim().split_once('.').unwrap_or((raw.trim(), ""));
        if !fraction.bytes().all(|b| b == b'0') {
            return Err(RecordError::invalid_number(var, raw));
        }
        whole
            .parse::<u32>()
            .map_err(|_| RecordError::invalid_number(var, raw))
    }

    fn flag(&self, var: &'static str) -> RecordResult<bool> {
        self.text(var).map(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// Parse one row of the record query
///
/// Required fields fail fast; `openHours`, `keywords` and `sameAs` default to
/// empty when unbound.
pub fn record_from_row(row: &Row) -> RecordResult<Record> {
    let r = RowReader::new(row);

    let id = r.text(vars::RECORD)?;
    let name = r.text(vars::NAME)?;
    let address = r.text(vars::ADDRESS)?;
    let position = LatLon::new(r.float(vars::LAT)?, r.float(vars::LON)?)?;

    let dietary = DietaryFlags {
        gluten_free: r.flag(vars::GLUTEN_FREE)?,
        vegan_options: r.flag(vars::VEGAN_OPTIONS)?,
        vegetarian_friendly: r.flag(vars::VEGETARIAN_FRIENDLY)?,
    };

    let reviews = ReviewCounts {
        excellent: r.count(vars::EXCELLENT_COUNT)?,
        very_good: r.count(vars::VERY_GOOD_COUNT)?,
        average: r.count(vars::AVERAGE_COUNT)?,
        poor: r.count(vars::POOR_COUNT)?,
        terrible: r.count(vars::TERRIBLE_COUNT)?,
    };

    let scores = ScoreBreakdown::new(
        r.float(vars::FOOD)?,
        r.float(vars::SERVICE)?,
        r.float(vars::VALUE)?,
        r.float(vars::ATMOSPHERE)?,
    )?;

    Ok(Record::new(id, name, address, position)
        .with_rating(r.float(vars::AVG_RATING)?)
        .with_dietary(dietary)
        .with_place(r.text(vars::COUNTRY)?, r.text(vars::CITY)?)
        .with_price_level(r.text(vars::PRICE_LEVEL)?)
        .with_open_hours(r.optional(vars::OPEN_HOURS))
        .with_keywords(r.optional(vars::KEYWORDS))
        .with_same_as(r.optional(vars::SAME_AS))
        .with_reviews(reviews)
        .with_scores(scores))
}
