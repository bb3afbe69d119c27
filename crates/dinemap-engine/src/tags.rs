//! Lazy tag loading
//!
//! Multi-valued attributes are fetched for the whole store in one logical
//! fetch, the first time a filter needs them. At most one fetch is in flight;
//! requests arriving meanwhile are dropped and picked up by the render that
//! ends the running fetch.

use crate::error::EngineResult;
use crate::store::{MergeReport, RecordStore};
use dinemap_core::{LazyAttribute, RecordId, TagSet};
use dinemap_query::{tag_var, vars, QueryService, Row, SparqlQueries, TAG_SEPARATOR};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Summary of a completed tag fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagReport {
    /// Records in the store when the fetch was issued
    pub records: usize,
    /// Records that had at least one tag row
    pub tagged: usize,
    /// Query texts issued
    pub batches: usize,
}

/// What `ensure_tags_for` did
#[derive(Debug, Clone, PartialEq)]
pub enum TagLoad<R> {
    /// No active selector depends on lazy attributes
    NotNeeded,
    /// Every record already carries its tags
    AlreadyLoaded,
    /// Another fetch is running; this request was dropped
    InFlight,
    /// Tags were fetched, merged, and the render callback ran
    Fetched {
        report: TagReport,
        rendered: R,
    },
}

impl<R> TagLoad<R> {
    /// Whether this call issued network requests
    #[inline]
    #[must_use]
    pub fn fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

/// Clears the in-flight flag when dropped, including on error paths
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fetches lazy attributes with at most one request in flight
pub struct TagLoader {
    service: Arc<dyn QueryService>,
    queries: SparqlQueries,
    batch_size: usize,
    in_flight: AtomicBool,
    fetches: AtomicU64,
}

impl std::fmt::Debug for TagLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagLoader")
            .field("batch_size", &self.batch_size)
            .field("in_flight", &self.is_in_flight())
            .field("fetches", &self.fetch_count())
            .finish_non_exhaustive()
    }
}

impl TagLoader {
    /// Create loader; a zero batch size is treated as one
    pub fn new(service: Arc<dyn QueryService>, queries: SparqlQueries, batch_size: usize) -> Self {
        Self {
            service,
            queries,
            batch_size: batch_size.max(1),
            in_flight: AtomicBool::new(false),
            fetches: AtomicU64::new(0),
        }
    }

    /// Whether a fetch is currently running
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Logical fetches issued this session
    #[inline]
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Make sure `needed` attributes are present, then run `render`
    ///
    /// `render` runs only after a fetch and before the in-flight flag is
    /// cleared. On failure the store is left untouched, `render` is not
    /// called, and the flag is cleared.
    pub async fn ensure_tags_for<R>(
        &self,
        store: &RwLock<RecordStore>,
        needed: &[LazyAttribute],
        render: impl FnOnce() -> R,
    ) -> EngineResult<TagLoad<R>> {
        if needed.is_empty() {
            return Ok(TagLoad::NotNeeded);
        }

        let ids: Vec<RecordId> = {
            let store = store.read();
            if store.all_tags_loaded() {
                return Ok(TagLoad::AlreadyLoaded);
            }
            store.ids().cloned().collect()
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("tag fetch already in flight, request dropped");
            return Ok(TagLoad::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let batches = ids.len().div_ceil(self.batch_size);
        tracing::info!(records = ids.len(), batches, "fetching record tags");

        let fetched = match self.fetch_all(&ids).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(error = %e, "tag fetch failed");
                return Err(e);
            }
        };

        let MergeReport { tagged, .. } = store.write().merge_tags(fetched);
        let report = TagReport {
            records: ids.len(),
            tagged,
            batches,
        };
        tracing::info!(records = report.records, tagged, "record tags merged");

        let rendered = render();
        Ok(TagLoad::Fetched { report, rendered })
    }

    async fn fetch_all(&self, ids: &[RecordId]) -> EngineResult<HashMap<RecordId, TagSet>> {
        let mut fetched = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(self.batch_size) {
            let query = self.queries.tag_batch(chunk)?;
            let results = self.service.select(&query).await?;
            fetched.extend(results.rows().iter().filter_map(tags_from_row));
        }
        Ok(fetched)
    }
}

/// Split an aggregated tag string into trimmed, non-empty values
#[must_use]
pub fn split_tag_list(raw: &str) -> Vec<String> {
    raw.split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse one tag batch row; rows without an identifier are ignored
#[must_use]
pub fn tags_from_row(row: &Row) -> Option<(RecordId, TagSet)> {
    let id = row.value(vars::RECORD)?;
    let list = |attr| split_tag_list(row.value(tag_var(attr)).unwrap_or_default());
    let tags = TagSet::loaded(
        list(LazyAttribute::Cuisine),
        list(LazyAttribute::Meal),
        list(LazyAttribute::Feature),
        list(LazyAttribute::Award),
    );
    Some((RecordId::new(id), tags))
}
