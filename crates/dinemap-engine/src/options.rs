//! Selector option lists

use crate::error::EngineResult;
use crate::surface::SelectOption;
use dinemap_core::CategoryField;
use dinemap_query::{vars, QueryService, ResultSet, SparqlQueries};
use std::collections::BTreeSet;

/// Option list for a selector: "ALL" first, then sorted distinct values
///
/// Blank values are dropped. Values are kept verbatim so a selected option
/// compares equal to the record attribute it came from.
#[must_use]
pub fn options_from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<SelectOption> {
    let distinct: BTreeSet<&str> = values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .collect();

    std::iter::once(SelectOption::all())
        .chain(distinct.into_iter().map(SelectOption::plain))
        .collect()
}

/// Option list from a distinct-values response
#[must_use]
pub fn options_from_results(results: &ResultSet) -> Vec<SelectOption> {
    options_from_values(results.rows().iter().filter_map(|r| r.value(vars::DISTINCT_VALUE)))
}

/// Fetch the option list of one selector
pub async fn load_options(
    field: CategoryField,
    service: &dyn QueryService,
    queries: &SparqlQueries,
) -> EngineResult<Vec<SelectOption>> {
    let results = service.select(&queries.distinct_values(field)).await?;
    let options = options_from_results(&results);
    tracing::debug!(selector = field.name(), options = options.len(), "selector options loaded");
    Ok(options)
}
