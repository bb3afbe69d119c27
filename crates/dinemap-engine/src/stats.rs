//! Statistics panels

use crate::charts::{Bar, BarChart, StatPanel};
use crate::error::EngineResult;
use dinemap_core::{DashboardConfig, RatingBucket};
use dinemap_query::{vars, QueryService, ResultSet, Row, SparqlQueries};

/// Query text for a panel
#[must_use]
pub fn panel_query(panel: StatPanel, queries: &SparqlQueries, config: &DashboardConfig) -> String {
    match panel {
        StatPanel::TopCuisines => queries.top_cuisines(config.top_cuisines),
        StatPanel::RatingDistribution => queries.rating_distribution(),
        StatPanel::TopMeals => queries.top_meals(config.top_meals),
    }
}

/// Turn a panel response into a chart
#[must_use]
pub fn panel_chart(panel: StatPanel, results: &ResultSet) -> BarChart {
    match panel {
        StatPanel::TopCuisines => top_n_chart(results, vars::CUISINE),
        StatPanel::RatingDistribution => rating_chart(results),
        StatPanel::TopMeals => top_n_chart(results, vars::MEAL),
    }
}

/// Fetch one panel
pub async fn load_panel(
    panel: StatPanel,
    service: &dyn QueryService,
    queries: &SparqlQueries,
    config: &DashboardConfig,
) -> EngineResult<BarChart> {
    let results = service.select(&panel_query(panel, queries, config)).await?;
    let chart = panel_chart(panel, &results);
    tracing::debug!(panel = %panel, bars = chart.bars.len(), "statistics panel loaded");
    Ok(chart)
}

fn count(row: &Row) -> Option<f64> {
    row.value(vars::COUNT)
        .and_then(|n| n.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n >= 0.0)
}

/// Label/count rows in response order; rows missing either are skipped
#[must_use]
pub fn top_n_chart(results: &ResultSet, label_var: &str) -> BarChart {
    let bars = results
        .rows()
        .iter()
        .filter_map(|row| Some(Bar::new(row.value(label_var)?, count(row)?)))
        .collect();
    BarChart::auto(bars)
}

/// Rating histogram in bucket order; missing buckets count zero
#[must_use]
pub fn rating_chart(results: &ResultSet) -> BarChart {
    let mut counts = [0.0_f64; 4];
    for row in results.rows() {
        let Some(label) = row.value(vars::BUCKET) else {
            continue;
        };
        let Ok(bucket) = label.parse::<RatingBucket>() else {
            tracing::debug!(label, "unknown rating bucket ignored");
            continue;
        };
        if let Some(n) = count(row) {
            counts[bucket as usize] += n;
        }
    }

    let bars = RatingBucket::ALL
        .into_iter()
        .zip(counts)
        .map(|(bucket, n)| Bar::new(bucket.label(), n))
        .collect();
    BarChart::auto(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dinemap_query::QueryResult;
    use pretty_assertions::assert_eq;

    struct Canned(ResultSet);

    #[async_trait]
    impl QueryService for Canned {
        async fn select(&self, query: &str) -> QueryResult<ResultSet> {
            assert!(query.contains("LIMIT 3"), "unexpected query: {query}");
            Ok(self.0.clone())
        }
    }

    fn pair(label_var: &str, label: &str, n: &str) -> Row {
        Row::new()
            .with_literal(label_var, label)
            .with_literal(vars::COUNT, n)
    }

    #[test]
    fn top_n_keeps_response_order() {
        let results = ResultSet::from_rows(
            ["cuisine", "n"],
            vec![
                pair(vars::CUISINE, "Italian", "120"),
                pair(vars::CUISINE, "French", "80"),
                Row::new().with_literal(vars::CUISINE, "Broken"),
            ],
        );
        let chart = top_n_chart(&results, vars::CUISINE);
        assert_eq!(chart.bars, vec![Bar::new("Italian", 120.0), Bar::new("French", 80.0)]);
    }

    #[test]
    fn rating_buckets_in_fixed_order_with_zero_fill() {
        let results = ResultSet::from_rows(
            ["bucket", "n"],
            vec![
                pair(vars::BUCKET, ">=4.5", "10"),
                pair(vars::BUCKET, "2.5-3.5", "4"),
                pair(vars::BUCKET, "mystery", "99"),
            ],
        );
        let chart = rating_chart(&results);
        assert_eq!(
            chart.bars,
            vec![
                Bar::new("<2.5", 0.0),
                Bar::new("2.5-3.5", 4.0),
                Bar::new("3.5-4.5", 0.0),
                Bar::new(">=4.5", 10.0),
            ]
        );
    }

    #[test]
    fn empty_response_gives_empty_top_n() {
        let results = ResultSet::from_rows(["meal", "n"], Vec::new());
        assert!(top_n_chart(&results, vars::MEAL).is_empty());
        assert_eq!(rating_chart(&results).bars.len(), 4);
    }

    #[test]
    fn load_panel_uses_configured_limit() {
        let service = Canned(ResultSet::from_rows(
            ["meal", "n"],
            vec![pair(vars::MEAL, "Dinner", "42")],
        ));
        let config = DashboardConfig {
            top_meals: 3,
            ..DashboardConfig::default()
        };

        let chart = tokio_test::block_on(load_panel(
            StatPanel::TopMeals,
            &service,
            &SparqlQueries::new(),
            &config,
        ))
        .unwrap();

        assert_eq!(chart.bars, vec![Bar::new("Dinner", 42.0)]);
    }
}
