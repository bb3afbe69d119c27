//! Bar chart data and typed drawing targets

use crate::marker::MarkerId;
use dinemap_core::{ReviewCounts, ScoreBreakdown};
use serde::Serialize;
use std::fmt;

/// How bar lengths are normalised
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "max")]
pub enum ChartScale {
    /// Longest bar spans the full width; an all-zero chart uses 1
    Auto,
    /// Fixed upper bound
    Fixed(f64),
}

/// One labelled bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

impl Bar {
    /// Create bar
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Horizontal bar chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub bars: Vec<Bar>,
    pub scale: ChartScale,
}

impl BarChart {
    /// Auto-scaled chart
    #[must_use]
    pub fn auto(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            scale: ChartScale::Auto,
        }
    }

    /// Chart on a fixed scale
    #[must_use]
    pub fn fixed(bars: Vec<Bar>, max: f64) -> Self {
        Self {
            bars,
            scale: ChartScale::Fixed(max),
        }
    }

    /// Value mapped to a full-width bar
    #[must_use]
    pub fn max_value(&self) -> f64 {
        match self.scale {
            ChartScale::Fixed(max) => max,
            ChartScale::Auto => {
                let max = self.bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
                if max > 0.0 {
                    max
                } else {
                    1.0
                }
            }
        }
    }

    /// Bar length as a fraction of the full width, clamped to 0..=1
    #[must_use]
    pub fn fraction(&self, bar: &Bar) -> f64 {
        let max = self.max_value();
        if max > 0.0 {
            (bar.value / max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether there is nothing to draw ("No data")
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Review counts, auto-scaled
#[must_use]
pub fn reviews_chart(reviews: &ReviewCounts) -> BarChart {
    BarChart::auto(vec![
        Bar::new("excellent", f64::from(reviews.excellent)),
        Bar::new("veryGood", f64::from(reviews.very_good)),
        Bar::new("average", f64::from(reviews.average)),
        Bar::new("poor", f64::from(reviews.poor)),
        Bar::new("terrible", f64::from(reviews.terrible)),
    ])
}

/// Score breakdown on the fixed 0 to 5 scale
#[must_use]
pub fn scores_chart(scores: &ScoreBreakdown) -> BarChart {
    BarChart::fixed(
        vec![
            Bar::new("food", scores.food),
            Bar::new("service", scores.service),
            Bar::new("value", scores.value),
            Bar::new("atmosphere", scores.atmosphere),
        ],
        ScoreBreakdown::MAX,
    )
}

/// Marker detail surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailSurface {
    /// Shown on hover
    Tooltip,
    /// Shown on click
    Popup,
}

/// Chart slot within a detail surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSlot {
    Reviews,
    Scores,
}

impl ChartSlot {
    /// Heading shown above the chart
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Reviews => "Reviews",
            Self::Scores => "Scores",
        }
    }
}

/// Statistics panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatPanel {
    TopCuisines,
    RatingDistribution,
    TopMeals,
}

impl StatPanel {
    pub const ALL: [StatPanel; 3] = [Self::TopCuisines, Self::RatingDistribution, Self::TopMeals];

    /// Panel heading
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::TopCuisines => "Top cuisines",
            Self::RatingDistribution => "Rating distribution",
            Self::TopMeals => "Top meals",
        }
    }
}

impl fmt::Display for StatPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Where a chart is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartTarget {
    /// A chart slot inside one marker's tooltip or popup
    Marker {
        marker: MarkerId,
        surface: DetailSurface,
        slot: ChartSlot,
    },
    /// A statistics panel
    Statistics(StatPanel),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_scale_uses_largest_bar() {
        let chart = reviews_chart(&ReviewCounts {
            excellent: 40,
            very_good: 10,
            average: 0,
            poor: 2,
            terrible: 0,
        });
        assert_eq!(chart.max_value(), 40.0);
        assert_eq!(chart.fraction(&chart.bars[1]), 0.25);
        assert_eq!(
            chart.bars.iter().map(|b| b.label.as_str()).collect::<Vec<_>>(),
            vec!["excellent", "veryGood", "average", "poor", "terrible"]
        );
    }

    #[test]
    fn all_zero_reviews_scale_to_one() {
        let chart = reviews_chart(&ReviewCounts::default());
        assert_eq!(chart.max_value(), 1.0);
        assert!(chart.bars.iter().all(|b| chart.fraction(b) == 0.0));
    }

    #[test]
    fn scores_use_fixed_scale() {
        let chart = scores_chart(&ScoreBreakdown::new(2.5, 5.0, 1.0, 0.0).unwrap());
        assert_eq!(chart.scale, ChartScale::Fixed(5.0));
        assert_eq!(chart.fraction(&chart.bars[0]), 0.5);
        assert_eq!(chart.fraction(&chart.bars[1]), 1.0);
    }

    #[test]
    fn empty_chart() {
        assert!(BarChart::auto(Vec::new()).is_empty());
    }
}
