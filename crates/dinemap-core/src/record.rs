//! Restaurant record model
//!
//! A [`Record`] carries immutable identity and scalar attributes parsed once
//! from the initial full-set query, plus a [`TagSet`] of lazily loaded
//! multi-valued attributes that is filled in at most once per session.

use crate::error::{RecordError, RecordResult};
use crate::geo::LatLon;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque record identifier (the restaurant IRI)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an identifier
    #[inline]
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Dietary flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryFlags {
    /// Offers gluten-free options
    pub gluten_free: bool,
    /// Offers vegan options
    pub vegan_options: bool,
    /// Vegetarian friendly
    pub vegetarian_friendly: bool,
}

/// Review counts by category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCounts {
    pub excellent: u32,
    pub very_good: u32,
    pub average: u32,
    pub poor: u32,
    pub terrible: u32,
}

impl ReviewCounts {
    /// Total number of reviews
    #[must_use]
    pub fn total(&self) -> u64 {
        [
            self.excellent,
            self.very_good,
            self.average,
            self.poor,
            self.terrible,
        ]
        .iter()
        .map(|&n| u64::from(n))
        .sum()
    }
}

/// Per-axis score breakdown, each axis within 0..=5
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub food: f64,
    pub service: f64,
    pub value: f64,
    pub atmosphere: f64,
}

impl ScoreBreakdown {
    /// Upper bound of every score axis
    pub const MAX: f64 = 5.0;

    /// Create a breakdown, rejecting axes outside 0..=5
    pub fn new(food: f64, service: f64, value: f64, atmosphere: f64) -> RecordResult<Self> {
        for (field, v) in [
            ("food", food),
            ("service", service),
            ("value", value),
            ("atmosphere", atmosphere),
        ] {
            if !(0.0..=Self::MAX).contains(&v) {
                return Err(RecordError::ScoreOutOfRange { field, value: v });
            }
        }
        Ok(Self {
            food,
            service,
            value,
            atmosphere,
        })
    }
}

/// Multi-valued attribute fetched on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LazyAttribute {
    Cuisine,
    Meal,
    Feature,
    Award,
}

impl LazyAttribute {
    /// Every lazy attribute, in fetch order
    pub const ALL: [LazyAttribute; 4] = [Self::Cuisine, Self::Meal, Self::Feature, Self::Award];

    /// Data property holding the attribute values
    #[must_use]
    pub fn property(self) -> &'static str {
        match self {
            Self::Cuisine => "cuisines",
            Self::Meal => "meals",
            Self::Feature => "features",
            Self::Award => "awards",
        }
    }
}

/// The lazily loaded attributes of one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    pub cuisines: Vec<String>,
    pub meals: Vec<String>,
    pub features: Vec<String>,
    pub awards: Vec<String>,
    loaded: bool,
}

impl TagSet {
    /// Loaded tag set with the given values
    #[must_use]
    pub fn loaded(
        cuisines: Vec<String>,
        meals: Vec<String>,
        features: Vec<String>,
        awards: Vec<String>,
    ) -> Self {
        Self {
            cuisines,
            meals,
            features,
            awards,
            loaded: true,
        }
    }

    /// Loaded tag set for a record the data source has no tags for
    #[must_use]
    pub fn loaded_empty() -> Self {
        Self {
            loaded: true,
            ..Self::default()
        }
    }

    /// Whether the tags reflect a completed fetch
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Values of one attribute
    #[must_use]
    pub fn values(&self, attribute: LazyAttribute) -> &[String] {
        match attribute {
            LazyAttribute::Cuisine => &self.cuisines,
            LazyAttribute::Meal => &self.meals,
            LazyAttribute::Feature => &self.features,
            LazyAttribute::Award => &self.awards,
        }
    }

    /// Exact membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, attribute: LazyAttribute, value: &str) -> bool {
        self.values(attribute).iter().any(|v| v == value)
    }
}

/// One restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    pub position: LatLon,
    pub avg_rating: f64,
    pub dietary: DietaryFlags,
    pub country: String,
    pub city: String,
    pub price_level: String,
    /// Opening hours text, empty when unknown
    pub open_hours: String,
    /// Free-text keywords, empty when unknown
    pub keywords: String,
    /// Cross-reference identifier (a Wikidata entity for chains)
    pub same_as: Option<String>,
    pub reviews: ReviewCounts,
    pub scores: ScoreBreakdown,
    tags: TagSet,
}

impl Record {
    /// Create record with identity, name, address and position
    ///
    /// Remaining attributes start at their defaults; lazy tags start unloaded.
    #[must_use]
    pub fn new(
        id: impl Into<RecordId>,
        name: impl Into<String>,
        address: impl Into<String>,
        position: LatLon,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            position,
            avg_rating: 0.0,
            dietary: DietaryFlags::default(),
            country: String::new(),
            city: String::new(),
            price_level: String::new(),
            open_hours: String::new(),
            keywords: String::new(),
            same_as: None,
            reviews: ReviewCounts::default(),
            scores: ScoreBreakdown::default(),
            tags: TagSet::default(),
        }
    }

    /// With average rating
    #[inline]
    #[must_use]
    pub fn with_rating(mut self, avg_rating: f64) -> Self {
        self.avg_rating = avg_rating;
        self
    }

    /// With dietary flags
    #[inline]
    #[must_use]
    pub fn with_dietary(mut self, dietary: DietaryFlags) -> Self {
        self.dietary = dietary;
        self
    }

    /// With country and city
    #[must_use]
    pub fn with_place(mut self, country: impl Into<String>, city: impl Into<String>) -> Self {
        self.country = country.into();
        self.city = city.into();
        self
    }

    /// With price tier
    #[must_use]
    pub fn with_price_level(mut self, price_level: impl Into<String>) -> Self {
        self.price_level = price_level.into();
        self
    }

    /// With opening hours text
    #[must_use]
    pub fn with_open_hours(mut self, open_hours: impl Into<String>) -> Self {
        self.open_hours = open_hours.into();
        self
    }

    /// With keywords text
    #[must_use]
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// With cross-reference identifier; empty text means none
    #[must_use]
    pub fn with_same_as(mut self, same_as: impl Into<String>) -> Self {
        let same_as = same_as.into();
        self.same_as = (!same_as.is_empty()).then_some(same_as);
        self
    }

    /// With review counts
    #[inline]
    #[must_use]
    pub fn with_reviews(mut self, reviews: ReviewCounts) -> Self {
        self.reviews = reviews;
        self
    }

    /// With score breakdown
    #[inline]
    #[must_use]
    pub fn with_scores(mut self, scores: ScoreBreakdown) -> Self {
        self.scores = scores;
        self
    }

    /// A record is a chain iff it carries a non-empty cross-reference
    #[inline]
    #[must_use]
    pub fn is_chain(&self) -> bool {
        self.same_as.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Lazy attributes
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Whether lazy attributes have been fetched
    #[inline]
    #[must_use]
    pub fn tags_loaded(&self) -> bool {
        self.tags.is_loaded()
    }

    /// Replace lazy attributes with a fetched set
    ///
    /// Unloaded sets are ignored: once loaded, a record never goes back.
    pub fn assign_tags(&mut self, tags: TagSet) {
        if tags.is_loaded() {
            self.tags = tags;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record::new(
            "http://ltr.european-restaurants.org/restaurant_1",
            "Trattoria",
            "Via Roma 1",
            LatLon::new(45.0, 9.0).unwrap(),
        )
    }

    #[test]
    fn new_record_has_unloaded_empty_tags() {
        let r = record();
        assert!(!r.tags_loaded());
        for attr in LazyAttribute::ALL {
            assert!(r.tags().values(attr).is_empty());
        }
    }

    #[test]
    fn chain_requires_non_empty_same_as() {
        assert!(!record().is_chain());
        assert!(!record().with_same_as("").is_chain());
        assert!(record()
            .with_same_as("http://www.wikidata.org/entity/Q38076")
            .is_chain());
    }

    #[test]
    fn assign_tags_ignores_unloaded_sets() {
        let mut r = record();
        r.assign_tags(TagSet::loaded(vec!["Italian".into()], vec![], vec![], vec![]));
        assert!(r.tags_loaded());

        r.assign_tags(TagSet::default());
        assert!(r.tags_loaded());
        assert!(r.tags().contains(LazyAttribute::Cuisine, "Italian"));
    }

    #[test]
    fn tag_membership_is_exact() {
        let tags = TagSet::loaded(vec!["Italian".into()], vec![], vec![], vec![]);
        assert!(tags.contains(LazyAttribute::Cuisine, "Italian"));
        assert!(!tags.contains(LazyAttribute::Cuisine, "italian"));
        assert!(!tags.contains(LazyAttribute::Meal, "Italian"));
    }

    #[test]
    fn score_breakdown_rejects_out_of_range() {
        assert!(ScoreBreakdown::new(4.0, 4.5, 3.0, 5.0).is_ok());
        assert!(matches!(
            ScoreBreakdown::new(4.0, 5.5, 3.0, 5.0),
            Err(RecordError::ScoreOutOfRange { field: "service", .. })
        ));
        assert!(ScoreBreakdown::new(f64::NAN, 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn review_total_sums_all_categories() {
        let reviews = ReviewCounts {
            excellent: 10,
            very_good: 5,
            average: 3,
            poor: 1,
            terrible: 1,
        };
        assert_eq!(reviews.total(), 20);
    }
}
