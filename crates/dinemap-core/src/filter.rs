//! Filter configuration and the record filter predicate
//!
//! [`matches`] is pure: it never loads attributes. Callers resolve lazy tags
//! (see `TagLoader` in `dinemap-engine`) before evaluating selectors on
//! cuisines, meals, features or awards.

use crate::geo::Bounds;
use crate::record::{LazyAttribute, Record};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel selector value meaning "no restriction"
pub const ALL_SENTINEL: &str = "ALL";

/// One categorical selector value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selector {
    /// No restriction
    #[default]
    All,
    /// Restrict to one concrete value
    Only(String),
}

impl Selector {
    /// Parse control value; the `ALL` sentinel disables the selector
    #[must_use]
    pub fn parse(value: &str) -> Self {
        Self::from(value.to_string())
    }

    /// Whether the selector restricts anything
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Only(_))
    }

    /// Concrete value, if active
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        if value == ALL_SENTINEL {
            Self::All
        } else {
            Self::Only(value)
        }
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        match selector {
            Selector::All => ALL_SENTINEL.to_string(),
            Selector::Only(v) => v,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(ALL_SENTINEL))
    }
}

/// Categorical selector kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryField {
    Country,
    City,
    Price,
    Cuisine,
    Meal,
    Feature,
    Award,
}

impl CategoryField {
    /// Every selector, in predicate evaluation order
    pub const ALL: [CategoryField; 7] = [
        Self::Country,
        Self::City,
        Self::Price,
        Self::Cuisine,
        Self::Meal,
        Self::Feature,
        Self::Award,
    ];

    /// Data property whose values populate the selector
    #[must_use]
    pub fn property(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::City => "city",
            Self::Price => "priceLevel",
            other => other
                .lazy_attribute()
                .map_or("", LazyAttribute::property),
        }
    }

    /// Lazy attribute backing the selector, for multi-valued fields
    #[must_use]
    pub fn lazy_attribute(self) -> Option<LazyAttribute> {
        match self {
            Self::Country | Self::City | Self::Price => None,
            Self::Cuisine => Some(LazyAttribute::Cuisine),
            Self::Meal => Some(LazyAttribute::Meal),
            Self::Feature => Some(LazyAttribute::Feature),
            Self::Award => Some(LazyAttribute::Award),
        }
    }

    /// Short name used on the command line
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::City => "city",
            Self::Price => "price",
            Self::Cuisine => "cuisine",
            Self::Meal => "meal",
            Self::Feature => "feature",
            Self::Award => "award",
        }
    }
}

impl std::str::FromStr for CategoryField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown selector '{s}'"))
    }
}

/// Snapshot of every filter control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub gluten_free: bool,
    pub vegan: bool,
    pub vegetarian: bool,
    pub chain_only: bool,
    /// Inclusive rating floor
    pub min_rating: f64,
    /// Restrict to the current map viewport
    pub in_view: bool,
    pub country: Selector,
    pub city: Selector,
    pub price: Selector,
    pub cuisine: Selector,
    pub meal: Selector,
    pub feature: Selector,
    pub award: Selector,
}

impl Default for FilterConfig {
    /// Reset state: nothing restricted
    fn default() -> Self {
        Self {
            gluten_free: false,
            vegan: false,
            vegetarian: false,
            chain_only: false,
            min_rating: 0.0,
            in_view: false,
            country: Selector::All,
            city: Selector::All,
            price: Selector::All,
            cuisine: Selector::All,
            meal: Selector::All,
            feature: Selector::All,
            award: Selector::All,
        }
    }
}

impl FilterConfig {
    /// Create unrestricted configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector for a field
    #[must_use]
    pub fn selector(&self, field: CategoryField) -> &Selector {
        match field {
            CategoryField::Country => &self.country,
            CategoryField::City => &self.city,
            CategoryField::Price => &self.price,
            CategoryField::Cuisine => &self.cuisine,
            CategoryField::Meal => &self.meal,
            CategoryField::Feature => &self.feature,
            CategoryField::Award => &self.award,
        }
    }

    /// Mutable selector for a field
    pub fn selector_mut(&mut self, field: CategoryField) -> &mut Selector {
        match field {
            CategoryField::Country => &mut self.country,
            CategoryField::City => &mut self.city,
            CategoryField::Price => &mut self.price,
            CategoryField::Cuisine => &mut self.cuisine,
            CategoryField::Meal => &mut self.meal,
            CategoryField::Feature => &mut self.feature,
            CategoryField::Award => &mut self.award,
        }
    }

    /// With one selector restricted to a value
    #[must_use]
    pub fn with_selector(mut self, field: CategoryField, value: impl Into<String>) -> Self {
        *self.selector_mut(field) = Selector::from(value.into());
        self
    }

    /// With rating floor
    #[inline]
    #[must_use]
    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = min_rating;
        self
    }

    /// With viewport restriction
    #[inline]
    #[must_use]
    pub fn with_in_view(mut self, in_view: bool) -> Self {
        self.in_view = in_view;
        self
    }

    /// Lazy attributes that active selectors depend on
    #[must_use]
    pub fn needed_attributes(&self) -> Vec<LazyAttribute> {
        CategoryField::ALL
            .into_iter()
            .filter(|&f| self.selector(f).is_active())
            .filter_map(CategoryField::lazy_attribute)
            .collect()
    }
}

/// Filter predicate
///
/// `viewport` is consulted only when `config.in_view` is set; with no bounds
/// available the viewport check is skipped.
#[must_use]
pub fn matches(record: &Record, config: &FilterConfig, viewport: Option<&Bounds>) -> bool {
    if config.gluten_free && !record.dietary.gluten_free {
        return false;
    }
    if config.vegan && !record.dietary.vegan_options {
        return false;
    }
    if config.vegetarian && !record.dietary.vegetarian_friendly {
        return false;
    }
    if config.chain_only && !record.is_chain() {
        return false;
    }

    if record.avg_rating < config.min_rating {
        return false;
    }

    let selectors_pass = CategoryField::ALL.into_iter().all(|field| {
        let Some(wanted) = config.selector(field).value() else {
            return true;
        };
        match field {
            CategoryField::Country => record.country == wanted,
            CategoryField::City => record.city == wanted,
            CategoryField::Price => record.price_level == wanted,
            lazy => lazy
                .lazy_attribute()
                .is_some_and(|attr| record.tags().contains(attr, wanted)),
        }
    });
    if !selectors_pass {
        return false;
    }

    match (config.in_view, viewport) {
        (true, Some(bounds)) => bounds.contains(record.position),
        _ => true,
    }
}
