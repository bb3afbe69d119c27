//! Four-bucket rating scale used for marker colors and the rating histogram

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rating bucket
///
/// Lower three buckets are half-open `[lo, hi)`; the top bucket is `>= 4.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingBucket {
    /// `< 2.5`
    Low,
    /// `[2.5, 3.5)`
    Fair,
    /// `[3.5, 4.5)`
    Good,
    /// `>= 4.5`
    Excellent,
}

impl RatingBucket {
    /// Buckets in ascending order
    pub const ALL: [RatingBucket; 4] = [Self::Low, Self::Fair, Self::Good, Self::Excellent];

    /// Classify a rating
    #[must_use]
    pub fn from_rating(rating: f64) -> Self {
        if rating < 2.5 {
            Self::Low
        } else if rating < 3.5 {
            Self::Fair
        } else if rating < 4.5 {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    /// Marker color
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#D2042D",
            Self::Fair => "#FF4500",
            Self::Good => "#318CE7",
            Self::Excellent => "#9400D3",
        }
    }

    /// Label used by the rating-distribution query
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "<2.5",
            Self::Fair => "2.5-3.5",
            Self::Good => "3.5-4.5",
            Self::Excellent => ">=4.5",
        }
    }
}

impl fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unknown bucket label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rating bucket: '{0}'")]
pub struct UnknownBucket(pub String);

impl FromStr for RatingBucket {
    type Err = UnknownBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.label() == s)
            .ok_or_else(|| UnknownBucket(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundaries_fall_in_upper_bucket() {
        assert_eq!(RatingBucket::from_rating(2.4999), RatingBucket::Low);
        assert_eq!(RatingBucket::from_rating(2.5), RatingBucket::Fair);
        assert_eq!(RatingBucket::from_rating(3.5), RatingBucket::Good);
        assert_eq!(RatingBucket::from_rating(4.4999), RatingBucket::Good);
        assert_eq!(RatingBucket::from_rating(4.5), RatingBucket::Excellent);
        assert_eq!(RatingBucket::from_rating(5.0), RatingBucket::Excellent);
    }

    #[test]
    fn labels_parse_back() {
        for bucket in RatingBucket::ALL {
            assert_eq!(bucket.label().parse::<RatingBucket>(), Ok(bucket));
        }
        assert!("4-5".parse::<RatingBucket>().is_err());
    }

    #[test]
    fn colors_are_distinct() {
        let mut colors: Vec<_> = RatingBucket::ALL.iter().map(|b| b.color()).collect();
        colors.dedup();
        assert_eq!(colors.len(), 4);
    }

    proptest! {
        #[test]
        fn bucket_is_monotonic(a in 0.0f64..5.0, b in 0.0f64..5.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(RatingBucket::from_rating(lo) <= RatingBucket::from_rating(hi));
        }
    }
}
