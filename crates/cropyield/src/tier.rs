//! Yield tiers.
//!
//! Fixed thresholds (tons/hectare), upper bounds inclusive:
//! `> 8` excellent, `> 5` good, `> 3` moderate, otherwise below average.
//! NaN gets its own tier instead of falling through to the lowest one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualitative yield label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// More than 8 t/ha.
    Excellent,
    /// More than 5 and at most 8 t/ha.
    Good,
    /// More than 3 and at most 5 t/ha.
    Moderate,
    /// At most 3 t/ha.
    BelowAverage,
    /// The estimate was NaN.
    Invalid,
}

const EXCELLENT_ABOVE: f64 = 8.0;
const GOOD_ABOVE: f64 = 5.0;
const MODERATE_ABOVE: f64 = 3.0;

impl Tier {
    /// Classify a yield estimate.
    #[must_use]
    pub fn classify(yield_tons_per_hectare: f64) -> Self {
        let y = yield_tons_per_hectare;
        if y.is_nan() {
            Self::Invalid
        } else if y > EXCELLENT_ABOVE {
            Self::Excellent
        } else if y > GOOD_ABOVE {
            Self::Good
        } else if y > MODERATE_ABOVE {
            Self::Moderate
        } else {
            Self::BelowAverage
        }
    }

    /// Short lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::BelowAverage => "below average",
            Self::Invalid => "invalid",
        }
    }

    /// Icon shown next to the interpretation.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Excellent => "✨",
            Self::Good => "👍",
            Self::Moderate => "🔍",
            Self::BelowAverage => "⚠️",
            Self::Invalid => "❓",
        }
    }

    /// Bold headline of the interpretation.
    #[must_use]
    pub fn headline(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent yield potential!",
            Self::Good => "Good yield potential.",
            Self::Moderate => "Moderate yield potential.",
            Self::BelowAverage => "Below average yield potential.",
            Self::Invalid => "Yield could not be assessed.",
        }
    }

    /// Advice following the headline.
    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            Self::Excellent => "Your conditions are optimal for this crop.",
            Self::Good => "Consider minor adjustments for optimization.",
            Self::Moderate => "Review your farming practices for improvements.",
            Self::BelowAverage => "Consider alternative crops or significant changes.",
            Self::Invalid => "The model returned a non-numeric estimate.",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let cases = [
            (9.0, Tier::Excellent),
            (8.0, Tier::Good),
            (6.0, Tier::Good),
            (5.0, Tier::Moderate),
            (4.0, Tier::Moderate),
            (3.0, Tier::BelowAverage),
            (2.0, Tier::BelowAverage),
        ];
        for (value, expected) in cases {
            assert_eq!(Tier::classify(value), expected, "yield {value}");
        }
    }

    #[test]
    fn test_just_above_boundaries() {
        assert_eq!(Tier::classify(8.000_001), Tier::Excellent);
        assert_eq!(Tier::classify(5.000_001), Tier::Good);
        assert_eq!(Tier::classify(3.000_001), Tier::Moderate);
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(Tier::classify(f64::NAN), Tier::Invalid);
        assert_eq!(Tier::classify(f64::INFINITY), Tier::Excellent);
        assert_eq!(Tier::classify(f64::NEG_INFINITY), Tier::BelowAverage);
        assert_eq!(Tier::classify(-2.0), Tier::BelowAverage);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Tier::BelowAverage.to_string(), "below average");
        assert_eq!(Tier::Good.label(), "good");
        assert_eq!(Tier::Excellent.icon(), "✨");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Tier::BelowAverage).unwrap();
        assert_eq!(json, "\"below_average\"");
    }
}
