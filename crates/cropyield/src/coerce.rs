//! Coercion of free-text form fields into a [`PredictionRecord`].
//!
//! Malformed numbers never block a submission: the field becomes NaN and a
//! warning naming the field is recorded. Whether NaN is acceptable is up to
//! the scorer.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::record::{FormInput, NumericField, PredictionRecord};

/// A non-fatal problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputWarning {
    /// The field label shown to the user.
    pub field: &'static str,
    /// The text that failed to parse.
    pub input: String,
}

impl fmt::Display for InputWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid input for {}. Using NaN.", self.field)
    }
}

/// Parse `raw` as a float, substituting NaN on failure.
///
/// Leading and trailing whitespace is ignored. On failure exactly one
/// warning is pushed to `warnings`.
pub fn coerce_float(raw: &str, field: NumericField, warnings: &mut Vec<InputWarning>) -> f64 {
    if let Some(value) = parse_float(raw.trim()) {
        value
    } else {
        warn!(field = field.label(), input = raw, "invalid numeric input, using NaN");
        warnings.push(InputWarning {
            field: field.label(),
            input: raw.to_string(),
        });
        f64::NAN
    }
}

/// Parse a float, accepting `_` as a digit separator (`1_000.5`).
///
/// A separator must sit between two ASCII digits.
fn parse_float(text: &str) -> Option<f64> {
    if !text.contains('_') {
        return text.parse().ok();
    }

    let bytes = text.as_bytes();
    let grouped = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'_'
            || (i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
    });
    if !grouped {
        return None;
    }

    text.replace('_', "").parse().ok()
}

/// A form turned into a record, plus whatever went wrong on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    /// The record to score.
    pub record: PredictionRecord,
    /// One entry per numeric field that failed to parse.
    pub warnings: Vec<InputWarning>,
}

/// Build the record for one submission.
///
/// Each numeric field is parsed exactly once.
#[must_use]
pub fn coerce_form(form: &FormInput) -> Coerced {
    let mut warnings = Vec::new();

    let rainfall_mm = coerce_float(&form.rainfall, NumericField::Rainfall, &mut warnings);
    let temperature_celsius =
        coerce_float(&form.temperature, NumericField::Temperature, &mut warnings);
    let days_to_harvest = coerce_float(
        &form.days_to_harvest,
        NumericField::DaysToHarvest,
        &mut warnings,
    );

    let record = PredictionRecord {
        region: form.region,
        soil_type: form.soil_type,
        crop: form.crop,
        rainfall_mm,
        temperature_celsius,
        fertilizer_used: form.fertilizer_used.is_yes(),
        irrigation_used: form.irrigation_used.is_yes(),
        weather_condition: form.weather_condition,
        days_to_harvest,
    };

    Coerced { record, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Crop, Region, SoilType, Toggle, WeatherCondition};

    #[test]
    fn test_valid_numbers_parse_exactly() {
        let mut warnings = Vec::new();
        for (raw, expected) in [
            ("500", 500.0_f64),
            ("25.5", 25.5),
            ("-3", -3.0),
            ("1e3", 1000.0),
            ("0.1", 0.1),
            ("  120 ", 120.0),
        ] {
            let value = coerce_float(raw, NumericField::Rainfall, &mut warnings);
            assert_eq!(value.to_bits(), expected.to_bits(), "input {raw:?}");
        }
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_underscore_digit_grouping() {
        let mut warnings = Vec::new();
        assert_eq!(
            coerce_float("1_000", NumericField::Rainfall, &mut warnings),
            1000.0
        );
        assert_eq!(
            coerce_float("1_000.2_5", NumericField::Rainfall, &mut warnings),
            1000.25
        );
        assert!(warnings.is_empty());

        for raw in ["_1", "1_", "1__0", "1_.5", "1e_3"] {
            let value = coerce_float(raw, NumericField::Rainfall, &mut warnings);
            assert!(value.is_nan(), "input {raw:?}");
        }
        assert_eq!(warnings.len(), 5);
    }

    #[test]
    fn test_invalid_input_gives_nan_and_one_warning() {
        for raw in ["abc", "", "12mm", "1,5", "--1"] {
            let mut warnings = Vec::new();
            let value = coerce_float(raw, NumericField::Temperature, &mut warnings);
            assert!(value.is_nan(), "input {raw:?}");
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].field, "Temperature");
            assert_eq!(warnings[0].input, raw);
        }
    }

    #[test]
    fn test_nan_and_infinity_spellings_are_floats() {
        let mut warnings = Vec::new();
        assert!(coerce_float("nan", NumericField::Rainfall, &mut warnings).is_nan());
        assert_eq!(
            coerce_float("inf", NumericField::Rainfall, &mut warnings),
            f64::INFINITY
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_warning_message_names_field() {
        let warning = InputWarning {
            field: NumericField::DaysToHarvest.label(),
            input: "soon".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "Invalid input for Days to Harvest. Using NaN."
        );
    }

    #[test]
    fn test_coerce_form_builds_record() {
        let form = FormInput {
            region: Region::North,
            soil_type: SoilType::Loam,
            crop: Crop::Wheat,
            weather_condition: WeatherCondition::Sunny,
            fertilizer_used: Toggle::Yes,
            irrigation_used: Toggle::No,
            rainfall: "500".to_string(),
            temperature: "25".to_string(),
            days_to_harvest: "120".to_string(),
        };
        let coerced = coerce_form(&form);

        assert!(coerced.warnings.is_empty());
        assert_eq!(coerced.record.region, Region::North);
        assert_eq!(coerced.record.soil_type, SoilType::Loam);
        assert!(coerced.record.fertilizer_used);
        assert!(!coerced.record.irrigation_used);
        assert!((coerced.record.rainfall_mm - 500.0).abs() < f64::EPSILON);
        assert!((coerced.record.days_to_harvest - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coerce_form_warns_once_per_bad_field() {
        crate::logging::init_test_logging();
        let form = FormInput {
            rainfall: "abc".to_string(),
            days_to_harvest: "soon".to_string(),
            ..FormInput::default()
        };
        let coerced = coerce_form(&form);

        assert!(coerced.record.rainfall_mm.is_nan());
        assert!(coerced.record.days_to_harvest.is_nan());
        assert!((coerced.record.temperature_celsius - 25.0).abs() < f64::EPSILON);
        let fields: Vec<_> = coerced.warnings.iter().map(|w| w.field).collect();
        assert_eq!(fields, vec!["Rainfall", "Days to Harvest"]);
    }
}
