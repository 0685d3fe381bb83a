//! Prediction request types.
//!
//! A [`FormInput`] is what the user submitted: categorical selections plus
//! three unparsed numeric strings. A [`PredictionRecord`] is the nine-column
//! row handed to the scorer after coercion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column names of the record, as the trained model knows them.
pub mod columns {
    /// Geographical region.
    pub const REGION: &str = "Region";
    /// Primary soil type.
    pub const SOIL_TYPE: &str = "Soil_Type";
    /// Crop grown.
    pub const CROP: &str = "Crop";
    /// Average rainfall over the season, millimetres.
    pub const RAINFALL_MM: &str = "Rainfall_mm";
    /// Average temperature over the season, degrees Celsius.
    pub const TEMPERATURE_CELSIUS: &str = "Temperature_Celsius";
    /// Whether fertilizer is applied.
    pub const FERTILIZER_USED: &str = "Fertilizer_Used";
    /// Whether the field is irrigated.
    pub const IRRIGATION_USED: &str = "Irrigation_Used";
    /// Predominant weather over the season.
    pub const WEATHER_CONDITION: &str = "Weather_Condition";
    /// Days from planting to harvest.
    pub const DAYS_TO_HARVEST: &str = "Days_to_Harvest";

    /// Categorical columns.
    pub const CATEGORICAL: [&str; 4] = [REGION, SOIL_TYPE, CROP, WEATHER_CONDITION];
    /// Numeric columns.
    pub const NUMERIC: [&str; 3] = [RAINFALL_MM, TEMPERATURE_CELSIUS, DAYS_TO_HARVEST];
    /// Boolean columns.
    pub const BOOLEAN: [&str; 2] = [FERTILIZER_USED, IRRIGATION_USED];
}

/// A label that did not match any value of a categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseLabelError {
    /// Which field was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated list of accepted labels.
    pub expected: String,
}

/// Lowercase and fold `-`/`_` into spaces so `clay-loam` matches `Clay Loam`.
fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Declares a form drop-down: the enum, its display labels, and parsing.
///
/// The first variant is the form default.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $first:ident => $first_label:literal
            $(, $variant:ident => $label:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = $first_label)]
            #[doc = $first_label]
            $first,
            $(
                #[serde(rename = $label)]
                #[doc = $label]
                $variant,
            )*
        }

        impl $name {
            /// Every value, in form order.
            pub const ALL: &'static [Self] = &[Self::$first $(, Self::$variant)*];

            /// The label shown in the form and used as the model's category.
            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    Self::$first => $first_label,
                    $(Self::$variant => $label,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_label(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize_label(v.label()) == wanted)
                    .ok_or_else(|| ParseLabelError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|v| v.label())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

choice_enum! {
    /// Geographical region of the farm.
    Region, "region" {
        West => "West",
        South => "South",
        North => "North",
        East => "East",
    }
}

choice_enum! {
    /// Primary soil type of the field.
    SoilType, "soil type" {
        Sandy => "Sandy",
        Clay => "Clay",
        Loam => "Loam",
        Silt => "Silt",
        ClayLoam => "Clay Loam",
        SandyLoam => "Sandy Loam",
        Other => "Other",
    }
}

choice_enum! {
    /// Crop being planned.
    Crop, "crop" {
        Wheat => "Wheat",
        Rice => "Rice",
        Maize => "Maize",
        Potato => "Potato",
        Soybean => "Soybean",
        Cotton => "Cotton",
        Sugarcane => "Sugarcane",
        Other => "Other",
    }
}

choice_enum! {
    /// Typical weather during the growing season.
    WeatherCondition, "weather condition" {
        Sunny => "Sunny",
        Rainy => "Rainy",
        Cloudy => "Cloudy",
        Mixed => "Mixed",
    }
}

choice_enum! {
    /// A Yes/No radio button.
    Toggle, "yes/no answer" {
        Yes => "Yes",
        No => "No",
    }
}

impl Toggle {
    /// `true` for `Yes`.
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

/// The three free-text numeric fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    /// Average rainfall (mm).
    Rainfall,
    /// Average temperature (°C).
    Temperature,
    /// Days from planting to harvest.
    DaysToHarvest,
}

impl NumericField {
    /// Every numeric field, in form order.
    pub const ALL: [Self; 3] = [Self::Rainfall, Self::Temperature, Self::DaysToHarvest];

    /// Name used in user-facing warnings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Rainfall => "Rainfall",
            Self::Temperature => "Temperature",
            Self::DaysToHarvest => "Days to Harvest",
        }
    }

    /// The record column this field feeds.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Rainfall => columns::RAINFALL_MM,
            Self::Temperature => columns::TEMPERATURE_CELSIUS,
            Self::DaysToHarvest => columns::DAYS_TO_HARVEST,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A raw form submission.
///
/// Field names match the HTML form, so this deserializes directly from an
/// `application/x-www-form-urlencoded` body. Missing fields take the form
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormInput {
    /// Selected region.
    pub region: Region,
    /// Selected soil type.
    pub soil_type: SoilType,
    /// Selected crop.
    pub crop: Crop,
    /// Selected predominant weather.
    pub weather_condition: WeatherCondition,
    /// Fertilizer radio button.
    pub fertilizer_used: Toggle,
    /// Irrigation radio button.
    pub irrigation_used: Toggle,
    /// Rainfall text, unparsed.
    pub rainfall: String,
    /// Temperature text, unparsed.
    pub temperature: String,
    /// Days to harvest text, unparsed.
    pub days_to_harvest: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            region: Region::default(),
            soil_type: SoilType::default(),
            crop: Crop::default(),
            weather_condition: WeatherCondition::default(),
            fertilizer_used: Toggle::Yes,
            irrigation_used: Toggle::Yes,
            rainfall: "500".to_string(),
            temperature: "25".to_string(),
            days_to_harvest: "120".to_string(),
        }
    }
}

impl FormInput {
    /// The raw text of one numeric field.
    #[must_use]
    pub fn numeric_text(&self, field: NumericField) -> &str {
        match field {
            NumericField::Rainfall => &self.rainfall,
            NumericField::Temperature => &self.temperature,
            NumericField::DaysToHarvest => &self.days_to_harvest,
        }
    }
}

/// One row of model input.
///
/// Numeric fields are NaN when the user's text did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "Region")]
    /// Region of the farm.
    pub region: Region,
    #[serde(rename = "Soil_Type")]
    /// Soil type.
    pub soil_type: SoilType,
    #[serde(rename = "Crop")]
    /// Crop.
    pub crop: Crop,
    #[serde(rename = "Rainfall_mm")]
    /// Rainfall in millimetres, NaN if unparsed.
    pub rainfall_mm: f64,
    #[serde(rename = "Temperature_Celsius")]
    /// Temperature in °C, NaN if unparsed.
    pub temperature_celsius: f64,
    #[serde(rename = "Fertilizer_Used")]
    /// Fertilizer applied.
    pub fertilizer_used: bool,
    #[serde(rename = "Irrigation_Used")]
    /// Field irrigated.
    pub irrigation_used: bool,
    #[serde(rename = "Weather_Condition")]
    /// Predominant weather.
    pub weather_condition: WeatherCondition,
    #[serde(rename = "Days_to_Harvest")]
    /// Days to harvest, NaN if unparsed.
    pub days_to_harvest: f64,
}

impl PredictionRecord {
    /// Value of a numeric column.
    #[must_use]
    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::Rainfall => self.rainfall_mm,
            NumericField::Temperature => self.temperature_celsius,
            NumericField::DaysToHarvest => self.days_to_harvest,
        }
    }

    /// Category label of a categorical column, if `column` is one.
    #[must_use]
    pub fn category(&self, column: &str) -> Option<&'static str> {
        match column {
            columns::REGION => Some(self.region.label()),
            columns::SOIL_TYPE => Some(self.soil_type.label()),
            columns::CROP => Some(self.crop.label()),
            columns::WEATHER_CONDITION => Some(self.weather_condition.label()),
            _ => None,
        }
    }

    /// Value of a boolean column, if `column` is one.
    #[must_use]
    pub fn flag(&self, column: &str) -> Option<bool> {
        match column {
            columns::FERTILIZER_USED => Some(self.fertilizer_used),
            columns::IRRIGATION_USED => Some(self.irrigation_used),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_counts_match_form() {
        assert_eq!(Region::ALL.len(), 4);
        assert_eq!(SoilType::ALL.len(), 7);
        assert_eq!(Crop::ALL.len(), 8);
        assert_eq!(WeatherCondition::ALL.len(), 4);
    }

    #[test]
    fn test_defaults_are_first_options() {
        assert_eq!(Region::default(), Region::West);
        assert_eq!(SoilType::default(), SoilType::Sandy);
        assert_eq!(Crop::default(), Crop::Wheat);
        assert_eq!(WeatherCondition::default(), WeatherCondition::Sunny);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("North".parse::<Region>().unwrap(), Region::North);
        assert_eq!("clay loam".parse::<SoilType>().unwrap(), SoilType::ClayLoam);
        assert_eq!("sandy-loam".parse::<SoilType>().unwrap(), SoilType::SandyLoam);
        assert_eq!("SUGARCANE".parse::<Crop>().unwrap(), Crop::Sugarcane);
        assert_eq!("no".parse::<Toggle>().unwrap(), Toggle::No);
    }

    #[test]
    fn test_parse_unknown_label() {
        let err = "Tundra".parse::<Region>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("region"));
        assert!(msg.contains("Tundra"));
        assert!(msg.contains("West, South, North, East"));
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&SoilType::ClayLoam).unwrap();
        assert_eq!(json, "\"Clay Loam\"");
        let parsed: SoilType = serde_json::from_str("\"Sandy Loam\"").unwrap();
        assert_eq!(parsed, SoilType::SandyLoam);
    }

    #[test]
    fn test_form_input_defaults() {
        let form = FormInput::default();
        assert_eq!(form.region, Region::West);
        assert_eq!(form.fertilizer_used, Toggle::Yes);
        assert_eq!(form.irrigation_used, Toggle::Yes);
        assert_eq!(form.rainfall, "500");
        assert_eq!(form.temperature, "25");
        assert_eq!(form.days_to_harvest, "120");
    }

    #[test]
    fn test_form_input_partial_deserialize() {
        let form: FormInput =
            serde_json::from_str(r#"{"crop": "Rice", "rainfall": "abc"}"#).unwrap();
        assert_eq!(form.crop, Crop::Rice);
        assert_eq!(form.rainfall, "abc");
        assert_eq!(form.temperature, "25");
    }

    #[test]
    fn test_record_serializes_model_column_names() {
        let record = PredictionRecord {
            region: Region::North,
            soil_type: SoilType::Loam,
            crop: Crop::Wheat,
            rainfall_mm: 500.0,
            temperature_celsius: 25.0,
            fertilizer_used: true,
            irrigation_used: true,
            weather_condition: WeatherCondition::Sunny,
            days_to_harvest: 120.0,
        };
        let value = serde_json::to_value(record).unwrap();
        for column in columns::CATEGORICAL
            .iter()
            .chain(columns::NUMERIC.iter())
            .chain(columns::BOOLEAN.iter())
        {
            assert!(value.get(column).is_some(), "missing {column}");
        }
        assert_eq!(value["Soil_Type"], "Loam");
    }

    #[test]
    fn test_record_column_accessors() {
        let record = PredictionRecord {
            region: Region::East,
            soil_type: SoilType::Silt,
            crop: Crop::Maize,
            rainfall_mm: 1.0,
            temperature_celsius: 2.0,
            fertilizer_used: false,
            irrigation_used: true,
            weather_condition: WeatherCondition::Mixed,
            days_to_harvest: 3.0,
        };
        assert_eq!(record.category(columns::REGION), Some("East"));
        assert_eq!(record.category(columns::RAINFALL_MM), None);
        assert_eq!(record.flag(columns::FERTILIZER_USED), Some(false));
        assert_eq!(record.flag(columns::CROP), None);
        assert!((record.numeric(NumericField::Temperature) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_numeric_field_labels() {
        assert_eq!(NumericField::DaysToHarvest.label(), "Days to Harvest");
        assert_eq!(NumericField::Rainfall.column(), columns::RAINFALL_MM);
    }
}
