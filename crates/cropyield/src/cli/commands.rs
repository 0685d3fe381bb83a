//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::record::{Crop, FormInput, Region, SoilType, Toggle, WeatherCondition};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Interface to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Predict command arguments.
///
/// Every field defaults to the form's initial value.
#[derive(Debug, Args)]
pub struct PredictCommand {
    /// Geographical region of the farm
    #[arg(long, default_value_t = Region::West)]
    pub region: Region,

    /// Primary soil type of the field
    #[arg(long, default_value_t = SoilType::Sandy)]
    pub soil_type: SoilType,

    /// Crop being planned
    #[arg(long, default_value_t = Crop::Wheat)]
    pub crop: Crop,

    /// Predominant weather during the growing season
    #[arg(long, default_value_t = WeatherCondition::Sunny)]
    pub weather: WeatherCondition,

    /// Fertilizer used (yes or no)
    #[arg(long, default_value_t = Toggle::Yes)]
    pub fertilizer: Toggle,

    /// Irrigation used (yes or no)
    #[arg(long, default_value_t = Toggle::Yes)]
    pub irrigation: Toggle,

    /// Average rainfall in mm (invalid numbers become NaN)
    #[arg(long, default_value = "500", allow_hyphen_values = true)]
    pub rainfall: String,

    /// Average temperature in °C (invalid numbers become NaN)
    #[arg(long, default_value = "25", allow_hyphen_values = true)]
    pub temperature: String,

    /// Days from planting to harvest (invalid numbers become NaN)
    #[arg(long, default_value = "120", allow_hyphen_values = true)]
    pub days_to_harvest: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl PredictCommand {
    /// The form these arguments describe.
    #[must_use]
    pub fn to_form(&self) -> FormInput {
        FormInput {
            region: self.region,
            soil_type: self.soil_type,
            crop: self.crop,
            weather_condition: self.weather,
            fertilizer_used: self.fertilizer,
            irrigation_used: self.irrigation,
            rainfall: self.rainfall.clone(),
            temperature: self.temperature.clone(),
            days_to_harvest: self.days_to_harvest.clone(),
        }
    }
}

/// Model commands.
#[derive(Debug, Subcommand)]
pub enum ModelCommand {
    /// Show the configured model's status and provenance
    Info {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Load the model and exit non-zero if it cannot be used
    Check,
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Number of predictions to show (defaults to `history.recent_limit`)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict_defaults() -> PredictCommand {
        PredictCommand {
            region: Region::West,
            soil_type: SoilType::Sandy,
            crop: Crop::Wheat,
            weather: WeatherCondition::Sunny,
            fertilizer: Toggle::Yes,
            irrigation: Toggle::Yes,
            rainfall: "500".to_string(),
            temperature: "25".to_string(),
            days_to_harvest: "120".to_string(),
            json: false,
        }
    }

    #[test]
    fn test_default_arguments_match_form_defaults() {
        assert_eq!(predict_defaults().to_form(), FormInput::default());
    }

    #[test]
    fn test_to_form_copies_text_verbatim() {
        let cmd = PredictCommand {
            rainfall: " abc ".to_string(),
            irrigation: Toggle::No,
            ..predict_defaults()
        };
        let form = cmd.to_form();
        assert_eq!(form.rainfall, " abc ");
        assert_eq!(form.irrigation_used, Toggle::No);
    }
}
