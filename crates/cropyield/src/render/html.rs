//! The prediction page, rendered with Askama templates from `templates/`.
//!
//! Templates escape every interpolated value, so submitted text is safe to
//! echo back into the form.

use askama::Template;

use crate::history::HistoryEntry;
use crate::model::ModelHandle;
use crate::predict::{Submission, RETRY_HINT};
use crate::record::{Crop, FormInput, NumericField, Region, SoilType, Toggle, WeatherCondition};

use super::{GROWING_CONDITIONS, SOIL_HEALTH_TIPS};

/// Everything one page render needs.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Values the form is filled with.
    pub form: &'a FormInput,
    /// Model state, for the load banner and the sidebar.
    pub model: &'a ModelHandle,
    /// The submission being answered, if any.
    pub submission: Option<&'a Submission>,
    /// Stored predictions for the sidebar.
    pub recent: &'a [HistoryEntry],
    /// Whether a history store is configured.
    pub history_enabled: bool,
}

/// One `<option>` or radio button.
struct ChoiceOption {
    value: &'static str,
    selected: bool,
}

/// A drop-down, or a Yes/No radio pair when `radio` is set.
struct ChoiceField {
    name: &'static str,
    label: &'static str,
    hint: &'static str,
    radio: bool,
    options: Vec<ChoiceOption>,
}

/// A free-text numeric input, echoing what was submitted.
struct NumberField {
    name: &'static str,
    label: &'static str,
    hint: &'static str,
    value: String,
}

struct SummaryCell {
    label: &'static str,
    value: String,
}

struct PredictionView {
    yield_text: String,
    tier_class: String,
    icon: &'static str,
    headline: &'static str,
    advice: &'static str,
    timestamp: String,
}

/// Everything shown below the form after a submission.
struct ResultView {
    warnings: Vec<String>,
    summary: Vec<SummaryCell>,
    prediction: Option<PredictionView>,
    failure: Option<String>,
}

struct RecentRow {
    crop: &'static str,
    region: &'static str,
    yield_text: String,
}

struct Expander {
    title: &'static str,
    items: Vec<&'static str>,
}

struct Sidebar {
    history_enabled: bool,
    recent: Vec<RecentRow>,
    expanders: Vec<Expander>,
}

#[derive(Template)]
#[template(path = "pages/predict.html")]
struct PredictPage {
    load_error: Option<String>,
    choices: Vec<ChoiceField>,
    numbers: Vec<NumberField>,
    result: Option<ResultView>,
    retry_hint: &'static str,
    sidebar: Option<Sidebar>,
}

/// Render the whole page.
///
/// # Errors
///
/// Returns the template engine's error if rendering fails.
pub fn render_page(view: &PageView<'_>) -> askama::Result<String> {
    let page = PredictPage {
        load_error: view.model.load_error().map(str::to_string),
        choices: choice_fields(view.form),
        numbers: number_fields(view.form),
        result: view.submission.and_then(result_view),
        retry_hint: RETRY_HINT,
        sidebar: view
            .model
            .is_ready()
            .then(|| sidebar(view.recent, view.history_enabled)),
    };
    page.render()
}

fn options<T: Copy + PartialEq>(
    all: &[T],
    current: T,
    label: impl Fn(T) -> &'static str,
) -> Vec<ChoiceOption> {
    all.iter()
        .map(|&value| ChoiceOption {
            value: label(value),
            selected: value == current,
        })
        .collect()
}

fn choice_fields(form: &FormInput) -> Vec<ChoiceField> {
    vec![
        ChoiceField {
            name: "region",
            label: "Region",
            hint: "Select the geographical region of your farm",
            radio: false,
            options: options(Region::ALL, form.region, Region::label),
        },
        ChoiceField {
            name: "weather_condition",
            label: "Predominant Weather",
            hint: "Select the typical weather condition during growing season",
            radio: false,
            options: options(WeatherCondition::ALL, form.weather_condition, WeatherCondition::label),
        },
        ChoiceField {
            name: "soil_type",
            label: "Soil Type",
            hint: "Select the primary soil type of your field",
            radio: false,
            options: options(SoilType::ALL, form.soil_type, SoilType::label),
        },
        ChoiceField {
            name: "fertilizer_used",
            label: "Fertilizer Used",
            hint: "Will you use fertilizer?",
            radio: true,
            options: options(Toggle::ALL, form.fertilizer_used, Toggle::label),
        },
        ChoiceField {
            name: "crop",
            label: "Crop Type",
            hint: "Select the crop you're planning to grow",
            radio: false,
            options: options(Crop::ALL, form.crop, Crop::label),
        },
        ChoiceField {
            name: "irrigation_used",
            label: "Irrigation Used",
            hint: "Will you use irrigation?",
            radio: true,
            options: options(Toggle::ALL, form.irrigation_used, Toggle::label),
        },
    ]
}

fn number_fields(form: &FormInput) -> Vec<NumberField> {
    NumericField::ALL
        .iter()
        .map(|&field| {
            let (name, label, hint) = match field {
                NumericField::Rainfall => (
                    "rainfall",
                    "Average Rainfall (mm)",
                    "Expected average rainfall during the growing season",
                ),
                NumericField::Temperature => (
                    "temperature",
                    "Average Temperature (°C)",
                    "Expected average temperature during the growing season",
                ),
                NumericField::DaysToHarvest => (
                    "days_to_harvest",
                    "Days to Harvest",
                    "Expected number of days from planting to harvest",
                ),
            };
            NumberField {
                name,
                label,
                hint,
                value: form.numeric_text(field).to_string(),
            }
        })
        .collect()
}

fn result_view(submission: &Submission) -> Option<ResultView> {
    let Submission::Processed {
        summary,
        warnings,
        outcome,
        ..
    } = submission
    else {
        return None;
    };

    let (prediction, failure) = match outcome {
        Ok(prediction) => (
            Some(PredictionView {
                yield_text: prediction.yield_display(),
                tier_class: prediction.tier.label().replace(' ', "-"),
                icon: prediction.tier.icon(),
                headline: prediction.tier.headline(),
                advice: prediction.tier.advice(),
                timestamp: prediction.timestamp_display(),
            }),
            None,
        ),
        Err(failure) => (None, Some(failure.to_string())),
    };

    Some(ResultView {
        warnings: warnings.iter().map(ToString::to_string).collect(),
        summary: summary
            .rows
            .iter()
            .map(|(label, value)| SummaryCell {
                label: *label,
                value: value.clone(),
            })
            .collect(),
        prediction,
        failure,
    })
}

fn sidebar(recent: &[HistoryEntry], history_enabled: bool) -> Sidebar {
    Sidebar {
        history_enabled,
        recent: recent
            .iter()
            .map(|entry| RecentRow {
                crop: entry.record.crop.label(),
                region: entry.record.region.label(),
                yield_text: super::short_yield(entry.yield_tons_per_hectare),
            })
            .collect(),
        expanders: vec![
            Expander {
                title: "Optimal Growing Conditions",
                items: GROWING_CONDITIONS.to_vec(),
            },
            Expander {
                title: "Soil Health Tips",
                items: SOIL_HEALTH_TIPS.to_vec(),
            },
        ],
    }
}
