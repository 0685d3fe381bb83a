//! One form submission, end to end.
//!
//! [`Predictor`] owns the model handle and the optional history. Given a
//! [`FormInput`] it coerces the numeric fields, scores the record, classifies
//! the estimate and, when history is on, records the result. Everything the
//! page needs to render comes back as a [`Submission`].

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::coerce::{coerce_form, InputWarning};
use crate::config::Config;
use crate::history::{History, HistoryEntry};
use crate::model::ModelHandle;
use crate::record::{FormInput, PredictionRecord};
use crate::scorer::score_one;
use crate::tier::Tier;

/// Shown under every scoring failure.
pub const RETRY_HINT: &str = "Please ensure all inputs are valid and try again.";

/// Timestamp layout for "Prediction made on ...".
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A float as a summary cell: finite values always carry a fractional part
/// or a signed two-digit exponent (`500.0`, `0.1`, `1e+20`, `1e-07`).
fn float_text(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let text = format!("{value:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// The "Your Input Summary" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    /// `(label, value)` pairs in display order.
    pub rows: Vec<(&'static str, String)>,
}

impl InputSummary {
    /// Summarize a coerced record.
    #[must_use]
    pub fn from_record(record: &PredictionRecord) -> Self {
        let days = if record.days_to_harvest.is_finite() {
            format!("{}", record.days_to_harvest.trunc())
        } else {
            format!("{}", record.days_to_harvest)
        };

        Self {
            rows: vec![
                ("Region", record.region.label().to_string()),
                ("Crop", record.crop.label().to_string()),
                ("Soil Type", record.soil_type.label().to_string()),
                ("Rainfall", format!("{} mm", float_text(record.rainfall_mm))),
                (
                    "Temperature",
                    format!("{} °C", float_text(record.temperature_celsius)),
                ),
                ("Days to Harvest", days),
            ],
        }
    }

    /// Value of the row with `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// A successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The estimate.
    pub yield_tons_per_hectare: f64,
    /// Its tier.
    pub tier: Tier,
    /// When it was made, local time.
    pub predicted_at: DateTime<Local>,
}

impl Prediction {
    /// `"{y:.2} tons/hectare"`.
    #[must_use]
    pub fn yield_display(&self) -> String {
        format!("{:.2} tons/hectare", self.yield_tons_per_hectare)
    }

    /// `"Prediction made on YYYY-mm-dd HH:MM:SS"`.
    #[must_use]
    pub fn timestamp_display(&self) -> String {
        format!(
            "Prediction made on {}",
            self.predicted_at.format(TIMESTAMP_FORMAT)
        )
    }
}

/// A scoring call that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringFailure {
    /// The scorer's message.
    pub message: String,
}

impl fmt::Display for ScoringFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prediction failed: {}", self.message)
    }
}

/// What happened to a submitted form.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The model never loaded, nothing was computed.
    Disabled {
        /// The load failure.
        reason: String,
    },
    /// The form was coerced and scored.
    Processed {
        /// The record handed to the scorer.
        record: PredictionRecord,
        /// The input summary table.
        summary: InputSummary,
        /// One entry per numeric field that fell back to NaN.
        warnings: Vec<InputWarning>,
        /// The estimate, or why there isn't one.
        outcome: Result<Prediction, ScoringFailure>,
    },
}

impl Submission {
    /// The prediction, if one was made.
    #[must_use]
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::Processed {
                outcome: Ok(prediction),
                ..
            } => Some(prediction),
            _ => None,
        }
    }
}

/// Serves predictions for the form and the CLI.
#[derive(Debug)]
pub struct Predictor {
    model: ModelHandle,
    history: Option<Mutex<History>>,
    recent_limit: usize,
    max_entries: Option<usize>,
}

impl Predictor {
    /// A predictor without history.
    #[must_use]
    pub fn new(model: ModelHandle) -> Self {
        Self {
            model,
            history: None,
            recent_limit: 3,
            max_entries: None,
        }
    }

    /// Record successful predictions to `history`.
    ///
    /// `max_entries` of `None` keeps everything.
    #[must_use]
    pub fn with_history(
        mut self,
        history: History,
        recent_limit: usize,
        max_entries: Option<usize>,
    ) -> Self {
        self.history = Some(Mutex::new(history));
        self.recent_limit = recent_limit;
        self.max_entries = max_entries;
        self
    }

    /// Load the configured model and, if enabled, open the history store.
    ///
    /// A history store that cannot be opened is logged and left off; the
    /// form keeps working without it.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let predictor = Self::new(ModelHandle::load(&config.model.path));
        if !config.history.enabled {
            return predictor;
        }

        match History::open(config.database_path()) {
            Ok(history) => predictor.with_history(
                history,
                config.history.recent_limit,
                config.max_history_entries(),
            ),
            Err(e) => {
                error!(error = %e, "failed to open prediction history, continuing without it");
                predictor
            }
        }
    }

    /// The model handle.
    #[must_use]
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Whether history is enabled.
    #[must_use]
    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    /// Number of entries the sidebar shows.
    #[must_use]
    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Process one submitted form, timestamped now.
    #[must_use]
    pub fn submit(&self, form: &FormInput) -> Submission {
        self.submit_at(form, Local::now())
    }

    /// Process one submitted form with an explicit timestamp.
    #[must_use]
    pub fn submit_at(
        &self,
        form: &FormInput,
        now: DateTime<Local>,
    ) -> Submission {
        let Some(scorer) = self.model.scorer() else {
            let reason = self.model.load_error().unwrap_or_default().to_string();
            debug!("submission ignored, model unavailable");
            return Submission::Disabled { reason };
        };

        let coerced = coerce_form(form);
        let record = coerced.record;
        let summary = InputSummary::from_record(&record);

        let outcome = match score_one(scorer, &record) {
            Ok(yield_tons_per_hectare) => {
                let tier = Tier::classify(yield_tons_per_hectare);
                info!(
                    crop = %record.crop,
                    region = %record.region,
                    yield_tons_per_hectare,
                    tier = tier.label(),
                    "prediction made"
                );
                self.record_history(&record, yield_tons_per_hectare, now, scorer.name());
                Ok(Prediction {
                    yield_tons_per_hectare,
                    tier,
                    predicted_at: now,
                })
            }
            Err(e) => {
                warn!(error = %e, "prediction failed");
                Err(ScoringFailure {
                    message: e.to_string(),
                })
            }
        };

        Submission::Processed {
            record,
            summary,
            warnings: coerced.warnings,
            outcome,
        }
    }

    /// The newest `limit` stored predictions; empty when history is off or
    /// unreadable.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let Some(history) = &self.history else {
            return Vec::new();
        };
        let Ok(history) = history.lock() else {
            error!("history lock poisoned");
            return Vec::new();
        };

        history.recent(limit).unwrap_or_else(|e| {
            error!(error = %e, "failed to read prediction history");
            Vec::new()
        })
    }

    fn record_history(
        &self,
        record: &PredictionRecord,
        yield_tons_per_hectare: f64,
        now: DateTime<Local>,
        model_name: &str,
    ) {
        let Some(history) = &self.history else {
            return;
        };
        let Ok(history) = history.lock() else {
            error!("history lock poisoned, prediction not recorded");
            return;
        };

        let at = now.with_timezone(&Utc);
        if let Err(e) = history.append(record, yield_tons_per_hectare, at, model_name) {
            error!(error = %e, "failed to record prediction");
            return;
        }

        if let Some(max) = self.max_entries {
            if let Err(e) = history.prune_keep_recent(max) {
                error!(error = %e, "failed to prune prediction history");
            }
        }
    }
}
