//! Linear regression over the one-hot-encoded record.
//!
//! The artifact is JSON:
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "name": "crop-yield-linear",
//!   "target": "Yield_tons_per_hectare",
//!   "intercept": 0.0,
//!   "numeric":     { "Rainfall_mm": w, "Temperature_Celsius": w, "Days_to_Harvest": w },
//!   "boolean":     { "Fertilizer_Used": w, "Irrigation_Used": w },
//!   "categorical": { "Region": { "West": w, ... }, "Soil_Type": { ... }, ... }
//! }
//! ```
//!
//! A categorical level missing from its map is an unseen category and fails
//! the prediction, the same way a strict one-hot encoder would.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{columns, NumericField, PredictionRecord};
use crate::scorer::{Scorer, ScoringError};

/// The only artifact layout this build understands.
pub const FORMAT_VERSION: u32 = 1;

fn default_target() -> String {
    "Yield_tons_per_hectare".to_string()
}

/// Serialized form of a linear yield model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearArtifact {
    /// Layout version, must equal [`FORMAT_VERSION`].
    pub format_version: u32,
    /// Human-readable model name.
    #[serde(default)]
    pub name: String,
    /// Name of the predicted column.
    #[serde(default = "default_target")]
    pub target: String,
    /// Bias term.
    pub intercept: f64,
    /// Weight per numeric column.
    pub numeric: BTreeMap<String, f64>,
    /// Weight added when a boolean column is true.
    pub boolean: BTreeMap<String, f64>,
    /// Weight per level of each categorical column.
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

/// A validated, ready-to-score linear model.
#[derive(Debug, Clone)]
pub struct LinearYieldModel {
    name: String,
    intercept: f64,
    numeric: [(NumericField, f64); 3],
    boolean: [(&'static str, f64); 2],
    categorical: [(&'static str, BTreeMap<String, f64>); 4],
}

fn check_finite(what: &str, weight: f64) -> Result<f64> {
    if weight.is_finite() {
        Ok(weight)
    } else {
        Err(Error::model_invalid(format!("weight for {what} is not finite")))
    }
}

fn take_column<T>(map: &mut BTreeMap<String, T>, section: &str, column: &str) -> Result<T> {
    map.remove(column).ok_or_else(|| {
        Error::model_invalid(format!("{section} section is missing column {column}"))
    })
}

impl LinearYieldModel {
    /// Parse and validate an artifact from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the format version is
    /// unsupported, a column is missing, or a weight is not finite.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let artifact: LinearArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// Validate a deserialized artifact.
    ///
    /// # Errors
    ///
    /// See [`LinearYieldModel::from_json_str`].
    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self> {
        if artifact.format_version != FORMAT_VERSION {
            return Err(Error::model_invalid(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                artifact.format_version
            )));
        }

        let LinearArtifact {
            name,
            target,
            intercept,
            mut numeric,
            mut boolean,
            mut categorical,
            ..
        } = artifact;

        let intercept = check_finite("intercept", intercept)?;

        let mut numeric_weights = NumericField::ALL.map(|field| (field, 0.0));
        for (field, weight) in &mut numeric_weights {
            let column = field.column();
            *weight = check_finite(column, take_column(&mut numeric, "numeric", column)?)?;
        }

        let mut boolean_weights = columns::BOOLEAN.map(|column| (column, 0.0));
        for (column, weight) in &mut boolean_weights {
            *weight = check_finite(column, take_column(&mut boolean, "boolean", column)?)?;
        }

        let mut categorical_weights = columns::CATEGORICAL.map(|column| (column, BTreeMap::new()));
        for (column, levels) in &mut categorical_weights {
            *levels = take_column(&mut categorical, "categorical", column)?;
            if levels.is_empty() {
                return Err(Error::model_invalid(format!(
                    "categorical column {column} has no levels"
                )));
            }
            for (level, weight) in levels.iter() {
                check_finite(&format!("{column}={level}"), *weight)?;
            }
        }

        for extra in numeric
            .keys()
            .chain(boolean.keys())
            .chain(categorical.keys())
        {
            warn!(column = %extra, "ignoring column not present in the form");
        }

        debug!(name = %name, target = %target, "linear model validated");
        Ok(Self {
            name,
            intercept,
            numeric: numeric_weights,
            boolean: boolean_weights,
            categorical: categorical_weights,
        })
    }

    fn predict_row(&self, row: &PredictionRecord) -> std::result::Result<f64, ScoringError> {
        let mut y = self.intercept;

        for (field, weight) in &self.numeric {
            let value = row.numeric(*field);
            if !value.is_finite() {
                return Err(ScoringError::NonFiniteInput {
                    column: field.column(),
                });
            }
            y += weight * value;
        }

        for (column, weight) in &self.boolean {
            if row.flag(column) == Some(true) {
                y += weight;
            }
        }

        for &(column, ref levels) in &self.categorical {
            let Some(level) = row.category(column) else {
                continue;
            };
            let weight = levels
                .get(level)
                .ok_or_else(|| ScoringError::UnknownCategory {
                    column,
                    value: level.to_string(),
                })?;
            y += weight;
        }

        Ok(y)
    }
}

impl Scorer for LinearYieldModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, rows: &[PredictionRecord]) -> std::result::Result<Vec<f64>, ScoringError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}
