//! The scoring seam.
//!
//! Anything that can turn records into yield estimates implements
//! [`Scorer`]. The web form and the CLI only ever see this trait, so tests
//! can swap in a stub for the trained model.

use thiserror::Error;

use crate::record::PredictionRecord;

/// Why a scoring call failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// A numeric input was NaN or infinite.
    #[error("input column '{column}' is not a finite number")]
    NonFiniteInput {
        /// The offending column.
        column: &'static str,
    },

    /// A categorical value the model was not trained on.
    #[error("found unknown category '{value}' in column '{column}' during prediction")]
    UnknownCategory {
        /// The categorical column.
        column: &'static str,
        /// The unseen level.
        value: String,
    },

    /// The scorer returned no predictions.
    #[error("model returned no predictions")]
    EmptyOutput,

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

impl ScoringError {
    /// Create a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// A trained model that predicts yield in tons per hectare.
///
/// Implementations must be read-only after construction; a single instance
/// is shared across all requests.
pub trait Scorer: Send + Sync {
    /// Name of the model (for logging and the health endpoint).
    fn name(&self) -> &str;

    /// Score a batch of rows, returning one estimate per row.
    ///
    /// # Errors
    ///
    /// Returns a [`ScoringError`] if any row cannot be scored.
    fn predict(&self, rows: &[PredictionRecord]) -> Result<Vec<f64>, ScoringError>;
}

/// Score a single record and take the first estimate.
///
/// # Errors
///
/// Propagates the scorer's error, or [`ScoringError::EmptyOutput`] if it
/// returned nothing.
pub fn score_one(scorer: &dyn Scorer, record: &PredictionRecord) -> Result<f64, ScoringError> {
    let predictions = scorer.predict(std::slice::from_ref(record))?;
    predictions
        .first()
        .copied()
        .ok_or(ScoringError::EmptyOutput)
}
