//! `cropyield` - Crop yield prediction form backed by a pre-trained regression model
//!
//! This library collects farm conditions from a form, coerces them into the
//! record the model expects, scores the record, and classifies the estimate
//! into a qualitative tier.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod coerce;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod model;
pub mod predict;
pub mod record;
pub mod render;
pub mod scorer;
pub mod tier;
pub mod web;

pub use coerce::{coerce_form, InputWarning};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::ModelHandle;
pub use predict::{Prediction, Predictor, Submission};
pub use record::{FormInput, PredictionRecord};
pub use scorer::{Scorer, ScoringError};
pub use tier::Tier;
pub use web::{create_router, AppState};
