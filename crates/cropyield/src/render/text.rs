//! Plain-text output for the terminal.

use std::fmt::Write;

use crate::history::HistoryEntry;
use crate::model::ModelHandle;
use crate::predict::{Submission, RETRY_HINT};

/// Format a processed submission the way the page shows it.
#[must_use]
pub fn submission(submission: &Submission) -> String {
    let mut out = String::new();

    match submission {
        Submission::Disabled { reason } => {
            let _ = writeln!(out, "Failed to load model: {reason}");
        }
        Submission::Processed {
            summary,
            warnings,
            outcome,
            ..
        } => {
            for warning in warnings {
                let _ = writeln!(out, "⚠️ {warning}");
            }

            out.push_str("Your Input Summary\n");
            let width = summary
                .rows
                .iter()
                .map(|(label, _)| label.len())
                .max()
                .unwrap_or(0);
            for (label, value) in &summary.rows {
                let _ = writeln!(out, "  {label:<width$}  {value}");
            }
            out.push('\n');

            match outcome {
                Ok(prediction) => {
                    let _ = writeln!(out, "Predicted Yield: {}", prediction.yield_display());
                    let _ = writeln!(
                        out,
                        "{} {} {}",
                        prediction.tier.icon(),
                        prediction.tier.headline(),
                        prediction.tier.advice()
                    );
                    let _ = writeln!(out, "{}", prediction.timestamp_display());
                }
                Err(failure) => {
                    let _ = writeln!(out, "❌ {failure}");
                    let _ = writeln!(out, "{RETRY_HINT}");
                }
            }
        }
    }

    out
}

/// Format stored predictions as a table, newest first, out of `total` stored.
#[must_use]
pub fn history(entries: &[HistoryEntry], total: i64) -> String {
    if entries.is_empty() {
        return "No predictions recorded.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<19}  {:<10}  {:<6}  {:>14}  {}",
        "PREDICTED AT", "CROP", "REGION", "YIELD", "TIER"
    );
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<19}  {:<10}  {:<6}  {:>14}  {}",
            entry
                .predicted_at
                .with_timezone(&chrono::Local)
                .format(crate::predict::TIMESTAMP_FORMAT),
            entry.record.crop.label(),
            entry.record.region.label(),
            format!("{} tons/ha", super::short_yield(entry.yield_tons_per_hectare)),
            entry.tier().label()
        );
    }
    let _ = writeln!(out, "\nShowing {} of {total} predictions", entries.len());
    out
}

/// Describe the model handle for `model info`.
#[must_use]
pub fn model_info(model: &ModelHandle) -> String {
    let mut out = String::new();
    match model {
        ModelHandle::Ready { info, .. } => {
            out.push_str("Status:      loaded\n");
            let _ = writeln!(out, "Name:        {}", info.name);
            if let Some(path) = &info.path {
                let _ = writeln!(out, "Path:        {}", path.display());
            }
            if let Some(fingerprint) = &info.fingerprint {
                let _ = writeln!(out, "Fingerprint: {fingerprint}");
            }
        }
        ModelHandle::Unavailable { reason } => {
            out.push_str("Status:      unavailable\n");
            let _ = writeln!(out, "Error:       {reason}");
        }
    }
    out
}
