//! The process-wide model handle.
//!
//! The model is loaded exactly once at startup. If loading fails the handle
//! remembers why and scoring stays disabled for the life of the process;
//! there is no retry.

pub mod linear;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::scorer::Scorer;

pub use linear::{LinearArtifact, LinearYieldModel};

/// Where a loaded model came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model name from the artifact.
    pub name: String,
    /// Artifact path, if loaded from disk.
    pub path: Option<PathBuf>,
    /// BLAKE3 hex digest of the artifact bytes.
    pub fingerprint: Option<String>,
}

/// A loaded scorer, or the reason there isn't one.
#[derive(Clone)]
pub enum ModelHandle {
    /// Scoring is available.
    Ready {
        /// The shared, read-only scorer.
        scorer: Arc<dyn Scorer>,
        /// Provenance.
        info: ModelInfo,
    },
    /// Loading failed; scoring is disabled.
    Unavailable {
        /// User-facing failure reason.
        reason: String,
    },
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready { info, .. } => f.debug_struct("Ready").field("info", info).finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Read and validate a linear model artifact from disk.
///
/// # Errors
///
/// Returns [`Error::ModelLoad`] if the file cannot be read or parsed, or
/// [`Error::ModelInvalid`] if its contents are unusable.
pub fn load_linear(path: &Path) -> Result<(LinearYieldModel, ModelInfo)> {
    let bytes = std::fs::read(path).map_err(|e| Error::model_load(path, e.to_string()))?;
    let fingerprint = blake3::hash(&bytes).to_hex().to_string();

    let text = std::str::from_utf8(&bytes)
        .map_err(|e| Error::model_load(path, format!("artifact is not UTF-8: {e}")))?;
    let model = LinearYieldModel::from_json_str(text).map_err(|e| match e {
        Error::Json(json) => Error::model_load(path, json.to_string()),
        other => other,
    })?;

    let info = ModelInfo {
        name: model.name().to_string(),
        path: Some(path.to_path_buf()),
        fingerprint: Some(fingerprint),
    };
    Ok((model, info))
}

/// The load failure as shown to the user, minus the error's own
/// "failed to load model" prefix.
fn load_failure_reason(path: &Path, err: Error) -> String {
    match err {
        Error::ModelLoad { path, message } => format!("{}: {message}", path.display()),
        Error::ModelInvalid { message } => format!("{}: {message}", path.display()),
        other => other.to_string(),
    }
}

impl ModelHandle {
    /// Load the model at `path`, recording the failure instead of returning it.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match load_linear(path) {
            Ok((model, info)) => {
                info!(
                    name = %info.name,
                    path = %path.display(),
                    fingerprint = info.fingerprint.as_deref().unwrap_or(""),
                    "model loaded"
                );
                Self::Ready {
                    scorer: Arc::new(model),
                    info,
                }
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load model, prediction disabled");
                Self::Unavailable {
                    reason: load_failure_reason(path, e),
                }
            }
        }
    }

    /// Wrap an already constructed scorer.
    #[must_use]
    pub fn ready(scorer: Arc<dyn Scorer>) -> Self {
        let info = ModelInfo {
            name: scorer.name().to_string(),
            path: None,
            fingerprint: None,
        };
        Self::Ready { scorer, info }
    }

    /// A handle whose load failed.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// The scorer, if loading succeeded.
    #[must_use]
    pub fn scorer(&self) -> Option<&dyn Scorer> {
        match self {
            Self::Ready { scorer, .. } => Some(scorer.as_ref()),
            Self::Unavailable { .. } => None,
        }
    }

    /// Provenance of the loaded model.
    #[must_use]
    pub fn info(&self) -> Option<&ModelInfo> {
        match self {
            Self::Ready { info, .. } => Some(info),
            Self::Unavailable { .. } => None,
        }
    }

    /// Why loading failed, if it did.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        match self {
            Self::Ready { .. } => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }

    /// Whether scoring is available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PredictionRecord;
    use crate::scorer::ScoringError;

    struct Constant;

    impl Scorer for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, rows: &[PredictionRecord]) -> std::result::Result<Vec<f64>, ScoringError> {
            Ok(vec![1.0; rows.len()])
        }
    }

    fn bundled_artifact() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../models/crop_yield_model.json")
    }

    #[test]
    fn test_load_missing_file_is_unavailable() {
        let handle = ModelHandle::load(Path::new("/nonexistent/model.json"));
        assert!(!handle.is_ready());
        assert!(handle.scorer().is_none());
        assert!(handle.info().is_none());
        assert!(handle.load_error().unwrap().contains("/nonexistent/model.json"));
    }

    #[test]
    fn test_load_garbage_file_is_unavailable() {
        let path = std::env::temp_dir().join(format!("cropyield-garbage-{}.json", std::process::id()));
        std::fs::write(&path, b"not a model").unwrap();

        let handle = ModelHandle::load(&path);
        let _ = std::fs::remove_file(&path);

        assert!(!handle.is_ready());
        let reason = handle.load_error().unwrap();
        assert!(reason.starts_with(&path.display().to_string()));
        assert!(!reason.to_lowercase().contains("failed to load model"));
    }

    #[test]
    fn test_invalid_artifact_reason_names_path() {
        let path = std::env::temp_dir().join(format!("cropyield-v9-{}.json", std::process::id()));
        std::fs::write(
            &path,
            br#"{"format_version": 9, "intercept": 0.0, "numeric": {}, "boolean": {}, "categorical": {}}"#,
        )
        .unwrap();

        let handle = ModelHandle::load(&path);
        let _ = std::fs::remove_file(&path);

        let reason = handle.load_error().unwrap();
        assert!(reason.starts_with(&path.display().to_string()));
        assert!(reason.contains("unsupported format_version 9"));
    }

    #[test]
    fn test_load_bundled_artifact() {
        let handle = ModelHandle::load(&bundled_artifact());
        assert!(handle.is_ready(), "{:?}", handle.load_error());

        let info = handle.info().unwrap();
        assert_eq!(info.fingerprint.as_ref().map(String::len), Some(64));
        assert!(info.path.is_some());
    }

    #[test]
    fn test_ready_wraps_scorer() {
        let handle = ModelHandle::ready(Arc::new(Constant));
        assert!(handle.is_ready());
        assert_eq!(handle.info().unwrap().name, "constant");
        assert!(handle.load_error().is_none());
    }

    #[test]
    fn test_debug_hides_scorer() {
        let handle = ModelHandle::unavailable("boom");
        let debug_str = format!("{handle:?}");
        assert!(debug_str.contains("Unavailable"));
        assert!(debug_str.contains("boom"));
    }
}
