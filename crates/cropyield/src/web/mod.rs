//! HTTP front end for the prediction form.
//!
//! Routes:
//! - `GET /`: the empty form
//! - `POST /predict`: a submitted form, answered with the same page
//! - `GET /health`: JSON status including the model state

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::predict::{Predictor, Submission};
use crate::record::FormInput;
use crate::render::{render_page, PageView};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The predictor every request goes through.
    pub predictor: Arc<Predictor>,
}

impl AppState {
    /// Wrap a predictor.
    #[must_use]
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
        }
    }
}

/// Build the router with all routes and request tracing.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `address` and serve until the process is stopped.
///
/// # Errors
///
/// Returns [`Error::ServerBind`] if the address cannot be bound, or an I/O
/// error if the server fails while running.
pub async fn serve(address: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| Error::ServerBind {
            address: address.to_string(),
            source,
        })?;

    let local = listener.local_addr()?;
    info!("Serving crop yield form on http://{}", local);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Render the page for `form`, reading recent history for the sidebar.
///
/// Scoring and history access hold a `Mutex` and run `SQLite` queries, so
/// callers run this on the blocking pool.
fn page(predictor: &Predictor, form: &FormInput, submission: Option<&Submission>) -> String {
    let recent = if predictor.model().is_ready() {
        predictor.recent(predictor.recent_limit())
    } else {
        Vec::new()
    };

    render_page(&PageView {
        form,
        model: predictor.model(),
        submission,
        recent: &recent,
        history_enabled: predictor.has_history(),
    })
    .unwrap_or_else(|e| format!("Template error: {e}"))
}

async fn index(State(state): State<AppState>) -> Response {
    let predictor = state.predictor.clone();
    let html = tokio::task::spawn_blocking(move || page(&predictor, &FormInput::default(), None))
        .await;
    page_response(html)
}

async fn predict(State(state): State<AppState>, Form(form): Form<FormInput>) -> Response {
    let predictor = state.predictor.clone();
    let html = tokio::task::spawn_blocking(move || {
        let submission = predictor.submit(&form);
        page(&predictor, &form, Some(&submission))
    })
    .await;
    page_response(html)
}

fn page_response(html: std::result::Result<String, JoinError>) -> Response {
    match html {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Page task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Task join error: {e}"),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct ModelStatus {
    loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    model: ModelStatus,
    timestamp: String,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let model = state.predictor.model();
    let loaded = model.is_ready();

    let body = Health {
        status: if loaded { "healthy" } else { "degraded" },
        model: ModelStatus {
            loaded,
            name: model.info().map(|info| info.name.clone()),
            error: model.load_error().map(str::to_string),
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let code = if loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body))
}
