use std::sync::Arc;
use std::time::Duration;

use autodoc_core::CalendarError;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Json, Redirect};
use axum::routing::get;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

use crate::assignment::create_assignment_router;
use crate::calendar::create_calendar_router;
use crate::config::Config;
use crate::references::ReferenceCache;
use crate::schedule::create_schedule_router;
use crate::store::{ExternalStore, HttpStore};

pub mod api;
pub mod lenient;

/// State shared by every handler. The reference cache is the only piece of
/// cross-request state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExternalStore>,
    pub references: Arc<ReferenceCache>,
}

impl AppState {
    pub fn new(store: Arc<dyn ExternalStore>, reference_ttl: Option<Duration>) -> Self {
        let references = Arc::new(ReferenceCache::new(store.clone(), reference_ttl));
        Self { store, references }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Custom error type for page handlers.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("Invalid date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            WebError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Calendar(_) | WebError::InvalidDate { .. } => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            tracing::error!(error = ?self, "Failed to render page");
        } else {
            tracing::warn!(error = %self, "Rejected page request");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Assembles every route of the application.
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_check_handler))
        .merge(create_calendar_router(state.clone()))
        .merge(create_schedule_router(state.clone()))
        .merge(create_assignment_router(state))
        .merge(api::create_api_docs_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn ExternalStore> = Arc::new(HttpStore::from_config(&config)?);
    let state = AppState::new(store, config.reference_ttl());
    let app = create_app_router(state);

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!(
        store = %config.api_base_url,
        "Web server running on http://{}",
        server_address
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument]
pub async fn index_handler() -> Redirect {
    Redirect::to("/calendar")
}
