//! HTTP API for triggering imports and polling their status
//!
//! All responses use the `ApiResponse` envelope.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::ImportError;
use crate::jobs::ImportOrchestrator;
use crate::source::SourceType;
use crate::store::ProgressStore;

/// Shared application state
#[derive(Clone)]
struct AppState {
    orchestrator: ImportOrchestrator,
    progress: Arc<dyn ProgressStore>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    };
    (status, Json(body)).into_response()
}

fn fail(status: StatusCode, error: impl ToString) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(error.to_string()),
    };
    (status, Json(body)).into_response()
}

/// POST /api/sources/{source}/import
async fn trigger_handler(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    match source.parse::<SourceType>() {
        Ok(source) => respond(StatusCode::ACCEPTED, state.orchestrator.trigger(source)),
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

/// GET /api/imports/{id}
async fn status_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return fail(StatusCode::NOT_FOUND, format!("Import job not found: {}", id));
    };

    match state.orchestrator.get_status(id) {
        Ok(job) => respond(StatusCode::OK, job),
        Err(e @ ImportError::JobNotFound(_)) => fail(StatusCode::NOT_FOUND, e),
        Err(e) => {
            log::error!("Status lookup for job {} failed: {}", id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// GET /api/imports
async fn list_handler(State(state): State<AppState>) -> Response {
    respond(StatusCode::OK, state.orchestrator.list_jobs())
}

/// GET /api/sources/{source}/progress
async fn progress_handler(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    let source = match source.parse::<SourceType>() {
        Ok(source) => source,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e),
    };

    match state.progress.read(source) {
        Ok(Some(checkpoint)) => respond(StatusCode::OK, checkpoint),
        Ok(None) => fail(
            StatusCode::NOT_FOUND,
            format!("No import progress recorded for {}", source),
        ),
        Err(e) => {
            log::error!("Checkpoint read for {} failed: {}", source, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// Build the web server router
pub fn create_router(orchestrator: ImportOrchestrator, progress: Arc<dyn ProgressStore>) -> Router {
    let state = AppState {
        orchestrator,
        progress,
    };

    Router::new()
        .route("/api/sources/{source}/import", post(trigger_handler))
        .route("/api/sources/{source}/progress", get(progress_handler))
        .route("/api/imports", get(list_handler))
        .route("/api/imports/{id}", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
pub async fn serve(
    orchestrator: ImportOrchestrator,
    progress: Arc<dyn ProgressStore>,
    port: u16,
) -> std::io::Result<()> {
    let app = create_router(orchestrator, progress);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Import API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
