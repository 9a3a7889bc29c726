//! HTTP front end: `POST /generate_caption` and `GET /health`.
//!
//! Decoding is CPU-bound and synchronous, so each request runs it on the
//! blocking thread pool and the async runtime keeps accepting connections.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::Captioner;

/// Error message for requests without an `image_id`.
pub const MISSING_IMAGE_ID: &str = "No image ID provided.";

/// Message returned for ids with no stored features.
pub const IMAGE_NOT_FOUND: &str = "Image not found.";

/// Shared state handed to every handler.
pub struct AppState {
    pub captioner: Arc<Captioner>,
    /// Report unknown ids as a 200 caption instead of a 404 error.
    pub legacy_not_found_caption: bool,
}

impl AppState {
    pub fn new(captioner: Arc<Captioner>) -> Self {
        Self {
            captioner,
            legacy_not_found_caption: false,
        }
    }

    pub fn with_legacy_not_found_caption(mut self, enabled: bool) -> Self {
        self.legacy_not_found_caption = enabled;
        self
    }
}

/// Body of `POST /generate_caption`.
#[derive(Debug, Deserialize)]
pub struct CaptionRequest {
    pub image_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate_caption", post(generate_caption))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

/// Serve the router on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Caption server listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handler for `POST /generate_caption`.
pub async fn generate_caption(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CaptionRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected caption request: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let Some(image_id) = request.image_id else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_IMAGE_ID);
    };

    tracing::debug!(image_id = %image_id, "Caption requested");
    let start = std::time::Instant::now();

    let captioner = Arc::clone(&state.captioner);
    let id = image_id.clone();
    let result = tokio::task::spawn_blocking(move || captioner.caption(&id)).await;

    match result {
        Ok(Ok(caption)) => {
            tracing::info!(
                image_id = %image_id,
                steps = caption.steps,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Generated caption"
            );
            Json(CaptionResponse {
                caption: caption.text(),
            })
            .into_response()
        }
        Ok(Err(e)) if e.is_not_found() => {
            tracing::warn!("{}", e);
            if state.legacy_not_found_caption {
                Json(CaptionResponse {
                    caption: IMAGE_NOT_FOUND.to_string(),
                })
                .into_response()
            } else {
                error_response(StatusCode::NOT_FOUND, IMAGE_NOT_FOUND)
            }
        }
        Ok(Err(e)) => {
            tracing::error!(image_id = %image_id, error = %e, "Caption generation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            tracing::error!(image_id = %image_id, error = %e, "Caption task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Caption task failed: {e}"),
            )
        }
    }
}

/// Handler for `GET /health`.
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "images": state.captioner.features().len(),
    }))
}
