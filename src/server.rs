//! HTTP server for the query service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/query/` | Answer a natural-language query |
//! | `POST` | `/llm/` | Alias of `/query/` used by the consultation frontend |
//! | `GET`  | `/personas/{id}` | Fetch one stored persona |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Query contract
//!
//! Request body `{"query": "..."}`. On success:
//!
//! ```json
//! { "answer": "...", "relevant_data": [{ "primer_nombre": "Maria", ... }] }
//! ```
//!
//! `relevant_data` is `null` when no persona matched. Every failure uses the
//! same envelope, `{"detail": "..."}`: 422 for a malformed body, 404 for an
//! unknown persona, 500 for any store or generation failure.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser frontend
//! can call the service directly.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use personas_core::{QueryOutcome, Record};

use crate::config::Config;
use crate::services::Services;

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let services = Services::from_config(config).await?;
    let pipeline = services.pipeline();
    tracing::info!(
        bind = %config.server.bind,
        generator = %pipeline.generator_name(),
        cap = pipeline.options().cap,
        strategy = ?pipeline.options().strategy,
        "query service listening"
    );
    let app = router(services);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router over already-constructed services.
pub fn router(services: Services) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/query/", post(handle_query))
        .route("/llm/", post(handle_query))
        .route("/personas/{id}", get(handle_get_persona))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(services)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

struct AppError {
    status: StatusCode,
    detail: String,
}

impl AppError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

// ============ POST /query/ ============

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

async fn handle_query(
    State(services): State<Services>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryOutcome>, AppError> {
    let Json(request) =
        body.map_err(|e| AppError::new(StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;

    tracing::info!(query = %request.query, "query received");

    match services.pipeline().handle(&request.query).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "query failed");
            Err(AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ))
        }
    }
}

// ============ GET /personas/{id} ============

async fn handle_get_persona(
    State(services): State<Services>,
    Path(id): Path<String>,
) -> Result<Json<Record>, AppError> {
    match services.store().get_by_id(&id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(AppError::new(StatusCode::NOT_FOUND, "Persona no encontrada")),
        Err(e) => {
            tracing::error!(error = %e, id = %id, "persona lookup failed");
            Err(AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ))
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
