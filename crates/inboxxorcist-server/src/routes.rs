//! HTTP routes and handlers

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use inboxxorcist_core::{BatchResult, ClassificationResult, MailboxIngestionResult, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::config::CorsConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Service version reported by `/` and `/health`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Multipart field carrying the mailbox archive
const UPLOAD_FIELD: &str = "file";

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/predict", post(predict_email))
        .route("/api/predict/batch", post(predict_batch))
        .route("/api/predict/mbox", post(predict_mbox))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn root() -> impl IntoResponse {
    metrics::counter!("inboxxorcist_requests_total", "endpoint" => "root").increment(1);
    Json(json!({
        "message": "Spam Email Detection API",
        "version": VERSION,
        "endpoints": {
            "/health": "Health check",
            "/api/predict": "Single email prediction (POST)",
            "/api/predict/batch": "Batch email prediction (POST)",
            "/api/predict/mbox": "MBOX file prediction (POST, multipart field 'file')",
            "/metrics": "Prometheus metrics",
        }
    }))
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<String>,
    version: &'static str,
    timestamp: String,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("inboxxorcist_requests_total", "endpoint" => "health").increment(1);
    let status = state.service.status();

    Json(HealthResponse {
        status: if status.healthy { "healthy" } else { "unhealthy" },
        model_loaded: status.backend_loaded,
        backend: status.backend,
        version: VERSION,
        timestamp: status.timestamp,
    })
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

/// Single email request
#[derive(Debug, Deserialize)]
struct EmailRequest {
    email_text: String,
}

/// Batch request
#[derive(Debug, Deserialize)]
struct BatchEmailRequest {
    emails: Vec<String>,
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn predict_email(
    State(state): State<AppState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, AppError> {
    metrics::counter!("inboxxorcist_requests_total", "endpoint" => "predict").increment(1);
    state.service.ensure_available().map_err(AppError::email)?;
    let Json(req) = payload.map_err(|e| AppError::email(malformed_request(e)))?;

    let result = state
        .service
        .classify_one(&req.email_text)
        .await
        .map_err(AppError::email)?;

    info!(
        prediction = %result.label,
        confidence = result.confidence,
        "Email classified"
    );
    Ok(Json(result))
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn predict_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchEmailRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, AppError> {
    metrics::counter!("inboxxorcist_requests_total", "endpoint" => "batch").increment(1);
    state.service.ensure_available().map_err(AppError::batch)?;
    let Json(req) = payload.map_err(|e| AppError::batch(malformed_request(e)))?;

    let batch = state
        .service
        .classify_batch(&req.emails)
        .await
        .map_err(AppError::batch)?;

    info!(
        total = batch.total(),
        spam = batch.positive_count(),
        "Batch classified"
    );
    Ok(Json(batch))
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn predict_mbox(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MailboxIngestionResult>, AppError> {
    metrics::counter!("inboxxorcist_requests_total", "endpoint" => "mbox").increment(1);
    state.service.ensure_available().map_err(AppError::mailbox)?;
    let mut multipart = multipart
        .map_err(|e| AppError::mailbox(ValidationError::MalformedUpload(e.body_text())))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::mailbox(ValidationError::MalformedUpload(e.body_text())))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        info!(%filename, "Received mailbox upload");

        let result = state
            .ingestor
            .classify_mailbox(field, &filename)
            .await
            .map_err(AppError::mailbox)?;
        return Ok(Json(result));
    }

    Err(AppError::mailbox(ValidationError::MissingUpload))
}

fn malformed_request(rejection: JsonRejection) -> ValidationError {
    ValidationError::MalformedRequest(rejection.body_text())
}
