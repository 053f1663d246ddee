use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::task;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::gateway::{DisabledGateway, WhatsAppGateway};
use crate::pipeline::{ChorePipeline, PipelineError, ResultRecord};

use super::config::ServiceConfig;
use super::state::AppState;
use super::BoxError;

pub async fn run_server(
    config: ServiceConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), BoxError> {
    std::fs::create_dir_all(&config.upload_dir)?;

    let host: IpAddr = config
        .host
        .parse()
        .map_err(|_| format!("invalid host: {}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    let upload_max_bytes = config.upload_max_bytes;

    let state = AppState {
        config: Arc::new(config),
    };

    info!("chore reminder service listening on {}", addr);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/upload", post(upload_roster))
        .route("/preview", post(preview_roster))
        .route("/send", post(send_reminders))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(upload_max_bytes));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Accept a roster upload (multipart `file` field), replace the current
/// roster, and respond with a dry-run preview of today's reminders.
/// POST /upload
async fn upload_roster(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut uploaded = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => match field.bytes().await {
                Ok(bytes) => {
                    uploaded = Some(bytes);
                    break;
                }
                Err(err) => {
                    error!("failed to read roster upload: {}", err);
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": "failed to read uploaded file"})),
                    );
                }
            },
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "malformed multipart body"})),
                );
            }
        }
    }

    let Some(bytes) = uploaded else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No file uploaded"})),
        );
    };

    let roster_path = state.config.latest_roster_path();
    if let Err(err) = std::fs::write(&roster_path, &bytes) {
        error!("failed to store roster at {}: {}", roster_path.display(), err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "failed to store uploaded roster"})),
        );
    }
    info!("roster replaced ({} bytes)", bytes.len());

    run_pipeline(state, true).await
}

/// Dry-run the pipeline against the most recent upload.
/// POST /preview
async fn preview_roster(State(state): State<AppState>) -> impl IntoResponse {
    if !state.config.latest_roster_path().exists() {
        return no_roster_uploaded();
    }
    run_pipeline(state, true).await
}

/// Send today's reminders for real against the most recent upload.
/// POST /send
async fn send_reminders(State(state): State<AppState>) -> impl IntoResponse {
    if !state.config.latest_roster_path().exists() {
        return no_roster_uploaded();
    }
    if state.config.twilio_config().is_none() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "messaging gateway not configured (missing Twilio credentials)"})),
        );
    }
    run_pipeline(state, false).await
}

fn no_roster_uploaded() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "No uploaded file found. Please upload first."})),
    )
}

async fn run_pipeline(state: AppState, dry_run: bool) -> (StatusCode, Json<serde_json::Value>) {
    let config = state.config.clone();
    let joined = task::spawn_blocking(move || run_pipeline_blocking(&config, dry_run)).await;

    match joined {
        Ok(Ok(records)) => (StatusCode::OK, Json(json!(records))),
        Ok(Err(err)) => pipeline_error_response(err),
        Err(err) => {
            error!("pipeline task failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "pipeline task failed"})),
            )
        }
    }
}

fn run_pipeline_blocking(
    config: &ServiceConfig,
    dry_run: bool,
) -> Result<Vec<ResultRecord>, PipelineError> {
    let roster_path = config.latest_roster_path();
    let composer = config.composer();
    let log = config.delivery_log();

    match (dry_run, config.twilio_config()) {
        (false, Some(twilio)) => ChorePipeline::new(composer, WhatsAppGateway::new(twilio), log)
            .run_path(&roster_path, false, None),
        (dry_run, _) => ChorePipeline::new(composer, DisabledGateway, log)
            .run_path(&roster_path, dry_run, None),
    }
}

fn pipeline_error_response(err: PipelineError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        PipelineError::Roster(_) | PipelineError::MissingColumn { .. } => StatusCode::BAD_REQUEST,
        PipelineError::Log(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!("pipeline run failed: {}", err);
    (status, Json(json!({"error": err.to_string()})))
}
