use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info};

mod metrics;

use voicegate::classifier::SileroClassifier;
use voicegate::{Error, FrameVerdict, VadConfig, VadEngine};

#[derive(Parser, Debug)]
#[command(name = "voicegate-server")]
#[command(about = "HTTP server for streaming voice activity detection")]
struct Params {
    /// Path to a Silero VAD ONNX model file (e.g. `silero_vad.onnx`).
    #[arg(short = 'm', long = "model", required = true)]
    model_path: String,

    /// Host interface to bind to.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 1003)]
    port: u16,

    /// Maximum request body size (bytes).
    #[arg(long = "max-bytes", default_value_t = 4 * 1024 * 1024)]
    max_bytes: usize,

    /// Seconds of inactivity before a session is eligible for eviction.
    #[arg(long = "idle-timeout-secs", default_value_t = 300)]
    idle_timeout_secs: u64,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<VadEngine<SileroClassifier>>,
    max_idle: Duration,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    service: &'static str,
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    active_sessions: usize,
    evicted: usize,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn from_engine(err: Error) -> Self {
        let status = match err {
            Error::EmptyInput
            | Error::UnalignedChunk(_)
            | Error::EmptySessionId
            | Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Error::UnknownSession(_) => StatusCode::NOT_FOUND,
            Error::Classifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[tokio::main]
async fn main() {
    voicegate::logging::init();

    if let Err(err) = run().await {
        error!(error = ?err, "voicegate-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    metrics::init();

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let classifier =
        SileroClassifier::new(&params.model_path).context("failed to load Silero VAD model")?;
    let engine =
        VadEngine::new(VadConfig::default(), classifier).context("failed to initialize engine")?;

    let state = AppState {
        engine: Arc::new(engine),
        max_idle: Duration::from_secs(params.idle_timeout_secs),
    };

    let app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/v1/status", get(status))
        .route("/v1/sessions/{id}/detect", post(detect))
        .route("/v1/sessions/{id}/reset", post(reset))
        .route("/v1/sessions/{id}", delete(remove))
        .route_layer(from_fn(metrics::track_http_metrics))
        .with_state(state)
        .layer(DefaultBodyLimit::max(params.max_bytes))
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "voicegate",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn healthz() -> &'static str {
    "ok"
}

/// Report the live-session count, sweeping out idle sessions first.
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let evicted = state.engine.evict_idle(state.max_idle);
    let active_sessions = state.engine.session_count();
    metrics::set_active_sessions(active_sessions);

    Json(StatusResponse {
        active_sessions,
        evicted,
    })
}

async fn detect(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> std::result::Result<Json<FrameVerdict>, AppError> {
    // Classification is CPU-bound ONNX inference; keep it off the async workers.
    let engine = state.engine.clone();
    let verdict = tokio::task::spawn_blocking(move || engine.process_chunk(&session_id, &body))
        .await
        .map_err(|err| AppError::internal(format!("detection task failed: {err}")))?
        .map_err(AppError::from_engine)?;

    if verdict.speech_ended {
        metrics::inc_speech_segments();
    }

    Ok(Json(verdict))
}

async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<MessageBody>, AppError> {
    state
        .engine
        .reset_session(&session_id)
        .map_err(AppError::from_engine)?;

    Ok(Json(MessageBody {
        message: "session reset",
    }))
}

async fn remove(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<MessageBody>, AppError> {
    state
        .engine
        .remove_session(&session_id)
        .map_err(AppError::from_engine)?;

    Ok(Json(MessageBody {
        message: "session removed",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_expected_statuses() {
        let cases = [
            (Error::EmptyInput, StatusCode::BAD_REQUEST),
            (Error::UnalignedChunk(3), StatusCode::BAD_REQUEST),
            (Error::EmptySessionId, StatusCode::BAD_REQUEST),
            (
                Error::UnknownSession("abc".to_owned()),
                StatusCode::NOT_FOUND,
            ),
            (
                Error::Classifier(anyhow::anyhow!("model unavailable")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from_engine(err).status, expected);
        }
    }

    #[test]
    fn params_require_model_path() {
        let err = Params::try_parse_from(["voicegate-server"])
            .err()
            .expect("expected missing-args error");
        assert!(err.to_string().contains("--model"));

        let params =
            Params::try_parse_from(["voicegate-server", "--model", "silero_vad.onnx"])
                .expect("parse server params");
        assert_eq!(params.port, 1003);
        assert_eq!(params.idle_timeout_secs, 300);
    }
}
