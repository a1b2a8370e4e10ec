//! materials HTTP server.
//!
//! Exposes the engine over REST:
//!
//! - `POST /add`: JSON `add` document → stored records
//! - `POST /search[?q=term]`: JSON `search` document → matching records
//! - `POST /upload`: raw CSV body → `"{accepted} of {total} records loaded"`
//! - `GET  /health`: server status
//!
//! Client errors answer 400 with `{"error": "..."}`, other failures 500.
//! Wrong methods on a known route answer 405.
//!
//! Build and run: `cargo run --features server --bin materials-server`

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use materials_db::config::MaterialsConfig;
use materials_db::engine::{Engine, EngineConfig};
use materials_db::error::{MaterialsError, MaterialsResult};
use materials_db::project::Record;

// ── Errors ────────────────────────────────────────────────────────────────

enum ApiError {
    Engine(MaterialsError),
    /// The blocking worker panicked or was cancelled.
    Task(tokio::task::JoinError),
}

impl From<MaterialsError> for ApiError {
    fn from(e: MaterialsError) -> Self {
        Self::Engine(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Engine(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Engine(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Task(e) => {
                tracing::error!(error = %e, "engine task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ── Response types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    materials: usize,
    full_text: bool,
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// Run an engine call on the blocking pool; store and index access is
/// synchronous.
async fn blocking<T, F>(engine: Arc<Engine>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Engine) -> MaterialsResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(move || op(&engine)).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(join) => Err(ApiError::Task(join)),
    }
}

async fn health(State(engine): State<Arc<Engine>>) -> Result<Json<HealthResponse>, ApiError> {
    let info = blocking(engine, |e| e.info()).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        materials: info.material_count,
        full_text: info.full_text,
    }))
}

async fn add(
    State(engine): State<Arc<Engine>>,
    body: Bytes,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(blocking(engine, move |e| e.add(&body)).await?))
}

async fn search(
    State(engine): State<Arc<Engine>>,
    Query(params): Query<SearchParams>,
    body: Bytes,
) -> Result<Json<Vec<Record>>, ApiError> {
    let found = blocking(engine, move |e| e.search(&body, params.q.as_deref())).await?;
    Ok(Json(found))
}

async fn upload(State(engine): State<Arc<Engine>>, body: Bytes) -> Result<String, ApiError> {
    let summary = blocking(engine, move |e| e.upload(&body)).await?;
    Ok(summary.to_string())
}

fn app(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/add", post(add))
        .route("/search", post(search))
        .route("/upload", post(upload))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

// ── Main ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let config = match std::env::var("MATERIALS_CONFIG") {
        Ok(path) => MaterialsConfig::load(&PathBuf::from(path)).unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        }),
        Err(_) => MaterialsConfig::default(),
    }
    .with_env_overrides();

    let filter = config.log_filter.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let engine = Engine::new(EngineConfig::from(&config)).unwrap_or_else(|e| {
        tracing::error!("failed to initialize engine: {e}");
        std::process::exit(1);
    });
    let router = app(Arc::new(engine));

    let addr = config.listen_addr();
    tracing::info!("materials server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        });
    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
