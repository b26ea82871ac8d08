//! HTTP surface: synchronous run, fire-and-forget start, poll, and SSE stream.

use crate::swarmserve::config::ServerConfig;
use crate::swarmserve::context::RunContext;
use crate::swarmserve::event::{summary_payload, RunEvent};
use crate::swarmserve::model::{validate_request, RunRequest, RunResponse};
use crate::swarmserve::orchestrator::SwarmFactory;
use crate::swarmserve::registry::RunRegistry;
use crate::swarmserve::worker::{run_synchronous, run_worker};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;

/// Bounded wait used by the stream consumer between queue checks.
const STREAM_POP_WAIT: Duration = Duration::from_millis(500);

/// Shared state behind every handler.
pub struct AppState {
    pub registry: Arc<RunRegistry>,
    pub factory: Arc<dyn SwarmFactory>,
}

impl AppState {
    pub fn new(max_retained_runs: usize, factory: Arc<dyn SwarmFactory>) -> Self {
        Self {
            registry: Arc::new(RunRegistry::new(max_retained_runs)),
            factory,
        }
    }
}

/// Client-visible error taxonomy. `StillRunning` is a distinguished
/// try-again signal, not a failure.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    StillRunning,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::StillRunning => (StatusCode::ACCEPTED, "still running".to_string()),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/run", post(run_swarm))
        .route("/api/run/start", post(start_run))
        .route("/api/result/{run_id}", get(get_result))
        .route("/api/stream/{run_id}", get(stream_run))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// `POST /api/run` — run to completion on this request, no streaming.
async fn run_swarm(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    validate_request(&req).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let summary = run_synchronous(&req, state.factory.as_ref())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(summary))
}

/// `POST /api/run/start` — validate, register, launch the worker, return
/// immediately with the fresh run identifier.
async fn start_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_request(&req).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let run_id = Uuid::new_v4().simple().to_string();
    let ctx = Arc::new(RunContext::new());
    state.registry.insert(run_id.clone(), ctx.clone());

    let factory = state.factory.clone();
    let worker_id = run_id.clone();
    tokio::spawn(run_worker(worker_id, req, ctx, factory));

    Ok((StatusCode::ACCEPTED, Json(json!({ "run_id": run_id }))))
}

/// `GET /api/result/{run_id}` — the stored summary, a 202 while the run is
/// in flight, or a 404 for an unknown identifier.
async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<RunResponse>, ApiError> {
    let ctx = state
        .registry
        .get(&run_id)
        .ok_or_else(|| ApiError::NotFound("run_id not found".to_string()))?;
    if !ctx.is_done() {
        return Err(ApiError::StillRunning);
    }
    match ctx.summary() {
        Some(summary) => Ok(Json(summary)),
        None => Err(ApiError::StillRunning),
    }
}

/// `GET /api/stream/{run_id}` — live SSE relay of the run's event queue.
async fn stream_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let ctx = state
        .registry
        .get(&run_id)
        .ok_or_else(|| ApiError::NotFound("run_id not found".to_string()))?;

    let stream = run_event_stream(run_id, ctx);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// The SSE generator for one reader: a `ready` frame up front, then relayed
/// queue events with a bounded wait, terminating only once the completion
/// flag is set *and* the queue was observed empty (drain before trusting the
/// flag), and finally one synthesized `summary` frame when a summary exists.
fn run_event_stream(
    run_id: String,
    ctx: Arc<RunContext>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        yield Ok(Event::default()
            .event("ready")
            .data(json!({ "run_id": run_id }).to_string()));

        loop {
            if let Some(event) = ctx.queue.pop_timeout(STREAM_POP_WAIT).await {
                yield Ok(event_frame(&event));
            }
            if ctx.is_done() && ctx.queue.is_empty() {
                break;
            }
        }

        if let Some(summary) = ctx.summary() {
            yield Ok(Event::default()
                .event("summary")
                .data(summary_payload(&summary).to_string()));
        }
    }
}

/// Convert an internal event record into a wire frame: the `type` tag moves
/// into the SSE `event:` field, everything else rides in `data:` unmodified.
fn event_frame(event: &RunEvent) -> Event {
    let mut payload = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
    if let Some(map) = payload.as_object_mut() {
        map.remove("type");
    }
    Event::default().event(event.kind()).data(payload.to_string())
}

/// Bind and serve until the process exits.
pub async fn serve(
    config: ServerConfig,
    factory: Arc<dyn SwarmFactory>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let state = Arc::new(AppState::new(config.max_retained_runs, factory));
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    log::info!("swarmserve listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
