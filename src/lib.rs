//! # swarmserve
//!
//! swarmserve turns a single blocking multi-agent orchestration call into a
//! safely-observable, concurrent, streamable, idempotently-queryable HTTP
//! service. The orchestration algorithm itself lives behind the
//! [`Orchestrator`] trait; this crate owns everything around it:
//!
//! * **Run lifecycle**: [`RunRegistry`] and [`RunContext`] track every run
//!   in process memory — the event queue, a monotonic completion flag, a
//!   bounded log-tail ring, and the final summary slot
//! * **Event pipeline**: a per-run [`EventQueue`](swarmserve::queue::EventQueue)
//!   carries typed [`RunEvent`]s from the background worker to any number of
//!   concurrently attached SSE readers, in arrival order
//! * **Defensive normalization**: the [`normalize`] module turns whatever
//!   loosely-shaped [`RawValue`] a backend produces into a stable
//!   [`RunResponse`] transcript — probing failures degrade, never fail
//! * **HTTP surface**: `POST /api/run` (synchronous), `POST /api/run/start`
//!   (fire-and-forget), `GET /api/result/{run_id}` (poll), and
//!   `GET /api/stream/{run_id}` (live SSE)
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swarmserve::{serve, EchoSwarmFactory, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     swarmserve::init_logger();
//!     serve(ServerConfig::from_env(), Arc::new(EchoSwarmFactory)).await
//! }
//! ```
//!
//! ## Plugging in a real orchestration backend
//!
//! Implement [`SwarmFactory`] to construct your backend from the request's
//! participants and limits, and [`Orchestrator`] to execute one task. The
//! result can be any [`RawValue`] shape — the normalizer probes a fixed
//! priority order of field names and structural fallbacks, so partial or
//! unusual result objects still produce a usable summary.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialize `env_logger` exactly once, no matter how many times this is
/// called. Controlled by `RUST_LOG` as usual.
///
/// # Example
///
/// ```
/// swarmserve::init_logger();
/// swarmserve::init_logger(); // harmless
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `swarmserve` module.
pub mod swarmserve;

// Re-exporting key items for easier external access.
pub use crate::swarmserve::config::ServerConfig;
pub use crate::swarmserve::context::{RunContext, LOG_TAIL_CAPACITY};
pub use crate::swarmserve::event;
pub use crate::swarmserve::event::{RunEvent, TurnPreview};
pub use crate::swarmserve::model::{
    validate_request, AgentSpec, AgentTurn, RunRequest, RunResponse, SwarmSettings,
    ValidationError,
};
pub use crate::swarmserve::normalize;
pub use crate::swarmserve::orchestrator::{
    DiagnosticSink, EchoSwarm, EchoSwarmFactory, Orchestrator, ScopedDiagnostics, SwarmFactory,
};
pub use crate::swarmserve::queue::EventQueue;
pub use crate::swarmserve::raw::RawValue;
pub use crate::swarmserve::registry::RunRegistry;
pub use crate::swarmserve::server::{router, serve, ApiError, AppState};
pub use crate::swarmserve::worker::{run_synchronous, run_worker};
