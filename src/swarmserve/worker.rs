//! Run execution.
//!
//! [`run_worker`] drives one background run on its own tokio task: it wires
//! the diagnostic interception point into the run's event queue, invokes the
//! orchestrator, normalizes whatever comes back, and publishes the terminal
//! event before — strictly last — raising the completion flag.
//! [`run_synchronous`] is the blocking variant behind `POST /api/run`.

use crate::swarmserve::context::RunContext;
use crate::swarmserve::event::RunEvent;
use crate::swarmserve::model::{RunRequest, RunResponse};
use crate::swarmserve::normalize::{build_summary, extract_output};
use crate::swarmserve::orchestrator::{DiagnosticSink, ScopedDiagnostics, SwarmFactory};
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;

/// How many buffered log lines are copied into the summary's metadata when
/// output extraction comes up empty.
const LOG_TAIL_META_LINES: usize = 50;

/// Forwards intercepted diagnostics into the run's event queue and log-tail
/// ring as they happen.
struct QueueSink {
    run_id: String,
    ctx: Arc<RunContext>,
}

impl DiagnosticSink for QueueSink {
    fn emit(&self, level: &str, message: &str) {
        self.ctx.push_log(format!("{} | {}", level, message));
        self.ctx.queue.push(RunEvent::Log {
            run_id: self.run_id.clone(),
            message: message.to_string(),
            level: level.to_string(),
        });
    }
}

/// Execute one background run to completion.
///
/// Event discipline: `start` is pushed first; `log` events flow while the
/// orchestrator runs; exactly one terminal event (`done` or `error`) is
/// pushed, the summary slot is populated, the interception hook is detached,
/// and only then is the completion flag set. Readers that drain the queue to
/// empty before trusting the flag therefore never lose the terminal event.
pub async fn run_worker(
    run_id: String,
    req: RunRequest,
    ctx: Arc<RunContext>,
    factory: Arc<dyn SwarmFactory>,
) {
    let task = req.task.trim().to_string();

    ctx.queue.push(RunEvent::Start {
        run_id: run_id.clone(),
        task: task.clone(),
    });
    log::info!("run {}: started ({} agents)", run_id, req.agents.len());

    let orchestrator = match factory.build(&req.agents, &req.settings) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            log::warn!("run {}: orchestrator build failed: {}", run_id, e);
            publish_failure(&run_id, &ctx, &e.to_string());
            ctx.mark_done();
            return;
        }
    };

    let sink = Arc::new(QueueSink {
        run_id: run_id.clone(),
        ctx: ctx.clone(),
    });
    let diagnostics = ScopedDiagnostics::attach(orchestrator.clone(), sink);

    match orchestrator.execute(&task).await {
        Ok(result) => {
            let mut summary = build_summary(&result);
            attach_log_tail_hint(&mut summary, &ctx, extract_output(&result).is_none());
            ctx.store_summary(summary.clone());
            ctx.queue.push(RunEvent::done_from_summary(&run_id, &summary));
            log::info!(
                "run {}: completed with status '{}' ({} steps)",
                run_id,
                summary.status,
                summary.node_history.len()
            );
        }
        Err(e) => {
            log::warn!("run {}: orchestrator failed: {}", run_id, e);
            publish_failure(&run_id, &ctx, &e.to_string());
        }
    }

    // Detach the interception hook before publishing completion.
    drop(diagnostics);
    ctx.mark_done();
}

/// Publish the terminal state for a failed run: the `error` event first,
/// then a stored summary with status `"failed"` so the poll endpoint
/// terminates rather than reporting "still running" forever.
fn publish_failure(run_id: &str, ctx: &RunContext, error: &str) {
    ctx.queue.push(RunEvent::Error {
        run_id: run_id.to_string(),
        error: error.to_string(),
    });
    ctx.store_summary(failure_summary(ctx, error));
}

fn failure_summary(ctx: &RunContext, error: &str) -> RunResponse {
    let mut meta = serde_json::Map::new();
    meta.insert("error".to_string(), Value::String(error.to_string()));
    let tail = ctx.log_tail(LOG_TAIL_META_LINES);
    if !tail.is_empty() {
        meta.insert("log_tail".to_string(), json!(tail));
    }
    RunResponse {
        status: "failed".to_string(),
        node_history: Vec::new(),
        output: None,
        meta,
        transcript: Vec::new(),
    }
}

/// When output extraction found nothing non-null and the log ring is
/// non-empty, attach the recent log lines and an explanatory hint to the
/// summary's metadata.
fn attach_log_tail_hint(summary: &mut RunResponse, ctx: &RunContext, no_output_found: bool) {
    if !no_output_found {
        return;
    }
    let tail = ctx.log_tail(LOG_TAIL_META_LINES);
    if tail.is_empty() {
        return;
    }
    summary.meta.insert("log_tail".to_string(), json!(tail));
    summary.meta.insert(
        "hint".to_string(),
        Value::String(
            "no recognizable output field on the orchestrator result; recent log lines attached"
                .to_string(),
        ),
    );
}

/// Run a request to completion on the caller's task: same build, execute,
/// and normalization path as the background worker, but with no run context,
/// no streaming, and no log capture.
pub async fn run_synchronous(
    req: &RunRequest,
    factory: &dyn SwarmFactory,
) -> Result<RunResponse, Box<dyn Error + Send + Sync>> {
    let orchestrator = factory.build(&req.agents, &req.settings)?;
    let result = orchestrator.execute(req.task.trim()).await?;
    Ok(build_summary(&result))
}
