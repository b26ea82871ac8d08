//! Run event vocabulary.
//!
//! A [`RunEvent`] is one record in a run's event pipeline: produced only by
//! that run's worker, consumed in arrival order by whichever stream readers
//! are attached. The variants map one-to-one onto SSE frame kinds (the
//! internal `type` tag becomes the frame's `event:` field on the wire).

use crate::swarmserve::model::RunResponse;
use crate::swarmserve::normalize::truncate_chars;
use serde::Serialize;
use serde_json::{json, Value};

/// Character budget for the output preview carried by `done`/`summary`.
pub const OUTPUT_PREVIEW_CHARS: usize = 300;

/// Character budget for each transcript entry preview.
pub const TURN_PREVIEW_CHARS: usize = 180;

/// How many trailing transcript entries are previewed.
pub const TRANSCRIPT_PREVIEW_TURNS: usize = 3;

/// A short preview of one transcript entry.
#[derive(Debug, Clone, Serialize)]
pub struct TurnPreview {
    pub agent: String,
    pub text: String,
}

/// One typed record in a run's event pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// The worker has started executing the run.
    Start { run_id: String, task: String },
    /// One diagnostic log line intercepted during the orchestrator call.
    Log {
        run_id: String,
        message: String,
        level: String,
    },
    /// The orchestrator returned and the summary has been stored.
    Done {
        run_id: String,
        status: String,
        node_history: Vec<String>,
        has_output: bool,
        output_preview: Option<String>,
        transcript_preview: Vec<TurnPreview>,
    },
    /// The orchestrator call failed.
    Error { run_id: String, error: String },
}

impl RunEvent {
    /// The SSE event name for this record.
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::Start { .. } => "start",
            RunEvent::Log { .. } => "log",
            RunEvent::Done { .. } => "done",
            RunEvent::Error { .. } => "error",
        }
    }

    /// Build the terminal `done` event for a stored summary.
    pub fn done_from_summary(run_id: &str, summary: &RunResponse) -> RunEvent {
        RunEvent::Done {
            run_id: run_id.to_string(),
            status: summary.status.clone(),
            node_history: summary.node_history.clone(),
            has_output: summary.output.is_some(),
            output_preview: output_preview(summary),
            transcript_preview: transcript_preview(summary),
        }
    }
}

/// First ~300 characters of the output, when the output is text.
pub fn output_preview(summary: &RunResponse) -> Option<String> {
    match &summary.output {
        Some(Value::String(text)) => Some(truncate_chars(text, OUTPUT_PREVIEW_CHARS)),
        _ => None,
    }
}

/// Short previews of the last few transcript entries.
pub fn transcript_preview(summary: &RunResponse) -> Vec<TurnPreview> {
    let skip = summary
        .transcript
        .len()
        .saturating_sub(TRANSCRIPT_PREVIEW_TURNS);
    summary
        .transcript
        .iter()
        .skip(skip)
        .map(|turn| TurnPreview {
            agent: turn.agent.clone(),
            text: truncate_chars(&turn.text, TURN_PREVIEW_CHARS),
        })
        .collect()
}

/// Payload for the synthesized terminal `summary` frame. Deliberately
/// redundant with `done`/`error`: a reader that attaches after the raw
/// events were consumed still gets a terminal signal.
pub fn summary_payload(summary: &RunResponse) -> Value {
    json!({
        "status": summary.status,
        "node_history": summary.node_history,
        "has_output": summary.output.is_some(),
        "output_preview": output_preview(summary),
        "transcript_preview": transcript_preview(summary)
            .into_iter()
            .map(|p| json!({"agent": p.agent, "text": p.text}))
            .collect::<Vec<_>>(),
    })
}
