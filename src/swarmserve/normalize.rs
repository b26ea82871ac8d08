//! Result normalization: turning a loosely-shaped orchestrator result into a
//! stable [`RunResponse`].
//!
//! Everything in this module is a pure function over [`RawValue`]. The
//! guiding rule is that no probe is ever allowed to fail a run: a missing
//! field, an unexpected shape, or an oversized payload always degrades to
//! `None` / an empty string / a truncated string, never to an error. Field
//! probe order is part of the contract — it encodes which of several
//! plausible result shapes wins when more than one is present.

use crate::swarmserve::model::{AgentTurn, RunResponse};
use crate::swarmserve::raw::RawValue;
use serde_json::Value;

/// Candidate field names probed, in priority order, when hunting for a
/// result's final output.
const OUTPUT_KEYS: [&str; 11] = [
    "output",
    "final_output",
    "result",
    "message",
    "content",
    "text",
    "response",
    "final",
    "answer",
    "data",
    "value",
];

/// Top-level result fields copied through into [`RunResponse::meta`].
const META_KEYS: [&str; 5] = ["metrics", "cost", "usage", "elapsed_time", "trace_id"];

/// Upper bound on the compact string form of a non-text fallback value.
const FALLBACK_TEXT_MAX_CHARS: usize = 4000;

/// Best-effort extraction of a result's final output value.
///
/// Probes the fixed [`OUTPUT_KEYS`] list over the value's named entries and
/// returns the first non-null hit. Structural fallbacks, in order: a
/// non-empty list recurses on its last element, bytes decode best-effort to
/// text, and as a last resort the value is stringified — unless its string
/// form is an opaque placeholder (a `<...>`-style default repr), which yields
/// `None`. Total and terminating: every recursive step strictly reduces
/// structure.
///
/// ```
/// use swarmserve::normalize::extract_output;
/// use swarmserve::RawValue;
///
/// // A plain string comes back unchanged.
/// let plain = RawValue::Text("hello".into());
/// assert_eq!(extract_output(&plain), Some(plain.clone()));
///
/// // {"output": "X"} yields "X".
/// let shaped = RawValue::map(vec![("output".into(), RawValue::Text("X".into()))]);
/// assert_eq!(extract_output(&shaped), Some(RawValue::Text("X".into())));
///
/// // An empty list has no tail to recurse on.
/// assert_eq!(extract_output(&RawValue::List(vec![])), None);
/// ```
pub fn extract_output(value: &RawValue) -> Option<RawValue> {
    match value {
        RawValue::Null => None,
        RawValue::Bytes(bytes) => Some(RawValue::Text(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        RawValue::List(items) => match items.last() {
            Some(last) => extract_output(last),
            None => None,
        },
        RawValue::Map(_) | RawValue::Record { .. } => {
            for key in &OUTPUT_KEYS {
                if let Some(hit) = value.get(key) {
                    if !hit.is_null() {
                        return Some(hit.clone());
                    }
                }
            }
            // Last resort: stringify, unless the repr is an opaque
            // placeholder (records with no recognizable field).
            let text = value.to_string();
            if text.starts_with('<') {
                None
            } else {
                Some(RawValue::Text(text))
            }
        }
        other => Some(other.clone()),
    }
}

/// Render a status value as a plain string: symbolic/enumerated values by
/// name, everything else stringified. A missing status is `"unknown"`.
pub fn normalize_status(status: Option<&RawValue>) -> String {
    match status {
        Some(RawValue::Symbol(name)) => name.clone(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}

/// Recover the ordered list of step identifiers from a result's
/// `node_history` field. Each entry is either an object exposing a `node_id`
/// field or something stringifiable.
pub fn step_history(result: &RawValue) -> Vec<String> {
    let history = match result.get("node_history") {
        Some(RawValue::List(items)) => items,
        _ => return Vec::new(),
    };
    history
        .iter()
        .map(|item| match item.get("node_id") {
            Some(id) => id.to_string(),
            None => item.to_string(),
        })
        .collect()
}

/// Extract `(role, text)` from a message-shaped value.
///
/// Understands three shapes: an object with `role`/`content` fields where
/// `content` is a list of `{text: ...}` fragments (joined with newlines),
/// the same with `content` as a plain string, or no recognizable shape at
/// all (`None`, letting the caller fall back to [`extract_output`]).
pub fn extract_message(value: &RawValue) -> Option<(Option<String>, String)> {
    value.entries()?;
    let role = value.get("role").map(|r| r.to_string());
    match value.get("content") {
        Some(RawValue::List(fragments)) => {
            let parts: Vec<String> = fragments
                .iter()
                .map(|fragment| match fragment.get("text") {
                    Some(text) => text.to_string(),
                    None => String::new(),
                })
                .collect();
            Some((role, parts.join("\n")))
        }
        Some(RawValue::Text(text)) => Some((role, text.clone())),
        _ => None,
    }
}

/// Truncate to at most `max_chars` characters, safely on char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// Coerce a fallback output value into turn text. Mappings (which can be
/// arbitrarily large) are serialized to a compact string form bounded at
/// [`FALLBACK_TEXT_MAX_CHARS`]; everything else stringifies directly.
fn fallback_text(value: &RawValue) -> String {
    match value {
        RawValue::Map(_) | RawValue::Record { .. } => {
            truncate_chars(&value.to_json().to_string(), FALLBACK_TEXT_MAX_CHARS)
        }
        other => other.to_string(),
    }
}

/// Probe a list of `(container, field)` locations and return the first hit,
/// converted to JSON. Used for the usage/metrics payloads, which different
/// orchestration backends park in different places.
fn probe_locations(locations: &[(Option<&RawValue>, &str)]) -> Option<Value> {
    for (container, field) in locations {
        if let Some(value) = container.and_then(|c| c.get(field)) {
            if !value.is_null() {
                return Some(value.to_json());
            }
        }
    }
    None
}

/// Build the ordered per-participant transcript for a result.
///
/// Participants appear in step-history order first (each at most once), then
/// any remaining keys of the results mapping in their natural order. A
/// history entry with no results record is skipped — the transcript may be
/// shorter than the history. An absent or empty results mapping yields an
/// empty transcript, which is a valid terminal state, not an error.
pub fn extract_transcript(result: &RawValue) -> Vec<AgentTurn> {
    let history = step_history(result);
    let entries = match result.get("results").and_then(|r| r.entries()) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    let mut ordered: Vec<&str> = Vec::new();
    for name in &history {
        if entries.iter().any(|(k, _)| k == name) && !ordered.contains(&name.as_str()) {
            ordered.push(name);
        }
    }
    for (name, _) in entries {
        if !ordered.contains(&name.as_str()) {
            ordered.push(name);
        }
    }

    ordered
        .into_iter()
        .filter_map(|name| {
            let node = entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)?;
            Some(node_turn(name, node))
        })
        .collect()
}

/// Normalize one node's results record into an [`AgentTurn`].
fn node_turn(name: &str, node: &RawValue) -> AgentTurn {
    let inner = node.get("result");

    let stop_reason = node
        .get("stop_reason")
        .or_else(|| inner.and_then(|r| r.get("stop_reason")))
        .filter(|v| !v.is_null())
        .map(|v| v.to_string());

    let usage = probe_locations(&[
        (Some(node), "usage"),
        (inner, "usage"),
        (inner.and_then(|r| r.get("metrics")), "accumulated_usage"),
    ]);
    let metrics = probe_locations(&[
        (Some(node), "metrics"),
        (inner, "metrics"),
        (Some(node), "accumulated_metrics"),
    ]);

    let message = inner
        .and_then(|r| r.get("message"))
        .or_else(|| node.get("message"));
    let (role, text) = match message.and_then(extract_message) {
        Some((role, text)) => (role, text),
        None => {
            // No recognizable message shape; fall back to the per-node
            // result's best-effort output.
            let fallback = inner
                .and_then(extract_output)
                .or_else(|| extract_output(node));
            (None, fallback.map(|v| fallback_text(&v)).unwrap_or_default())
        }
    };

    AgentTurn {
        agent: name.to_string(),
        role,
        text,
        stop_reason,
        usage,
        metrics,
    }
}

/// Assemble the full [`RunResponse`] for a completed orchestrator result:
/// normalized status, step history, best-effort output (falling back to the
/// last transcript entry's text when no explicit output field was present),
/// passthrough metadata, and the transcript.
pub fn build_summary(result: &RawValue) -> RunResponse {
    let status = normalize_status(result.get("status"));
    let node_history = step_history(result);
    let transcript = extract_transcript(result);

    let output = match extract_output(result) {
        Some(value) => Some(value.to_json()),
        None => transcript
            .last()
            .map(|turn| Value::String(turn.text.clone())),
    };

    let mut meta = serde_json::Map::new();
    for key in &META_KEYS {
        if let Some(value) = result.get(key) {
            if !value.is_null() {
                meta.insert((*key).to_string(), value.to_json());
            }
        }
    }

    RunResponse {
        status,
        node_history,
        output,
        meta,
        transcript,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_record_yields_none() {
        let opaque = RawValue::record("SwarmResult", vec![]);
        assert_eq!(extract_output(&opaque), None);
    }

    #[test]
    fn list_recurses_on_last_element() {
        let value = RawValue::List(vec![
            RawValue::Text("first".into()),
            RawValue::map(vec![("output".into(), RawValue::Text("last".into()))]),
        ]);
        assert_eq!(extract_output(&value), Some(RawValue::Text("last".into())));
    }

    #[test]
    fn probe_order_prefers_output_over_result() {
        let value = RawValue::map(vec![
            ("result".into(), RawValue::Text("second".into())),
            ("output".into(), RawValue::Text("first".into())),
        ]);
        assert_eq!(extract_output(&value), Some(RawValue::Text("first".into())));
    }

    #[test]
    fn fallback_text_is_bounded() {
        let big = "x".repeat(10_000);
        let value = RawValue::map(vec![("blob".into(), RawValue::Text(big))]);
        assert!(fallback_text(&value).chars().count() <= FALLBACK_TEXT_MAX_CHARS);
    }
}
