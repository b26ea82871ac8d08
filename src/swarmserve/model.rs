//! Request and response data model for the HTTP surface.
//!
//! These types mirror the JSON bodies accepted and produced by the endpoints
//! in [`server`](crate::swarmserve::server). A [`RunRequest`] is immutable
//! once a run starts; a [`RunResponse`] is assembled exactly once per run by
//! the normalizer and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt;

fn default_system_prompt() -> String {
    "You are a helpful specialist...".to_string()
}

fn default_max_handoffs() -> u32 {
    20
}

fn default_max_iterations() -> u32 {
    20
}

fn default_execution_timeout() -> f64 {
    900.0
}

fn default_node_timeout() -> f64 {
    300.0
}

fn default_detection_window() -> u32 {
    8
}

fn default_min_unique_agents() -> u32 {
    3
}

/// One named participant in a swarm run.
///
/// `name` must be unique within the run; `model` optionally pins the
/// participant to a specific model identifier understood by the orchestration
/// backend (passed through opaquely).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: default_system_prompt(),
            model: None,
        }
    }
}

/// Bounded numeric limits for one orchestration, plus the entry participant.
///
/// The timeout fields are forwarded to the external orchestrator and are not
/// separately enforced by this service: if the backend ignores them, the
/// run's task can block indefinitely (a documented limitation, not a bug this
/// layer papers over).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmSettings {
    #[serde(default = "default_max_handoffs")]
    pub max_handoffs: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Overall execution timeout in seconds.
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout: f64,
    /// Per-node (per-step) timeout in seconds.
    #[serde(default = "default_node_timeout")]
    pub node_timeout: f64,
    #[serde(default = "default_detection_window")]
    pub repetitive_handoff_detection_window: u32,
    #[serde(default = "default_min_unique_agents")]
    pub repetitive_handoff_min_unique_agents: u32,
    /// Name of the agent the orchestration starts with. Must reference an
    /// entry of [`RunRequest::agents`]; validated before any run state is
    /// created.
    pub entry_point: String,
}

impl SwarmSettings {
    /// Settings with every limit at its default and the given entry point.
    pub fn with_entry_point(entry_point: impl Into<String>) -> Self {
        Self {
            max_handoffs: default_max_handoffs(),
            max_iterations: default_max_iterations(),
            execution_timeout: default_execution_timeout(),
            node_timeout: default_node_timeout(),
            repetitive_handoff_detection_window: default_detection_window(),
            repetitive_handoff_min_unique_agents: default_min_unique_agents(),
            entry_point: entry_point.into(),
        }
    }
}

/// A complete run submission: task text, participants, and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub task: String,
    pub agents: Vec<AgentSpec>,
    pub settings: SwarmSettings,
}

/// One participant's contribution to a run, as recovered by the normalizer.
///
/// `text` is never null — an empty string means no textual content could be
/// found for that node. `usage` and `metrics` are opaque payloads passed
/// through from the orchestrator unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTurn {
    pub agent: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Value>,
    #[serde(default)]
    pub metrics: Option<Value>,
}

/// The final normalized summary of a run.
///
/// Created exactly once, after the orchestrator call returns or fails, and
/// immutable thereafter. `output` is a best-effort extraction and may be
/// null even for successful runs (in which case `meta` carries a log-tail
/// hint when one is available).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub status: String,
    #[serde(default)]
    pub node_history: Vec<String>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub meta: serde_json::Map<String, Value>,
    #[serde(default)]
    pub transcript: Vec<AgentTurn>,
}

/// Why a [`RunRequest`] was rejected before any run state was created.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTask,
    NoAgents,
    DuplicateAgentName(String),
    UnknownEntryPoint(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyTask => write!(f, "task must not be empty"),
            ValidationError::NoAgents => write!(f, "at least one agent is required"),
            ValidationError::DuplicateAgentName(name) => {
                write!(f, "duplicate agent name '{}'", name)
            }
            ValidationError::UnknownEntryPoint(name) => {
                write!(f, "entry_point '{}' not found in agents", name)
            }
        }
    }
}

impl Error for ValidationError {}

/// Validate a submission: non-empty task, at least one agent, unique agent
/// names, and an `entry_point` that names one of the supplied agents.
///
/// ```
/// use swarmserve::{validate_request, AgentSpec, RunRequest, SwarmSettings};
///
/// let req = RunRequest {
///     task: "summarize X".into(),
///     agents: vec![AgentSpec::new("writer")],
///     settings: SwarmSettings::with_entry_point("critic"),
/// };
/// assert!(validate_request(&req).is_err());
/// ```
pub fn validate_request(req: &RunRequest) -> Result<(), ValidationError> {
    if req.task.trim().is_empty() {
        return Err(ValidationError::EmptyTask);
    }
    if req.agents.is_empty() {
        return Err(ValidationError::NoAgents);
    }
    for (i, agent) in req.agents.iter().enumerate() {
        if req.agents[..i].iter().any(|other| other.name == agent.name) {
            return Err(ValidationError::DuplicateAgentName(agent.name.clone()));
        }
    }
    if !req
        .agents
        .iter()
        .any(|agent| agent.name == req.settings.entry_point)
    {
        return Err(ValidationError::UnknownEntryPoint(
            req.settings.entry_point.clone(),
        ));
    }
    Ok(())
}
