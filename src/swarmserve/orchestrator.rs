//! The external orchestrator seam.
//!
//! The orchestration algorithm itself — how steps are chosen, how control
//! passes between participants — is an external collaborator. This module
//! fixes its interface: a [`SwarmFactory`] builds an [`Orchestrator`] from
//! the participants and limits of one request, and the orchestrator is
//! invoked with a task string, producing a loosely-shaped [`RawValue`]
//! result that the normalizer handles defensively.
//!
//! A [`DiagnosticSink`] is the log interception point: attached immediately
//! before each invocation and guaranteed detached on every exit path via the
//! [`ScopedDiagnostics`] guard.

use crate::swarmserve::model::{AgentSpec, SwarmSettings};
use crate::swarmserve::raw::RawValue;
use async_trait::async_trait;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Receives diagnostic log lines produced by the orchestration machinery
/// while a call is in flight.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, level: &str, message: &str);
}

/// One constructed orchestration, invocable with a task string.
///
/// The result's shape is deliberately loose; see
/// [`normalize`](crate::swarmserve::normalize) for how it is consumed.
/// Implementations should forward diagnostics to the currently attached
/// sink, if any, and tolerate the sink being swapped between invocations.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Attach (`Some`) or detach (`None`) the diagnostic interception point.
    fn set_diagnostics(&self, sink: Option<Arc<dyn DiagnosticSink>>);

    /// Execute the orchestration for one task, blocking until it returns or
    /// fails. The configured timeouts are the implementation's to honor —
    /// this service adds no watchdog of its own.
    async fn execute(&self, task: &str) -> Result<RawValue, Box<dyn Error + Send + Sync>>;
}

/// Builds an [`Orchestrator`] from a request's participants and limits.
pub trait SwarmFactory: Send + Sync {
    fn build(
        &self,
        agents: &[AgentSpec],
        settings: &SwarmSettings,
    ) -> Result<Arc<dyn Orchestrator>, Box<dyn Error + Send + Sync>>;
}

/// Scoped attachment of a [`DiagnosticSink`]: attached on construction,
/// detached on drop — success, failure, and panic paths alike.
pub struct ScopedDiagnostics {
    orchestrator: Arc<dyn Orchestrator>,
}

impl ScopedDiagnostics {
    pub fn attach(orchestrator: Arc<dyn Orchestrator>, sink: Arc<dyn DiagnosticSink>) -> Self {
        orchestrator.set_diagnostics(Some(sink));
        Self { orchestrator }
    }
}

impl Drop for ScopedDiagnostics {
    fn drop(&mut self) {
        self.orchestrator.set_diagnostics(None);
    }
}

/// A deterministic built-in orchestrator: every participant "responds" by
/// echoing the task back. Used by the demo and as a reference shape for
/// integrating real backends — its result exercises the full normalization
/// path (record-wrapped nodes, fragment-list messages, symbolic status,
/// usage payloads).
pub struct EchoSwarm {
    agents: Vec<AgentSpec>,
    entry_point: String,
    sink: Mutex<Option<Arc<dyn DiagnosticSink>>>,
}

impl EchoSwarm {
    pub fn new(agents: Vec<AgentSpec>, settings: &SwarmSettings) -> Self {
        Self {
            agents,
            entry_point: settings.entry_point.clone(),
            sink: Mutex::new(None),
        }
    }

    fn diag(&self, level: &str, message: &str) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.emit(level, message);
        }
    }

    /// Entry participant first, then the rest in submission order.
    fn node_order(&self) -> Vec<&AgentSpec> {
        let mut ordered: Vec<&AgentSpec> = self
            .agents
            .iter()
            .filter(|a| a.name == self.entry_point)
            .collect();
        ordered.extend(self.agents.iter().filter(|a| a.name != self.entry_point));
        ordered
    }
}

#[async_trait]
impl Orchestrator for EchoSwarm {
    fn set_diagnostics(&self, sink: Option<Arc<dyn DiagnosticSink>>) {
        *self.sink.lock().unwrap() = sink;
    }

    async fn execute(&self, task: &str) -> Result<RawValue, Box<dyn Error + Send + Sync>> {
        let mut history = Vec::new();
        let mut results = Vec::new();

        for agent in self.node_order() {
            self.diag("DEBUG", &format!("handing off to node '{}'", agent.name));
            history.push(RawValue::record(
                "NodeRef",
                vec![("node_id".into(), RawValue::Text(agent.name.clone()))],
            ));

            let text = format!("[{}] {}", agent.name, task);
            let message = RawValue::map(vec![
                ("role".into(), RawValue::Text("assistant".into())),
                (
                    "content".into(),
                    RawValue::List(vec![RawValue::map(vec![(
                        "text".into(),
                        RawValue::Text(text),
                    )])]),
                ),
            ]);
            let node_result = RawValue::record(
                "NodeResult",
                vec![
                    (
                        "result".into(),
                        RawValue::record("AgentResult", vec![("message".into(), message)]),
                    ),
                    ("stop_reason".into(), RawValue::Text("end_turn".into())),
                    (
                        "usage".into(),
                        RawValue::map(vec![
                            ("input_tokens".into(), RawValue::Int(task.len() as i64)),
                            ("output_tokens".into(), RawValue::Int(16)),
                        ]),
                    ),
                ],
            );
            results.push((agent.name.clone(), node_result));
            self.diag("INFO", &format!("node '{}' completed", agent.name));
        }

        Ok(RawValue::record(
            "SwarmResult",
            vec![
                ("status".into(), RawValue::Symbol("COMPLETED".into())),
                ("node_history".into(), RawValue::List(history)),
                ("results".into(), RawValue::Map(results)),
            ],
        ))
    }
}

/// Factory for [`EchoSwarm`] orchestrations.
pub struct EchoSwarmFactory;

impl SwarmFactory for EchoSwarmFactory {
    fn build(
        &self,
        agents: &[AgentSpec],
        settings: &SwarmSettings,
    ) -> Result<Arc<dyn Orchestrator>, Box<dyn Error + Send + Sync>> {
        Ok(Arc::new(EchoSwarm::new(agents.to_vec(), settings)))
    }
}
