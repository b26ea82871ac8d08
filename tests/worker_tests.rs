use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swarmserve::event::RunEvent;
use swarmserve::{
    run_synchronous, run_worker, AgentSpec, DiagnosticSink, EchoSwarm, EchoSwarmFactory,
    Orchestrator, RawValue, RunContext, RunRequest, SwarmFactory, SwarmSettings,
};

fn two_agent_request() -> RunRequest {
    RunRequest {
        task: "  review the draft  ".to_string(),
        agents: vec![AgentSpec::new("writer"), AgentSpec::new("critic")],
        settings: SwarmSettings::with_entry_point("critic"),
    }
}

async fn drain(ctx: &RunContext) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Some(event) = ctx.queue.pop_timeout(Duration::from_millis(10)).await {
        events.push(event);
    }
    events
}

struct FailingSwarm {
    sink: Mutex<Option<Arc<dyn DiagnosticSink>>>,
}

#[async_trait]
impl Orchestrator for FailingSwarm {
    fn set_diagnostics(&self, sink: Option<Arc<dyn DiagnosticSink>>) {
        *self.sink.lock().unwrap() = sink;
    }

    async fn execute(
        &self,
        _task: &str,
    ) -> Result<RawValue, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.emit("ERROR", "node 'writer' blew up");
        }
        Err("boom".into())
    }
}

/// Hands out one pre-built orchestrator, so tests can inspect it afterwards.
struct CapturingFactory {
    orchestrator: Arc<dyn Orchestrator>,
}

impl SwarmFactory for CapturingFactory {
    fn build(
        &self,
        _agents: &[AgentSpec],
        _settings: &SwarmSettings,
    ) -> Result<Arc<dyn Orchestrator>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.orchestrator.clone())
    }
}

struct BrokenFactory;

impl SwarmFactory for BrokenFactory {
    fn build(
        &self,
        _agents: &[AgentSpec],
        _settings: &SwarmSettings,
    ) -> Result<Arc<dyn Orchestrator>, Box<dyn std::error::Error + Send + Sync>> {
        Err("no backend configured".into())
    }
}

#[tokio::test]
async fn test_worker_event_sequence_and_summary() {
    let req = two_agent_request();
    let ctx = Arc::new(RunContext::new());
    run_worker(
        "run-1".to_string(),
        req,
        ctx.clone(),
        Arc::new(EchoSwarmFactory),
    )
    .await;

    assert!(ctx.is_done());
    let events = drain(&ctx).await;

    match &events[0] {
        RunEvent::Start { run_id, task } => {
            assert_eq!(run_id, "run-1");
            assert_eq!(task, "review the draft");
        }
        other => panic!("expected start first, got {:?}", other),
    }

    // Two diagnostics per agent, then exactly one terminal event.
    let log_count = events
        .iter()
        .filter(|e| matches!(e, RunEvent::Log { .. }))
        .count();
    assert_eq!(log_count, 4);

    match events.last().unwrap() {
        RunEvent::Done {
            status,
            node_history,
            has_output,
            ..
        } => {
            assert_eq!(status, "COMPLETED");
            assert_eq!(node_history, &vec!["critic", "writer"]);
            assert!(*has_output);
        }
        other => panic!("expected done last, got {:?}", other),
    }

    let summary = ctx.summary().unwrap();
    assert_eq!(summary.status, "COMPLETED");
    assert_eq!(summary.transcript.len(), 2);
    assert_eq!(summary.transcript[0].agent, "critic");
}

#[tokio::test]
async fn test_worker_failure_stores_failed_summary() {
    let orchestrator = Arc::new(FailingSwarm {
        sink: Mutex::new(None),
    });
    let factory = Arc::new(CapturingFactory {
        orchestrator: orchestrator.clone(),
    });

    let ctx = Arc::new(RunContext::new());
    run_worker("run-2".to_string(), two_agent_request(), ctx.clone(), factory).await;

    assert!(ctx.is_done());
    let summary = ctx.summary().unwrap();
    assert_eq!(summary.status, "failed");
    assert_eq!(
        summary.meta.get("error").and_then(|v| v.as_str()),
        Some("boom")
    );
    // The intercepted diagnostic line ends up in the summary's log tail.
    let tail = summary.meta.get("log_tail").unwrap();
    assert!(tail.to_string().contains("blew up"));

    let events = drain(&ctx).await;
    match events.last().unwrap() {
        RunEvent::Error { error, .. } => assert_eq!(error, "boom"),
        other => panic!("expected error last, got {:?}", other),
    }
}

#[tokio::test]
async fn test_worker_build_failure_terminates_run() {
    let ctx = Arc::new(RunContext::new());
    run_worker(
        "run-3".to_string(),
        two_agent_request(),
        ctx.clone(),
        Arc::new(BrokenFactory),
    )
    .await;

    assert!(ctx.is_done());
    assert_eq!(ctx.summary().unwrap().status, "failed");

    // Even a run that never gets an orchestrator opens with `start`.
    let events = drain(&ctx).await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], RunEvent::Start { .. }));
    assert!(matches!(events[1], RunEvent::Error { .. }));
}

#[tokio::test]
async fn test_worker_detaches_sink_after_run() {
    let req = two_agent_request();
    let echo = Arc::new(EchoSwarm::new(req.agents.clone(), &req.settings));
    let factory = Arc::new(CapturingFactory {
        orchestrator: echo.clone(),
    });

    let ctx = Arc::new(RunContext::new());
    run_worker("run-4".to_string(), req, ctx.clone(), factory).await;

    // A post-run execution must not feed the finished run's queue.
    let leftover = drain(&ctx).await;
    let before = leftover.len();
    echo.execute("again").await.unwrap();
    assert!(ctx.queue.is_empty());
    assert_eq!(drain(&ctx).await.len(), 0);
    assert!(before > 0);
}

#[tokio::test]
async fn test_run_synchronous_normalizes_result() {
    let req = two_agent_request();
    let summary = run_synchronous(&req, &EchoSwarmFactory).await.unwrap();

    assert_eq!(summary.status, "COMPLETED");
    assert_eq!(summary.node_history, vec!["critic", "writer"]);
    assert_eq!(summary.transcript.len(), 2);
    let output = summary.output.unwrap();
    assert!(output.as_str().unwrap().contains("review the draft"));
}
