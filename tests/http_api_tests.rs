use async_trait::async_trait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use swarmserve::{
    router, AgentSpec, AppState, DiagnosticSink, EchoSwarm, EchoSwarmFactory, Orchestrator,
    RawValue, RunResponse, SwarmFactory, SwarmSettings,
};

async fn spawn_server(factory: Arc<dyn SwarmFactory>) -> SocketAddr {
    let state = Arc::new(AppState::new(64, factory));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn request_body(task: &str, entry_point: &str) -> Value {
    json!({
        "task": task,
        "agents": [{"name": "writer"}, {"name": "critic"}],
        "settings": {"entry_point": entry_point}
    })
}

/// An echo orchestration that takes long enough to observe "still running".
struct SlowSwarm {
    inner: EchoSwarm,
}

#[async_trait]
impl Orchestrator for SlowSwarm {
    fn set_diagnostics(&self, sink: Option<Arc<dyn DiagnosticSink>>) {
        self.inner.set_diagnostics(sink);
    }

    async fn execute(
        &self,
        task: &str,
    ) -> Result<RawValue, Box<dyn std::error::Error + Send + Sync>> {
        tokio::time::sleep(Duration::from_millis(400)).await;
        self.inner.execute(task).await
    }
}

struct SlowFactory;

impl SwarmFactory for SlowFactory {
    fn build(
        &self,
        agents: &[AgentSpec],
        settings: &SwarmSettings,
    ) -> Result<Arc<dyn Orchestrator>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Arc::new(SlowSwarm {
            inner: EchoSwarm::new(agents.to_vec(), settings),
        }))
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = spawn_server(Arc::new(EchoSwarmFactory)).await;
    let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({"ok": true}));
}

#[tokio::test]
async fn test_synchronous_run() {
    let addr = spawn_server(Arc::new(EchoSwarmFactory)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/api/run", addr))
        .json(&request_body("summarize the report", "critic"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let summary: RunResponse = resp.json().await.unwrap();
    assert_eq!(summary.status, "COMPLETED");
    assert_eq!(summary.node_history, vec!["critic", "writer"]);
    assert_eq!(summary.transcript.len(), 2);
    let output = summary.output.unwrap();
    assert!(output.as_str().unwrap().contains("summarize the report"));
}

#[tokio::test]
async fn test_validation_rejections() {
    let addr = spawn_server(Arc::new(EchoSwarmFactory)).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/api/run", addr);

    let resp = client
        .post(&url)
        .json(&request_body("   ", "writer"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "task must not be empty");

    let resp = client
        .post(&url)
        .json(&request_body("do things", "nobody"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "entry_point 'nobody' not found in agents");

    let resp = client
        .post(&url)
        .json(&json!({"task": "x", "agents": [], "settings": {"entry_point": "a"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "at least one agent is required");

    let resp = client
        .post(&url)
        .json(&json!({
            "task": "x",
            "agents": [{"name": "writer"}, {"name": "writer"}],
            "settings": {"entry_point": "writer"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "duplicate agent name 'writer'");
}

#[tokio::test]
async fn test_start_then_poll_lifecycle() {
    let addr = spawn_server(Arc::new(SlowFactory)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/api/run/start", addr))
        .json(&request_body("slow task", "writer"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    let run_id = body["run_id"].as_str().unwrap().to_string();

    let result_url = format!("http://{}/api/result/{}", addr, run_id);

    // The run sleeps before completing, so the first poll sees 202.
    let resp = client.get(&result_url).send().await.unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "still running");

    let mut summary = None;
    for _ in 0..50 {
        let resp = client.get(&result_url).send().await.unwrap();
        if resp.status() == 200 {
            summary = Some(resp.json::<RunResponse>().await.unwrap());
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let summary = summary.expect("run never completed");
    assert_eq!(summary.status, "COMPLETED");
    assert_eq!(summary.node_history, vec!["writer", "critic"]);
}

#[tokio::test]
async fn test_unknown_run_id() {
    let addr = spawn_server(Arc::new(EchoSwarmFactory)).await;
    let client = reqwest::Client::new();

    for endpoint in ["result", "stream"] {
        let resp = client
            .get(format!("http://{}/api/{}/deadbeef", addr, endpoint))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["detail"], "run_id not found");
    }
}

#[tokio::test]
async fn test_stream_frame_order() {
    let addr = spawn_server(Arc::new(EchoSwarmFactory)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/api/run/start", addr))
        .json(&request_body("stream me", "writer"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let run_id = body["run_id"].as_str().unwrap().to_string();

    let body = client
        .get(format!("http://{}/api/stream/{}", addr, run_id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let ready = body.find("event: ready").expect("no ready frame");
    let start = body.find("event: start").expect("no start frame");
    let done = body.find("event: done").expect("no done frame");
    let summary = body.find("event: summary").expect("no summary frame");
    assert!(ready < start && start < done && done < summary);
    assert!(body.contains("event: log"));
    assert!(body.contains(&run_id));
    assert!(body.contains("\"status\":\"COMPLETED\""));
}

#[tokio::test]
async fn test_late_stream_reader_still_gets_summary() {
    let addr = spawn_server(Arc::new(EchoSwarmFactory)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/api/run/start", addr))
        .json(&request_body("quick task", "writer"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let run_id = body["run_id"].as_str().unwrap().to_string();

    let stream_url = format!("http://{}/api/stream/{}", addr, run_id);

    // First reader drains the event queue to completion.
    let first = client.get(&stream_url).send().await.unwrap().text().await.unwrap();
    assert!(first.contains("event: done"));

    // A reader attaching afterwards finds an empty queue but still receives
    // the synthesized terminal summary frame.
    let second = client.get(&stream_url).send().await.unwrap().text().await.unwrap();
    assert!(second.contains("event: ready"));
    assert!(second.contains("event: summary"));
    assert!(!second.contains("event: done"));
}
