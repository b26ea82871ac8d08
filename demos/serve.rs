//! Run swarmserve with the built-in echo orchestrator.
//!
//! ```bash
//! RUST_LOG=info cargo run --example serve
//! curl -s localhost:8000/health
//! curl -s -X POST localhost:8000/api/run -H 'content-type: application/json' -d '{
//!   "task": "summarize X",
//!   "agents": [{"name": "writer"}, {"name": "critic"}],
//!   "settings": {"entry_point": "writer"}
//! }'
//! ```

use std::sync::Arc;
use swarmserve::{serve, EchoSwarmFactory, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    swarmserve::init_logger();

    let config = ServerConfig::from_env();
    log::info!("starting swarmserve demo on {}", config.bind_addr);
    serve(config, Arc::new(EchoSwarmFactory)).await
}
