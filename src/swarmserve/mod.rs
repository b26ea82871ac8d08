// src/swarmserve/mod.rs

pub mod config;
pub mod context;
pub mod event;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod queue;
pub mod raw;
pub mod registry;
pub mod server;
pub mod worker;

// Explicitly export the per-run state types so they are reachable as
// swarmserve::RunContext / swarmserve::RunRegistry from the crate root.
pub use context::RunContext;
pub use registry::RunRegistry;
