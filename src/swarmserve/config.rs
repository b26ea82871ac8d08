//! Server configuration.
//!
//! Intentionally minimal and construction-first: build a [`ServerConfig`]
//! however you like, or start from [`ServerConfig::from_env`]. No config
//! file parsing dependencies are introduced.

use std::net::SocketAddr;

/// Environment variable overriding the bind address.
pub const ENV_ADDR: &str = "SWARMSERVE_ADDR";

/// Environment variable overriding the run retention cap.
pub const ENV_MAX_RUNS: &str = "SWARMSERVE_MAX_RUNS";

/// Configuration for [`serve`](crate::swarmserve::server::serve).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind_addr: SocketAddr,
    /// Retention cap for the run registry; oldest completed runs are evicted
    /// past this. `0` disables eviction.
    pub max_retained_runs: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 8000).into(),
            max_retained_runs: 1024,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `SWARMSERVE_ADDR` / `SWARMSERVE_MAX_RUNS`
    /// where set and parseable; unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var(ENV_ADDR) {
            if let Ok(addr) = addr.parse() {
                config.bind_addr = addr;
            }
        }
        if let Ok(max) = std::env::var(ENV_MAX_RUNS) {
            if let Ok(max) = max.parse() {
                config.max_retained_runs = max;
            }
        }
        config
    }
}
