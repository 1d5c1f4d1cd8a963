use clap::Args;
use std::net::SocketAddr;
use std::time::Duration;

/// Settings of the registry service, readable from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address the HTTP and WebSocket listener binds to.
    #[arg(long, env = "HUDDLE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Seconds a session may stay without members before it is discarded.
    #[arg(long, env = "HUDDLE_EMPTY_SESSION_TTL_SECS", default_value_t = 300)]
    pub empty_session_ttl_secs: u64,

    /// Depth of each session's command queue.
    #[arg(long, env = "HUDDLE_SESSION_QUEUE", default_value_t = 100)]
    pub session_queue: usize,
}

impl ServerConfig {
    pub fn registry(&self) -> RegistryConfig {
        RegistryConfig {
            empty_session_ttl: Duration::from_secs(self.empty_session_ttl_secs),
            command_queue: self.session_queue.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    pub empty_session_ttl: Duration,
    pub command_queue: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            empty_session_ttl: Duration::from_secs(300),
            command_queue: 100,
        }
    }
}
