//! Server configuration.
//!
//! Every option can be given on the command line or through an `AGORA_*`
//! environment variable.

use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use crate::{
    domain::DEFAULT_MESSAGE_RETENTION,
    infrastructure::realtime::{DEFAULT_ONLINE_THRESHOLD, DEFAULT_TICK_INTERVAL},
};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SEND_BUFFER: usize = 64;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Parser)]
#[command(name = "agora-server")]
#[command(about = "Realtime presence and message fan-out server for the Agora chatroom")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "AGORA_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on (0 picks a free port)
    #[arg(short, long, env = "AGORA_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// How long a user stays online after their last activity (milliseconds)
    #[arg(long, env = "AGORA_ONLINE_THRESHOLD_MS", default_value_t = DEFAULT_ONLINE_THRESHOLD.as_millis() as u64)]
    pub online_threshold_ms: u64,

    /// Period of the presence tick (milliseconds)
    #[arg(long, env = "AGORA_TICK_INTERVAL_MS", default_value_t = DEFAULT_TICK_INTERVAL.as_millis() as u64)]
    pub tick_interval_ms: u64,

    /// Frames queued per connection before it is dropped as too slow
    #[arg(long, env = "AGORA_SEND_BUFFER", default_value_t = DEFAULT_SEND_BUFFER)]
    pub send_buffer: usize,

    /// Number of messages kept in the in-memory log
    #[arg(long, env = "AGORA_MESSAGE_RETENTION", default_value_t = DEFAULT_MESSAGE_RETENTION)]
    pub message_retention: usize,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "AGORA_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            online_threshold_ms: DEFAULT_ONLINE_THRESHOLD.as_millis() as u64,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            send_buffer: DEFAULT_SEND_BUFFER,
            message_retention: DEFAULT_MESSAGE_RETENTION,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` as given, for binding
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed socket address, if `host` is an IP literal
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.addr().parse().ok()
    }

    pub fn online_threshold(&self) -> Duration {
        Duration::from_millis(self.online_threshold_ms.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn send_buffer(&self) -> usize {
        self.send_buffer.max(1)
    }

    pub fn message_retention(&self) -> usize {
        self.message_retention.max(1)
    }
}
