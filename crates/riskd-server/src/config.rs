//! Server configuration.

use std::time::Duration;

use riskd_core::Channel;
use riskd_wire::DEFAULT_MAX_PAYLOAD_SIZE;
use serde::{Deserialize, Serialize};

/// What happens to the risk state when new clients connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// State lives for the whole process lifetime.
    #[default]
    Persistent,
    /// Every connection after the first, on either channel, starts from an
    /// empty state. Convenient for repeated manual demo runs.
    ResetOnNewConnection,
}

/// Listener configuration for the order and trade channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address both listeners bind to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Order channel port.
    #[serde(default = "default_order_port")]
    pub order_port: u16,
    /// Trade channel port.
    #[serde(default = "default_trade_port")]
    pub trade_port: u16,
    /// Close a connection when no complete frame arrives for this long
    /// (0 = wait forever).
    #[serde(default)]
    pub read_timeout_ms: u64,
    /// Maximum concurrent connections across both channels (0 = unlimited).
    #[serde(default)]
    pub max_connections: usize,
    /// Frames announcing a larger payload close the connection.
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
    #[serde(default)]
    pub session_policy: SessionPolicy,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_order_port() -> u16 {
    55555
}

fn default_trade_port() -> u16 {
    55556
}

fn default_max_payload_size() -> usize {
    DEFAULT_MAX_PAYLOAD_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            order_port: default_order_port(),
            trade_port: default_trade_port(),
            read_timeout_ms: 0,
            max_connections: 0,
            max_payload_size: default_max_payload_size(),
            session_policy: SessionPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Loopback config on ephemeral ports.
    pub fn ephemeral() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            order_port: 0,
            trade_port: 0,
            ..Self::default()
        }
    }

    pub fn port(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Order => self.order_port,
            Channel::Trade => self.trade_port,
        }
    }

    /// `host:port` string for a channel's listener.
    pub fn listen_addr(&self, channel: Channel) -> String {
        format!("{}:{}", self.bind_address, self.port(channel))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }
}

/// Prometheus exposition endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_metrics_bind_address(),
            port: default_metrics_port(),
        }
    }
}

impl MetricsConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
