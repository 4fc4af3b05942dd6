//! Uplink configuration.

use serde::Deserialize;

/// The server we link to. Services always initiate the connection.
#[derive(Debug, Clone, Deserialize)]
pub struct UplinkConfig {
    /// Uplink IP/hostname to connect to.
    pub host: String,
    /// Uplink server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Link password, sent in PASS and expected back from the uplink.
    pub password: String,
}

impl UplinkConfig {
    /// `host:port` for connecting.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_port() -> u16 {
    6667
}
