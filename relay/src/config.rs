use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_CAPACITY: usize = 30;
/// 300 link-check ticks at 1 Hz.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_MTU: u16 = 1400;

/// What `write` does when the link is still down once the connect wait expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectedWrite {
    /// Hand the frame to the driver anyway and let it reject the send.
    #[default]
    Attempt,
    /// Return `RelayError::NotConnected` without touching the driver.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Maximum number of received frames retained before the oldest is dropped.
    pub capacity: usize,
    pub connect_timeout_ms: u64,
    pub disconnected_write: DisconnectedWrite,
    pub mtu: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            disconnected_write: DisconnectedWrite::default(),
            mtu: DEFAULT_MTU,
        }
    }
}

impl RelayConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_disconnected_write(mut self, policy: DisconnectedWrite) -> Self {
        self.disconnected_write = policy;
        self
    }

    /// Check the configuration and return the queue capacity as a non-zero value.
    pub fn validate(&self) -> Result<NonZeroUsize, RelayError> {
        if self.mtu == 0 {
            return Err(RelayError::InvalidConfig("mtu must be non-zero".to_string()));
        }
        NonZeroUsize::new(self.capacity)
            .ok_or_else(|| RelayError::InvalidConfig("capacity must be at least 1".to_string()))
    }
}

/// Credentials and reconnect behaviour for the station interface.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub ssid: String,
    pub password: String,
    pub auto_reconnect: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            auto_reconnect: true,
        }
    }
}

impl StationConfig {
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: ssid.to_string(),
            password: password.to_string(),
            auto_reconnect: true,
        }
    }
}

impl std::fmt::Debug for StationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("auto_reconnect", &self.auto_reconnect)
            .finish()
    }
}
