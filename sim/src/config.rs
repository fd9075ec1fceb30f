use crate::error::SimError;
use crate::frames::MIN_FRAME_LEN;
use mote_relay::{MacAddress, RelayConfig, StationConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Station MAC used by the simulated radio ("MOTE").
pub const DEFAULT_MAC: MacAddress = MacAddress([0x02, 0x4d, 0x4f, 0x54, 0x45, 0x00]);
/// Access point MAC frames appear to come from.
pub const AP_MAC: MacAddress = MacAddress([0x02, 0x4d, 0x4f, 0x54, 0x45, 0x01]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub mac: MacAddress,
    /// Delay between two received frames.
    pub rx_interval_us: u64,
    pub frame_len: usize,
    /// How long association takes after `connect`.
    pub associate_delay_ms: u64,
    /// Drop the link this often; never when unset.
    pub flap_every_ms: Option<u64>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            mac: DEFAULT_MAC,
            rx_interval_us: 500,
            frame_len: 128,
            associate_delay_ms: 20,
            flap_every_ms: None,
        }
    }
}

impl RadioConfig {
    pub fn rx_interval(&self) -> Duration {
        Duration::from_micros(self.rx_interval_us)
    }

    pub fn associate_delay(&self) -> Duration {
        Duration::from_millis(self.associate_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub read_buf: usize,
    /// Send every received frame back out through `write`.
    pub echo: bool,
    pub duration_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            read_buf: 1514,
            echo: true,
            duration_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub relay: RelayConfig,
    pub station: StationConfig,
    pub radio: RadioConfig,
    pub consumer: ConsumerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Short connect wait so echo writes during a link flap do not stall shutdown.
            relay: RelayConfig::default().with_connect_timeout(Duration::from_millis(1_000)),
            station: StationConfig::new("mote-sim", ""),
            radio: RadioConfig::default(),
            consumer: ConsumerConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let raw = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.relay.validate()?;
        if self.radio.frame_len < MIN_FRAME_LEN {
            return Err(SimError::Config(format!(
                "frame_len must be at least {} bytes",
                MIN_FRAME_LEN
            )));
        }
        if self.consumer.read_buf == 0 {
            return Err(SimError::Config("read_buf must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.consumer.duration_ms)
    }
}
