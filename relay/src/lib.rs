//! Frame relay between an interrupt-driven radio driver and a polling consumer.

mod config;
mod driver;
mod error;
mod frame;
mod relay;
mod ring;
mod signal;
mod station;
mod stats;
#[cfg(test)]
mod testing;
mod types;

pub use config::{
    DEFAULT_CAPACITY, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MTU, DisconnectedWrite, RelayConfig,
    StationConfig,
};
pub use driver::{FrameSink, RadioDriver};
pub use error::{DriverError, ERR_ARG, ERR_OK, RelayError};
pub use frame::{Frame, RxBuffer};
pub use relay::Relay;
pub use ring::{FrameRing, PushOutcome};
pub use signal::{Signal, WaitResult};
pub use station::Station;
pub use stats::{RelayStats, StatsSnapshot};
pub use types::*;
