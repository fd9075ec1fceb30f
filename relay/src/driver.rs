use crate::config::StationConfig;
use crate::error::DriverError;
use crate::frame::RxBuffer;
use crate::types::MacAddress;
use std::sync::Arc;

/// Receive callback registered with the driver.
///
/// Invoked from the driver's own context, possibly concurrently with the
/// consumer. Implementations must take ownership of `buf` before returning
/// and must not block.
pub trait FrameSink<B: RxBuffer>: Send + Sync {
    fn on_receive(&self, buf: B);
}

/// The radio driver underneath the relay.
pub trait RadioDriver: Send + Sync + 'static {
    type Buffer: RxBuffer;

    /// Install `sink` as the station interface's receive callback, replacing any previous one.
    fn register_receiver(&self, sink: Arc<dyn FrameSink<Self::Buffer>>) -> Result<(), DriverError>;

    /// Send one frame. All-or-nothing.
    fn transmit(&self, frame: &[u8]) -> Result<(), DriverError>;

    fn mac_address(&self) -> Result<MacAddress, DriverError>;

    /// Apply station credentials.
    fn configure(&self, station: &StationConfig) -> Result<(), DriverError>;

    /// Start (or restart) association. Completion is reported as a connection event.
    fn connect(&self) -> Result<(), DriverError>;
}
