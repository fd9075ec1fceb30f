use crate::config::{DisconnectedWrite, RelayConfig};
use crate::driver::{FrameSink, RadioDriver};
use crate::error::{DriverError, RelayError};
use crate::frame::{Frame, RxBuffer};
use crate::ring::{FrameRing, PushOutcome};
use crate::signal::{Signal, WaitResult};
use crate::stats::{RelayStats, StatsSnapshot};
use crate::types::{InterfaceInfo, Status};
use std::sync::Arc;

/// State reachable from the driver's receive callback.
///
/// Deliberately holds no reference to the driver, so registering it with the
/// driver does not create an ownership cycle.
struct RxPath<B: RxBuffer> {
    ring: FrameRing<B>,
    stats: RelayStats,
}

impl<B: RxBuffer> FrameSink<B> for RxPath<B> {
    fn on_receive(&self, buf: B) {
        RelayStats::bump(&self.stats.received);

        if buf.payload().is_empty() {
            RelayStats::bump(&self.stats.discarded_empty);
            tracing::trace!("Discarding zero-length frame");
            buf.release();
            return;
        }

        if self.ring.push(Frame::new(buf)) == PushOutcome::Evicted {
            let evicted = RelayStats::bump(&self.stats.evicted);
            tracing::warn!(
                capacity = self.ring.capacity(),
                evicted,
                "Too many frames pending, dropped the oldest one"
            );
        }
    }
}

/// Relay between the radio driver and a polling consumer.
///
/// Constructed once and shared between the driver callback (through
/// [`Relay::receiver`]) and the consumer's read/write calls.
pub struct Relay<D: RadioDriver> {
    driver: Arc<D>,
    rx: Arc<RxPath<D::Buffer>>,
    link: Signal,
    config: RelayConfig,
}

impl<D: RadioDriver> Relay<D> {
    pub fn new(driver: Arc<D>, config: RelayConfig) -> Result<Self, RelayError> {
        let capacity = config.validate()?;
        tracing::debug!(
            capacity = capacity.get(),
            connect_timeout = ?config.connect_timeout(),
            disconnected_write = ?config.disconnected_write,
            "Relay created"
        );
        Ok(Self {
            driver,
            rx: Arc::new(RxPath {
                ring: FrameRing::new(capacity),
                stats: RelayStats::default(),
            }),
            link: Signal::new(),
            config,
        })
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Receive callback to hand to the driver.
    pub fn receiver(&self) -> Arc<dyn FrameSink<D::Buffer>> {
        self.rx.clone()
    }

    /// Accept a frame from the driver. Same path as the registered receiver.
    pub fn on_receive(&self, buf: D::Buffer) {
        self.rx.on_receive(buf);
    }

    /// "Frames available" signal; set while at least one frame is queued.
    pub fn readiness(&self) -> &Signal {
        self.rx.ring.readiness()
    }

    /// "Link connected" signal.
    pub fn link(&self) -> &Signal {
        &self.link
    }

    pub fn pending(&self) -> usize {
        self.rx.ring.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.rx.stats.snapshot()
    }

    /// Copy the oldest queued frame into `dst` and return its length.
    ///
    /// Never blocks. Whenever a frame is queued, exactly one is consumed, even
    /// when it does not fit in `dst`. An oversized frame is dropped so a short
    /// buffer cannot stall the queue.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize, RelayError> {
        let frame = self.rx.ring.pop().ok_or(RelayError::WouldBlock)?;
        let len = frame.len();

        if len > dst.len() {
            RelayStats::bump(&self.rx.stats.oversized);
            tracing::warn!(len, capacity = dst.len(), "Dropping frame larger than read buffer");
            frame.release();
            return Err(RelayError::FrameTooLarge {
                len,
                capacity: dst.len(),
            });
        }

        dst[..len].copy_from_slice(frame.payload());
        frame.release();
        RelayStats::bump(&self.rx.stats.delivered);
        Ok(len)
    }

    /// `read` flattened to a status and byte count.
    pub fn read_status(&self, dst: &mut [u8]) -> (Status, usize) {
        match self.read(dst) {
            Ok(n) => (Status::Ok, n),
            Err(e) => (e.status(), 0),
        }
    }

    /// Transmit one frame, first waiting up to the connect timeout for the link.
    ///
    /// Blocks the caller. What happens when the wait expires with the link still
    /// down depends on [`RelayConfig::disconnected_write`].
    pub fn write(&self, frame: &[u8]) -> Result<(), RelayError> {
        let timeout = self.config.connect_timeout();
        if self.link.wait_timeout(timeout) == WaitResult::TimedOut {
            RelayStats::bump(&self.rx.stats.connect_wait_timeouts);
            match self.config.disconnected_write {
                DisconnectedWrite::FailFast => {
                    RelayStats::bump(&self.rx.stats.not_connected);
                    tracing::warn!(?timeout, len = frame.len(), "Link down, refusing to transmit");
                    return Err(RelayError::NotConnected { waited: timeout });
                }
                DisconnectedWrite::Attempt => {
                    tracing::warn!(?timeout, len = frame.len(), "Link still down, transmitting anyway");
                }
            }
        }

        match self.driver.transmit(frame) {
            Ok(()) => {
                RelayStats::bump(&self.rx.stats.transmitted);
                Ok(())
            }
            Err(DriverError::InvalidArgument) => {
                RelayStats::bump(&self.rx.stats.tx_rejected);
                tracing::debug!(len = frame.len(), "Driver rejected frame");
                Err(RelayError::TransmitRejected(DriverError::InvalidArgument))
            }
            Err(e) => {
                RelayStats::bump(&self.rx.stats.tx_failed);
                tracing::warn!(len = frame.len(), error = %e, "Transmit failed");
                Err(RelayError::TransmitFailed(e))
            }
        }
    }

    /// `write` flattened to a status.
    pub fn write_status(&self, frame: &[u8]) -> Status {
        match self.write(frame) {
            Ok(()) => Status::Ok,
            Err(e) => e.status(),
        }
    }

    /// Apply a link transition.
    ///
    /// On connect the relay (re)registers itself as the driver's receive
    /// callback before raising the link signal. A registration failure is
    /// returned and leaves the link down.
    pub fn connection_state_changed(&self, connected: bool) -> Result<(), RelayError> {
        if connected {
            self.driver
                .register_receiver(self.receiver())
                .map_err(RelayError::Registration)?;
            tracing::debug!("Receive callback registered");
            if self.link.set() {
                RelayStats::bump(&self.rx.stats.link_ups);
                tracing::info!("Link up");
            }
        } else if self.link.clear() {
            RelayStats::bump(&self.rx.stats.link_downs);
            tracing::info!("Link down");
        }
        Ok(())
    }

    pub fn interface_info(&self) -> Result<InterfaceInfo, RelayError> {
        Ok(InterfaceInfo {
            mac: self.driver.mac_address()?,
            mtu: self.config.mtu,
        })
    }

    /// Release every queued frame back to the driver.
    pub fn drain(&self) -> usize {
        let n = self.rx.ring.drain();
        RelayStats::add(&self.rx.stats.drained, n as u64);
        tracing::debug!(released = n, "Drained frame ring");
        n
    }
}
