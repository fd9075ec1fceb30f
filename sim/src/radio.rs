//! Simulated station radio.
//!
//! Stands in for the wifi driver: it associates after a short delay, reports
//! connection events on a channel, delivers frames to the registered receive
//! callback from its own thread and accepts frames for transmission.

use crate::config::{AP_MAC, RadioConfig};
use crate::frames::{ETH_HEADER_LEN, build_frame};
use mote_relay::{
    ConnectionEvent, DriverError, ERR_ARG, FrameSink, MacAddress, RadioDriver, RxBuffer,
    StationConfig,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tokio::sync::mpsc::UnboundedSender;

/// lwIP "not connected".
const ERR_CONN: i32 = -11;

/// Tracks every receive buffer the radio lends out.
#[derive(Debug, Default)]
pub struct BufferLedger {
    leased: AtomicU64,
    released: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LedgerSnapshot {
    pub leased: u64,
    pub released: u64,
    pub outstanding: u64,
}

impl BufferLedger {
    pub fn snapshot(&self) -> LedgerSnapshot {
        let leased = self.leased.load(Ordering::SeqCst);
        let released = self.released.load(Ordering::SeqCst);
        LedgerSnapshot {
            leased,
            released,
            outstanding: leased.saturating_sub(released),
        }
    }
}

/// Receive buffer lent to the relay.
pub struct SimBuffer {
    data: Vec<u8>,
    ledger: Arc<BufferLedger>,
}

impl RxBuffer for SimBuffer {
    fn payload(&self) -> &[u8] {
        &self.data
    }

    fn release(self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct SimRadio {
    config: RadioConfig,
    mtu: usize,
    sink: Mutex<Option<Arc<dyn FrameSink<SimBuffer>>>>,
    station: Mutex<Option<StationConfig>>,
    associated: Arc<AtomicBool>,
    ledger: Arc<BufferLedger>,
    events: UnboundedSender<ConnectionEvent>,
    tx_frames: AtomicU64,
    tx_bytes: AtomicU64,
}

impl SimRadio {
    pub fn new(config: RadioConfig, mtu: u16, events: UnboundedSender<ConnectionEvent>) -> Self {
        Self {
            config,
            mtu: mtu as usize,
            sink: Mutex::new(None),
            station: Mutex::new(None),
            associated: Arc::new(AtomicBool::new(false)),
            ledger: Arc::new(BufferLedger::default()),
            events,
            tx_frames: AtomicU64::new(0),
            tx_bytes: AtomicU64::new(0),
        }
    }

    pub fn ledger(&self) -> &Arc<BufferLedger> {
        &self.ledger
    }

    pub fn tx_frames(&self) -> u64 {
        self.tx_frames.load(Ordering::Relaxed)
    }

    pub fn tx_bytes(&self) -> u64 {
        self.tx_bytes.load(Ordering::Relaxed)
    }

    pub fn is_associated(&self) -> bool {
        self.associated.load(Ordering::SeqCst)
    }

    /// Power up the interface.
    pub fn start(&self) {
        self.emit(ConnectionEvent::Start);
    }

    /// Lose association with the access point.
    pub fn drop_link(&self) {
        if self.associated.swap(false, Ordering::SeqCst) {
            tracing::info!("Radio lost association");
            self.emit(ConnectionEvent::Disconnected);
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!(%event, "No listener for connection event");
        }
    }

    fn lease(&self, data: Vec<u8>) -> SimBuffer {
        self.ledger.leased.fetch_add(1, Ordering::SeqCst);
        SimBuffer {
            data,
            ledger: self.ledger.clone(),
        }
    }

    /// Deliver one frame to the receive callback, as the driver's rx path would.
    /// Frames arriving while unassociated or unregistered are dropped by the radio.
    pub fn receive(&self, data: Vec<u8>) -> bool {
        if !self.is_associated() {
            return false;
        }
        let sink = self
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match sink {
            Some(sink) => {
                sink.on_receive(self.lease(data));
                true
            }
            None => false,
        }
    }

    /// Run the receive loop on a dedicated thread until `shutdown` is set.
    pub fn spawn_rx(self: Arc<Self>, shutdown: Arc<AtomicBool>) -> thread::JoinHandle<u64> {
        thread::spawn(move || {
            let interval = self.config.rx_interval();
            let mut seq = 0u64;
            while !shutdown.load(Ordering::SeqCst) {
                let frame = build_frame(&self.config.mac, &AP_MAC, seq, self.config.frame_len);
                if self.receive(frame) {
                    seq += 1;
                }
                thread::sleep(interval);
            }
            tracing::debug!(delivered = seq, "Radio rx loop stopped");
            seq
        })
    }
}

impl RadioDriver for SimRadio {
    type Buffer = SimBuffer;

    fn register_receiver(&self, sink: Arc<dyn FrameSink<SimBuffer>>) -> Result<(), DriverError> {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
        Ok(())
    }

    fn transmit(&self, frame: &[u8]) -> Result<(), DriverError> {
        if frame.is_empty() || frame.len() > self.mtu + ETH_HEADER_LEN {
            return DriverError::check(ERR_ARG);
        }
        if !self.is_associated() {
            return DriverError::check(ERR_CONN);
        }
        self.tx_frames.fetch_add(1, Ordering::Relaxed);
        self.tx_bytes.fetch_add(frame.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn mac_address(&self) -> Result<MacAddress, DriverError> {
        Ok(self.config.mac)
    }

    fn configure(&self, station: &StationConfig) -> Result<(), DriverError> {
        if station.ssid.is_empty() {
            return Err(DriverError::InvalidArgument);
        }
        *self.station.lock().unwrap_or_else(PoisonError::into_inner) = Some(station.clone());
        Ok(())
    }

    fn connect(&self) -> Result<(), DriverError> {
        let ssid = self
            .station
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.ssid.clone())
            .ok_or_else(|| DriverError::Other("station not configured".to_string()))?;

        let delay = self.config.associate_delay();
        let events = self.events.clone();
        tracing::debug!(%ssid, ?delay, "Associating");
        // Association completes asynchronously, like the real radio.
        let associated = self.associated.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            associated.store(true, Ordering::SeqCst);
            let _ = events.send(ConnectionEvent::Connected);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn radio() -> (SimRadio, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = RadioConfig {
            associate_delay_ms: 5,
            ..RadioConfig::default()
        };
        (SimRadio::new(config, 1400, tx), rx)
    }

    #[test]
    fn test_transmit_requires_association() {
        let (radio, _events) = radio();
        assert_eq!(radio.transmit(&[0u8; 64]), Err(DriverError::Code(ERR_CONN)));
        assert_eq!(radio.transmit(&[]), Err(DriverError::InvalidArgument));
        assert_eq!(
            radio.transmit(&vec![0u8; 1400 + ETH_HEADER_LEN + 1]),
            Err(DriverError::InvalidArgument)
        );
        assert_eq!(radio.tx_frames(), 0);
    }

    #[test]
    fn test_receive_dropped_while_unassociated() {
        let (radio, _events) = radio();
        assert!(!radio.receive(vec![1, 2, 3]));
        assert_eq!(radio.ledger().snapshot().leased, 0);
    }

    #[test]
    fn test_connect_requires_configuration() {
        let (radio, _events) = radio();
        assert!(matches!(radio.connect(), Err(DriverError::Other(_))));
        assert_eq!(
            radio.configure(&StationConfig::new("", "")),
            Err(DriverError::InvalidArgument)
        );
    }

    #[tokio::test]
    async fn test_association_emits_connected() {
        let (radio, mut events) = radio();
        radio.start();
        assert_eq!(events.recv().await, Some(ConnectionEvent::Start));

        radio.configure(&StationConfig::new("lab", "pw")).unwrap();
        radio.connect().unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(ConnectionEvent::Connected));
        assert!(radio.is_associated());

        radio.drop_link();
        assert_eq!(events.recv().await, Some(ConnectionEvent::Disconnected));
        assert!(!radio.is_associated());
        // Already down: no second event.
        radio.drop_link();
        assert!(events.try_recv().is_err());
    }
}
