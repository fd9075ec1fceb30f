//! Station connection state machine.
//!
//! Turns the radio's connection events into driver calls and link transitions
//! on the relay:
//! - `Start`: apply credentials and begin association.
//! - `Connected`: register the receive callback and raise the link signal.
//! - `Disconnected`: drop the link signal and, if configured, re-associate.

use crate::config::StationConfig;
use crate::driver::RadioDriver;
use crate::error::RelayError;
use crate::relay::Relay;
use crate::types::ConnectionEvent;
use std::sync::Arc;

pub struct Station<D: RadioDriver> {
    relay: Arc<Relay<D>>,
    config: StationConfig,
}

impl<D: RadioDriver> Station<D> {
    pub fn new(relay: Arc<Relay<D>>, config: StationConfig) -> Self {
        Self { relay, config }
    }

    pub fn relay(&self) -> &Arc<Relay<D>> {
        &self.relay
    }

    /// Handle one connection event. Driver failures are returned to the caller unretried.
    pub fn handle(&self, event: ConnectionEvent) -> Result<(), RelayError> {
        tracing::debug!(%event, ssid = %self.config.ssid, "Station event");
        let driver = self.relay.driver();
        match event {
            ConnectionEvent::Start => {
                driver.configure(&self.config)?;
                driver.connect()?;
                tracing::info!(ssid = %self.config.ssid, "Connecting");
            }
            ConnectionEvent::Connected => {
                self.relay.connection_state_changed(true)?;
            }
            ConnectionEvent::Disconnected => {
                self.relay.connection_state_changed(false)?;
                if self.config.auto_reconnect {
                    driver.connect()?;
                    tracing::info!(ssid = %self.config.ssid, "Reconnecting");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::testing::TestDriver;
    use std::sync::atomic::Ordering;

    fn station(auto_reconnect: bool) -> Station<TestDriver> {
        let relay = Relay::new(Arc::new(TestDriver::new()), RelayConfig::default()).unwrap();
        let mut config = StationConfig::new("lab", "secret");
        config.auto_reconnect = auto_reconnect;
        Station::new(Arc::new(relay), config)
    }

    #[test]
    fn test_start_configures_and_connects() {
        let station = station(true);
        station.handle(ConnectionEvent::Start).unwrap();

        let driver = station.relay().driver();
        let configured = driver.configured.lock().unwrap().clone().unwrap();
        assert_eq!(configured.ssid, "lab");
        assert_eq!(driver.connects.load(Ordering::SeqCst), 1);
        assert!(!station.relay().link().is_set());
    }

    #[test]
    fn test_connect_disconnect_cycle() {
        let station = station(true);
        station.handle(ConnectionEvent::Start).unwrap();
        station.handle(ConnectionEvent::Connected).unwrap();
        assert!(station.relay().link().is_set());
        assert_eq!(station.relay().driver().registrations.load(Ordering::SeqCst), 1);

        station.handle(ConnectionEvent::Disconnected).unwrap();
        assert!(!station.relay().link().is_set());
        assert_eq!(station.relay().driver().connects.load(Ordering::SeqCst), 2);

        station.handle(ConnectionEvent::Connected).unwrap();
        assert_eq!(station.relay().driver().registrations.load(Ordering::SeqCst), 2);
        assert_eq!(station.relay().stats().link_ups, 2);
    }

    #[test]
    fn test_no_reconnect_when_disabled() {
        let station = station(false);
        station.handle(ConnectionEvent::Connected).unwrap();
        station.handle(ConnectionEvent::Disconnected).unwrap();
        assert_eq!(station.relay().driver().connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registration_failure_propagates() {
        let station = station(true);
        station.relay().driver().reject_registration(true);
        let err = station.handle(ConnectionEvent::Connected).unwrap_err();
        assert!(matches!(err, RelayError::Registration(_)));
    }
}
