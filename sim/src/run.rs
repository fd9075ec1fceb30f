use crate::config::SimConfig;
use crate::error::SimError;
use crate::frames::frame_seq;
use crate::radio::{LedgerSnapshot, SimRadio};
use mote_relay::{InterfaceInfo, Relay, RelayError, Station, StatsSnapshot};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// How long the consumer parks on the readiness signal before re-checking shutdown.
const READY_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsumerReport {
    pub frames: u64,
    pub bytes: u64,
    pub oversized: u64,
    pub out_of_order: u64,
    pub echoed: u64,
    pub echo_failed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub interface: InterfaceInfo,
    pub produced: u64,
    pub relay: StatsSnapshot,
    pub consumer: ConsumerReport,
    pub buffers: LedgerSnapshot,
    pub tx_frames: u64,
    pub tx_bytes: u64,
    pub drained: usize,
}

/// Drive the relay against the simulated radio for the configured duration.
pub async fn run(config: SimConfig) -> Result<Report, SimError> {
    config.validate()?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let radio = Arc::new(SimRadio::new(
        config.radio.clone(),
        config.relay.mtu,
        events_tx,
    ));
    let relay = Arc::new(Relay::new(radio.clone(), config.relay.clone())?);
    let station = Station::new(relay.clone(), config.station.clone());
    let shutdown = Arc::new(AtomicBool::new(false));

    let interface = relay.interface_info()?;
    tracing::info!(mac = %interface.mac, mtu = interface.mtu, "Interface up");

    let station_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if let Err(e) = station.handle(event) {
                tracing::error!(%event, error = %e, "Station failed");
                return Err(e);
            }
        }
        Ok::<(), RelayError>(())
    });

    let flapper = config.radio.flap_every_ms.map(|every| {
        let radio = radio.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(every.max(1)));
            tick.tick().await;
            while !shutdown.load(Ordering::SeqCst) {
                tick.tick().await;
                radio.drop_link();
            }
        })
    });

    radio.start();
    let rx_thread = radio.clone().spawn_rx(shutdown.clone());

    let consumer = {
        let relay = relay.clone();
        let shutdown = shutdown.clone();
        let read_buf = config.consumer.read_buf;
        let echo = config.consumer.echo;
        tokio::task::spawn_blocking(move || consume(&relay, &shutdown, read_buf, echo))
    };

    tokio::time::sleep(config.duration()).await;
    tracing::info!("Stopping simulation");
    shutdown.store(true, Ordering::SeqCst);

    if let Some(flapper) = flapper {
        flapper.abort();
    }
    let produced = tokio::task::spawn_blocking(move || rx_thread.join())
        .await?
        .map_err(|_| SimError::Task("radio rx thread panicked".to_string()))?;
    let consumer = consumer.await?;

    station_task.abort();
    if let Ok(Err(e)) = station_task.await {
        return Err(e.into());
    }

    let drained = relay.drain();
    let buffers = radio.ledger().snapshot();
    let report = Report {
        interface,
        produced,
        relay: relay.stats(),
        consumer,
        buffers,
        tx_frames: radio.tx_frames(),
        tx_bytes: radio.tx_bytes(),
        drained,
    };

    tracing::info!(
        produced = report.produced,
        delivered = report.relay.delivered,
        evicted = report.relay.evicted,
        outstanding = report.buffers.outstanding,
        "Simulation finished"
    );

    if buffers.outstanding != 0 {
        return Err(SimError::Leak {
            outstanding: buffers.outstanding,
        });
    }
    Ok(report)
}

/// Consumer loop: park on readiness, read, optionally echo the frame back out.
fn consume(
    relay: &Relay<SimRadio>,
    shutdown: &AtomicBool,
    read_buf: usize,
    echo: bool,
) -> ConsumerReport {
    let mut report = ConsumerReport::default();
    let mut buf = vec![0u8; read_buf];
    let mut last_seq: Option<u64> = None;

    loop {
        match relay.read(&mut buf) {
            Ok(n) => {
                report.frames += 1;
                report.bytes += n as u64;
                if let Some(seq) = frame_seq(&buf[..n]) {
                    if last_seq.is_some_and(|last| seq <= last) {
                        report.out_of_order += 1;
                    }
                    last_seq = Some(seq);
                }
                if echo {
                    match relay.write(&buf[..n]) {
                        Ok(()) => report.echoed += 1,
                        Err(e) => {
                            tracing::debug!(error = %e, "Echo failed");
                            report.echo_failed += 1;
                        }
                    }
                }
            }
            Err(RelayError::WouldBlock) => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                relay.readiness().wait_timeout(READY_POLL);
            }
            Err(RelayError::FrameTooLarge { .. }) => report.oversized += 1,
            Err(e) => {
                tracing::warn!(error = %e, "Read failed");
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use mote_relay::DisconnectedWrite;

    fn quick_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.consumer.duration_ms = 300;
        config.radio.rx_interval_us = 200;
        config.relay.connect_timeout_ms = 100;
        config
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_releases_every_buffer() {
        let report = run(quick_config()).await.unwrap();

        assert!(report.produced > 0);
        assert_eq!(report.buffers.outstanding, 0);
        assert_eq!(report.buffers.leased, report.produced);
        assert_eq!(report.consumer.out_of_order, 0);
        assert_eq!(
            report.relay.received,
            report.relay.delivered + report.relay.evicted + report.relay.drained as u64
        );
        assert_eq!(report.interface.mtu, 1400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tiny_read_buffer_discards_frames() {
        let mut config = quick_config();
        config.consumer.read_buf = 16;
        config.consumer.echo = false;

        let report = run(config).await.unwrap();
        assert_eq!(report.consumer.frames, 0);
        assert_eq!(report.consumer.oversized, report.relay.oversized);
        assert_eq!(report.buffers.outstanding, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_link_flaps_do_not_leak() {
        let mut config = quick_config();
        config.radio.flap_every_ms = Some(60);
        config.relay.disconnected_write = DisconnectedWrite::FailFast;

        let report = run(config).await.unwrap();
        assert!(report.relay.link_downs >= 1);
        assert_eq!(report.buffers.outstanding, 0);
        assert_eq!(report.consumer.out_of_order, 0);
    }
}
