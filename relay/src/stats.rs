use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated from both the receive callback and the consumer.
#[derive(Debug, Default)]
pub struct RelayStats {
    pub(crate) received: AtomicU64,
    pub(crate) evicted: AtomicU64,
    pub(crate) discarded_empty: AtomicU64,
    pub(crate) delivered: AtomicU64,
    pub(crate) oversized: AtomicU64,
    pub(crate) transmitted: AtomicU64,
    pub(crate) tx_rejected: AtomicU64,
    pub(crate) tx_failed: AtomicU64,
    pub(crate) connect_wait_timeouts: AtomicU64,
    pub(crate) not_connected: AtomicU64,
    pub(crate) link_ups: AtomicU64,
    pub(crate) link_downs: AtomicU64,
    pub(crate) drained: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub evicted: u64,
    pub discarded_empty: u64,
    pub delivered: u64,
    pub oversized: u64,
    pub transmitted: u64,
    pub tx_rejected: u64,
    pub tx_failed: u64,
    pub connect_wait_timeouts: u64,
    pub not_connected: u64,
    pub link_ups: u64,
    pub link_downs: u64,
    pub drained: u64,
}

impl RelayStats {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            received: load(&self.received),
            evicted: load(&self.evicted),
            discarded_empty: load(&self.discarded_empty),
            delivered: load(&self.delivered),
            oversized: load(&self.oversized),
            transmitted: load(&self.transmitted),
            tx_rejected: load(&self.tx_rejected),
            tx_failed: load(&self.tx_failed),
            connect_wait_timeouts: load(&self.connect_wait_timeouts),
            not_connected: load(&self.not_connected),
            link_ups: load(&self.link_ups),
            link_downs: load(&self.link_downs),
            drained: load(&self.drained),
        }
    }
}

impl StatsSnapshot {
    /// Frames that reached the ring but never reached the consumer.
    pub fn lost(&self) -> u64 {
        self.evicted + self.oversized + self.drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = RelayStats::default();
        assert_eq!(RelayStats::bump(&stats.received), 1);
        assert_eq!(RelayStats::bump(&stats.received), 2);
        RelayStats::bump(&stats.evicted);
        RelayStats::add(&stats.drained, 3);

        let snap = stats.snapshot();
        assert_eq!(snap.received, 2);
        assert_eq!(snap.evicted, 1);
        assert_eq!(snap.lost(), 4);
    }
}
