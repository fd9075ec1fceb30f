//! Counting buffers and a scriptable driver for unit tests.

use crate::config::StationConfig;
use crate::driver::{FrameSink, RadioDriver};
use crate::error::{DriverError, ERR_OK};
use crate::frame::RxBuffer;
use crate::types::MacAddress;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) const TEST_MAC: MacAddress = MacAddress([0x02, 0x52, 0x4f, 0x53, 0x53, 0x00]);

#[derive(Default)]
struct PoolState {
    leased: usize,
    released: Vec<u64>,
}

/// Hands out buffers and records every release by buffer id.
#[derive(Clone, Default)]
pub(crate) struct Pool {
    state: Arc<Mutex<PoolState>>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lease(&self, id: u64, len: usize) -> TestBuffer {
        self.lease_with(id, vec![id as u8; len])
    }

    pub fn lease_with(&self, id: u64, data: Vec<u8>) -> TestBuffer {
        self.state.lock().unwrap().leased += 1;
        TestBuffer {
            id,
            data,
            pool: self.clone(),
        }
    }

    pub fn released(&self) -> Vec<u64> {
        self.state.lock().unwrap().released.clone()
    }

    pub fn release_count(&self, id: u64) -> usize {
        self.state
            .lock()
            .unwrap()
            .released
            .iter()
            .filter(|r| **r == id)
            .count()
    }

    pub fn outstanding(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.leased - state.released.len()
    }
}

pub(crate) struct TestBuffer {
    id: u64,
    data: Vec<u8>,
    pool: Pool,
}

impl RxBuffer for TestBuffer {
    fn payload(&self) -> &[u8] {
        &self.data
    }

    fn release(self) {
        self.pool.state.lock().unwrap().released.push(self.id);
    }
}

pub(crate) struct TestDriver {
    sink: Mutex<Option<Arc<dyn FrameSink<TestBuffer>>>>,
    transmitted: Mutex<Vec<Vec<u8>>>,
    tx_code: AtomicI32,
    reject_registration: AtomicBool,
    pub registrations: AtomicUsize,
    pub connects: AtomicUsize,
    pub configured: Mutex<Option<StationConfig>>,
}

impl TestDriver {
    pub fn new() -> Self {
        Self {
            sink: Mutex::new(None),
            transmitted: Mutex::new(Vec::new()),
            tx_code: AtomicI32::new(ERR_OK),
            reject_registration: AtomicBool::new(false),
            registrations: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            configured: Mutex::new(None),
        }
    }

    pub fn set_tx_code(&self, code: i32) {
        self.tx_code.store(code, Ordering::SeqCst);
    }

    pub fn reject_registration(&self, reject: bool) {
        self.reject_registration.store(reject, Ordering::SeqCst);
    }

    /// Play the driver's receive callback. Without a registered sink the buffer is freed here.
    pub fn deliver(&self, buf: TestBuffer) -> bool {
        let sink = self.sink.lock().unwrap().clone();
        match sink {
            Some(sink) => {
                sink.on_receive(buf);
                true
            }
            None => {
                buf.release();
                false
            }
        }
    }

    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.transmitted.lock().unwrap().clone()
    }
}

impl RadioDriver for TestDriver {
    type Buffer = TestBuffer;

    fn register_receiver(&self, sink: Arc<dyn FrameSink<TestBuffer>>) -> Result<(), DriverError> {
        if self.reject_registration.load(Ordering::SeqCst) {
            return Err(DriverError::Other("rx callback rejected".to_string()));
        }
        *self.sink.lock().unwrap() = Some(sink);
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn transmit(&self, frame: &[u8]) -> Result<(), DriverError> {
        DriverError::check(self.tx_code.load(Ordering::SeqCst))?;
        self.transmitted.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    fn mac_address(&self) -> Result<MacAddress, DriverError> {
        Ok(TEST_MAC)
    }

    fn configure(&self, station: &StationConfig) -> Result<(), DriverError> {
        *self.configured.lock().unwrap() = Some(station.clone());
        Ok(())
    }

    fn connect(&self) -> Result<(), DriverError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
