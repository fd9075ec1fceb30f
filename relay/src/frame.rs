//! Ownership adapter for receive buffers lent to us by the radio driver.
//!
//! The driver hands over a buffer together with the obligation to give it back.
//! [`Frame`] carries that obligation: the buffer is returned exactly once, either
//! through [`Frame::release`] or when the frame is dropped (eviction, teardown).

/// A receive buffer owned by the driver until it is released.
///
/// `release` consumes the buffer, so a second release cannot be expressed.
pub trait RxBuffer: Send + 'static {
    /// Received bytes.
    fn payload(&self) -> &[u8];

    /// Return the underlying storage to the driver.
    fn release(self);
}

/// A received frame queued for the consumer.
pub struct Frame<B: RxBuffer> {
    buf: Option<B>,
}

impl<B: RxBuffer> Frame<B> {
    pub fn new(buf: B) -> Self {
        Self { buf: Some(buf) }
    }

    pub fn payload(&self) -> &[u8] {
        match &self.buf {
            Some(buf) => buf.payload(),
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.payload().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand the buffer back to the driver.
    pub fn release(mut self) {
        if let Some(buf) = self.buf.take() {
            buf.release();
        }
    }
}

impl<B: RxBuffer> Drop for Frame<B> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            buf.release();
        }
    }
}

impl<B: RxBuffer> std::fmt::Debug for Frame<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame").field("len", &self.len()).finish()
    }
}
