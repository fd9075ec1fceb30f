//! Bounded frame ring between the driver's receive callback and the consumer.
//!
//! One producer (driver callback) and one consumer (read path) touch the ring
//! from different execution contexts, so every mutation happens under a single
//! mutex. When full, the oldest frame is dropped rather than blocking the
//! producer: stale frames are the least useful ones on a live link.

use crate::frame::{Frame, RxBuffer};
use crate::signal::Signal;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What happened to the ring on a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The frame was queued and the oldest one was dropped to make room.
    Evicted,
}

/// Bounded FIFO of received frames with drop-oldest backpressure.
pub struct FrameRing<B: RxBuffer> {
    inner: Mutex<VecDeque<Frame<B>>>,
    capacity: usize,
    // Mirrors `!inner.is_empty()`; only updated while `inner` is locked.
    ready: Signal,
}

impl<B: RxBuffer> FrameRing<B> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            // One spare slot so the push-then-evict step never reallocates.
            inner: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
            ready: Signal::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame<B>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// "Frames available" signal.
    pub fn readiness(&self) -> &Signal {
        &self.ready
    }

    /// Append a frame, dropping the oldest one if the ring overflows.
    ///
    /// Never blocks on the consumer and does O(1) work.
    pub fn push(&self, frame: Frame<B>) -> PushOutcome {
        let evicted = {
            let mut q = self.lock();
            q.push_back(frame);
            let evicted = if q.len() > self.capacity {
                q.pop_front()
            } else {
                None
            };
            self.ready.set();
            evicted
        };

        // Return the evicted buffer to the driver outside the critical section.
        match evicted {
            Some(oldest) => {
                oldest.release();
                PushOutcome::Evicted
            }
            None => PushOutcome::Queued,
        }
    }

    /// Take the oldest frame. Ownership, and the duty to release it, moves to the caller.
    pub fn pop(&self) -> Option<Frame<B>> {
        let mut q = self.lock();
        let frame = q.pop_front()?;
        if q.is_empty() {
            self.ready.clear();
        }
        Some(frame)
    }

    /// Release every retained frame. Returns how many were released.
    pub fn drain(&self) -> usize {
        let frames: Vec<Frame<B>> = {
            let mut q = self.lock();
            self.ready.clear();
            q.drain(..).collect()
        };
        let n = frames.len();
        frames.into_iter().for_each(Frame::release);
        n
    }
}
