//! Bounded hand-off between device reader threads and seed consumers.
//!
//! Producers never block: a byte offered to a full pool is dropped.
//! Consumers block until a byte arrives or the pool is cancelled.

use super::source::EntropyError;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Default number of buffered bytes.
pub const DEFAULT_POOL_CAPACITY: usize = 1000;

#[derive(Debug, Default)]
struct PoolState {
    bytes: VecDeque<u8>,
    cancelled: bool,
    dropped: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<PoolState>,
    available: Condvar,
    capacity: usize,
}

/// A cloneable handle to a bounded byte queue.
#[derive(Debug, Clone)]
pub struct HarvestPool {
    shared: Arc<Shared>,
}

impl HarvestPool {
    /// Creates a pool holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    bytes: VecDeque::with_capacity(capacity),
                    ..PoolState::default()
                }),
                available: Condvar::new(),
                capacity,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Offers a byte. Returns false if it was dropped.
    pub fn offer(&self, byte: u8) -> bool {
        let mut state = self.lock();
        if state.cancelled || state.bytes.len() >= self.shared.capacity {
            state.dropped += 1;
            return false;
        }
        state.bytes.push_back(byte);
        drop(state);
        self.shared.available.notify_one();
        true
    }

    /// Takes one byte, blocking while the pool is empty.
    pub fn take(&self) -> Result<u8, EntropyError> {
        let mut state = self.lock();
        loop {
            if state.cancelled {
                return Err(EntropyError::Cancelled);
            }
            if let Some(byte) = state.bytes.pop_front() {
                return Ok(byte);
            }
            state = self
                .shared
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Fills `dest`, blocking until every byte has arrived.
    pub fn take_into(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        for slot in dest.iter_mut() {
            *slot = self.take()?;
        }
        Ok(())
    }

    /// Cancels the pool and wakes every blocked consumer.
    pub fn cancel(&self) {
        let mut state = self.lock();
        if !state.cancelled {
            state.cancelled = true;
            state.bytes.clear();
            tracing::info!(dropped = state.dropped, "Harvest pool cancelled");
        }
        drop(state);
        self.shared.available.notify_all();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.lock().bytes.len()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum buffered bytes.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Offers dropped because the pool was full or cancelled.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}

impl Default for HarvestPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let pool = HarvestPool::new(4);
        assert!(pool.offer(1));
        assert!(pool.offer(2));
        assert_eq!(pool.take().unwrap(), 1);
        assert_eq!(pool.take().unwrap(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_full_pool_drops_offers() {
        let pool = HarvestPool::new(2);
        assert!(pool.offer(1));
        assert!(pool.offer(2));
        assert!(!pool.offer(3));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.dropped(), 1);
    }

    #[test]
    fn test_consumer_blocks_until_offer() {
        let pool = HarvestPool::new(8);
        let producer = pool.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.offer(0xAB);
        });
        assert_eq!(pool.take().unwrap(), 0xAB);
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_wakes_blocked_consumer() {
        let pool = HarvestPool::new(8);
        let consumer = pool.clone();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 4];
            consumer.take_into(&mut buf)
        });
        thread::sleep(Duration::from_millis(20));
        pool.cancel();
        assert_eq!(handle.join().unwrap(), Err(EntropyError::Cancelled));
        assert!(!pool.offer(1));
    }
}
