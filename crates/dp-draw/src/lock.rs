//! Draw reentrancy lock
//!
//! At most one draw is in flight at a time. Acquiring returns a [`DrawLease`];
//! the lock is free again once the lease is dropped, which happens when the
//! reveal settles, when the reveal is cancelled, or straight away when a draw
//! fails or has nothing to fill.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared in-flight flag
#[derive(Debug, Clone, Default)]
pub struct DrawLock {
    in_flight: Arc<AtomicBool>,
}

impl DrawLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, `None` if a draw is already in flight
    pub fn try_acquire(&self) -> Option<DrawLease> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| DrawLease {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_held(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Proof of holding the draw lock; releases on drop
#[derive(Debug)]
pub struct DrawLease {
    in_flight: Arc<AtomicBool>,
}

impl Drop for DrawLease {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
        log::debug!("[Draw] Lock released");
    }
}
