//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::CANCEL_CHECK_INTERVAL;
use crate::error::{Error, Result};

/// A cheap, cloneable cancel flag passed through wait loops, the parallel
/// pipeline, and every `StorageNodeClient`/`ChainClient` call.
///
/// Checking the token is the collaborator's responsibility; the token itself
/// never interrupts a thread, it only records that cancellation was
/// requested.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(Error::Cancelled)` if cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `total`, waking every [`CANCEL_CHECK_INTERVAL`] to observe
    /// cancellation promptly. Returns `Err(Error::Cancelled)` if cancelled
    /// before `total` elapses.
    pub fn sleep(&self, total: std::time::Duration) -> Result<()> {
        let mut remaining = total;
        loop {
            self.check()?;
            if remaining.is_zero() {
                return Ok(());
            }
            let step = remaining.min(CANCEL_CHECK_INTERVAL);
            thread::sleep(step);
            remaining -= step;
        }
    }
}
