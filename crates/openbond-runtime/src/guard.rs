//! Reentrancy guard.
//!
//! An engine holds one [`ReentrancyLock`] next to its state. Every protected
//! operation calls [`ReentrancyLock::enter`] before touching anything; the
//! returned [`CallGuard`] clears the flag when it drops, on every exit path.

use std::cell::Cell;

use openbond_types::{OpenbondError, Result};

/// Entered flag for one engine instance.
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    entered: Cell<bool>,
}

impl ReentrancyLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the engine as inside a protected call.
    ///
    /// # Errors
    /// Returns [`OpenbondError::ReentrantCall`] if a call is already running.
    pub fn enter(&self) -> Result<CallGuard<'_>> {
        if self.entered.replace(true) {
            tracing::warn!("Reentrant call rejected");
            return Err(OpenbondError::ReentrantCall);
        }
        Ok(CallGuard { lock: self })
    }

    /// Whether a protected call is currently running.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

/// Scope of one protected call. Releases the lock on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct CallGuard<'a> {
    lock: &'a ReentrancyLock,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.lock.entered.set(false);
    }
}
