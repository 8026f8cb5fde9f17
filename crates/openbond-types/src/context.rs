//! Per-call execution context.
//!
//! Every mutating operation receives the identity of its caller and the
//! current time explicitly, so the engines stay deterministic and tests can
//! move the clock freely.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Seconds since the UNIX epoch.
pub type Timestamp = u64;

/// Who is calling, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The account invoking the operation.
    pub caller: AccountId,
    /// Execution time of the call.
    pub now: Timestamp,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: AccountId, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Context stamped with the wall clock.
    #[must_use]
    pub fn at_system_time(caller: AccountId) -> Self {
        // Pre-epoch clocks clamp to zero.
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        Self { caller, now }
    }

    /// Same caller, `secs` later.
    #[must_use]
    pub fn advanced_by(&self, secs: u64) -> Self {
        Self {
            caller: self.caller,
            now: self.now.saturating_add(secs),
        }
    }

    /// Same time, different caller.
    #[must_use]
    pub fn as_caller(&self, caller: AccountId) -> Self {
        Self {
            caller,
            now: self.now,
        }
    }
}
