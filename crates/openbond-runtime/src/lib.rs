//! # openbond-runtime
//!
//! Execution primitives shared by the OpenBond engines:
//!
//! 1. **ReentrancyLock / CallGuard**: rejects nested entry into a protected
//!    operation and releases itself on every exit path
//! 2. **InMemoryLedger**: a [`FungibleLedger`](openbond_types::FungibleLedger)
//!    with allowances, per-asset transfer fees and failure injection

pub mod guard;
pub mod memory_ledger;

pub use guard::{CallGuard, ReentrancyLock};
pub use memory_ledger::{InMemoryLedger, UNLIMITED_ALLOWANCE};
