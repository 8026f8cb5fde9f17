//! # openbond-escrow
//!
//! **Escrow Ledger**: intermediates a one-shot deposit between an untrusted
//! buyer and seller.
//!
//! ## Architecture
//!
//! 1. **EscrowLedger**: one record per (buyer, seller, asset); deposits are
//!    measured on arrival so fee-charging assets are booked at what actually
//!    landed
//! 2. **CustodyAudit**: checks that the escrow account still holds at least
//!    what its live records owe
//!
//! ## Record Lifecycle
//!
//! ```text
//! EMPTY → deposit → HELD → approve → HELD_APPROVED → withdraw | cancel → EMPTY
//!                   HELD → cancel → EMPTY
//!                   HELD → withdraw (created_at + timeout) → EMPTY
//! ```
//!
//! Every mutating call runs under a reentrancy guard and clears state
//! before it moves funds out.

pub mod custody;
pub mod escrow;

pub use custody::{CustodyAudit, CustodyReport};
pub use escrow::EscrowLedger;
