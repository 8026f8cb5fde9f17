//! Escrow record types.
//!
//! One record per (buyer, seller, asset) triple. A record whose `amount` is
//! zero does not exist: "never deposited" and "already paid out" look the
//! same to every authorization check.

use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, Timestamp};

/// Composite key identifying an escrow slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EscrowKey {
    pub buyer: AccountId,
    pub seller: AccountId,
    pub asset: AssetId,
}

impl EscrowKey {
    #[must_use]
    pub fn new(buyer: AccountId, seller: AccountId, asset: AssetId) -> Self {
        Self {
            buyer,
            seller,
            asset,
        }
    }
}

impl std::fmt::Display for EscrowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}->{}:{}",
            self.buyer.short(),
            self.seller.short(),
            self.asset.short()
        )
    }
}

/// Funds held for one triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EscrowRecord {
    /// Quantity actually received, after any transfer fee.
    pub amount: u128,
    /// Buyer has released the funds to the seller.
    pub approved: bool,
    /// When the deposit landed.
    pub created_at: Timestamp,
}

impl EscrowRecord {
    /// Whether the record holds funds.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.amount != 0
    }

    /// Lifecycle state as seen from outside.
    #[must_use]
    pub fn state(&self) -> EscrowState {
        match (self.is_live(), self.approved) {
            (false, _) => EscrowState::Empty,
            (true, false) => EscrowState::Held,
            (true, true) => EscrowState::HeldApproved,
        }
    }
}

/// Lifecycle of a triple:
///
/// ```text
/// EMPTY ─deposit─▶ HELD ─approve─▶ HELD_APPROVED
///   ▲               │                   │
///   └─cancel/withdraw(timeout)─┘        │
///   └──────────cancel/withdraw──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowState {
    Empty,
    Held,
    HeldApproved,
}

impl std::fmt::Display for EscrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "EMPTY"),
            Self::Held => write!(f, "HELD"),
            Self::HeldApproved => write!(f, "HELD_APPROVED"),
        }
    }
}
