//! Events surfaced to off-chain indexers.
//!
//! Each engine appends an [`EventRecord`] for every completed state change.
//! Indexers rebuild engine state by replaying the stream; [`EventLog::root`]
//! lets two replicas confirm they saw the same stream without comparing
//! payloads.
//!
//! The field order of every variant is part of the canonical encoding and
//! must not change.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{constants, AccountId, AssetId, Timestamp};

/// A completed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Supply issued against payment.
    Purchased {
        buyer: AccountId,
        payment: u128,
        minted: u128,
    },
    /// Supply burned against a refund.
    Sold {
        seller: AccountId,
        burned: u128,
        refund: u128,
    },
    /// Funds placed in escrow. `amount` is what actually arrived.
    Deposited {
        buyer: AccountId,
        seller: AccountId,
        asset: AssetId,
        amount: u128,
    },
    /// Buyer released the funds to the seller.
    WithdrawApproved {
        buyer: AccountId,
        seller: AccountId,
        asset: AssetId,
    },
    /// Buyer took the funds back.
    DepositCancelled {
        buyer: AccountId,
        seller: AccountId,
        asset: AssetId,
        amount: u128,
    },
    /// Seller collected the funds.
    Withdrawn {
        buyer: AccountId,
        seller: AccountId,
        asset: AssetId,
        amount: u128,
    },
}

impl EngineEvent {
    /// Stable one-byte tag for the canonical encoding.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::Purchased { .. } => 1,
            Self::Sold { .. } => 2,
            Self::Deposited { .. } => 3,
            Self::WithdrawApproved { .. } => 4,
            Self::DepositCancelled { .. } => 5,
            Self::Withdrawn { .. } => 6,
        }
    }

    /// Canonical bytes: tag, then fields in declaration order. Addresses
    /// are raw 20 bytes, amounts 16 bytes little-endian.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(96);
        out.push(self.tag());
        match self {
            Self::Purchased {
                buyer,
                payment,
                minted,
            } => {
                out.extend_from_slice(buyer.as_bytes());
                out.extend_from_slice(&payment.to_le_bytes());
                out.extend_from_slice(&minted.to_le_bytes());
            }
            Self::Sold {
                seller,
                burned,
                refund,
            } => {
                out.extend_from_slice(seller.as_bytes());
                out.extend_from_slice(&burned.to_le_bytes());
                out.extend_from_slice(&refund.to_le_bytes());
            }
            Self::WithdrawApproved {
                buyer,
                seller,
                asset,
            } => {
                out.extend_from_slice(buyer.as_bytes());
                out.extend_from_slice(seller.as_bytes());
                out.extend_from_slice(asset.as_bytes());
            }
            Self::Deposited {
                buyer,
                seller,
                asset,
                amount,
            }
            | Self::DepositCancelled {
                buyer,
                seller,
                asset,
                amount,
            }
            | Self::Withdrawn {
                buyer,
                seller,
                asset,
                amount,
            } => {
                out.extend_from_slice(buyer.as_bytes());
                out.extend_from_slice(seller.as_bytes());
                out.extend_from_slice(asset.as_bytes());
                out.extend_from_slice(&amount.to_le_bytes());
            }
        }
        out
    }
}

/// An event with its position in the stream and the time it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub at: Timestamp,
    pub event: EngineEvent,
}

/// Append-only event stream owned by one engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_seq: u64,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn emit(&mut self, at: Timestamp, event: EngineEvent) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.push(EventRecord { seq, at, event });
        seq
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    #[must_use]
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hand the buffered records to an indexer. Sequence numbers keep
    /// counting from where they were.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    /// Digest of the buffered records.
    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        compute_event_root(&self.records)
    }
}

/// SHA-256 over the canonical encoding of `records`, in order.
#[must_use]
pub fn compute_event_root(records: &[EventRecord]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::EVENT_ROOT_DOMAIN);
    hasher.update((records.len() as u64).to_le_bytes());

    for record in records {
        hasher.update(record.seq.to_le_bytes());
        hasher.update(record.at.to_le_bytes());
        hasher.update(record.event.canonical_bytes());
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase(minted: u128) -> EngineEvent {
        EngineEvent::Purchased {
            buyer: AccountId::from_low_u64(1),
            payment: 6,
            minted,
        }
    }

    #[test]
    fn emit_assigns_sequential_numbers() {
        let mut log = EventLog::new();
        assert_eq!(log.emit(10, purchase(3)), 0);
        assert_eq!(log.emit(11, purchase(4)), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().at, 11);
    }

    #[test]
    fn drain_keeps_sequence_running() {
        let mut log = EventLog::new();
        log.emit(1, purchase(1));
        let drained = log.drain();
        assert_eq!(drained.len(), 1);
        assert!(log.is_empty());
        assert_eq!(log.emit(2, purchase(2)), 1);
    }

    #[test]
    fn root_is_deterministic() {
        let mut a = EventLog::new();
        let mut b = EventLog::new();
        for log in [&mut a, &mut b] {
            log.emit(5, purchase(3));
            log.emit(6, purchase(4));
        }
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn root_depends_on_amounts_and_order() {
        let mut a = EventLog::new();
        a.emit(5, purchase(3));
        a.emit(6, purchase(4));

        let mut b = EventLog::new();
        b.emit(5, purchase(4));
        b.emit(6, purchase(3));

        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn empty_root_is_stable() {
        assert_eq!(compute_event_root(&[]), EventLog::new().root());
    }

    #[test]
    fn canonical_bytes_have_distinct_tags() {
        let buyer = AccountId::from_low_u64(1);
        let seller = AccountId::from_low_u64(2);
        let asset = AssetId::from_low_u64(3);
        let cancelled = EngineEvent::DepositCancelled {
            buyer,
            seller,
            asset,
            amount: 5,
        };
        let withdrawn = EngineEvent::Withdrawn {
            buyer,
            seller,
            asset,
            amount: 5,
        };
        assert_ne!(cancelled.canonical_bytes(), withdrawn.canonical_bytes());
        assert_eq!(cancelled.canonical_bytes().len(), 1 + 20 * 3 + 16);
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = EventRecord {
            seq: 7,
            at: 1_000,
            event: EngineEvent::WithdrawApproved {
                buyer: AccountId::from_low_u64(1),
                seller: AccountId::from_low_u64(2),
                asset: AssetId::from_low_u64(3),
            },
        };
        let json = serde_json::to_string(&rec).unwrap();
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
