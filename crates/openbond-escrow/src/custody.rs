//! Custody invariant checker.
//!
//! Invariant enforced after every escrow step:
//! ```text
//! ∀ asset: ledger.balance_of(asset, escrow) >= Σ live record amounts
//! ```
//!
//! The escrow can hold more than it owes (an overwritten deposit stays in
//! custody), never less. A shortfall means bookkeeping and custody have
//! drifted apart and the escrow must stop paying out.

use std::collections::BTreeSet;

use openbond_types::{AssetId, FungibleLedger, OpenbondError, Result};

use crate::escrow::EscrowLedger;

/// Held-versus-owed figures for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustodyReport {
    pub asset: AssetId,
    /// Balance of the escrow account on the ledger.
    pub held: u128,
    /// Sum of live record amounts.
    pub owed: u128,
}

impl CustodyReport {
    /// Custody in excess of what the records owe.
    #[must_use]
    pub fn surplus(&self) -> u128 {
        self.held.saturating_sub(self.owed)
    }

    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.held >= self.owed
    }
}

/// Compares an escrow's records against its ledger balances.
pub struct CustodyAudit<'a> {
    escrow: &'a EscrowLedger,
    ledger: &'a dyn FungibleLedger,
}

impl<'a> CustodyAudit<'a> {
    #[must_use]
    pub fn new(escrow: &'a EscrowLedger, ledger: &'a dyn FungibleLedger) -> Self {
        Self { escrow, ledger }
    }

    /// Held-versus-owed for `asset`.
    pub fn report(&self, asset: AssetId) -> Result<CustodyReport> {
        Ok(CustodyReport {
            asset,
            held: self
                .ledger
                .balance_of(asset, self.escrow.config().account),
            owed: self.escrow.locked_total(asset)?,
        })
    }

    /// Verify that custody covers the live records for `asset`.
    ///
    /// # Errors
    /// Returns [`OpenbondError::CustodyShortfall`] if held < owed.
    pub fn verify(&self, asset: AssetId) -> Result<()> {
        let report = self.report(asset)?;
        if !report.is_covered() {
            tracing::error!(
                asset = %asset,
                held = report.held,
                owed = report.owed,
                "Custody shortfall"
            );
            return Err(OpenbondError::CustodyShortfall {
                asset,
                held: report.held,
                owed: report.owed,
            });
        }
        Ok(())
    }

    /// Verify every asset with at least one live record.
    pub fn verify_all(&self) -> Result<()> {
        self.tracked_assets()
            .into_iter()
            .try_for_each(|asset| self.verify(asset))
    }

    /// Assets with at least one live record.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        let assets: BTreeSet<AssetId> = self
            .escrow
            .live_records()
            .into_iter()
            .map(|(key, _)| key.asset)
            .collect();
        assets.into_iter().collect()
    }
}
