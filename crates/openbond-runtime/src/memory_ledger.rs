//! In-memory fungible ledger.
//!
//! A reference implementation of [`FungibleLedger`] for embedding and tests:
//! per-(account, asset) balances, allowances, an optional per-asset transfer
//! fee (burned), and a switch that makes every outbound movement report
//! failure. All mutations are atomic: either the full movement succeeds or
//! nothing changes.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use openbond_types::{
    constants::MAX_BPS, AccountId, AssetId, FungibleLedger, OpenbondError, Result,
};

/// Allowance value treated as unlimited; never decremented.
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

/// Balances, allowances and fee schedule for any number of assets.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    /// Per-(account, asset) balances.
    balances: RefCell<HashMap<(AccountId, AssetId), u128>>,
    /// Per-(owner, spender, asset) allowances.
    allowances: RefCell<HashMap<(AccountId, AccountId, AssetId), u128>>,
    /// Transfer fee in basis points, per asset.
    fees_bps: RefCell<HashMap<AssetId, u16>>,
    /// When set, `transfer` and `transfer_from` report failure.
    failing: Cell<bool>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue new units to `account`.
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if the balance would overflow.
    pub fn mint(&self, account: AccountId, asset: AssetId, amount: u128) -> Result<()> {
        let mut balances = self.balances.borrow_mut();
        let entry = balances.entry((account, asset)).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or(OpenbondError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Let `spender` move up to `amount` of `owner`'s `asset`.
    /// Overwrites the previous allowance.
    pub fn approve(&self, owner: AccountId, spender: AccountId, asset: AssetId, amount: u128) {
        self.allowances
            .borrow_mut()
            .insert((owner, spender, asset), amount);
    }

    #[must_use]
    pub fn allowance(&self, owner: AccountId, spender: AccountId, asset: AssetId) -> u128 {
        self.allowances
            .borrow()
            .get(&(owner, spender, asset))
            .copied()
            .unwrap_or(0)
    }

    /// Charge `bps` basis points on every movement of `asset`.
    ///
    /// # Errors
    /// Returns `Configuration` if `bps` exceeds 100%.
    pub fn set_transfer_fee_bps(&self, asset: AssetId, bps: u16) -> Result<()> {
        if bps > MAX_BPS {
            return Err(OpenbondError::Configuration(format!(
                "transfer fee {bps} bps exceeds {MAX_BPS}"
            )));
        }
        self.fees_bps.borrow_mut().insert(asset, bps);
        Ok(())
    }

    /// Fee charged on a movement of `amount` of `asset`, rounded down.
    #[must_use]
    pub fn fee_for(&self, asset: AssetId, amount: u128) -> u128 {
        let bps = self.fees_bps.borrow().get(&asset).copied().unwrap_or(0);
        if bps == 0 {
            return 0;
        }
        // amount * bps can only overflow for amounts near u128::MAX; split
        // to stay exact.
        let bps = u128::from(bps);
        let max = u128::from(MAX_BPS);
        (amount / max) * bps + (amount % max) * bps / max
    }

    /// Make every subsequent transfer report failure (or stop doing so).
    pub fn set_transfers_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Sum of all balances of `asset`.
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if the balances sum past `u128::MAX`.
    pub fn total_supply(&self, asset: AssetId) -> Result<u128> {
        self.balances
            .borrow()
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .try_fold(0u128, |total, (_, amount)| total.checked_add(*amount))
            .ok_or(OpenbondError::ArithmeticOverflow)
    }

    /// Debit `from`, credit `to` net of fee. Nothing changes unless every
    /// step succeeds.
    fn move_funds(&self, asset: AssetId, from: AccountId, to: AccountId, amount: u128) -> bool {
        if self.failing.get() {
            tracing::debug!(asset = %asset, from = %from, to = %to, amount, "Transfer forced to fail");
            return false;
        }
        let fee = self.fee_for(asset, amount);
        let net = amount - fee;

        let mut balances = self.balances.borrow_mut();
        let from_balance = balances.get(&(from, asset)).copied().unwrap_or(0);
        let Some(from_after) = from_balance.checked_sub(amount) else {
            tracing::debug!(asset = %asset, from = %from, amount, available = from_balance, "Transfer exceeds balance");
            return false;
        };

        if from == to {
            // Only the fee leaves the account.
            balances.insert((from, asset), from_balance - fee);
            return true;
        }

        let to_balance = balances.get(&(to, asset)).copied().unwrap_or(0);
        let Some(to_after) = to_balance.checked_add(net) else {
            return false;
        };

        balances.insert((from, asset), from_after);
        balances.insert((to, asset), to_after);
        true
    }
}

impl FungibleLedger for InMemoryLedger {
    fn balance_of(&self, asset: AssetId, account: AccountId) -> u128 {
        self.balances
            .borrow()
            .get(&(account, asset))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&self, asset: AssetId, from: AccountId, to: AccountId, amount: u128) -> bool {
        self.move_funds(asset, from, to, amount)
    }

    fn transfer_from(
        &self,
        asset: AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> bool {
        let key = (from, spender, asset);
        let allowed = if spender == from {
            UNLIMITED_ALLOWANCE
        } else {
            self.allowance(from, spender, asset)
        };
        if allowed < amount {
            tracing::debug!(asset = %asset, owner = %from, spender = %spender, amount, allowed, "Allowance exceeded");
            return false;
        }
        if !self.move_funds(asset, from, to, amount) {
            return false;
        }
        if spender != from && allowed != UNLIMITED_ALLOWANCE {
            self.allowances.borrow_mut().insert(key, allowed - amount);
        }
        true
    }
}
