//! Interface to the external fungible ledger.
//!
//! The ledger owns balances; the engines only observe and move them. Every
//! movement reports success as a flag instead of failing loudly, and the
//! engines must check it.
//!
//! Methods take `&self`: a ledger is free to run arbitrary code during a
//! transfer, including calling back into the engine that invoked it.

use crate::{AccountId, AssetId};

/// Balance tracking plus transfer-with-return-status.
pub trait FungibleLedger {
    /// Balance of `account` in `asset`.
    fn balance_of(&self, asset: AssetId, account: AccountId) -> u128;

    /// Move `amount` of `asset` from `from` (the calling engine's own
    /// account) to `to`. Returns `false` on failure.
    fn transfer(&self, asset: AssetId, from: AccountId, to: AccountId, amount: u128) -> bool;

    /// Move `amount` of `asset` from `from` to `to` on the authority of
    /// `spender`'s allowance. Returns `false` on failure.
    ///
    /// The amount credited to `to` may be less than `amount` for assets
    /// that charge a transfer fee.
    fn transfer_from(
        &self,
        asset: AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> bool;
}
