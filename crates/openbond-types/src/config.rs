//! Configuration types for the OpenBond engines.

use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, AssetId, OpenbondError, Result};

/// Top-level configuration covering both engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub market: MarketConfig,
    pub escrow: EscrowConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the engines cannot run with.
    ///
    /// The two engines must not share a custody account: the market reads
    /// its reserve from the account balance, which would then include
    /// escrowed deposits.
    pub fn validate(&self) -> Result<()> {
        self.market.validate()?;
        self.escrow.validate()?;
        if self.market.account == self.escrow.account {
            return Err(OpenbondError::Configuration(format!(
                "market and escrow must use distinct custody accounts, both are {}",
                self.market.account
            )));
        }
        Ok(())
    }
}

/// Bonding-curve market configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// The market's own custody account on the payment ledger.
    pub account: AccountId,
    /// Asset accepted as payment and paid out on sales.
    pub payment_asset: AssetId,
    /// Seconds between a purchase and the buyer's next sale.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

impl MarketConfig {
    #[must_use]
    pub fn new(account: AccountId, payment_asset: AssetId) -> Self {
        Self {
            account,
            payment_asset,
            cooldown_secs: constants::SELL_COOLDOWN_SECS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.account.is_zero() {
            return Err(OpenbondError::Configuration(
                "market account must not be the zero address".into(),
            ));
        }
        if self.payment_asset.is_zero() {
            return Err(OpenbondError::Configuration(
                "payment asset must not be the zero address".into(),
            ));
        }
        if self.cooldown_secs == 0 {
            return Err(OpenbondError::Configuration(
                "sell cooldown must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Escrow ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// The escrow's own custody account on the asset ledger.
    pub account: AccountId,
    /// Seconds after deposit at which the seller may withdraw unapproved.
    #[serde(default = "default_withdraw_timeout")]
    pub withdraw_timeout_secs: u64,
}

impl EscrowConfig {
    #[must_use]
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            withdraw_timeout_secs: constants::ESCROW_WITHDRAW_TIMEOUT_SECS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.account.is_zero() {
            return Err(OpenbondError::Configuration(
                "escrow account must not be the zero address".into(),
            ));
        }
        if self.withdraw_timeout_secs == 0 {
            return Err(OpenbondError::Configuration(
                "withdraw timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_cooldown() -> u64 {
    constants::SELL_COOLDOWN_SECS
}

fn default_withdraw_timeout() -> u64 {
    constants::ESCROW_WITHDRAW_TIMEOUT_SECS
}
