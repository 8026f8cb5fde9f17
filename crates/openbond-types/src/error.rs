//! Error types for the OpenBond engines.
//!
//! All errors use the `OB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Amount / input validation errors
//! - 2xx: Bonding-curve market errors
//! - 3xx: Escrow errors
//! - 4xx: Ledger / transfer errors
//! - 5xx: Execution guard errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AssetId, Timestamp};

/// Central error enum for all OpenBond operations.
///
/// Every variant is fatal to the call that produced it: the component's
/// state is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenbondError {
    // =================================================================
    // Input Errors (1xx)
    // =================================================================
    /// A deposit amount of zero was requested, or nothing arrived.
    #[error("OB_ERR_100: Amount must be greater than zero")]
    ZeroAmount,

    /// A purchase with zero payment.
    #[error("OB_ERR_101: Payment must be greater than zero")]
    ZeroPayment,

    /// A null asset or counterparty address.
    #[error("OB_ERR_102: Zero address not allowed")]
    ZeroAddress,

    /// A sale of zero units.
    #[error("OB_ERR_103: Invalid amount")]
    InvalidAmount,

    /// Checked arithmetic overflowed or underflowed.
    #[error("OB_ERR_104: Arithmetic overflow")]
    ArithmeticOverflow,

    // =================================================================
    // Market Errors (2xx)
    // =================================================================
    /// The seller holds fewer units than they are trying to sell.
    #[error("OB_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// The market does not hold enough payment to honour the refund.
    #[error("OB_ERR_201: Insufficient reserve: need {needed}, have {available}")]
    InsufficientReserve { needed: u128, available: u128 },

    /// The computed output is below the caller's floor.
    #[error("OB_ERR_202: Slippage exceeded: got {got}, want at least {want}")]
    SlippageExceeded { got: u128, want: u128 },

    /// The caller bought too recently to sell.
    #[error("OB_ERR_203: Cooldown active until {expiry}")]
    CooldownActive { expiry: Timestamp },

    // =================================================================
    // Escrow Errors (3xx)
    // =================================================================
    /// No live escrow record exists for the caller's triple.
    #[error("OB_ERR_300: Not authorized or no deposit found")]
    NotAuthorizedOrNoDepositFound,

    /// The buyer has not approved and the timeout has not elapsed.
    #[error("OB_ERR_301: Withdraw not allowed before {unlocks_at} without buyer approval")]
    WithdrawNotAllowed { unlocks_at: Timestamp },

    /// The escrow holds less of an asset than its live records owe.
    #[error("OB_ERR_302: Custody shortfall for {asset}: held {held}, owed {owed}")]
    CustodyShortfall { asset: AssetId, held: u128, owed: u128 },

    // =================================================================
    // Ledger Errors (4xx)
    // =================================================================
    /// The external ledger reported a failed transfer.
    #[error("OB_ERR_400: Transfer failed")]
    TransferFailed,

    // =================================================================
    // Guard Errors (5xx)
    // =================================================================
    /// A protected operation was re-entered before the outer call returned.
    #[error("OB_ERR_500: Reentrant call")]
    ReentrantCall,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("OB_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("OB_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenbondError>;

impl From<serde_json::Error> for OpenbondError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
