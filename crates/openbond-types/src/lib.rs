//! # openbond-types
//!
//! Shared types, errors, and configuration for the **OpenBond** engines.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AssetId`]
//! - **Execution context**: [`CallContext`], [`Timestamp`]
//! - **Escrow model**: [`EscrowKey`], [`EscrowRecord`], [`EscrowState`]
//! - **Events**: [`EngineEvent`], [`EventRecord`], [`EventLog`]
//! - **Ledger interface**: [`FungibleLedger`]
//! - **Configuration**: [`EngineConfig`], [`MarketConfig`], [`EscrowConfig`]
//! - **Errors**: [`OpenbondError`] with `OB_ERR_` prefix codes
//! - **Constants**: cooldown, timeout and other defaults

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod escrow;
pub mod event;
pub mod ids;
pub mod ledger;

pub use config::*;
pub use context::*;
pub use error::*;
pub use escrow::*;
pub use event::*;
pub use ids::*;
pub use ledger::*;

// Constants are accessed via `openbond_types::constants::FOO`
// (not re-exported to avoid name collisions).
