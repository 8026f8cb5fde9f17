//! # openbond-curve
//!
//! **Bonding-curve market**: issues supply against payment along
//! `price(q) = q` and buys it back along the same curve.
//!
//! - **Minting** inverts the curve area with an exact-floor integer square
//!   root, so a buyer never receives more than the payment covers
//! - **Burning** evaluates the area directly and rounds up; a hard reserve
//!   check keeps the market from paying out what it does not hold
//! - **Cooldown**: an account must wait `cooldown_secs` after buying
//!   before it can sell
//!
//! ```text
//! buy:  payment ─transfer_from─▶ market account ; supply += floor(√(2p + S²)) - S
//! sell: supply -= a ; market account ─transfer─▶ seller ⌈(S² - (S-a)²)/2⌉
//! ```

pub mod market;
pub mod math;

pub use market::BondingCurveMarket;
pub use math::{isqrt, mint_for_payment, price_per_token, refund_for_burn};
