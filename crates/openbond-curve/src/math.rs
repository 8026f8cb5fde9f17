//! Pricing math for the linear curve `price(q) = q`.
//!
//! The cost of moving supply from `a` to `b` is the area under the curve,
//! `(b² - a²) / 2`. Minting inverts that area with an integer square root
//! and rounds down; burning evaluates it directly and rounds up.
//!
//! All arithmetic is checked; overflow surfaces as
//! [`OpenbondError::ArithmeticOverflow`].

use openbond_types::{OpenbondError, Result};

/// Integer square root, rounded down.
///
/// Returns `r` with `r*r <= n < (r+1)*(r+1)` for every `u128`.
#[must_use]
pub fn isqrt(n: u128) -> u128 {
    n.isqrt()
}

/// Marginal price at supply level `quantity`.
#[must_use]
pub fn price_per_token(quantity: u128) -> u128 {
    quantity
}

/// Units minted for `payment` at current `supply`:
/// `floor(sqrt(2*payment + supply²)) - supply`.
pub fn mint_for_payment(supply: u128, payment: u128) -> Result<u128> {
    let supply_sq = supply
        .checked_mul(supply)
        .ok_or(OpenbondError::ArithmeticOverflow)?;
    let radicand = payment
        .checked_mul(2)
        .and_then(|p| p.checked_add(supply_sq))
        .ok_or(OpenbondError::ArithmeticOverflow)?;
    // radicand >= supply², so the root never falls below supply.
    Ok(isqrt(radicand) - supply)
}

/// Payment returned for burning `amount` at current `supply`:
/// `ceil((supply² - (supply - amount)²) / 2)`.
pub fn refund_for_burn(supply: u128, amount: u128) -> Result<u128> {
    let remaining = supply
        .checked_sub(amount)
        .ok_or(OpenbondError::ArithmeticOverflow)?;
    let supply_sq = supply
        .checked_mul(supply)
        .ok_or(OpenbondError::ArithmeticOverflow)?;
    let area_x2 = supply_sq - remaining * remaining;
    Ok(area_x2 / 2 + area_x2 % 2)
}
