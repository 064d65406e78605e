//! Collateral ratio.
//!
//! The collateral ratio `r` splits a stable amount `S` into two legs:
//!
//! ```text
//! collateral value = S * r
//! governance value = S * (1 - r)
//! ```
//!
//! Each value is converted to a token amount at that token's TWAP price in
//! stable, truncating toward zero. A leg worth nothing needs no price.

use meridian_pricefeed::PriceSource;
use meridian_types::{decimal, AssetPair, Decimal};

use crate::Result;

/// The two legs of a stable amount, as values in stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegValues {
    pub collateral: Decimal,
    pub governance: Decimal,
}

/// Split `stable` by `coll_ratio`.
pub fn split(stable: u128, coll_ratio: Decimal) -> Result<LegValues> {
    let stable = decimal::from_amount(stable)?;
    let collateral = decimal::checked_mul(stable, coll_ratio)?;
    let governance = decimal::checked_sub(stable, collateral)?;
    Ok(LegValues {
        collateral,
        governance,
    })
}

/// Token amount of `pair.base` worth `value` stable at the pair's TWAP.
pub fn token_amount(value: Decimal, pair: &AssetPair, prices: &dyn PriceSource) -> Result<u128> {
    if value.is_zero() {
        return Ok(0);
    }
    let price = prices.twap(pair)?;
    Ok(decimal::to_amount(decimal::checked_div(value, price)?)?)
}
