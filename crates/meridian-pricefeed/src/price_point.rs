//! Posted oracle prices.
//!
//! A point is valid while `expiry > now`, and every valid point counts
//! towards the median, including several live posts from one oracle. Points
//! are pruned only after they expire: an unexpired post still bounds the
//! start of the TWAP window.

use serde::{Deserialize, Serialize};

use meridian_types::{decimal, AccountId, AssetPair, Decimal};

use crate::{PriceFeedError, Result};

/// An immutable price posted by an oracle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub id: u64,
    pub pair: AssetPair,
    pub oracle: AccountId,
    pub price: Decimal,
    pub submitted_at: u64,
    pub expiry: u64,
}

impl PricePoint {
    pub fn is_valid(&self, now: u64) -> bool {
        self.expiry > now
    }
}

/// Parse a posted price string.
pub fn parse_price(s: &str) -> Result<Decimal> {
    let price = decimal::parse(s).map_err(|e| PriceFeedError::InvalidPrice(e.to_string()))?;
    validate(price)?;
    Ok(price)
}

/// A price must be strictly positive.
pub fn validate(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(PriceFeedError::InvalidPrice(format!(
            "price must be positive, got {price}"
        )));
    }
    Ok(())
}

/// A post must still be valid in the block it is submitted in.
pub fn validate_expiry(expiry: u64, now: u64) -> Result<()> {
    if expiry <= now {
        return Err(PriceFeedError::InvalidPrice(format!(
            "expiry {expiry} is not after block time {now}"
        )));
    }
    Ok(())
}

/// Prices of the points still valid at `now`.
pub fn valid_prices(points: &[PricePoint], now: u64) -> Vec<Decimal> {
    points
        .iter()
        .filter(|p| p.is_valid(now))
        .map(|p| p.price)
        .collect()
}

/// Ids of points that can never be counted again.
pub fn prunable(points: &[PricePoint], now: u64) -> Vec<u64> {
    points
        .iter()
        .filter(|p| !p.is_valid(now))
        .map(|p| p.id)
        .collect()
}
