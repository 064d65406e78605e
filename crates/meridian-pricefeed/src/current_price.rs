//! Per-block price snapshots.

use serde::{Deserialize, Serialize};

use meridian_types::{decimal, AssetPair, Decimal};

use crate::Result;

/// The reduced market price recorded by one finalize pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub pair: AssetPair,
    pub price: Decimal,
    pub timestamp: u64,
    pub height: u64,
}

/// Median of `prices`; the mean of the two middle values for an even count.
///
/// Sorts a copy, so the result does not depend on input order.
pub fn median(prices: &[Decimal]) -> Result<Option<Decimal>> {
    let mut sorted = prices.to_vec();
    sorted.sort();

    let n = sorted.len();
    if n == 0 {
        return Ok(None);
    }
    if n % 2 == 1 {
        return Ok(Some(sorted[n / 2]));
    }
    let sum = decimal::checked_add(sorted[n / 2 - 1], sorted[n / 2])?;
    Ok(Some(decimal::checked_div(sum, Decimal::TWO)?))
}
