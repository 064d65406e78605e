//! Trade guards.
//!
//! A trade may not move the spot price more than `trade_limit_ratio` away
//! from the reference price, and may not push the open interest notional
//! above the pool's cap. A zero ratio or cap disables the respective guard.

use meridian_types::{decimal, Decimal};

use crate::{Result, VpoolError};

/// Check that `price` lies within `reference * (1 ± limit_ratio)`.
///
/// # Errors
///
/// [`VpoolError::FluctuationLimitExceeded`] when the price is outside the band.
pub fn check_fluctuation(reference: Decimal, price: Decimal, limit_ratio: Decimal) -> Result<()> {
    if limit_ratio.is_zero() {
        return Ok(());
    }
    let band = decimal::checked_mul(reference, limit_ratio)?;
    let lower = decimal::checked_sub(reference, band)?;
    let upper = decimal::checked_add(reference, band)?;
    if price < lower || price > upper {
        tracing::debug!(%price, %reference, %limit_ratio, "vpool: fluctuation limit hit");
        return Err(VpoolError::FluctuationLimitExceeded {
            price,
            reference,
            limit_ratio,
        });
    }
    Ok(())
}

/// Open interest notional: how far the quote reserve has moved from its
/// baseline.
pub fn open_interest_notional(quote_reserve: Decimal, baseline: Decimal) -> Result<Decimal> {
    Ok(decimal::checked_sub(quote_reserve, baseline)?.abs())
}

/// Check the open interest notional against `cap`.
///
/// # Errors
///
/// [`VpoolError::OpenInterestCapExceeded`] when the notional is above the cap.
pub fn check_open_interest(quote_reserve: Decimal, baseline: Decimal, cap: Decimal) -> Result<()> {
    if cap.is_zero() {
        return Ok(());
    }
    let notional = open_interest_notional(quote_reserve, baseline)?;
    if notional > cap {
        return Err(VpoolError::OpenInterestCapExceeded { notional, cap });
    }
    Ok(())
}
