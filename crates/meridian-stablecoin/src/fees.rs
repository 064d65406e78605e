//! Mint and burn fees.
//!
//! Each leg pays `trunc(amount * fee_ratio)`. A fee is split between:
//!
//! - **Ecosystem fund**: `trunc(fee * ef_fee_ratio)`
//! - **Treasury**: the remainder
//!
//! so the two shares always sum to the fee.

use meridian_types::{decimal, Decimal};

use crate::Result;

/// Fee owed on `amount`.
pub fn fee_for(amount: u128, fee_ratio: Decimal) -> Result<u128> {
    Ok(decimal::mul_amount(amount, fee_ratio)?)
}

/// One fee divided between the ecosystem fund and the treasury.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSplit {
    pub ecosystem_fund: u128,
    pub treasury: u128,
}

/// Split `fee` by `ef_fee_ratio`. The treasury receives the rounding
/// remainder.
pub fn split_fee(fee: u128, ef_fee_ratio: Decimal) -> Result<FeeSplit> {
    let ecosystem_fund = decimal::mul_amount(fee, ef_fee_ratio)?.min(fee);
    Ok(FeeSplit {
        ecosystem_fund,
        treasury: fee - ecosystem_fund,
    })
}
