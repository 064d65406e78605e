//! Stablecoin module parameters.

use serde::{Deserialize, Serialize};

use meridian_types::{decimal, Decimal};

use crate::{Result, StablecoinError};

/// Module parameters. Every ratio lies in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablecoinParams {
    /// Share of a stable amount backed by collateral.
    pub coll_ratio: Decimal,
    /// Fee charged on each leg of a mint or burn.
    pub fee_ratio: Decimal,
    /// Share of each fee sent to the ecosystem fund.
    pub ef_fee_ratio: Decimal,
    /// Bonus paid on recollateralization.
    pub bonus_rate_recoll: Decimal,
}

impl Default for StablecoinParams {
    fn default() -> Self {
        Self {
            coll_ratio: Decimal::ONE,
            fee_ratio: Decimal::new(2, 3),
            ef_fee_ratio: Decimal::new(5, 1),
            bonus_rate_recoll: Decimal::new(2, 3),
        }
    }
}

impl StablecoinParams {
    pub fn new(
        coll_ratio: Decimal,
        fee_ratio: Decimal,
        ef_fee_ratio: Decimal,
        bonus_rate_recoll: Decimal,
    ) -> Result<Self> {
        let params = Self {
            coll_ratio,
            fee_ratio,
            ef_fee_ratio,
            bonus_rate_recoll,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("coll_ratio", self.coll_ratio),
            ("fee_ratio", self.fee_ratio),
            ("ef_fee_ratio", self.ef_fee_ratio),
            ("bonus_rate_recoll", self.bonus_rate_recoll),
        ] {
            validate_ratio(name, value)?;
        }
        Ok(())
    }
}

/// A ratio must lie in `[0, 1]`.
pub fn validate_ratio(name: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(StablecoinError::InvalidParams(format!(
            "{name} {value} is outside [0, 1]"
        )));
    }
    Ok(())
}

/// Parse params from decimal strings, as supplied by configuration.
pub fn parse(
    coll_ratio: &str,
    fee_ratio: &str,
    ef_fee_ratio: &str,
    bonus_rate_recoll: &str,
) -> Result<StablecoinParams> {
    StablecoinParams::new(
        decimal::parse(coll_ratio)?,
        decimal::parse(fee_ratio)?,
        decimal::parse(ef_fee_ratio)?,
        decimal::parse(bonus_rate_recoll)?,
    )
}
