//! # meridian-stablecoin
//!
//! Collateral-ratio-driven minting and burning of the stablecoin.
//!
//! Minting `S` stable takes `S * r` worth of collateral and `S * (1 - r)`
//! worth of governance tokens from the caller, valued at the oracle TWAPs,
//! where `r` is the collateral ratio. Burning reverses the flow. Both legs
//! pay a fee split between the ecosystem fund and the treasury.
//!
//! ## Modules
//!
//! - [`params`]: Module parameters and their validation
//! - [`collateral_ratio`]: Splitting a stable amount into its two legs
//! - [`fees`]: Fee computation and the ecosystem fund / treasury split
//! - [`keeper`]: Store-backed operations
//! - [`mint_burn`]: `mint_stable` and `burn_stable`

pub mod collateral_ratio;
pub mod fees;
pub mod keeper;
pub mod mint_burn;
pub mod params;

use serde::{Deserialize, Serialize};

use meridian_bank::BankError;
use meridian_pricefeed::PriceFeedError;
use meridian_store::StoreError;
use meridian_types::decimal::DecimalError;
use meridian_types::{
    AccountId, AssetPair, Coin, Coins, COLL_DENOM, ECOSYSTEM_FUND_ACCOUNT, GOV_DENOM,
    STABLECOIN_MODULE_ACCOUNT, STABLE_DENOM, TREASURY_ACCOUNT,
};

pub use keeper::{StablecoinKeeper, StablecoinState};
pub use params::StablecoinParams;

/// Error types for stablecoin operations.
#[derive(Debug, thiserror::Error)]
pub enum StablecoinError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The caller cannot cover one leg of a mint.
    #[error("not enough balance: {}", held(.denom, *.available))]
    NotEnoughBalance {
        denom: String,
        required: u128,
        available: u128,
    },

    /// The caller does not hold the stable amount being burned.
    #[error("insufficient funds: need {required}{denom}, have {available}{denom}")]
    InsufficientFunds {
        denom: String,
        required: u128,
        available: u128,
    },

    #[error(transparent)]
    PriceFeed(#[from] PriceFeedError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Decimal(#[from] DecimalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The denomination alone when nothing is held, otherwise the held coin.
fn held(denom: &str, available: u128) -> String {
    if available == 0 {
        denom.to_string()
    } else {
        Coin::new(denom, available).to_string()
    }
}

pub type Result<T> = std::result::Result<T, StablecoinError>;

/// The three denominations the engine works with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablecoinDenoms {
    pub stable: String,
    pub collateral: String,
    pub governance: String,
}

impl Default for StablecoinDenoms {
    fn default() -> Self {
        Self {
            stable: STABLE_DENOM.to_string(),
            collateral: COLL_DENOM.to_string(),
            governance: GOV_DENOM.to_string(),
        }
    }
}

impl StablecoinDenoms {
    /// Market pricing collateral in stable.
    pub fn collateral_pair(&self) -> AssetPair {
        AssetPair::new(&self.collateral, &self.stable)
    }

    /// Market pricing governance tokens in stable.
    pub fn governance_pair(&self) -> AssetPair {
        AssetPair::new(&self.governance, &self.stable)
    }
}

/// Accounts the engine moves funds through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccounts {
    /// Holds collateral backing the stablecoin.
    pub module: AccountId,
    pub ecosystem_fund: AccountId,
    pub treasury: AccountId,
}

impl Default for ModuleAccounts {
    fn default() -> Self {
        Self {
            module: AccountId::new(STABLECOIN_MODULE_ACCOUNT),
            ecosystem_fund: AccountId::new(ECOSYSTEM_FUND_ACCOUNT),
            treasury: AccountId::new(TREASURY_ACCOUNT),
        }
    }
}

/// Result of a successful mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintStableResponse {
    pub stable: Coin,
    /// Collateral and governance consumed, excluding fees.
    pub used_coins: Coins,
    pub fees_paid: Coins,
}

/// Result of a successful burn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnStableResponse {
    /// Collateral paid out, net of fees.
    pub collateral: Coin,
    /// Governance tokens paid out, net of fees.
    pub gov: Coin,
    pub fees_paid: Coins,
}

pub(crate) mod keys {
    pub const PARAMS: &str = "stablecoin/params";
}
