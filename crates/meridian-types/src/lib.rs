//! # meridian-types
//!
//! Shared domain types used across the Meridian workspace.
//!
//! ## Modules
//!
//! - [`coin`]: Integer token amounts and coin sets
//! - [`context`]: Per-call block clock supplied by the ledger
//! - [`decimal`]: Fixed-point helpers over [`Decimal`]
//! - [`events`]: Events emitted by the keepers
//! - [`pair`]: Asset pairs identifying markets and pools

pub mod coin;
pub mod context;
pub mod decimal;
pub mod events;
pub mod pair;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use coin::{Coin, Coins};
pub use context::BlockContext;
pub use pair::AssetPair;
pub use rust_decimal::Decimal;

/// Stablecoin denomination.
pub const STABLE_DENOM: &str = "umusd";

/// Collateral token denomination.
pub const COLL_DENOM: &str = "uusdc";

/// Governance token denomination.
pub const GOV_DENOM: &str = "umrd";

/// Account holding collateral backing the stablecoin.
pub const STABLECOIN_MODULE_ACCOUNT: &str = "stablecoin";

/// Ecosystem fund receiving its share of mint/burn fees.
pub const ECOSYSTEM_FUND_ACCOUNT: &str = "stablecoin_ecosystem_fund";

/// Treasury receiving the remainder of mint/burn fees.
pub const TREASURY_ACCOUNT: &str = "treasury_pool";

/// A named ledger account (user address or module account).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Create an account handle from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The account name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
