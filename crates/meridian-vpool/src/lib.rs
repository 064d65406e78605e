//! # meridian-vpool
//!
//! Virtual AMM pricing for perpetual-futures trades.
//!
//! A pool holds virtual base and quote reserves on a constant-product curve.
//! No real tokens move: swaps only shift the reserves, and the resulting
//! prices are what the perp engine settles against.
//!
//! ## Modules
//!
//! - [`pool`]: The constant-product pool and its swap arithmetic
//! - [`limits`]: Fluctuation and open-interest guards
//! - [`snapshot`]: Per-block reserve history
//! - [`keeper`]: Store-backed pool operations

pub mod keeper;
pub mod limits;
pub mod pool;
pub mod snapshot;

use std::fmt;

use serde::{Deserialize, Serialize};

use meridian_pricefeed::{PriceFeedError, PriceSource};
use meridian_store::StoreError;
use meridian_types::decimal::DecimalError;
use meridian_types::{AssetPair, BlockContext, Decimal};

pub use keeper::VpoolKeeper;
pub use pool::{ConstantProductPool, PoolParams, PoolState};
pub use snapshot::ReserveSnapshot;

/// Error types for virtual pool operations.
#[derive(Debug, thiserror::Error)]
pub enum VpoolError {
    #[error("pool not found: {0}")]
    PoolNotFound(AssetPair),

    #[error("pool already exists: {0}")]
    PoolExists(AssetPair),

    #[error("invalid pool parameters: {0}")]
    InvalidParams(String),

    #[error("output {output} is below the minimum {minimum}")]
    OutputBelowMinimum { output: Decimal, minimum: Decimal },

    #[error("required input {input} exceeds the limit {limit}")]
    InputAboveLimit { input: Decimal, limit: Decimal },

    #[error("price {price} moves more than {limit_ratio} away from {reference}")]
    FluctuationLimitExceeded {
        price: Decimal,
        reference: Decimal,
        limit_ratio: Decimal,
    },

    #[error("open interest notional {notional} exceeds the cap {cap}")]
    OpenInterestCapExceeded { notional: Decimal, cap: Decimal },

    #[error("swap would exhaust the pool reserves")]
    ReserveExhausted,

    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error(transparent)]
    PriceFeed(#[from] PriceFeedError),

    #[error(transparent)]
    Decimal(#[from] DecimalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, VpoolError>;

/// Which way base asset moves relative to the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    AddToAmm,
    RemoveFromAmm,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AddToAmm => f.write_str("add_to_amm"),
            Direction::RemoveFromAmm => f.write_str("remove_from_amm"),
        }
    }
}

/// Pricing operations every pool kind provides.
///
/// Swap amounts are in virtual units: `swap_input` and
/// `get_output_price` take a base amount and yield quote; `swap_output`
/// takes a quote amount and yields base.
pub trait VirtualPool {
    fn pair(&self) -> &AssetPair;

    fn quote_denom(&self) -> &str {
        &self.pair().quote
    }

    /// Trade `input` base and return the quote amount produced.
    fn swap_input(
        &mut self,
        ctx: &BlockContext,
        direction: Direction,
        input: Decimal,
        min_output: Decimal,
        can_over_fluctuation: bool,
    ) -> Result<Decimal>;

    /// Trade for exactly `output` quote and return the base amount required.
    /// A zero `input_limit` means no limit.
    fn swap_output(
        &mut self,
        ctx: &BlockContext,
        direction: Direction,
        output: Decimal,
        input_limit: Decimal,
    ) -> Result<Decimal>;

    /// Quote amount a base trade of `amount` would produce now.
    fn get_output_price(&self, direction: Direction, amount: Decimal) -> Result<Decimal>;

    /// `quote_reserve / base_reserve`.
    fn get_spot_price(&self) -> Result<Decimal>;

    /// Oracle TWAP of the pool's pair.
    fn get_underlying_price(&self, prices: &dyn PriceSource) -> Result<Decimal>;

    /// Time-weighted [`get_output_price`](Self::get_output_price) over the
    /// recorded reserve snapshots.
    fn get_output_twap(&self, ctx: &BlockContext, direction: Direction, amount: Decimal)
        -> Result<Decimal>;

    /// Time-weighted spot price over the recorded reserve snapshots.
    fn get_spot_twap(&self, ctx: &BlockContext) -> Result<Decimal>;

    fn get_open_interest_notional_cap(&self) -> Decimal;

    fn get_max_holding_base_asset(&self) -> Decimal;

    /// Record the current reserves for this block.
    fn record_snapshot(&mut self, ctx: &BlockContext);
}

pub(crate) mod keys {
    use meridian_types::AssetPair;

    pub const POOL_PREFIX: &str = "vpool/pool/";

    pub fn pool(pair: &AssetPair) -> String {
        format!("{POOL_PREFIX}{pair}")
    }
}
