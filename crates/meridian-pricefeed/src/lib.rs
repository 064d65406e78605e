//! # meridian-pricefeed
//!
//! Oracle price feed: whitelisted oracles post prices per market, each block
//! the valid posts are reduced to a current price snapshot, and consumers
//! read a time-weighted average over the recent snapshots.
//!
//! ## Modules
//!
//! - [`market`]: Markets and their oracle allow-lists
//! - [`price_point`]: Posted prices and their validity rules
//! - [`current_price`]: Median reduction into per-block snapshots
//! - [`twap`]: Time-weighted average over snapshots
//! - [`keeper`]: Store-backed operations and the [`PriceSource`] seam

pub mod current_price;
pub mod keeper;
pub mod market;
pub mod price_point;
pub mod twap;

pub use current_price::CurrentPrice;
pub use keeper::{PriceFeedKeeper, PriceSource, PriceView};
pub use market::Market;
pub use price_point::PricePoint;
pub use twap::LookbackPolicy;

use meridian_store::StoreError;
use meridian_types::decimal::DecimalError;
use meridian_types::{AccountId, AssetPair};

/// Error types for price feed operations.
#[derive(Debug, thiserror::Error)]
pub enum PriceFeedError {
    /// No market exists for the pair.
    #[error("market not found: {0}")]
    MarketNotFound(AssetPair),

    /// The market exists but is not accepting prices.
    #[error("market {0} is inactive")]
    InactiveMarket(AssetPair),

    /// The submitter is not on the market's oracle allow-list.
    #[error("oracle {oracle} is not authorized for {pair}")]
    Unauthorized { oracle: AccountId, pair: AssetPair },

    /// Price is zero, negative, malformed, or already expired.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// No unexpired price point exists for the market.
    #[error("no valid prices for {0}")]
    NoValidPrices(AssetPair),

    /// No snapshot at or before the evaluation time.
    #[error("no price history at or before {now}")]
    InsufficientHistory { now: u64 },

    /// Snapshot timestamps are not strictly increasing.
    #[error("non-monotonic timestamp: {new} <= {last}")]
    NonMonotonicTimestamp { new: u64, last: u64 },

    #[error(transparent)]
    Decimal(#[from] DecimalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience result type for price feed operations.
pub type Result<T> = std::result::Result<T, PriceFeedError>;

/// Store keys.
pub(crate) mod keys {
    use meridian_types::AssetPair;

    pub const MARKET_PREFIX: &str = "pricefeed/market/";
    pub const SEQ: &str = "pricefeed/seq";

    pub fn market(pair: &AssetPair) -> String {
        format!("{MARKET_PREFIX}{pair}")
    }

    pub fn point_prefix(pair: &AssetPair) -> String {
        format!("pricefeed/point/{pair}/")
    }

    pub fn point(pair: &AssetPair, id: u64) -> String {
        format!("pricefeed/point/{pair}/{id:020}")
    }

    pub fn snapshot_prefix(pair: &AssetPair) -> String {
        format!("pricefeed/snapshot/{pair}/")
    }

    pub fn snapshot(pair: &AssetPair, timestamp: u64) -> String {
        format!("pricefeed/snapshot/{pair}/{timestamp:020}")
    }
}
