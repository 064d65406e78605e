//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use meridian_engine::{App, EngineConfig};
use meridian_pricefeed::Market;
use meridian_store::{KvStore, MemStore};
use meridian_types::{decimal, AccountId, AssetPair, BlockContext, Coin, Coins, Decimal};

/// Base block time for the scenarios.
pub const BASE_TIME: u64 = 1_445_385_600;

pub fn dec(s: &str) -> Decimal {
    decimal::parse(s).expect("decimal")
}

pub fn gov_pair() -> AssetPair {
    AssetPair::new("umrd", "umusd")
}

pub fn coll_pair() -> AssetPair {
    AssetPair::new("uusdc", "umusd")
}

pub fn oracle() -> AccountId {
    AccountId::new("oracle")
}

pub fn config(twap_lookback_secs: u64) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.pricefeed.twap_lookback_secs = twap_lookback_secs;
    config.vpool.twap_lookback_secs = twap_lookback_secs;
    config
}

pub fn mem_app(twap_lookback_secs: u64) -> App<MemStore> {
    App::new(MemStore::new(), &config(twap_lookback_secs))
}

/// Open the governance and collateral markets with a single oracle.
pub fn open_markets<S: KvStore>(app: &mut App<S>) {
    app.set_markets(&[
        Market::new(gov_pair(), [oracle()], true),
        Market::new(coll_pair(), [oracle()], true),
    ])
    .expect("markets");
}

/// Post `gov_price` and `coll_price` at `ctx` and finalize them.
pub fn post_prices<S: KvStore>(app: &mut App<S>, ctx: &BlockContext, gov_price: &str, coll_price: &str) {
    let expiry = ctx.time + 3_600;
    app.submit_price(ctx, &gov_pair(), &oracle(), gov_price, expiry)
        .expect("submit gov price");
    app.submit_price(ctx, &coll_pair(), &oracle(), coll_price, expiry)
        .expect("submit coll price");
    let summary = app.end_block(ctx).expect("end block");
    assert!(summary.skipped.is_empty());
}

pub fn coins(funds: &[(&str, u128)]) -> Coins {
    Coins::new(funds.iter().map(|(denom, amount)| Coin::new(*denom, *amount))).expect("coins")
}
