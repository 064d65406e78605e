//! Store-backed price feed operations.
//!
//! Mutating operations run on a [`Branch`](meridian_store::Branch) and only
//! forward their events once the branch has committed.

use serde_json::json;

use meridian_store::{atomically, codec, KvStore};
use meridian_types::events::{Event, EventLog, EventSink, EventType};
use meridian_types::{AccountId, AssetPair, BlockContext, Decimal};

use crate::current_price::{self, CurrentPrice};
use crate::market::Market;
use crate::price_point::{self, PricePoint};
use crate::twap::{self, LookbackPolicy};
use crate::{keys, PriceFeedError, Result};

/// Read access to oracle TWAPs, as consumed by the pools and the
/// stablecoin engine.
pub trait PriceSource {
    /// Current TWAP of `pair`, quoted as units of `pair.quote` per `pair.base`.
    fn twap(&self, pair: &AssetPair) -> Result<Decimal>;
}

/// A [`PriceSource`] reading straight from a store at a fixed block.
pub struct PriceView<'a> {
    store: &'a dyn KvStore,
    ctx: BlockContext,
    policy: LookbackPolicy,
}

impl<'a> PriceView<'a> {
    pub fn new(store: &'a dyn KvStore, ctx: BlockContext, policy: LookbackPolicy) -> Self {
        Self { store, ctx, policy }
    }
}

impl PriceSource for PriceView<'_> {
    fn twap(&self, pair: &AssetPair) -> Result<Decimal> {
        current_twap(self.store, &self.ctx, pair, &self.policy)
    }
}

/// Price feed keeper.
#[derive(Clone, Copy, Debug)]
pub struct PriceFeedKeeper {
    policy: LookbackPolicy,
}

impl PriceFeedKeeper {
    pub fn new(policy: LookbackPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LookbackPolicy {
        self.policy
    }

    /// A price source over `store` as of `ctx`.
    pub fn view<'a>(&self, store: &'a dyn KvStore, ctx: BlockContext) -> PriceView<'a> {
        PriceView::new(store, ctx, self.policy)
    }

    /// Create or replace markets.
    pub fn set_params(&self, store: &mut dyn KvStore, markets: &[Market]) -> Result<()> {
        atomically(store, |tx| {
            for market in markets {
                codec::put(tx, &keys::market(&market.pair), market)?;
            }
            Ok::<_, PriceFeedError>(())
        })?;
        tracing::info!(count = markets.len(), "pricefeed: markets updated");
        Ok(())
    }

    /// Open or close a market for submissions.
    pub fn set_market_active(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        pair: &AssetPair,
        active: bool,
    ) -> Result<()> {
        let mut staged = EventLog::new();
        atomically(store, |tx| {
            let mut market = get_market(tx, pair)?;
            if market.active == active {
                return Ok(());
            }
            market.active = active;
            codec::put(tx, &keys::market(pair), &market)?;
            staged.emit(Event::new(
                EventType::MarketStatusChanged,
                ctx,
                json!({ "pair": pair.to_string(), "active": active }),
            ));
            Ok::<_, PriceFeedError>(())
        })?;
        staged.drain_into(events);
        Ok(())
    }

    /// Record a price posted by a whitelisted oracle. Returns the new
    /// point's id.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_price(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        pair: &AssetPair,
        oracle: &AccountId,
        price: Decimal,
        expiry: u64,
    ) -> Result<u64> {
        let market = get_market(&*store, pair)?;
        if !market.active {
            return Err(PriceFeedError::InactiveMarket(pair.clone()));
        }
        if !market.is_oracle(oracle) {
            return Err(PriceFeedError::Unauthorized {
                oracle: oracle.clone(),
                pair: pair.clone(),
            });
        }
        price_point::validate(price)?;
        price_point::validate_expiry(expiry, ctx.time)?;

        let mut staged = EventLog::new();
        let id = atomically(store, |tx| {
            let id = codec::get::<u64>(tx, keys::SEQ)?.unwrap_or(0) + 1;
            let point = PricePoint {
                id,
                pair: pair.clone(),
                oracle: oracle.clone(),
                price,
                submitted_at: ctx.time,
                expiry,
            };
            codec::put(tx, &keys::point(pair, id), &point)?;
            codec::put(tx, keys::SEQ, &id)?;
            staged.emit(Event::new(
                EventType::PriceSubmitted,
                ctx,
                json!({
                    "id": id,
                    "pair": pair.to_string(),
                    "oracle": oracle.to_string(),
                    "price": price,
                    "expiry": expiry,
                }),
            ));
            Ok::<_, PriceFeedError>(id)
        })?;
        staged.drain_into(events);

        tracing::debug!(%pair, %oracle, %price, expiry, id, "pricefeed: price submitted");
        Ok(id)
    }

    /// Reduce the valid posts of `pair` to a snapshot at `ctx.time`.
    ///
    /// Also prunes expired posts and snapshots that have rolled out of every
    /// future window.
    pub fn finalize_current_price(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        pair: &AssetPair,
    ) -> Result<CurrentPrice> {
        let mut staged = EventLog::new();
        let current = atomically(store, |tx| {
            get_market(tx, pair)?;

            let points = price_points(tx, pair)?;
            let prices = price_point::valid_prices(&points, ctx.time);
            let price = current_price::median(&prices)?
                .ok_or_else(|| PriceFeedError::NoValidPrices(pair.clone()))?;

            if let Some(last) = latest_snapshot(tx, pair)? {
                if last.timestamp > ctx.time {
                    return Err(PriceFeedError::NonMonotonicTimestamp {
                        new: ctx.time,
                        last: last.timestamp,
                    });
                }
            }

            let current = CurrentPrice {
                pair: pair.clone(),
                price,
                timestamp: ctx.time,
                height: ctx.height,
            };
            codec::put(tx, &keys::snapshot(pair, ctx.time), &current)?;

            for id in price_point::prunable(&points, ctx.time) {
                tx.delete(keys::point(pair, id).as_bytes())?;
            }
            self.prune_snapshots(tx, pair, ctx.time)?;

            staged.emit(Event::new(
                EventType::CurrentPriceFinalized,
                ctx,
                json!({
                    "pair": pair.to_string(),
                    "price": price,
                    "points": prices.len(),
                }),
            ));
            Ok::<_, PriceFeedError>(current)
        })?;
        staged.drain_into(events);

        tracing::info!(%pair, price = %current.price, time = ctx.time, "pricefeed: current price finalized");
        Ok(current)
    }

    fn prune_snapshots(&self, store: &mut dyn KvStore, pair: &AssetPair, latest: u64) -> Result<()> {
        let timestamps: Vec<u64> = snapshots(&*store, pair)?
            .iter()
            .map(|s| s.timestamp)
            .collect();
        let count = self.policy.prunable(&timestamps, latest);
        for timestamp in &timestamps[..count] {
            store.delete(keys::snapshot(pair, *timestamp).as_bytes())?;
        }
        if count > 0 {
            tracing::trace!(%pair, count, "pricefeed: pruned snapshots");
        }
        Ok(())
    }
}

/// The market for `pair`.
pub fn get_market(store: &dyn KvStore, pair: &AssetPair) -> Result<Market> {
    codec::get(store, &keys::market(pair))?
        .ok_or_else(|| PriceFeedError::MarketNotFound(pair.clone()))
}

/// Every market, ordered by pair.
pub fn markets(store: &dyn KvStore) -> Result<Vec<Market>> {
    Ok(codec::scan(store, keys::MARKET_PREFIX)?
        .into_iter()
        .map(|(_, market)| market)
        .collect())
}

/// Stored posts of `pair`, oldest first.
pub fn price_points(store: &dyn KvStore, pair: &AssetPair) -> Result<Vec<PricePoint>> {
    Ok(codec::scan(store, &keys::point_prefix(pair))?
        .into_iter()
        .map(|(_, point)| point)
        .collect())
}

/// Retained snapshots of `pair`, oldest first.
pub fn snapshots(store: &dyn KvStore, pair: &AssetPair) -> Result<Vec<CurrentPrice>> {
    Ok(codec::scan(store, &keys::snapshot_prefix(pair))?
        .into_iter()
        .map(|(_, snapshot)| snapshot)
        .collect())
}

fn latest_snapshot(store: &dyn KvStore, pair: &AssetPair) -> Result<Option<CurrentPrice>> {
    Ok(snapshots(store, pair)?.pop())
}

/// The most recent snapshot of `pair`.
pub fn current_price(store: &dyn KvStore, pair: &AssetPair) -> Result<CurrentPrice> {
    get_market(store, pair)?;
    latest_snapshot(store, pair)?.ok_or_else(|| PriceFeedError::NoValidPrices(pair.clone()))
}

/// TWAP of `pair`'s snapshots as of `ctx`.
pub fn current_twap(
    store: &dyn KvStore,
    ctx: &BlockContext,
    pair: &AssetPair,
    policy: &LookbackPolicy,
) -> Result<Decimal> {
    get_market(store, pair)?;

    let oldest_valid = price_points(store, pair)?
        .iter()
        .filter(|p| p.is_valid(ctx.time))
        .map(|p| p.submitted_at)
        .min();
    let window_start = policy.window_start(ctx.time, oldest_valid);

    let history: Vec<(u64, Decimal)> = snapshots(store, pair)?
        .iter()
        .map(|s| (s.timestamp, s.price))
        .collect();
    twap::compute_twap(&history, window_start, ctx.time)
}
