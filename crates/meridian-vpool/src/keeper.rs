//! Store-backed pool operations.

use serde_json::json;

use meridian_store::{codec, KvStore};
use meridian_types::events::{Event, EventSink, EventType};
use meridian_types::{AssetPair, BlockContext, Decimal};

use crate::pool::{ConstantProductPool, PoolParams, PoolState};
use crate::{keys, Direction, Result, VirtualPool, VpoolError};

/// Virtual pool keeper.
#[derive(Clone, Copy, Debug)]
pub struct VpoolKeeper {
    twap_lookback: u64,
}

impl VpoolKeeper {
    /// `twap_lookback` is stamped on every pool this keeper creates.
    pub fn new(twap_lookback: u64) -> Self {
        Self { twap_lookback }
    }

    /// Create a constant-product pool for `params.pair`.
    pub fn create_pool(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        params: PoolParams,
    ) -> Result<PoolState> {
        let key = keys::pool(&params.pair);
        if store.get(key.as_bytes())?.is_some() {
            return Err(VpoolError::PoolExists(params.pair));
        }

        let pool = PoolState::ConstantProduct(ConstantProductPool::new(
            params,
            self.twap_lookback,
            ctx,
        )?);
        codec::put(store, &key, &pool)?;

        let PoolState::ConstantProduct(inner) = &pool;
        events.emit(Event::new(
            EventType::PoolCreated,
            ctx,
            json!({
                "pair": inner.pair.to_string(),
                "base_reserve": inner.base_reserve,
                "quote_reserve": inner.quote_reserve,
            }),
        ));
        tracing::info!(pair = %inner.pair, "vpool: pool created");
        Ok(pool)
    }

    /// Swap `input` base on `pair`'s pool; returns the quote amount.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_input(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        pair: &AssetPair,
        direction: Direction,
        input: Decimal,
        min_output: Decimal,
        can_over_fluctuation: bool,
    ) -> Result<Decimal> {
        let mut pool = get_pool(&*store, pair)?;
        let output = pool.pool_mut().swap_input(
            ctx,
            direction,
            input,
            min_output,
            can_over_fluctuation,
        )?;
        if input.is_zero() {
            return Ok(output);
        }
        codec::put(store, &keys::pool(pair), &pool)?;
        emit_swap(events, ctx, &pool, direction, input, output);
        Ok(output)
    }

    /// Swap for exactly `output` quote on `pair`'s pool; returns the base
    /// amount required.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_output(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        pair: &AssetPair,
        direction: Direction,
        output: Decimal,
        input_limit: Decimal,
    ) -> Result<Decimal> {
        let mut pool = get_pool(&*store, pair)?;
        let input = pool
            .pool_mut()
            .swap_output(ctx, direction, output, input_limit)?;
        if output.is_zero() {
            return Ok(input);
        }
        codec::put(store, &keys::pool(pair), &pool)?;
        emit_swap(events, ctx, &pool, direction, input, output);
        Ok(input)
    }

    /// Record this block's reserves for every pool. Returns the number of
    /// pools snapshotted.
    pub fn snapshot_pools(&self, store: &mut dyn KvStore, ctx: &BlockContext) -> Result<usize> {
        let all = pools(&*store)?;
        for mut pool in all.iter().cloned() {
            pool.pool_mut().record_snapshot(ctx);
            codec::put(store, &keys::pool(pool.pair()), &pool)?;
        }
        tracing::trace!(count = all.len(), height = ctx.height, "vpool: snapshots recorded");
        Ok(all.len())
    }
}

fn emit_swap(
    events: &mut dyn EventSink,
    ctx: &BlockContext,
    pool: &PoolState,
    direction: Direction,
    base: Decimal,
    quote: Decimal,
) {
    let PoolState::ConstantProduct(inner) = pool;
    events.emit(Event::new(
        EventType::Swap,
        ctx,
        json!({
            "pair": inner.pair.to_string(),
            "direction": direction,
            "base_amount": base,
            "quote_amount": quote,
            "base_reserve": inner.base_reserve,
            "quote_reserve": inner.quote_reserve,
        }),
    ));
}

/// The pool for `pair`.
pub fn get_pool(store: &dyn KvStore, pair: &AssetPair) -> Result<PoolState> {
    codec::get(store, &keys::pool(pair))?.ok_or_else(|| VpoolError::PoolNotFound(pair.clone()))
}

/// Every pool, ordered by pair.
pub fn pools(store: &dyn KvStore) -> Result<Vec<PoolState>> {
    Ok(codec::scan(store, keys::POOL_PREFIX)?
        .into_iter()
        .map(|(_, pool)| pool)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_store::MemStore;
    use meridian_types::decimal;
    use meridian_types::events::EventLog;

    fn dec(s: &str) -> Decimal {
        decimal::parse(s).expect("decimal")
    }

    fn pair() -> AssetPair {
        AssetPair::new("ubtc", "umusd")
    }

    fn params() -> PoolParams {
        PoolParams {
            pair: pair(),
            base_reserve: dec("100"),
            quote_reserve: dec("1000"),
            trade_limit_ratio: Decimal::ZERO,
            max_holding_base_asset: dec("50"),
            open_interest_notional_cap: Decimal::ZERO,
        }
    }

    fn setup() -> (VpoolKeeper, MemStore, EventLog) {
        let keeper = VpoolKeeper::new(900);
        let mut store = MemStore::new();
        let mut events = EventLog::new();
        keeper
            .create_pool(&mut store, &mut events, &BlockContext::new(0, 1), params())
            .expect("create pool");
        (keeper, store, events)
    }

    #[test]
    fn test_create_pool() {
        let (keeper, mut store, mut events) = setup();
        assert_eq!(events.of_type(EventType::PoolCreated).len(), 1);

        let pool = get_pool(&store, &pair()).expect("pool");
        assert_eq!(pool.pool().get_spot_price().expect("spot"), dec("10"));
        assert_eq!(pool.pool().get_max_holding_base_asset(), dec("50"));

        let err = keeper
            .create_pool(&mut store, &mut events, &BlockContext::new(0, 1), params())
            .expect_err("duplicate");
        assert!(matches!(err, VpoolError::PoolExists(_)));
    }

    #[test]
    fn test_swap_persists_and_emits() {
        let (keeper, mut store, mut events) = setup();
        let out = keeper
            .swap_input(
                &mut store,
                &mut events,
                &BlockContext::new(10, 2),
                &pair(),
                Direction::AddToAmm,
                dec("25"),
                Decimal::ZERO,
                false,
            )
            .expect("swap");
        assert_eq!(out, dec("200"));

        let PoolState::ConstantProduct(pool) = get_pool(&store, &pair()).expect("pool");
        assert_eq!(pool.base_reserve, dec("125"));
        assert_eq!(pool.quote_reserve, dec("800"));
        assert_eq!(events.of_type(EventType::Swap).len(), 1);
    }

    #[test]
    fn test_failed_swap_changes_nothing() {
        let (keeper, mut store, mut events) = setup();
        let before = get_pool(&store, &pair()).expect("pool");
        let err = keeper
            .swap_input(
                &mut store,
                &mut events,
                &BlockContext::new(10, 2),
                &pair(),
                Direction::AddToAmm,
                dec("25"),
                dec("1000"),
                false,
            )
            .expect_err("min output");
        assert!(matches!(err, VpoolError::OutputBelowMinimum { .. }));
        assert_eq!(get_pool(&store, &pair()).expect("pool"), before);
        assert!(events.of_type(EventType::Swap).is_empty());
    }

    #[test]
    fn test_swap_output_via_keeper() {
        let (keeper, mut store, mut events) = setup();
        let input = keeper
            .swap_output(
                &mut store,
                &mut events,
                &BlockContext::new(10, 2),
                &pair(),
                Direction::AddToAmm,
                dec("200"),
                Decimal::ZERO,
            )
            .expect("swap output");
        assert_eq!(input, dec("25"));
    }

    #[test]
    fn test_unknown_pool() {
        let (keeper, mut store, mut events) = setup();
        let err = keeper
            .swap_input(
                &mut store,
                &mut events,
                &BlockContext::new(10, 2),
                &AssetPair::new("ueth", "umusd"),
                Direction::AddToAmm,
                dec("1"),
                Decimal::ZERO,
                false,
            )
            .expect_err("no pool");
        assert!(matches!(err, VpoolError::PoolNotFound(_)));
    }

    #[test]
    fn test_snapshot_pools() {
        let (keeper, mut store, _) = setup();
        let count = keeper
            .snapshot_pools(&mut store, &BlockContext::new(50, 2))
            .expect("snapshot");
        assert_eq!(count, 1);

        let PoolState::ConstantProduct(pool) = get_pool(&store, &pair()).expect("pool");
        let heights: Vec<u64> = pool.snapshots.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![1, 2]);
        assert_eq!(pools(&store).expect("pools").len(), 1);
    }
}
