//! The engine facade.
//!
//! [`App`] owns the store and one keeper per module. The ledger drives it
//! with one call at a time, passing the block clock on every call, and runs
//! [`App::end_block`] once per block after the block's transactions.

use std::path::Path;

use anyhow::Context;

use meridian_pricefeed::keeper as pricefeed;
use meridian_pricefeed::{CurrentPrice, Market, PriceFeedError, PriceFeedKeeper};
use meridian_stablecoin::{
    BurnStableResponse, MintStableResponse, ModuleAccounts, StablecoinKeeper, StablecoinParams,
    StablecoinState,
};
use meridian_store::{atomically, KvStore, SqliteStore};
use meridian_types::events::{Event, EventLog};
use meridian_types::{decimal, AccountId, AssetPair, BlockContext, Coins, Decimal};
use meridian_vpool::keeper as vpool;
use meridian_vpool::{Direction, PoolParams, PoolState, VpoolKeeper};

use crate::config::EngineConfig;
use crate::error::Result;

/// What [`App::end_block`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockSummary {
    /// Snapshots written this block, ordered by pair.
    pub finalized: Vec<CurrentPrice>,
    /// Active markets without a valid price this block.
    pub skipped: Vec<AssetPair>,
    pub pools_snapshotted: usize,
}

/// Keepers wired over a single store.
pub struct App<S: KvStore> {
    store: S,
    pricefeed: PriceFeedKeeper,
    vpool: VpoolKeeper,
    stablecoin: StablecoinKeeper,
    accounts: ModuleAccounts,
    events: EventLog,
}

impl App<SqliteStore> {
    /// Open the SQLite database in the configured data directory, creating
    /// the directory if needed.
    pub fn open(config: &EngineConfig) -> anyhow::Result<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating {}", data_dir.display()))?;
        Self::open_at(&config.db_path(), config)
    }

    /// Open the SQLite database at `path`.
    pub fn open_at(path: &Path, config: &EngineConfig) -> anyhow::Result<Self> {
        let store = SqliteStore::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        tracing::info!(path = %path.display(), "engine: store opened");
        Ok(Self::new(store, config))
    }
}

impl<S: KvStore> App<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        let lookback = config.pricefeed.lookback();
        Self {
            store,
            pricefeed: PriceFeedKeeper::new(lookback),
            vpool: VpoolKeeper::new(config.vpool.twap_lookback_secs),
            stablecoin: StablecoinKeeper::new(config.stablecoin.denoms(), lookback),
            accounts: config.stablecoin.accounts(),
            events: EventLog::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn accounts(&self) -> &ModuleAccounts {
        &self.accounts
    }

    /// Events emitted by successful calls since the last [`take_events`](Self::take_events).
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take()
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Create or replace markets.
    pub fn set_markets(&mut self, markets: &[Market]) -> Result<()> {
        Ok(self.pricefeed.set_params(&mut self.store, markets)?)
    }

    pub fn set_market_active(
        &mut self,
        ctx: &BlockContext,
        pair: &AssetPair,
        active: bool,
    ) -> Result<()> {
        Ok(self
            .pricefeed
            .set_market_active(&mut self.store, &mut self.events, ctx, pair, active)?)
    }

    pub fn set_stablecoin_params(&mut self, params: &StablecoinParams) -> Result<()> {
        Ok(self.stablecoin.set_params(&mut self.store, params)?)
    }

    /// Set the collateral ratio from a decimal string such as `"0.9"`.
    pub fn set_coll_ratio(&mut self, ctx: &BlockContext, coll_ratio: &str) -> Result<()> {
        let coll_ratio = decimal::parse(coll_ratio)?;
        Ok(self
            .stablecoin
            .set_coll_ratio(&mut self.store, &mut self.events, ctx, coll_ratio)?)
    }

    pub fn create_pool(&mut self, ctx: &BlockContext, params: PoolParams) -> Result<PoolState> {
        Ok(self
            .vpool
            .create_pool(&mut self.store, &mut self.events, ctx, params)?)
    }

    /// Credit `coins` to `account`, increasing supply.
    pub fn mint_coins(&mut self, account: &AccountId, coins: &Coins) -> Result<()> {
        atomically(&mut self.store, |tx| {
            meridian_bank::Bank::new(tx).mint(account, coins)
        })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Record `price` (a decimal string) posted by `oracle`. Returns the
    /// post's id.
    pub fn submit_price(
        &mut self,
        ctx: &BlockContext,
        pair: &AssetPair,
        oracle: &AccountId,
        price: &str,
        expiry: u64,
    ) -> Result<u64> {
        let price = meridian_pricefeed::price_point::parse_price(price)?;
        Ok(self.pricefeed.submit_price(
            &mut self.store,
            &mut self.events,
            ctx,
            pair,
            oracle,
            price,
            expiry,
        )?)
    }

    pub fn swap_input(
        &mut self,
        ctx: &BlockContext,
        pair: &AssetPair,
        direction: Direction,
        input: Decimal,
        min_output: Decimal,
        can_over_fluctuation: bool,
    ) -> Result<Decimal> {
        Ok(self.vpool.swap_input(
            &mut self.store,
            &mut self.events,
            ctx,
            pair,
            direction,
            input,
            min_output,
            can_over_fluctuation,
        )?)
    }

    pub fn swap_output(
        &mut self,
        ctx: &BlockContext,
        pair: &AssetPair,
        direction: Direction,
        output: Decimal,
        input_limit: Decimal,
    ) -> Result<Decimal> {
        Ok(self.vpool.swap_output(
            &mut self.store,
            &mut self.events,
            ctx,
            pair,
            direction,
            output,
            input_limit,
        )?)
    }

    pub fn mint_stable(
        &mut self,
        ctx: &BlockContext,
        creator: &AccountId,
        amount: u128,
    ) -> Result<MintStableResponse> {
        Ok(self.stablecoin.mint_stable(
            &mut self.store,
            &mut self.events,
            ctx,
            &self.accounts,
            creator,
            amount,
        )?)
    }

    pub fn burn_stable(
        &mut self,
        ctx: &BlockContext,
        creator: &AccountId,
        amount: u128,
    ) -> Result<BurnStableResponse> {
        Ok(self.stablecoin.burn_stable(
            &mut self.store,
            &mut self.events,
            ctx,
            &self.accounts,
            creator,
            amount,
        )?)
    }

    /// Finalize a current price for every active market, then snapshot
    /// every pool's reserves.
    ///
    /// A market with no valid price this block is skipped and logged; any
    /// other failure aborts the pass.
    pub fn end_block(&mut self, ctx: &BlockContext) -> Result<BlockSummary> {
        let mut summary = BlockSummary::default();

        for market in pricefeed::markets(&self.store)? {
            if !market.active {
                continue;
            }
            match self.pricefeed.finalize_current_price(
                &mut self.store,
                &mut self.events,
                ctx,
                &market.pair,
            ) {
                Ok(current) => summary.finalized.push(current),
                Err(PriceFeedError::NoValidPrices(pair)) => {
                    tracing::warn!(%pair, height = ctx.height, "engine: no valid prices, skipping market");
                    summary.skipped.push(pair);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let keeper = self.vpool;
        summary.pools_snapshotted = atomically(&mut self.store, |tx| {
            keeper.snapshot_pools(tx, ctx)
        })?;

        tracing::debug!(
            height = ctx.height,
            finalized = summary.finalized.len(),
            skipped = summary.skipped.len(),
            pools = summary.pools_snapshotted,
            "engine: block ended"
        );
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Oracle TWAP of `pair` as of `ctx`.
    pub fn current_twap(&self, ctx: &BlockContext, pair: &AssetPair) -> Result<Decimal> {
        Ok(pricefeed::current_twap(
            &self.store,
            ctx,
            pair,
            &self.pricefeed.policy(),
        )?)
    }

    /// Latest finalized snapshot of `pair`.
    pub fn current_price(&self, pair: &AssetPair) -> Result<CurrentPrice> {
        Ok(pricefeed::current_price(&self.store, pair)?)
    }

    pub fn markets(&self) -> Result<Vec<Market>> {
        Ok(pricefeed::markets(&self.store)?)
    }

    pub fn pool(&self, pair: &AssetPair) -> Result<PoolState> {
        Ok(vpool::get_pool(&self.store, pair)?)
    }

    pub fn pools(&self) -> Result<Vec<PoolState>> {
        Ok(vpool::pools(&self.store)?)
    }

    pub fn spot_price(&self, pair: &AssetPair) -> Result<Decimal> {
        Ok(self.pool(pair)?.pool().get_spot_price()?)
    }

    pub fn spot_twap(&self, ctx: &BlockContext, pair: &AssetPair) -> Result<Decimal> {
        Ok(self.pool(pair)?.pool().get_spot_twap(ctx)?)
    }

    pub fn output_price(
        &self,
        pair: &AssetPair,
        direction: Direction,
        amount: Decimal,
    ) -> Result<Decimal> {
        Ok(self.pool(pair)?.pool().get_output_price(direction, amount)?)
    }

    pub fn output_twap(
        &self,
        ctx: &BlockContext,
        pair: &AssetPair,
        direction: Direction,
        amount: Decimal,
    ) -> Result<Decimal> {
        Ok(self
            .pool(pair)?
            .pool()
            .get_output_twap(ctx, direction, amount)?)
    }

    /// Oracle TWAP of the pool's pair.
    pub fn underlying_price(&self, ctx: &BlockContext, pair: &AssetPair) -> Result<Decimal> {
        let pool = self.pool(pair)?;
        let prices = self.pricefeed.view(&self.store, *ctx);
        Ok(pool.pool().get_underlying_price(&prices)?)
    }

    pub fn stablecoin_state(&self) -> Result<StablecoinState> {
        Ok(self
            .stablecoin
            .stablecoin_state(&self.store, &self.accounts)?)
    }

    pub fn balance(&self, account: &AccountId, denom: &str) -> Result<u128> {
        Ok(meridian_bank::balance(&self.store, account, denom)?)
    }

    pub fn balances(&self, account: &AccountId) -> Result<Coins> {
        Ok(meridian_bank::all_balances(&self.store, account)?)
    }
}
