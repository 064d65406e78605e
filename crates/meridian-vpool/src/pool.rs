//! Constant-product pool.
//!
//! Reserves satisfy `base * quote = k` across every swap, up to the last
//! digit of decimal rounding:
//!
//! ```text
//! base in  (AddToAmm):       quote' = k / (base + in),  out = quote - quote'
//! base out (RemoveFromAmm):  quote' = k / (base - in),  out = quote' - quote
//! ```
//!
//! Exact-output swaps solve the same curve for the base side.

use serde::{Deserialize, Serialize};

use meridian_pricefeed::{twap, PriceSource};
use meridian_types::{decimal, AssetPair, BlockContext, Decimal};

use crate::limits;
use crate::snapshot::{self, ReserveSnapshot};
use crate::{Direction, Result, VirtualPool, VpoolError};

/// Parameters supplied when a pool is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    pub pair: AssetPair,
    pub base_reserve: Decimal,
    pub quote_reserve: Decimal,
    /// Maximum relative spot move per trade; zero disables the check.
    pub trade_limit_ratio: Decimal,
    pub max_holding_base_asset: Decimal,
    /// Zero disables the cap.
    pub open_interest_notional_cap: Decimal,
}

impl PoolParams {
    pub fn validate(&self) -> Result<()> {
        if self.base_reserve <= Decimal::ZERO || self.quote_reserve <= Decimal::ZERO {
            return Err(VpoolError::InvalidParams(
                "reserves must be positive".to_string(),
            ));
        }
        if self.trade_limit_ratio < Decimal::ZERO || self.trade_limit_ratio > Decimal::ONE {
            return Err(VpoolError::InvalidParams(format!(
                "trade limit ratio {} is outside [0, 1]",
                self.trade_limit_ratio
            )));
        }
        if self.max_holding_base_asset < Decimal::ZERO
            || self.open_interest_notional_cap < Decimal::ZERO
        {
            return Err(VpoolError::InvalidParams(
                "caps must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// A stored pool, tagged by curve kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    ConstantProduct(ConstantProductPool),
}

impl PoolState {
    pub fn pool(&self) -> &dyn VirtualPool {
        match self {
            PoolState::ConstantProduct(pool) => pool,
        }
    }

    pub fn pool_mut(&mut self) -> &mut dyn VirtualPool {
        match self {
            PoolState::ConstantProduct(pool) => pool,
        }
    }

    pub fn pair(&self) -> &AssetPair {
        self.pool().pair()
    }
}

/// A virtual pool on the `base * quote = k` curve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantProductPool {
    pub pair: AssetPair,
    pub base_reserve: Decimal,
    pub quote_reserve: Decimal,
    pub trade_limit_ratio: Decimal,
    pub max_holding_base_asset: Decimal,
    pub open_interest_notional_cap: Decimal,
    /// Quote reserve at creation; open interest is measured from here.
    pub open_interest_baseline: Decimal,
    /// Spot price at creation. Trades in the creation block are checked
    /// against it.
    pub opening_spot_price: Decimal,
    /// TWAP lookback in seconds.
    pub twap_lookback: u64,
    pub snapshots: Vec<ReserveSnapshot>,
}

/// Reserves after a trade and the amount exchanged on the other side.
#[derive(Debug)]
struct Trade {
    base: Decimal,
    quote: Decimal,
    amount: Decimal,
}

/// Trade `amount` base against the given reserves.
fn trade_base(
    base_reserve: Decimal,
    quote_reserve: Decimal,
    direction: Direction,
    amount: Decimal,
) -> Result<Trade> {
    let k = decimal::checked_mul(base_reserve, quote_reserve)?;
    let base = match direction {
        Direction::AddToAmm => decimal::checked_add(base_reserve, amount)?,
        Direction::RemoveFromAmm => decimal::checked_sub(base_reserve, amount)?,
    };
    if base <= Decimal::ZERO {
        return Err(VpoolError::ReserveExhausted);
    }
    let quote = decimal::checked_div(k, base)?;
    if quote <= Decimal::ZERO {
        return Err(VpoolError::ReserveExhausted);
    }
    Ok(Trade {
        base,
        quote,
        amount: decimal::checked_sub(quote, quote_reserve)?.abs(),
    })
}

/// Trade for `amount` quote against the given reserves.
fn trade_quote(
    base_reserve: Decimal,
    quote_reserve: Decimal,
    direction: Direction,
    amount: Decimal,
) -> Result<Trade> {
    let k = decimal::checked_mul(base_reserve, quote_reserve)?;
    let quote = match direction {
        Direction::AddToAmm => decimal::checked_sub(quote_reserve, amount)?,
        Direction::RemoveFromAmm => decimal::checked_add(quote_reserve, amount)?,
    };
    if quote <= Decimal::ZERO {
        return Err(VpoolError::ReserveExhausted);
    }
    let base = decimal::checked_div(k, quote)?;
    if base <= Decimal::ZERO {
        return Err(VpoolError::ReserveExhausted);
    }
    Ok(Trade {
        base,
        quote,
        amount: decimal::checked_sub(base, base_reserve)?.abs(),
    })
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(VpoolError::InvalidAmount(amount));
    }
    Ok(())
}

fn output_at(
    base_reserve: Decimal,
    quote_reserve: Decimal,
    direction: Direction,
    amount: Decimal,
) -> Result<Decimal> {
    check_amount(amount)?;
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok(trade_base(base_reserve, quote_reserve, direction, amount)?.amount)
}

impl ConstantProductPool {
    /// Create a pool and record its first snapshot at `ctx`.
    pub fn new(params: PoolParams, twap_lookback: u64, ctx: &BlockContext) -> Result<Self> {
        params.validate()?;
        let opening_spot_price = decimal::checked_div(params.quote_reserve, params.base_reserve)?;
        let mut pool = Self {
            pair: params.pair,
            base_reserve: params.base_reserve,
            quote_reserve: params.quote_reserve,
            trade_limit_ratio: params.trade_limit_ratio,
            max_holding_base_asset: params.max_holding_base_asset,
            open_interest_notional_cap: params.open_interest_notional_cap,
            open_interest_baseline: params.quote_reserve,
            opening_spot_price,
            twap_lookback,
            snapshots: Vec::new(),
        };
        pool.record_snapshot(ctx);
        Ok(pool)
    }

    /// Spot price of the latest snapshot from an earlier block, or the
    /// opening spot price while still in the creation block.
    fn reference_price(&self, ctx: &BlockContext) -> Result<Decimal> {
        match snapshot::before_height(&self.snapshots, ctx.height) {
            Some(previous) => previous.spot_price(),
            None => Ok(self.opening_spot_price),
        }
    }

    fn check_trade(&self, ctx: &BlockContext, trade: &Trade, can_over_fluctuation: bool) -> Result<()> {
        if !can_over_fluctuation {
            let reference = self.reference_price(ctx)?;
            let price = decimal::checked_div(trade.quote, trade.base)?;
            limits::check_fluctuation(reference, price, self.trade_limit_ratio)?;
        }
        limits::check_open_interest(
            trade.quote,
            self.open_interest_baseline,
            self.open_interest_notional_cap,
        )
    }

    fn apply(&mut self, ctx: &BlockContext, trade: &Trade) {
        self.base_reserve = trade.base;
        self.quote_reserve = trade.quote;
        self.record_snapshot(ctx);
    }

    fn twap_of(
        &self,
        ctx: &BlockContext,
        price_at: impl Fn(&ReserveSnapshot) -> Result<Decimal>,
    ) -> Result<Decimal> {
        let history = self
            .snapshots
            .iter()
            .map(|s| Ok((s.timestamp, price_at(s)?)))
            .collect::<Result<Vec<(u64, Decimal)>>>()?;
        let window_start = ctx.time.saturating_sub(self.twap_lookback);
        Ok(twap::compute_twap(&history, window_start, ctx.time)?)
    }
}

impl VirtualPool for ConstantProductPool {
    fn pair(&self) -> &AssetPair {
        &self.pair
    }

    fn swap_input(
        &mut self,
        ctx: &BlockContext,
        direction: Direction,
        input: Decimal,
        min_output: Decimal,
        can_over_fluctuation: bool,
    ) -> Result<Decimal> {
        check_amount(input)?;
        if input.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let trade = trade_base(self.base_reserve, self.quote_reserve, direction, input)?;
        if trade.amount < min_output {
            return Err(VpoolError::OutputBelowMinimum {
                output: trade.amount,
                minimum: min_output,
            });
        }
        self.check_trade(ctx, &trade, can_over_fluctuation)?;
        self.apply(ctx, &trade);

        tracing::debug!(
            pair = %self.pair,
            %direction,
            %input,
            output = %trade.amount,
            "vpool: swap input"
        );
        Ok(trade.amount)
    }

    fn swap_output(
        &mut self,
        ctx: &BlockContext,
        direction: Direction,
        output: Decimal,
        input_limit: Decimal,
    ) -> Result<Decimal> {
        check_amount(output)?;
        if output.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let trade = trade_quote(self.base_reserve, self.quote_reserve, direction, output)?;
        if !input_limit.is_zero() && trade.amount > input_limit {
            return Err(VpoolError::InputAboveLimit {
                input: trade.amount,
                limit: input_limit,
            });
        }
        self.check_trade(ctx, &trade, false)?;
        self.apply(ctx, &trade);

        tracing::debug!(
            pair = %self.pair,
            %direction,
            %output,
            input = %trade.amount,
            "vpool: swap output"
        );
        Ok(trade.amount)
    }

    fn get_output_price(&self, direction: Direction, amount: Decimal) -> Result<Decimal> {
        output_at(self.base_reserve, self.quote_reserve, direction, amount)
    }

    fn get_spot_price(&self) -> Result<Decimal> {
        Ok(decimal::checked_div(self.quote_reserve, self.base_reserve)?)
    }

    fn get_underlying_price(&self, prices: &dyn PriceSource) -> Result<Decimal> {
        Ok(prices.twap(&self.pair)?)
    }

    fn get_output_twap(
        &self,
        ctx: &BlockContext,
        direction: Direction,
        amount: Decimal,
    ) -> Result<Decimal> {
        check_amount(amount)?;
        self.twap_of(ctx, |s| {
            output_at(s.base_reserve, s.quote_reserve, direction, amount)
        })
    }

    fn get_spot_twap(&self, ctx: &BlockContext) -> Result<Decimal> {
        self.twap_of(ctx, ReserveSnapshot::spot_price)
    }

    fn get_open_interest_notional_cap(&self) -> Decimal {
        self.open_interest_notional_cap
    }

    fn get_max_holding_base_asset(&self) -> Decimal {
        self.max_holding_base_asset
    }

    fn record_snapshot(&mut self, ctx: &BlockContext) {
        snapshot::record(
            &mut self.snapshots,
            ctx,
            self.base_reserve,
            self.quote_reserve,
            self.twap_lookback,
        );
    }
}
