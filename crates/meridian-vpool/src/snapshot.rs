//! Per-block reserve history.
//!
//! Pools keep one snapshot per block: a later swap in the same block (or a
//! block sharing its timestamp) replaces it. Snapshots older than the
//! pool's TWAP lookback are dropped once they can no longer contribute.

use serde::{Deserialize, Serialize};

use meridian_pricefeed::LookbackPolicy;
use meridian_types::{decimal, BlockContext, Decimal};

use crate::Result;

/// Pool reserves as of one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    pub base_reserve: Decimal,
    pub quote_reserve: Decimal,
    pub timestamp: u64,
    pub height: u64,
}

impl ReserveSnapshot {
    pub fn spot_price(&self) -> Result<Decimal> {
        Ok(decimal::checked_div(self.quote_reserve, self.base_reserve)?)
    }
}

/// Append or replace the snapshot for `ctx`, then prune.
pub fn record(
    snapshots: &mut Vec<ReserveSnapshot>,
    ctx: &BlockContext,
    base_reserve: Decimal,
    quote_reserve: Decimal,
    lookback: u64,
) {
    let snapshot = ReserveSnapshot {
        base_reserve,
        quote_reserve,
        timestamp: ctx.time,
        height: ctx.height,
    };
    match snapshots.last_mut() {
        Some(last) if last.height == ctx.height || last.timestamp == ctx.time => *last = snapshot,
        _ => snapshots.push(snapshot),
    }

    let timestamps: Vec<u64> = snapshots.iter().map(|s| s.timestamp).collect();
    let count = LookbackPolicy::new(lookback).prunable(&timestamps, ctx.time);
    *snapshots = snapshots.split_off(count);
}

/// The latest snapshot from a block before `height`.
pub fn before_height(snapshots: &[ReserveSnapshot], height: u64) -> Option<&ReserveSnapshot> {
    snapshots.iter().rev().find(|s| s.height < height)
}
