//! TWAP (Time-Weighted Average Price) calculation.
//!
//! Each snapshot's price prevails from its own timestamp until the next
//! snapshot (or until `now` for the latest one). Only the part of that
//! interval inside `[window_start, now]` counts:
//!
//! ```text
//! w_i  = min(t_{i+1}, now) - max(t_i, window_start)      (floored at 0)
//! TWAP = sum(p_i * w_i) / sum(w_i)
//! ```
//!
//! The result is a convex combination of the contributing prices.

use serde::{Deserialize, Serialize};

use meridian_types::decimal;
use meridian_types::Decimal;

use crate::{PriceFeedError, Result};

/// How far back a TWAP may look.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackPolicy {
    /// Maximum lookback in seconds.
    pub max_lookback: u64,
}

impl LookbackPolicy {
    pub fn new(max_lookback: u64) -> Self {
        Self { max_lookback }
    }

    /// Start of the averaging window.
    ///
    /// The window never reaches further back than `max_lookback`, nor before
    /// the oldest submission that is still valid (`oldest_valid`).
    pub fn window_start(&self, now: u64, oldest_valid: Option<u64>) -> u64 {
        let floor = now.saturating_sub(self.max_lookback);
        oldest_valid.map_or(floor, |t| floor.max(t))
    }

    /// Number of leading snapshots that can no longer contribute to any
    /// window once a snapshot at `latest` exists. The last snapshot is
    /// always kept.
    pub fn prunable(&self, timestamps: &[u64], latest: u64) -> usize {
        let cutoff = latest.saturating_sub(self.max_lookback);
        timestamps
            .windows(2)
            .take_while(|pair| pair[1] <= cutoff)
            .count()
    }
}

/// Compute the TWAP from `(timestamp, price)` snapshots in ascending order.
///
/// Snapshots after `now` are ignored. If no time has elapsed inside the
/// window (the only in-scope snapshot was taken at `now`), the latest
/// in-scope price is returned.
///
/// # Errors
///
/// - [`PriceFeedError::NonMonotonicTimestamp`] if timestamps are not strictly increasing
/// - [`PriceFeedError::InsufficientHistory`] if no snapshot is at or before `now`
pub fn compute_twap(snapshots: &[(u64, Decimal)], window_start: u64, now: u64) -> Result<Decimal> {
    for window in snapshots.windows(2) {
        let (t_prev, _) = window[0];
        let (t_next, _) = window[1];
        if t_next <= t_prev {
            return Err(PriceFeedError::NonMonotonicTimestamp {
                new: t_next,
                last: t_prev,
            });
        }
    }

    let in_scope: Vec<(u64, Decimal)> = snapshots
        .iter()
        .copied()
        .take_while(|(t, _)| *t <= now)
        .collect();
    let Some(&(_, latest_price)) = in_scope.last() else {
        return Err(PriceFeedError::InsufficientHistory { now });
    };

    let mut weighted_sum = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;
    let mut lowest = Decimal::MAX;
    let mut highest = Decimal::MIN;

    for (i, &(t, price)) in in_scope.iter().enumerate() {
        let end = in_scope.get(i + 1).map_or(now, |(next, _)| (*next).min(now));
        let start = t.max(window_start);
        if end <= start {
            continue;
        }
        let weight = Decimal::from(end - start);
        weighted_sum = decimal::checked_add(weighted_sum, decimal::checked_mul(price, weight)?)?;
        total_weight = decimal::checked_add(total_weight, weight)?;
        lowest = lowest.min(price);
        highest = highest.max(price);
    }

    if total_weight.is_zero() {
        return Ok(latest_price);
    }

    // Rounding at the last digit must not leave the hull of the inputs.
    let twap = decimal::checked_div(weighted_sum, total_weight)?;
    Ok(twap.clamp(lowest, highest))
}
