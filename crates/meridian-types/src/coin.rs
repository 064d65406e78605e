//! Integer token amounts.
//!
//! Real tokens are always counted in whole base units (`u128`). A [`Coins`]
//! set is kept sorted by denomination with zero entries removed, so two sets
//! holding the same amounts compare equal regardless of construction order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An amount of a single denomination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

/// Renders as `<amount><denom>`, e.g. `1800uusdc`.
impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A normalized set of coins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Build a set, merging duplicate denominations and dropping zeros.
    ///
    /// Returns `None` if merging duplicates overflows.
    pub fn new(coins: impl IntoIterator<Item = Coin>) -> Option<Self> {
        let mut merged: BTreeMap<String, u128> = BTreeMap::new();
        for coin in coins {
            let entry = merged.entry(coin.denom).or_insert(0);
            *entry = entry.checked_add(coin.amount)?;
        }
        Some(Self(
            merged
                .into_iter()
                .filter(|(_, amount)| *amount > 0)
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        ))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Amount held of `denom` (zero if absent).
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        f.write_str(&parts.join(","))
    }
}
