//! Markets and oracle allow-lists.

use serde::{Deserialize, Serialize};

use meridian_types::{AccountId, AssetPair};

/// A priced pair and the oracles allowed to post for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub pair: AssetPair,
    pub oracles: Vec<AccountId>,
    pub active: bool,
}

impl Market {
    pub fn new(pair: AssetPair, oracles: impl IntoIterator<Item = AccountId>, active: bool) -> Self {
        let mut oracles: Vec<AccountId> = oracles.into_iter().collect();
        oracles.sort();
        oracles.dedup();
        Self {
            pair,
            oracles,
            active,
        }
    }

    pub fn is_oracle(&self, account: &AccountId) -> bool {
        self.oracles.contains(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracles_deduplicated() {
        let market = Market::new(
            AssetPair::new("uusdc", "umusd"),
            [AccountId::new("b"), AccountId::new("a"), AccountId::new("b")],
            true,
        );
        assert_eq!(market.oracles, vec![AccountId::new("a"), AccountId::new("b")]);
        assert!(market.is_oracle(&AccountId::new("a")));
        assert!(!market.is_oracle(&AccountId::new("c")));
    }
}
