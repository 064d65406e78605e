//! Store-backed stablecoin operations.
//!
//! The mint and burn flows live in [`mint_burn`](crate::mint_burn); this
//! module holds the keeper itself, its parameters and the state query.

use serde::{Deserialize, Serialize};
use serde_json::json;

use meridian_pricefeed::{LookbackPolicy, PriceView};
use meridian_store::{atomically, codec, KvStore};
use meridian_types::events::{Event, EventLog, EventSink, EventType};
use meridian_types::{BlockContext, Decimal};

use crate::params::{self, StablecoinParams};
use crate::{keys, ModuleAccounts, Result, StablecoinDenoms, StablecoinError};

/// Supply and parameter summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablecoinState {
    pub stable_supply: u128,
    pub gov_supply: u128,
    /// Collateral held by the module account.
    pub collateral_held: u128,
    pub params: StablecoinParams,
}

/// Stablecoin keeper.
#[derive(Clone, Debug)]
pub struct StablecoinKeeper {
    denoms: StablecoinDenoms,
    lookback: LookbackPolicy,
}

impl StablecoinKeeper {
    /// `lookback` bounds the TWAP window used to value collateral and
    /// governance tokens.
    pub fn new(denoms: StablecoinDenoms, lookback: LookbackPolicy) -> Self {
        Self { denoms, lookback }
    }

    pub fn denoms(&self) -> &StablecoinDenoms {
        &self.denoms
    }

    pub(crate) fn prices<'a>(&self, store: &'a dyn KvStore, ctx: &BlockContext) -> PriceView<'a> {
        PriceView::new(store, *ctx, self.lookback)
    }

    /// Current parameters, or the defaults if none were stored.
    pub fn params(&self, store: &dyn KvStore) -> Result<StablecoinParams> {
        Ok(codec::get(store, keys::PARAMS)?.unwrap_or_default())
    }

    /// Replace the parameters.
    pub fn set_params(&self, store: &mut dyn KvStore, params: &StablecoinParams) -> Result<()> {
        params.validate()?;
        codec::put(store, keys::PARAMS, params)?;
        tracing::info!(
            coll_ratio = %params.coll_ratio,
            fee_ratio = %params.fee_ratio,
            "stablecoin: params updated"
        );
        Ok(())
    }

    /// Set the collateral ratio, leaving the other parameters unchanged.
    pub fn set_coll_ratio(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        coll_ratio: Decimal,
    ) -> Result<()> {
        params::validate_ratio("coll_ratio", coll_ratio)?;

        let mut staged = EventLog::new();
        let previous = atomically(store, |tx| {
            let mut params = self.params(tx)?;
            let previous = params.coll_ratio;
            params.coll_ratio = coll_ratio;
            codec::put(tx, keys::PARAMS, &params)?;
            staged.emit(Event::new(
                EventType::CollRatioUpdated,
                ctx,
                json!({ "previous": previous, "coll_ratio": coll_ratio }),
            ));
            Ok::<_, StablecoinError>(previous)
        })?;
        staged.drain_into(events);

        tracing::info!(%previous, %coll_ratio, "stablecoin: collateral ratio updated");
        Ok(())
    }

    /// Supplies of stable and governance tokens, collateral held by the
    /// module, and the current parameters.
    pub fn stablecoin_state(
        &self,
        store: &dyn KvStore,
        accounts: &ModuleAccounts,
    ) -> Result<StablecoinState> {
        Ok(StablecoinState {
            stable_supply: meridian_bank::supply(store, &self.denoms.stable)?,
            gov_supply: meridian_bank::supply(store, &self.denoms.governance)?,
            collateral_held: meridian_bank::balance(
                store,
                &accounts.module,
                &self.denoms.collateral,
            )?,
            params: self.params(store)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_bank::Bank;
    use meridian_store::MemStore;
    use meridian_types::{Coin, Coins};

    fn keeper() -> StablecoinKeeper {
        StablecoinKeeper::new(StablecoinDenoms::default(), LookbackPolicy::new(900))
    }

    #[test]
    fn test_params_default_when_unset() {
        let store = MemStore::new();
        assert_eq!(
            keeper().params(&store).expect("params"),
            StablecoinParams::default()
        );
    }

    #[test]
    fn test_set_params_rejects_invalid() {
        let mut store = MemStore::new();
        let mut params = StablecoinParams::default();
        params.fee_ratio = Decimal::TWO;
        assert!(keeper().set_params(&mut store, &params).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_coll_ratio() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut events = EventLog::new();
        let ctx = BlockContext::new(100, 1);

        keeper
            .set_coll_ratio(&mut store, &mut events, &ctx, Decimal::new(9, 1))
            .expect("set ratio");
        let params = keeper.params(&store).expect("params");
        assert_eq!(params.coll_ratio, Decimal::new(9, 1));
        assert_eq!(params.fee_ratio, StablecoinParams::default().fee_ratio);
        assert_eq!(events.of_type(EventType::CollRatioUpdated).len(), 1);

        let err = keeper
            .set_coll_ratio(&mut store, &mut events, &ctx, Decimal::TWO)
            .expect_err("ratio above one");
        assert!(matches!(err, StablecoinError::InvalidParams(_)));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_stablecoin_state() {
        let keeper = keeper();
        let accounts = ModuleAccounts::default();
        let mut store = MemStore::new();
        {
            let mut bank = Bank::new(&mut store);
            bank.mint(
                &accounts.module,
                &Coins::new([Coin::new("uusdc", 500), Coin::new("umusd", 700)]).expect("coins"),
            )
            .expect("mint");
        }

        let state = keeper
            .stablecoin_state(&store, &accounts)
            .expect("state");
        assert_eq!(state.stable_supply, 700);
        assert_eq!(state.gov_supply, 0);
        assert_eq!(state.collateral_held, 500);
    }
}
