//! Minting and burning the stablecoin.
//!
//! Both flows price their legs once, before touching the store, then run
//! every transfer on a single branch. Any failure leaves balances, supplies
//! and the event sink untouched.

use serde_json::json;

use meridian_bank::Bank;
use meridian_pricefeed::PriceSource;
use meridian_store::{atomically, KvStore};
use meridian_types::decimal::DecimalError;
use meridian_types::events::{Event, EventLog, EventSink, EventType};
use meridian_types::{AccountId, BlockContext, Coin, Coins};

use crate::fees::{self, FeeSplit};
use crate::params::StablecoinParams;
use crate::{
    collateral_ratio, BurnStableResponse, MintStableResponse, ModuleAccounts, Result,
    StablecoinError, StablecoinKeeper,
};

/// Token amounts for one mint or burn of a given stable amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    pub collateral: u128,
    pub gov: u128,
    pub collateral_fee: u128,
    pub gov_fee: u128,
}

impl StablecoinKeeper {
    /// Price `stable` at the current collateral ratio and TWAPs.
    pub fn quote(
        &self,
        prices: &dyn PriceSource,
        params: &StablecoinParams,
        stable: u128,
    ) -> Result<Quote> {
        let legs = collateral_ratio::split(stable, params.coll_ratio)?;
        let collateral = collateral_ratio::token_amount(
            legs.collateral,
            &self.denoms().collateral_pair(),
            prices,
        )?;
        let gov =
            collateral_ratio::token_amount(legs.governance, &self.denoms().governance_pair(), prices)?;
        Ok(Quote {
            collateral,
            gov,
            collateral_fee: fees::fee_for(collateral, params.fee_ratio)?,
            gov_fee: fees::fee_for(gov, params.fee_ratio)?,
        })
    }

    /// Mint `amount` stable to `creator` against collateral and governance
    /// tokens taken from `creator`.
    pub fn mint_stable(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        accounts: &ModuleAccounts,
        creator: &AccountId,
        amount: u128,
    ) -> Result<MintStableResponse> {
        let denoms = self.denoms();
        if amount == 0 {
            return Ok(MintStableResponse {
                stable: Coin::zero(&denoms.stable),
                used_coins: Coins::empty(),
                fees_paid: Coins::empty(),
            });
        }

        let params = self.params(&*store)?;
        let quote = self.quote(&self.prices(&*store, ctx), &params, amount)?;
        let collateral_in = checked_total(quote.collateral, quote.collateral_fee)?;
        let gov_in = checked_total(quote.gov, quote.gov_fee)?;

        let mut staged = EventLog::new();
        let response = atomically(store, |tx| {
            let mut bank = Bank::new(tx);
            ensure_balance(&bank, creator, &denoms.collateral, collateral_in)?;
            ensure_balance(&bank, creator, &denoms.governance, gov_in)?;

            bank.send(
                creator,
                &accounts.module,
                &coins([
                    Coin::new(&denoms.collateral, collateral_in),
                    Coin::new(&denoms.governance, gov_in),
                ])?,
            )?;
            bank.burn(
                &accounts.module,
                &coins([Coin::new(&denoms.governance, quote.gov)])?,
            )?;
            let stable = Coin::new(&denoms.stable, amount);
            bank.mint(creator, &coins([stable.clone()])?)?;

            let fees_paid = self.distribute_fees(&mut bank, &mut staged, ctx, accounts, &params, &quote)?;
            let used_coins = coins([
                Coin::new(&denoms.collateral, quote.collateral),
                Coin::new(&denoms.governance, quote.gov),
            ])?;

            staged.emit(Event::new(
                EventType::MintStable,
                ctx,
                json!({
                    "creator": creator.to_string(),
                    "stable": stable.to_string(),
                    "used_coins": used_coins.to_string(),
                    "fees_paid": fees_paid.to_string(),
                }),
            ));
            Ok::<_, StablecoinError>(MintStableResponse {
                stable,
                used_coins,
                fees_paid,
            })
        })?;
        staged.drain_into(events);

        tracing::info!(
            %creator,
            stable = %response.stable,
            used = %response.used_coins,
            fees = %response.fees_paid,
            "stablecoin: minted"
        );
        Ok(response)
    }

    /// Burn `amount` stable held by `creator`, paying out collateral from the
    /// module account and newly minted governance tokens.
    pub fn burn_stable(
        &self,
        store: &mut dyn KvStore,
        events: &mut dyn EventSink,
        ctx: &BlockContext,
        accounts: &ModuleAccounts,
        creator: &AccountId,
        amount: u128,
    ) -> Result<BurnStableResponse> {
        let denoms = self.denoms();
        if amount == 0 {
            return Ok(BurnStableResponse {
                collateral: Coin::zero(&denoms.collateral),
                gov: Coin::zero(&denoms.governance),
                fees_paid: Coins::empty(),
            });
        }

        let available = meridian_bank::balance(&*store, creator, &denoms.stable)?;
        if available < amount {
            return Err(StablecoinError::InsufficientFunds {
                denom: denoms.stable.clone(),
                required: amount,
                available,
            });
        }

        let params = self.params(&*store)?;
        let quote = self.quote(&self.prices(&*store, ctx), &params, amount)?;

        let mut staged = EventLog::new();
        let response = atomically(store, |tx| {
            let mut bank = Bank::new(tx);
            let stable = coins([Coin::new(&denoms.stable, amount)])?;
            bank.send(creator, &accounts.module, &stable)?;
            bank.burn(&accounts.module, &stable)?;
            bank.mint(
                &accounts.module,
                &coins([Coin::new(&denoms.governance, quote.gov)])?,
            )?;

            let collateral = Coin::new(&denoms.collateral, quote.collateral - quote.collateral_fee);
            let gov = Coin::new(&denoms.governance, quote.gov - quote.gov_fee);
            bank.send(
                &accounts.module,
                creator,
                &coins([collateral.clone(), gov.clone()])?,
            )?;

            let fees_paid = self.distribute_fees(&mut bank, &mut staged, ctx, accounts, &params, &quote)?;

            staged.emit(Event::new(
                EventType::BurnStable,
                ctx,
                json!({
                    "creator": creator.to_string(),
                    "stable": Coin::new(&denoms.stable, amount).to_string(),
                    "collateral": collateral.to_string(),
                    "gov": gov.to_string(),
                    "fees_paid": fees_paid.to_string(),
                }),
            ));
            Ok::<_, StablecoinError>(BurnStableResponse {
                collateral,
                gov,
                fees_paid,
            })
        })?;
        staged.drain_into(events);

        tracing::info!(
            %creator,
            collateral = %response.collateral,
            gov = %response.gov,
            fees = %response.fees_paid,
            "stablecoin: burned"
        );
        Ok(response)
    }

    /// Move both legs' fees out of the module account. The ecosystem fund
    /// burns the governance tokens it receives. Returns the fees paid.
    fn distribute_fees(
        &self,
        bank: &mut Bank<'_>,
        staged: &mut EventLog,
        ctx: &BlockContext,
        accounts: &ModuleAccounts,
        params: &StablecoinParams,
        quote: &Quote,
    ) -> Result<Coins> {
        let denoms = self.denoms();
        let collateral = fees::split_fee(quote.collateral_fee, params.ef_fee_ratio)?;
        let gov = fees::split_fee(quote.gov_fee, params.ef_fee_ratio)?;

        let share = |pick: fn(&FeeSplit) -> u128| {
            coins([
                Coin::new(&denoms.collateral, pick(&collateral)),
                Coin::new(&denoms.governance, pick(&gov)),
            ])
        };
        let to_fund = share(|s| s.ecosystem_fund)?;
        let to_treasury = share(|s| s.treasury)?;
        if to_fund.is_empty() && to_treasury.is_empty() {
            return Ok(Coins::empty());
        }

        bank.send(&accounts.module, &accounts.ecosystem_fund, &to_fund)?;
        bank.send(&accounts.module, &accounts.treasury, &to_treasury)?;
        let burned = coins([Coin::new(&denoms.governance, gov.ecosystem_fund)])?;
        bank.burn(&accounts.ecosystem_fund, &burned)?;

        staged.emit(Event::new(
            EventType::FeesDistributed,
            ctx,
            json!({
                "ecosystem_fund": to_fund.to_string(),
                "treasury": to_treasury.to_string(),
                "burned": burned.to_string(),
            }),
        ));
        coins([
            Coin::new(&denoms.collateral, quote.collateral_fee),
            Coin::new(&denoms.governance, quote.gov_fee),
        ])
    }
}

/// `creator` must hold at least `required` of `denom`.
fn ensure_balance(bank: &Bank<'_>, creator: &AccountId, denom: &str, required: u128) -> Result<()> {
    if required == 0 {
        return Ok(());
    }
    let available = bank.balance(creator, denom)?;
    if available < required {
        return Err(StablecoinError::NotEnoughBalance {
            denom: denom.to_string(),
            required,
            available,
        });
    }
    Ok(())
}

fn checked_total(amount: u128, fee: u128) -> Result<u128> {
    Ok(amount.checked_add(fee).ok_or(DecimalError::Overflow)?)
}

fn coins(coins: impl IntoIterator<Item = Coin>) -> Result<Coins> {
    Ok(Coins::new(coins).ok_or(DecimalError::Overflow)?)
}
