//! Integration test: minting and burning the stablecoin against oracle
//! TWAPs.
//!
//! Prices are posted and finalized through the engine, then the mint and
//! burn flows are checked for exact token movements, fee distribution
//! and supply accounting.

mod common;

use common::{coins, mem_app, open_markets, post_prices, BASE_TIME};
use meridian_engine::EngineError;
use meridian_stablecoin::{StablecoinError, StablecoinParams};
use meridian_types::events::EventType;
use meridian_types::{AccountId, BlockContext, Coin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn params(coll_ratio: &str) -> StablecoinParams {
    meridian_stablecoin::params::parse(coll_ratio, "0.002", "0.5", "0.002").expect("params")
}

#[test]
fn mint_then_burn_at_ninety_percent_collateral() {
    let mut app = mem_app(900);
    let ctx = BlockContext::new(BASE_TIME, 1);
    open_markets(&mut app);
    post_prices(&mut app, &ctx, "10", "1");
    app.set_stablecoin_params(&params("0.9")).expect("params");

    let alice = AccountId::new("alice");
    app.mint_coins(&alice, &coins(&[("uusdc", 901_800), ("umrd", 10_020)]))
        .expect("fund alice");

    // Mint: 900_000 collateral + 10_000 gov, each plus a 0.2% fee
    let minted = app.mint_stable(&ctx, &alice, 1_000_000).expect("mint");
    assert_eq!(minted.stable, Coin::new("umusd", 1_000_000));
    assert_eq!(minted.used_coins, coins(&[("uusdc", 900_000), ("umrd", 10_000)]));
    assert_eq!(minted.fees_paid, coins(&[("uusdc", 1_800), ("umrd", 20)]));

    let accounts = app.accounts().clone();
    assert_eq!(app.balances(&alice).expect("alice"), coins(&[("umusd", 1_000_000)]));
    assert_eq!(
        app.balances(&accounts.ecosystem_fund).expect("fund"),
        coins(&[("uusdc", 900)])
    );
    assert_eq!(
        app.balances(&accounts.treasury).expect("treasury"),
        coins(&[("uusdc", 900), ("umrd", 10)])
    );

    let state = app.stablecoin_state().expect("state");
    assert_eq!(state.stable_supply, 1_000_000);
    assert_eq!(state.gov_supply, 10);
    assert_eq!(state.collateral_held, 900_000);

    // Burn everything back at the same prices
    let burned = app.burn_stable(&ctx, &alice, 1_000_000).expect("burn");
    assert_eq!(burned.collateral, Coin::new("uusdc", 898_200));
    assert_eq!(burned.gov, Coin::new("umrd", 9_980));
    assert_eq!(burned.fees_paid, coins(&[("uusdc", 1_800), ("umrd", 20)]));

    assert_eq!(
        app.balances(&alice).expect("alice"),
        coins(&[("uusdc", 898_200), ("umrd", 9_980)])
    );
    let state = app.stablecoin_state().expect("state");
    assert_eq!(state.stable_supply, 0);
    assert_eq!(state.collateral_held, 0);
    // 10 left from the mint, 10_000 minted by the burn, 10 burned by the fund
    assert_eq!(state.gov_supply, 10 + 10_000 - 10);

    assert_eq!(app.events().of_type(EventType::MintStable).len(), 1);
    assert_eq!(app.events().of_type(EventType::BurnStable).len(), 1);
    assert_eq!(app.events().of_type(EventType::FeesDistributed).len(), 2);
}

#[test]
fn burn_pays_collateral_and_new_gov() {
    let mut app = mem_app(900);
    let ctx = BlockContext::new(BASE_TIME, 1);
    open_markets(&mut app);
    post_prices(&mut app, &ctx, "10", "1");
    app.set_stablecoin_params(&params("0.9")).expect("params");

    let alice = AccountId::new("alice");
    let module = app.accounts().module.clone();
    app.mint_coins(&alice, &coins(&[("umusd", 1_000_000_000)]))
        .expect("fund alice");
    app.mint_coins(&module, &coins(&[("uusdc", 100_000_000)]))
        .expect("fund module");

    let burned = app.burn_stable(&ctx, &alice, 10_000_000).expect("burn");
    assert_eq!(burned.collateral, Coin::new("uusdc", 9_000_000 - 18_000));
    assert_eq!(burned.gov, Coin::new("umrd", 100_000 - 200));
    assert_eq!(burned.fees_paid, coins(&[("uusdc", 18_000), ("umrd", 200)]));

    let state = app.stablecoin_state().expect("state");
    assert_eq!(state.gov_supply, 99_900);
    assert_eq!(state.stable_supply, 1_000_000_000 - 10_000_000);
    assert_eq!(state.collateral_held, 100_000_000 - 9_000_000);
}

#[test]
fn mint_without_gov_changes_nothing() {
    let mut app = mem_app(900);
    let ctx = BlockContext::new(BASE_TIME, 1);
    open_markets(&mut app);
    post_prices(&mut app, &ctx, "10", "1");
    app.set_stablecoin_params(&params("0.9")).expect("params");

    let alice = AccountId::new("alice");
    app.mint_coins(&alice, &coins(&[("uusdc", 9_001)]))
        .expect("fund alice");
    let events_before = app.events().len();

    let err = app.mint_stable(&ctx, &alice, 100).expect_err("no gov");
    assert!(matches!(
        err,
        EngineError::Stablecoin(StablecoinError::NotEnoughBalance { .. })
    ));
    assert_eq!(err.to_string(), "not enough balance: umrd");
    assert_eq!(app.balances(&alice).expect("alice"), coins(&[("uusdc", 9_001)]));
    assert_eq!(app.events().len(), events_before);
}

#[test]
fn full_collateral_needs_no_gov_price() {
    let mut app = mem_app(900);
    let ctx = BlockContext::new(BASE_TIME, 1);
    open_markets(&mut app);
    app.submit_price(&ctx, &common::coll_pair(), &common::oracle(), "1", BASE_TIME + 60)
        .expect("coll price");
    app.end_block(&ctx).expect("end block");
    app.set_stablecoin_params(&params("1")).expect("params");

    let alice = AccountId::new("alice");
    app.mint_coins(&alice, &coins(&[("uusdc", 10_020)]))
        .expect("fund alice");
    let minted = app.mint_stable(&ctx, &alice, 10_000).expect("mint");
    assert_eq!(minted.used_coins, coins(&[("uusdc", 10_000)]));
    assert_eq!(minted.fees_paid, coins(&[("uusdc", 20)]));
}

#[test]
fn interleaved_mints_and_burns_never_pay_out_more_than_deposited() {
    let mut rng = StdRng::seed_from_u64(42);
    let users: Vec<AccountId> = (0..4).map(|i| AccountId::new(format!("user{i}"))).collect();
    let deposit = 50_000_000u128;

    let mut app = mem_app(900);
    let ctx = BlockContext::new(BASE_TIME, 1);
    open_markets(&mut app);
    post_prices(&mut app, &ctx, "7.5", "0.998");
    app.set_stablecoin_params(&params("0.8")).expect("params");
    for user in &users {
        app.mint_coins(user, &coins(&[("uusdc", deposit), ("umrd", deposit)]))
            .expect("fund user");
    }
    // A burn larger than any single mint can truncate up by one unit, so
    // the module starts with some reserve.
    let module = app.accounts().module.clone();
    app.mint_coins(&module, &coins(&[("uusdc", 10_000)]))
        .expect("fund module");

    for _ in 0..200 {
        let user = &users[rng.gen_range(0..users.len())];
        let held = app.balance(user, "umusd").expect("stable balance");
        if held > 0 && rng.gen_bool(0.5) {
            let amount = rng.gen_range(1..=held);
            app.burn_stable(&ctx, user, amount).expect("burn");
        } else {
            let amount = rng.gen_range(1..=1_000_000u128);
            app.mint_stable(&ctx, user, amount).expect("mint");
        }
    }

    for user in &users {
        let held = app.balance(user, "umusd").expect("stable balance");
        app.burn_stable(&ctx, user, held).expect("final burn");
        assert!(app.balance(user, "uusdc").expect("coll") <= deposit);
        assert!(app.balance(user, "umrd").expect("gov") <= deposit);
    }
    assert_eq!(app.stablecoin_state().expect("state").stable_supply, 0);
}

#[test]
fn burn_more_than_held_fails() {
    let mut app = mem_app(900);
    let ctx = BlockContext::new(BASE_TIME, 1);
    open_markets(&mut app);
    post_prices(&mut app, &ctx, "10", "1");

    let alice = AccountId::new("alice");
    app.mint_coins(&alice, &coins(&[("umusd", 10)]))
        .expect("fund alice");
    let err = app.burn_stable(&ctx, &alice, 11).expect_err("over balance");
    assert!(err.to_string().contains("insufficient funds"));
    assert_eq!(app.balance(&alice, "umusd").expect("balance"), 10);
}
