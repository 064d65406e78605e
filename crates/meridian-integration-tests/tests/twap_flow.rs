//! Integration test: oracle posts through finalize to TWAP.
//!
//! Four oracles each post once, one block-interval `H` apart, with every
//! post valid for `4H`. The end-of-block hook turns the valid posts into a
//! median snapshot, and the TWAP weights each snapshot by how long it
//! prevailed inside the window. A single oracle revising its price every
//! block must produce the same history.

mod common;

use common::{dec, mem_app, BASE_TIME};
use meridian_engine::{App, EngineError};
use meridian_pricefeed::{Market, PriceFeedError};
use meridian_store::MemStore;
use meridian_types::events::EventType;
use meridian_types::{AccountId, AssetPair, BlockContext, Decimal};

const H: u64 = 18_000_000;

fn pair() -> AssetPair {
    AssetPair::new("uusdc", "umusd")
}

fn oracles() -> Vec<AccountId> {
    (0..4).map(|i| AccountId::new(format!("oracle{i}"))).collect()
}

#[test]
fn twap_over_rolling_median_snapshots() {
    let mut app = mem_app(4 * H);
    let oracles = oracles();
    app.set_markets(&[Market::new(pair(), oracles.clone(), true)])
        .expect("markets");

    let t = |k: u64| BASE_TIME + k * H;
    let mut height = 0;
    let mut block = |time: u64| {
        height += 1;
        BlockContext::new(time, height)
    };

    // 0.9 posted at S, finalized at T0 = S + H
    let ctx = block(t(0));
    app.submit_price(&ctx, &pair(), &oracles[0], "0.9", ctx.time + 4 * H)
        .expect("post 0.9");
    let ctx = block(t(1));
    let summary = app.end_block(&ctx).expect("end block T0");
    assert_eq!(summary.finalized[0].price, dec("0.9"));

    // 0.8 joins: median 0.85 at T1, TWAP still 0.9
    app.submit_price(&ctx, &pair(), &oracles[1], "0.8", ctx.time + 4 * H)
        .expect("post 0.8");
    let ctx = block(t(2));
    let summary = app.end_block(&ctx).expect("end block T1");
    assert_eq!(summary.finalized[0].price, dec("0.85"));
    assert_eq!(app.current_twap(&ctx, &pair()).expect("twap T1"), dec("0.9"));

    // 0.82 joins: median of {0.9, 0.8, 0.82}
    app.submit_price(&ctx, &pair(), &oracles[2], "0.82", ctx.time + 4 * H)
        .expect("post 0.82");
    let ctx = block(t(3));
    let summary = app.end_block(&ctx).expect("end block T2");
    assert_eq!(summary.finalized[0].price, dec("0.82"));
    assert_eq!(app.current_twap(&ctx, &pair()).expect("twap T2"), dec("0.875"));

    // 0.83 joins as 0.9 expires: median of {0.8, 0.82, 0.83}
    app.submit_price(&ctx, &pair(), &oracles[3], "0.83", ctx.time + 4 * H)
        .expect("post 0.83");
    let ctx = block(t(4));
    let summary = app.end_block(&ctx).expect("end block T3");
    assert_eq!(summary.finalized[0].price, dec("0.82"));
    assert_eq!(app.current_price(&pair()).expect("current").price, dec("0.82"));

    // The window now starts at the oldest valid post (T0), so the 0.9
    // snapshot's interval before T0 no longer counts.
    let twap = app.current_twap(&ctx, &pair()).expect("twap T3");
    let expected = dec("2.57") / Decimal::from(3);
    assert!((twap - expected).abs() < dec("0.00000000000000000001"));

    assert_eq!(app.events().of_type(EventType::PriceSubmitted).len(), 4);
    assert_eq!(app.events().of_type(EventType::CurrentPriceFinalized).len(), 4);
}

#[test]
fn revised_price_is_weighted_by_elapsed_time() {
    let mut app = mem_app(4 * H);
    let oracle = AccountId::new("oracle0");
    app.set_markets(&[Market::new(pair(), [oracle.clone()], true)])
        .expect("markets");

    let t0 = BASE_TIME;
    let t1 = BASE_TIME + H;
    let ctx0 = BlockContext::new(t0, 1);
    app.submit_price(&ctx0, &pair(), &oracle, "0.9", t0 + 10 * H)
        .expect("post 0.9");
    app.end_block(&ctx0).expect("finalize T0");

    // The revision expires after the first post; both stay live.
    let ctx1 = BlockContext::new(t1, 2);
    app.submit_price(&ctx1, &pair(), &oracle, "0.8", t1 + 10 * H)
        .expect("post 0.8");
    let before = app.current_twap(&ctx1, &pair()).expect("twap before end block");
    let summary = app.end_block(&ctx1).expect("finalize T1");
    assert_eq!(summary.finalized[0].price, dec("0.85"));
    assert_eq!(app.current_twap(&ctx1, &pair()).expect("twap at T1"), before);
    assert_eq!(before, dec("0.9"));

    let later = BlockContext::new(t1 + H, 3);
    assert_eq!(app.current_twap(&later, &pair()).expect("twap later"), dec("0.875"));
}

#[test]
fn single_oracle_revising_every_block() {
    let mut app = mem_app(4 * H);
    let oracle = AccountId::new("oracle0");
    app.set_markets(&[Market::new(pair(), [oracle.clone()], true)])
        .expect("markets");

    let t = |k: u64| BASE_TIME + k * H;
    let post = |app: &mut App<MemStore>, k: u64, price: &str| {
        let ctx = BlockContext::new(t(k), k + 1);
        app.submit_price(&ctx, &pair(), &oracle, price, ctx.time + 4 * H)
            .expect("post");
    };
    let finalize = |app: &mut App<MemStore>, k: u64| {
        let ctx = BlockContext::new(t(k), k + 1);
        let before = app.current_twap(&ctx, &pair()).ok();
        let summary = app.end_block(&ctx).expect("end block");
        let after = app.current_twap(&ctx, &pair()).expect("twap");
        if let Some(before) = before {
            assert_eq!(after, before, "finalize moved the twap at T{k}");
        }
        (summary.finalized[0].price, after)
    };

    post(&mut app, 0, "0.9");
    let (price, twap) = finalize(&mut app, 1);
    assert_eq!((price, twap), (dec("0.9"), dec("0.9")));

    post(&mut app, 1, "0.8");
    let (price, twap) = finalize(&mut app, 2);
    assert_eq!(price, dec("0.85"));
    assert_eq!(twap, dec("0.9"));

    post(&mut app, 2, "0.82");
    let (price, twap) = finalize(&mut app, 3);
    assert_eq!(price, dec("0.82"));
    assert_eq!(twap, dec("0.875"));

    // 0.9 expires at T4; the window then starts at the 0.8 post (T1)
    post(&mut app, 3, "0.83");
    let (price, twap) = finalize(&mut app, 4);
    assert_eq!(price, dec("0.82"));
    let expected = dec("2.57") / Decimal::from(3);
    assert!((twap - expected).abs() < dec("0.00000000000000000001"));
}

#[test]
fn non_oracle_submission_is_rejected() {
    let mut app = mem_app(900);
    app.set_markets(&[Market::new(pair(), oracles(), true)])
        .expect("markets");
    let ctx = BlockContext::new(BASE_TIME, 1);

    let err = app
        .submit_price(&ctx, &pair(), &AccountId::new("mallory"), "0.9", BASE_TIME + 60)
        .expect_err("not an oracle");
    assert!(matches!(
        err,
        EngineError::PriceFeed(PriceFeedError::Unauthorized { .. })
    ));
    assert!(app.events().is_empty());

    let summary = app.end_block(&ctx).expect("end block");
    assert_eq!(summary.skipped, vec![pair()]);
    assert!(matches!(
        app.current_twap(&ctx, &pair()),
        Err(EngineError::PriceFeed(PriceFeedError::InsufficientHistory { .. }))
    ));
}

#[test]
fn inactive_market_is_not_finalized() {
    let mut app = mem_app(900);
    app.set_markets(&[Market::new(pair(), oracles(), true)])
        .expect("markets");
    let oracles = oracles();
    let ctx = BlockContext::new(BASE_TIME, 1);
    app.submit_price(&ctx, &pair(), &oracles[0], "1.01", BASE_TIME + 600)
        .expect("post");
    app.set_market_active(&ctx, &pair(), false)
        .expect("deactivate");

    let summary = app.end_block(&ctx).expect("end block");
    assert!(summary.finalized.is_empty());
    assert!(summary.skipped.is_empty());

    let err = app
        .submit_price(&ctx, &pair(), &oracles[0], "1.02", BASE_TIME + 600)
        .expect_err("inactive");
    assert!(matches!(
        err,
        EngineError::PriceFeed(PriceFeedError::InactiveMarket(_))
    ));
}
