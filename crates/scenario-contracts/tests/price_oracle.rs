//! Price oracle deployment variants and price updates on the dev chain.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use alloy_primitives::Address;
use rust_decimal_macros::dec;
use scenario_contracts::{BuildError, ContractError, process_contract_event};
use scenario_core::{Context, DispatchError, RejectReason, ScenarioConfig};
use scenario_types::{Event, InvocationError, Value};
use scenario_world::{IndexPath, World};

const O_DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";

fn context() -> Context {
    Context::development(&ScenarioConfig::default()).unwrap()
}

fn from() -> Address {
    Address::repeat_byte(0x01)
}

async fn apply(ctx: &Context, world: &World, text: &str) -> Result<World, ContractError> {
    process_contract_event(ctx, world, from(), &Event::parse(text).unwrap()).await
}

#[tokio::test]
async fn deploys_each_variant_by_verb() {
    let ctx = context();
    let world = World::new("test");

    let simple = apply(&ctx, &world, "PriceOracle Deploy Simple").await.unwrap();
    assert_eq!(
        simple.contract("PriceOracle").unwrap().contract,
        "SimplePriceOracle"
    );

    let fixed = apply(&ctx, &world, "PriceOracle Deploy Fixed price:1.5")
        .await
        .unwrap();
    let metadata = fixed.metadata_at(&IndexPath::new(["PriceOracle"])).unwrap();
    assert_eq!(metadata.description, "Fixed");
    assert_eq!(metadata.get("price"), Some(&Value::from(dec!(1.5))));

    let not_oracle = apply(&ctx, &world, "priceoracle deploy notpriceoracle")
        .await
        .unwrap();
    assert_eq!(
        not_oracle.contract("PriceOracle").unwrap().contract,
        "NotPriceOracle"
    );
}

#[tokio::test]
async fn unknown_variant_lists_every_candidate() {
    let err = apply(&context(), &World::new("test"), "PriceOracle Deploy Anchored")
        .await
        .unwrap_err();
    let ContractError::Build(BuildError::Dispatch(DispatchError::AmbiguousOrNoMatch {
        attempts,
        ..
    })) = err
    else {
        panic!("expected no match");
    };
    let names: Vec<&str> = attempts.iter().map(|a| a.fetcher.as_str()).collect();
    assert_eq!(names, ["Simple", "Fixed", "NotPriceOracle"]);
    assert!(
        attempts
            .iter()
            .all(|a| matches!(a.reason, RejectReason::VerbMismatch { .. }))
    );
}

#[tokio::test]
async fn fixed_without_price_is_a_missing_argument() {
    let err = apply(&context(), &World::new("test"), "PriceOracle Deploy Fixed")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Fixed: missing argument `price`"));
}

#[tokio::test]
async fn set_price_records_an_action() {
    let ctx = context();
    let world = apply(&ctx, &World::new("test"), "PriceOracle Deploy Simple")
        .await
        .unwrap();

    let next = apply(&ctx, &world, &format!("PriceOracle SetPrice {O_DAI} 0.01"))
        .await
        .unwrap();

    assert_eq!(next.actions().len(), world.actions().len() + 1);
    let action = next.actions().last().unwrap();
    assert_eq!(action.message, format!("Set price of {O_DAI} to 0.01"));
    assert!(action.tx_hash.is_some());
}

#[tokio::test]
async fn prices_keep_uint256_precision() {
    let ctx = context();
    let world = apply(&ctx, &World::new("test"), "PriceOracle Deploy Fixed 1e36")
        .await
        .unwrap();
    let metadata = world.metadata_at(&IndexPath::new(["PriceOracle"])).unwrap();
    let price = metadata.get("price").and_then(Value::as_number).unwrap();
    assert_eq!(price.to_string(), format!("1{}", "0".repeat(36)));

    let simple = apply(&ctx, &World::new("test"), "PriceOracle Deploy Simple")
        .await
        .unwrap();
    let next = apply(&ctx, &simple, &format!("PriceOracle SetPrice {O_DAI} 1e29"))
        .await
        .unwrap();
    assert_eq!(
        next.actions().last().unwrap().message,
        format!("Set price of {O_DAI} to 1{}", "0".repeat(29))
    );
}

#[tokio::test]
async fn out_of_range_price_is_reported_as_such() {
    let err = apply(&context(), &World::new("test"), "PriceOracle Deploy Fixed 1e999")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Number `1e999` is out of range"), "{err}");
}

#[tokio::test]
async fn set_price_on_fixed_oracle_reverts() {
    let ctx = context();
    let world = apply(&ctx, &World::new("test"), "PriceOracle Deploy Fixed 1")
        .await
        .unwrap();

    let err = apply(&ctx, &world, &format!("PriceOracle SetPrice asset:{O_DAI} price:2"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Build(BuildError::Invocation(InvocationError::Reverted { ref method, .. }))
            if method == "setUnderlyingPrice"
    ));
}

#[tokio::test]
async fn set_price_without_oracle_fails_in_handler() {
    let err = apply(
        &context(),
        &World::new("test"),
        &format!("PriceOracle SetPrice {O_DAI} 1"),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Build(BuildError::Invocation(InvocationError::Handler(_)))
    ));
}

#[tokio::test]
async fn later_registrations_keep_earlier_entries() {
    let ctx = context();
    let world = World::new("test");
    let with_oracle = apply(&ctx, &world, "PriceOracle Deploy Simple").await.unwrap();
    let oracle_entry = with_oracle
        .metadata_at(&IndexPath::new(["PriceOracle"]))
        .cloned();

    let both = apply(
        &ctx,
        &with_oracle,
        "Maximillion Deploy 0x5aaf5f0dd3c4cc6e4b1f6a9a0a6a8e3f2f7c1d23",
    )
    .await
    .unwrap();

    assert_eq!(
        both.metadata_at(&IndexPath::new(["PriceOracle"])).cloned(),
        oracle_entry
    );
    assert_eq!(both.contracts().len(), 2);
    assert_ne!(
        both.contract("PriceOracle").unwrap().address,
        both.contract("Maximillion").unwrap().address
    );
}
