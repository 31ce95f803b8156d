//! Price oracles: deployment variants and price updates.

use std::sync::Arc;

use alloy_primitives::Address;
use scenario_core::{Arg, Chain, Context, Fetcher, FetcherArgs, get_fetcher_value};
use scenario_types::{Command, Invocation, InvocationError, Number, Value};
use scenario_world::{Action, ContractMetadata, IndexPath, World};
use tracing::info;

use crate::ContractError;
use crate::builder::{self, BuildError, Built, Deployment};

/// Logical name the deployed oracle is registered under.
pub const PRICE_ORACLE: &str = "PriceOracle";

/// Sub-commands of the `PriceOracle` namespace.
pub const COMMANDS: &[&str] = &["Deploy", "SetPrice"];

const SIMPLE_DOC: &str = "#### Simple

* \"Simple\" - A price oracle whose prices are set by hand
  * E.g. \"PriceOracle Deploy Simple\"";

const FIXED_DOC: &str = "#### Fixed

* \"Fixed price:<Number>\" - A price oracle that returns the same price for every asset
  * E.g. \"PriceOracle Deploy Fixed 1.0\"";

const NOT_PRICE_ORACLE_DOC: &str = "#### NotPriceOracle

* \"NotPriceOracle\" - A contract that does not implement the oracle interface
  * E.g. \"PriceOracle Deploy NotPriceOracle\"";

const SET_PRICE_DOC: &str = "#### SetPrice

* \"SetPrice asset:<Address> price:<Number>\" - Sets the price of an asset on a Simple oracle
  * E.g. \"PriceOracle SetPrice 0x6b175474e89094c44da98b954eedeac495271d0f 0.01\"";

async fn deploy(
    chain: Arc<dyn Chain>,
    from: Address,
    world: World,
    contract: &'static str,
    description: &'static str,
    args: FetcherArgs,
) -> Result<Invocation<Deployment>, InvocationError> {
    let mut metadata = ContractMetadata::new(PRICE_ORACLE, description);
    let mut constructor = Vec::new();
    if args.get("price").is_some() {
        let price = Value::Number(args.number("price")?);
        metadata = metadata.with_data("price", price.clone());
        constructor.push(price);
    }
    Ok(builder::deploy_contract(chain, &world, from, contract, &constructor, metadata).await)
}

fn deploy_fetcher(
    ctx: &Context,
    from: Address,
    doc: &'static str,
    verb: &'static str,
    args: Vec<Arg>,
    contract: &'static str,
) -> Fetcher<Deployment> {
    let chain = Arc::clone(ctx.chain());
    Fetcher::new(doc, verb, args, move |world, args| {
        deploy(Arc::clone(&chain), from, world, contract, verb, args)
    })
}

/// Deployment variants, tried in order.
pub fn fetchers(ctx: &Context, from: Address) -> Vec<Fetcher<Deployment>> {
    vec![
        deploy_fetcher(ctx, from, SIMPLE_DOC, "Simple", vec![], "SimplePriceOracle"),
        deploy_fetcher(
            ctx,
            from,
            FIXED_DOC,
            "Fixed",
            vec![Arg::number("price")],
            "FixedPriceOracle",
        ),
        deploy_fetcher(
            ctx,
            from,
            NOT_PRICE_ORACLE_DOC,
            "NotPriceOracle",
            vec![],
            "NotPriceOracle",
        ),
    ]
}

/// Deploy a price oracle and register it under `PriceOracle`.
///
/// `command` names the variant: `Simple`, `Fixed <price>`, or `NotPriceOracle`.
pub async fn build_price_oracle(
    ctx: &Context,
    world: &World,
    from: Address,
    command: &Command,
) -> Result<Built, BuildError> {
    builder::build(
        ctx,
        world,
        PRICE_ORACLE,
        command,
        &fetchers(ctx, from),
        &[IndexPath::new([PRICE_ORACLE])],
    )
    .await
}

async fn send_price(
    chain: Arc<dyn Chain>,
    from: Address,
    world: World,
    args: FetcherArgs,
) -> Result<Invocation<(Address, Number)>, InvocationError> {
    let asset = args.address("asset")?;
    let price = args.number("price")?;
    let oracle = world
        .contract_address(PRICE_ORACLE)
        .ok_or_else(|| InvocationError::Handler(format!("no {PRICE_ORACLE} deployed")))?;
    let invocation = chain
        .send(
            &world,
            from,
            oracle,
            "setUnderlyingPrice",
            &[Value::Address(asset), Value::Number(price)],
        )
        .await;
    Ok(invocation.map(|()| (asset, price)))
}

/// Set an asset's price on the registered oracle.
///
/// The successor world records the update in its action log.
pub async fn set_price(
    ctx: &Context,
    world: &World,
    from: Address,
    command: &Command,
) -> Result<World, BuildError> {
    let chain = Arc::clone(ctx.chain());
    let fetchers = vec![Fetcher::new(
        SET_PRICE_DOC,
        "SetPrice",
        vec![Arg::address("asset"), Arg::number("price")],
        move |world, args| send_price(Arc::clone(&chain), from, world, args),
    )];

    let invocation = get_fetcher_value(command, &fetchers, world, ctx.dispatch()).await?;
    let tx_hash = invocation.receipt().map(|receipt| receipt.tx_hash);
    let (asset, price) = invocation.into_result()?;

    info!(asset = %asset, %price, "set underlying price");
    Ok(world.with_action(Action::new(
        format!("Set price of {asset:#x} to {price}"),
        tx_hash,
    )))
}

/// Handle a `PriceOracle <command>` event.
pub async fn process_price_oracle_event(
    ctx: &Context,
    world: &World,
    from: Address,
    command: &Command,
) -> Result<World, ContractError> {
    if command.verb().eq_ignore_ascii_case("Deploy") {
        let variant = command.subcommand()?;
        let built = build_price_oracle(ctx, world, from, &variant).await?;
        return Ok(built.world);
    }
    if command.verb().eq_ignore_ascii_case("SetPrice") {
        return Ok(set_price(ctx, world, from, command).await?);
    }
    Err(ContractError::UnknownCommand {
        namespace: PRICE_ORACLE.to_owned(),
        command: command.verb().to_owned(),
        available: COMMANDS.join(", "),
    })
}
