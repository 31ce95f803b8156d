//! Maximillion: the helper that repays borrows on the ether market.

use std::sync::Arc;

use alloy_primitives::Address;
use scenario_core::{Arg, Chain, Context, Fetcher, FetcherArgs};
use scenario_types::{Command, Invocation, InvocationError, Value};
use scenario_world::{ContractMetadata, IndexPath, World};

use crate::ContractError;
use crate::builder::{self, BuildError, Built, Deployment};

/// Logical name and artifact of the contract.
pub const MAXIMILLION: &str = "Maximillion";

const DEPLOY_DOC: &str = "#### Maximillion

* \"Maximillion Deploy oEther:<Address>\" - Deploys Maximillion for the given ether market
  * E.g. \"Maximillion Deploy oEther:0x5aaf5f0dd3c4cc6e4b1f6a9a0a6a8e3f2f7c1d23\"
  * E.g. \"Maximillion Deploy Tokens.oEther\"";

/// Sub-commands of the `Maximillion` namespace.
pub const COMMANDS: &[&str] = &["Deploy"];

async fn deploy(
    chain: Arc<dyn Chain>,
    from: Address,
    world: World,
    args: FetcherArgs,
) -> Result<Invocation<Deployment>, InvocationError> {
    let o_ether = args.address("oEther")?;
    let metadata =
        ContractMetadata::new(MAXIMILLION, "Maximillion").with_data("oEtherAddress", o_ether);
    Ok(builder::deploy_contract(
        chain,
        &world,
        from,
        MAXIMILLION,
        &[Value::Address(o_ether)],
        metadata,
    )
    .await)
}

/// The single catchall fetcher: any verb, one `oEther` address.
pub fn fetchers(ctx: &Context, from: Address) -> Vec<Fetcher<Deployment>> {
    let chain = Arc::clone(ctx.chain());
    vec![
        Fetcher::new(DEPLOY_DOC, "", vec![Arg::address("oEther")], move |world, args| {
            deploy(Arc::clone(&chain), from, world, args)
        })
        .catchall(),
    ]
}

/// Deploy a Maximillion and register it under `Maximillion`.
pub async fn build_maximillion(
    ctx: &Context,
    world: &World,
    from: Address,
    command: &Command,
) -> Result<Built, BuildError> {
    builder::build(
        ctx,
        world,
        MAXIMILLION,
        command,
        &fetchers(ctx, from),
        &[IndexPath::new([MAXIMILLION])],
    )
    .await
}

/// Handle a `Maximillion <command>` event.
pub async fn process_maximillion_event(
    ctx: &Context,
    world: &World,
    from: Address,
    command: &Command,
) -> Result<World, ContractError> {
    if command.verb().eq_ignore_ascii_case("Deploy") {
        let built = build_maximillion(ctx, world, from, command).await?;
        return Ok(built.world);
    }
    Err(ContractError::UnknownCommand {
        namespace: MAXIMILLION.to_owned(),
        command: command.verb().to_owned(),
        available: COMMANDS.join(", "),
    })
}
