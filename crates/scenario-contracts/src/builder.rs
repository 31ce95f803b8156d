//! The shared deploy-and-register flow every contract builder follows.
//!
//! A builder declares fetchers that deploy a contract and describe it with
//! [`ContractMetadata`]. [`build`] dispatches a command to those fetchers,
//! re-raises a failed invocation, binds the deployed address into the
//! metadata, and registers the contract under the builder's index paths.

use std::sync::Arc;

use alloy_primitives::Address;
use scenario_core::{Chain, Context, DispatchError, Fetcher, get_fetcher_value};
use scenario_types::{Command, ContractInstance, Invocation, InvocationError, Value};
use scenario_world::{
    ContractMetadata, IndexEntry, IndexPath, World, WorldError, store_and_save_contract,
};
use tracing::{info, warn};

/// Errors from building a contract.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No fetcher matched, or a fetcher was malformed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The chain call, or the handler around it, failed.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// The deployment could not be registered in the world.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// What a deploy fetcher hands back: the live contract and its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// The deployed contract.
    pub instance: ContractInstance,
    /// Builder-supplied description, not yet bound to an address.
    pub metadata: ContractMetadata,
}

/// The result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Built {
    /// Successor world with the contract registered.
    pub world: World,
    /// The deployed contract.
    pub instance: ContractInstance,
    /// Stored metadata, bound to the deployed address.
    pub metadata: ContractMetadata,
}

/// Deploy `contract` and pair the resulting instance with `metadata`.
pub async fn deploy_contract(
    chain: Arc<dyn Chain>,
    world: &World,
    from: Address,
    contract: &str,
    args: &[Value],
    metadata: ContractMetadata,
) -> Invocation<Deployment> {
    chain
        .deploy(world, from, contract, args)
        .await
        .map(|instance| Deployment { instance, metadata })
}

/// Dispatch `command` to `fetchers` and register the deployed contract.
///
/// The input world is never modified. On any error the caller keeps it.
pub async fn build(
    ctx: &Context,
    world: &World,
    name: &str,
    command: &Command,
    fetchers: &[Fetcher<Deployment>],
    indices: &[IndexPath],
) -> Result<Built, BuildError> {
    let invocation = get_fetcher_value(command, fetchers, world, ctx.dispatch()).await?;
    let deployment = match &invocation {
        Invocation::Success { value, .. } => value.clone(),
        Invocation::Failure { error } => {
            warn!(contract = name, %error, "deployment failed");
            return Err(error.clone().into());
        }
    };

    let metadata = deployment
        .metadata
        .with_address(deployment.instance.address);
    let entries = indices
        .iter()
        .map(|path| IndexEntry::new(path.clone(), metadata.clone()))
        .collect();
    let world = store_and_save_contract(world, &deployment.instance, name, &invocation, entries)?;

    info!(
        contract = name,
        address = %deployment.instance.address,
        version = world.version(),
        "built contract"
    );
    Ok(Built {
        world,
        instance: deployment.instance,
        metadata,
    })
}
