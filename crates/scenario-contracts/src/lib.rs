//! Contract builders for the lending scenario harness.
//!
//! Each contract namespace (`Maximillion`, `PriceOracle`) owns the fetchers
//! that deploy or drive its contract. [`process_contract_event`] routes a
//! parsed event to the right namespace by its first word.
//!
//! # Modules
//!
//! - [`builder`] -- The shared deploy, re-raise, and register flow.
//! - [`maximillion`] -- The Maximillion builder.
//! - [`price_oracle`] -- Price oracle builders and price updates.

pub mod builder;
pub mod maximillion;
pub mod price_oracle;

use alloy_primitives::Address;
use scenario_core::Context;
use scenario_types::{Command, CommandError, Event};
use scenario_world::World;
use tracing::debug;

pub use builder::{BuildError, Built, Deployment};
pub use maximillion::{build_maximillion, process_maximillion_event};
pub use price_oracle::{build_price_oracle, process_price_oracle_event, set_price};

/// Contract namespaces accepted as the first word of an event.
pub const NAMESPACES: &[&str] = &[maximillion::MAXIMILLION, price_oracle::PRICE_ORACLE];

/// Errors from processing a contract event.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// The event did not start with a bare word.
    #[error("event must start with a contract namespace")]
    MissingNamespace,

    /// The first word named no known contract.
    #[error("unknown contract `{namespace}` (expected one of: {available})")]
    UnknownNamespace {
        /// The word that was given.
        namespace: String,
        /// Known namespaces.
        available: String,
    },

    /// The namespace has no such sub-command.
    #[error("unknown {namespace} command `{command}` (expected one of: {available})")]
    UnknownCommand {
        /// Namespace the command was sent to.
        namespace: String,
        /// The verb that was given.
        command: String,
        /// Known sub-commands.
        available: String,
    },

    /// The event's arguments could not form a command.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The builder or call failed.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Apply one contract event to `world`, returning the successor.
///
/// `from` is the account that sends any resulting transaction. On error
/// the caller's world is untouched.
pub async fn process_contract_event(
    ctx: &Context,
    world: &World,
    from: Address,
    event: &Event,
) -> Result<World, ContractError> {
    let (namespace, rest) = event.split_head().ok_or(ContractError::MissingNamespace)?;
    let Some(namespace) = NAMESPACES
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(namespace))
    else {
        return Err(ContractError::UnknownNamespace {
            namespace: namespace.to_owned(),
            available: NAMESPACES.join(", "),
        });
    };
    let command = Command::from_fragments(rest)?;
    debug!(namespace, command = %command, "processing contract event");

    if namespace == maximillion::MAXIMILLION {
        process_maximillion_event(ctx, world, from, &command).await
    } else {
        process_price_oracle_event(ctx, world, from, &command).await
    }
}
