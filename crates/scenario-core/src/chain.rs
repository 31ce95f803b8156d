//! The chain collaborator and an in-memory development chain.
//!
//! Builders never talk to a network directly. They go through a [`Chain`],
//! whose methods always return an [`Invocation`]: transport errors and
//! reverts come back as values, never as panics or `Err`s.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scenario_types::{ContractInstance, Invocation, InvocationError, Receipt, Value, ValueKind};
use scenario_world::World;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::artifact::ArtifactRegistry;

/// Deploys contracts and sends transactions.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Deploy `contract` from `from` with constructor `args`.
    async fn deploy(
        &self,
        world: &World,
        from: Address,
        contract: &str,
        args: &[Value],
    ) -> Invocation<ContractInstance>;

    /// Call `method` on the contract at `to`.
    async fn send(
        &self,
        world: &World,
        from: Address,
        to: Address,
        method: &str,
        args: &[Value],
    ) -> Invocation<()>;
}

/// Mutable chain state: block height, deployed code, and the address source.
#[derive(Debug)]
struct DevState {
    rng: StdRng,
    block_number: u64,
    deployed: BTreeMap<Address, String>,
}

impl DevState {
    fn next_block(&mut self) -> u64 {
        self.block_number = self.block_number.saturating_add(1);
        self.block_number
    }

    fn random_address(&mut self) -> Address {
        let mut bytes = [0_u8; 20];
        self.rng.fill(&mut bytes);
        Address::from(bytes)
    }

    fn random_hash(&mut self) -> B256 {
        let mut bytes = [0_u8; 32];
        self.rng.fill(&mut bytes);
        B256::from(bytes)
    }
}

/// A deterministic in-memory chain.
///
/// Addresses and transaction hashes come from a seeded RNG, so the same
/// scenario with the same seed always produces the same deployment. Calls
/// are checked against the [`ArtifactRegistry`]: unknown contracts, methods,
/// targets, or mistyped arguments revert.
#[derive(Debug)]
pub struct DevChain {
    artifacts: Arc<ArtifactRegistry>,
    state: Mutex<DevState>,
}

impl DevChain {
    /// Create a chain at block 0.
    pub fn new(artifacts: Arc<ArtifactRegistry>, seed: u64) -> Self {
        Self {
            artifacts,
            state: Mutex::new(DevState {
                rng: StdRng::seed_from_u64(seed),
                block_number: 0,
                deployed: BTreeMap::new(),
            }),
        }
    }

    /// Current block height.
    pub async fn block_number(&self) -> u64 {
        self.state.lock().await.block_number
    }
}

#[async_trait]
impl Chain for DevChain {
    async fn deploy(
        &self,
        _world: &World,
        from: Address,
        contract: &str,
        args: &[Value],
    ) -> Invocation<ContractInstance> {
        let Some(artifact) = self.artifacts.get(contract) else {
            return revert(contract, format!("no artifact named `{contract}`"));
        };
        if let Err(reason) = check_args(&artifact.constructor, args) {
            return revert(contract, reason);
        }

        let mut state = self.state.lock().await;
        let address = state.random_address();
        let tx_hash = state.random_hash();
        let block_number = state.next_block();
        state.deployed.insert(address, contract.to_owned());

        info!(contract, address = %address, block_number, "deployed contract");
        Invocation::success(
            ContractInstance::new(address, contract),
            Some(Receipt {
                tx_hash,
                block_number,
                from,
                to: None,
                contract_address: Some(address),
            }),
        )
    }

    async fn send(
        &self,
        world: &World,
        from: Address,
        to: Address,
        method: &str,
        args: &[Value],
    ) -> Invocation<()> {
        let mut state = self.state.lock().await;

        // Contracts restored from a saved world are callable too.
        let contract = state.deployed.get(&to).cloned().or_else(|| {
            world
                .contracts()
                .values()
                .find(|record| record.address == to)
                .map(|record| record.contract.clone())
        });
        let Some(contract) = contract else {
            return revert(method, format!("no contract at {to:#x}"));
        };
        let Some(inputs) = self
            .artifacts
            .get(&contract)
            .and_then(|artifact| artifact.methods.get(method))
        else {
            return revert(method, format!("{contract} has no method `{method}`"));
        };
        if let Err(reason) = check_args(inputs, args) {
            return revert(method, reason);
        }

        let tx_hash = state.random_hash();
        let block_number = state.next_block();
        debug!(%contract, method, block_number, "sent transaction");
        Invocation::success(
            (),
            Some(Receipt {
                tx_hash,
                block_number,
                from,
                to: Some(to),
                contract_address: None,
            }),
        )
    }
}

fn revert<T>(method: &str, reason: String) -> Invocation<T> {
    Invocation::failure(InvocationError::Reverted {
        method: method.to_owned(),
        reason,
    })
}

fn check_args(expected: &[ValueKind], args: &[Value]) -> Result<(), String> {
    let kinds: Vec<ValueKind> = args.iter().map(Value::kind).collect();
    if kinds == expected {
        return Ok(());
    }
    let render = |kinds: &[ValueKind]| {
        kinds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    Err(format!(
        "expected ({}), got ({})",
        render(expected),
        render(&kinds)
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreachable)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn chain(seed: u64) -> DevChain {
        DevChain::new(Arc::new(ArtifactRegistry::builtin()), seed)
    }

    fn from() -> Address {
        Address::repeat_byte(0x01)
    }

    #[tokio::test]
    async fn deploy_returns_instance_and_receipt() {
        let chain = chain(7);
        let world = World::new("test");
        let oether = Value::Address(Address::repeat_byte(0xee));

        let invocation = chain.deploy(&world, from(), "Maximillion", &[oether]).await;
        let instance = invocation.value().unwrap();
        let receipt = invocation.receipt().unwrap();
        assert_eq!(instance.contract, "Maximillion");
        assert_eq!(receipt.contract_address, Some(instance.address));
        assert_eq!(receipt.from, from());
        assert_eq!(receipt.block_number, 1);
        assert_eq!(chain.block_number().await, 1);
    }

    #[tokio::test]
    async fn same_seed_same_addresses() {
        let world = World::new("test");
        let deploy = |chain: DevChain| {
            let world = world.clone();
            async move {
                chain
                    .deploy(&world, from(), "SimplePriceOracle", &[])
                    .await
                    .into_result()
                    .unwrap()
                    .address
            }
        };
        assert_eq!(deploy(chain(1)).await, deploy(chain(1)).await);
        assert_ne!(deploy(chain(1)).await, deploy(chain(2)).await);
    }

    #[tokio::test]
    async fn unknown_artifact_and_bad_args_revert() {
        let chain = chain(7);
        let world = World::new("test");

        let unknown = chain.deploy(&world, from(), "Comptroller", &[]).await;
        assert!(matches!(
            unknown.error(),
            Some(InvocationError::Reverted { method, .. }) if method == "Comptroller"
        ));

        let mistyped = chain
            .deploy(&world, from(), "Maximillion", &[Value::Bool(true)])
            .await;
        let Some(InvocationError::Reverted { reason, .. }) = mistyped.error() else {
            unreachable!("expected revert");
        };
        assert_eq!(reason, "expected (Address), got (Bool)");
        assert_eq!(chain.block_number().await, 0);
    }

    #[tokio::test]
    async fn send_checks_target_and_method() {
        let chain = chain(7);
        let world = World::new("test");
        let oracle = chain
            .deploy(&world, from(), "SimplePriceOracle", &[])
            .await
            .into_result()
            .unwrap();
        let args = [Value::Address(Address::repeat_byte(0xee)), Value::from(dec!(1.5))];

        let sent = chain
            .send(&world, from(), oracle.address, "setUnderlyingPrice", &args)
            .await;
        assert_eq!(sent.receipt().and_then(|r| r.to), Some(oracle.address));

        let wrong_method = chain
            .send(&world, from(), oracle.address, "setPrice", &args)
            .await;
        assert!(!wrong_method.is_success());

        let nowhere = chain
            .send(&world, from(), Address::ZERO, "setUnderlyingPrice", &args)
            .await;
        assert!(!nowhere.is_success());
    }
}
