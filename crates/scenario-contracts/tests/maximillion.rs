//! Maximillion builder scenarios against recording and failing chains.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use async_trait::async_trait;
use scenario_contracts::{
    BuildError, ContractError, build_maximillion, process_contract_event,
};
use scenario_core::{
    ArtifactRegistry, Chain, Context, DevChain, DispatchError, DispatchOptions, RejectReason,
};
use scenario_types::{Command, ContractInstance, Event, Invocation, InvocationError, Value};
use scenario_world::{ContractMetadata, IndexPath, World};

const O_ETHER: &str = "0x5aaf5f0dd3c4cc6e4b1f6a9a0a6a8e3f2f7c1d23";

/// Delegates to a [`DevChain`] and records every deploy request.
struct RecordingChain {
    inner: DevChain,
    deploys: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingChain {
    fn new() -> Self {
        Self {
            inner: DevChain::new(Arc::new(ArtifactRegistry::builtin()), 7),
            deploys: Mutex::new(Vec::new()),
        }
    }

    fn deploys(&self) -> Vec<(String, Vec<Value>)> {
        self.deploys.lock().unwrap().clone()
    }
}

#[async_trait]
impl Chain for RecordingChain {
    async fn deploy(
        &self,
        world: &World,
        from: Address,
        contract: &str,
        args: &[Value],
    ) -> Invocation<ContractInstance> {
        self.deploys
            .lock()
            .unwrap()
            .push((contract.to_owned(), args.to_vec()));
        self.inner.deploy(world, from, contract, args).await
    }

    async fn send(
        &self,
        world: &World,
        from: Address,
        to: Address,
        method: &str,
        args: &[Value],
    ) -> Invocation<()> {
        self.inner.send(world, from, to, method, args).await
    }
}

/// Fails every call with a network error.
#[derive(Default)]
struct FailingChain {
    calls: AtomicUsize,
}

#[async_trait]
impl Chain for FailingChain {
    async fn deploy(
        &self,
        _world: &World,
        _from: Address,
        _contract: &str,
        _args: &[Value],
    ) -> Invocation<ContractInstance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Invocation::failure(InvocationError::Network("connection refused".to_owned()))
    }

    async fn send(
        &self,
        _world: &World,
        _from: Address,
        _to: Address,
        _method: &str,
        _args: &[Value],
    ) -> Invocation<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Invocation::failure(InvocationError::Network("connection refused".to_owned()))
    }
}

fn context(chain: Arc<dyn Chain>) -> Context {
    Context::new(chain, Arc::new(ArtifactRegistry::builtin()))
}

fn from() -> Address {
    Address::repeat_byte(0x01)
}

fn o_ether() -> Address {
    O_ETHER.parse().unwrap()
}

fn command(text: &str) -> Command {
    Command::from_fragments(Event::parse(text).unwrap().fragments()).unwrap()
}

#[tokio::test]
async fn valid_deploy_stores_metadata_under_maximillion() {
    let chain = Arc::new(RecordingChain::new());
    let ctx = context(chain.clone());
    let world = World::new("test");
    let event = Event::parse(&format!("Maximillion Deploy {O_ETHER}")).unwrap();

    let next = process_contract_event(&ctx, &world, from(), &event)
        .await
        .unwrap();

    assert_eq!(
        chain.deploys(),
        vec![("Maximillion".to_owned(), vec![Value::Address(o_ether())])]
    );

    let record = next.contract("Maximillion").unwrap();
    let metadata = next.metadata_at(&IndexPath::new(["Maximillion"])).unwrap();
    assert_eq!(metadata.description, "Maximillion");
    assert_eq!(metadata.get("oEtherAddress"), Some(&Value::Address(o_ether())));
    assert_eq!(metadata.address, Some(record.address));
    assert!(record.tx_hash.is_some());

    assert!(world.contracts().is_empty());
    assert!(world.store().is_empty());
}

#[tokio::test]
async fn build_returns_world_instance_and_metadata() {
    let ctx = context(Arc::new(RecordingChain::new()));
    let world = World::new("test");

    let built = build_maximillion(&ctx, &world, from(), &command(&format!("Deploy oEther:{O_ETHER}")))
        .await
        .unwrap();

    assert_eq!(built.instance.contract, "Maximillion");
    assert_eq!(built.metadata.address, Some(built.instance.address));
    assert_eq!(
        built.world.metadata_at(&IndexPath::new(["Maximillion"])),
        Some(&built.metadata)
    );
    assert_eq!(built.world.version(), world.version() + 1);
}

#[tokio::test]
async fn non_address_argument_matches_no_fetcher_and_deploys_nothing() {
    let chain = Arc::new(RecordingChain::new());
    let ctx = context(chain.clone());
    let world = World::new("test");

    let err = build_maximillion(&ctx, &world, from(), &command("Deploy notAnAddress"))
        .await
        .unwrap_err();

    let BuildError::Dispatch(DispatchError::AmbiguousOrNoMatch { attempts, .. }) = err else {
        panic!("expected no match");
    };
    assert_eq!(attempts.len(), 1);
    let RejectReason::TypeMismatch { arg, mismatch } = &attempts[0].reason else {
        panic!("expected a type mismatch");
    };
    assert_eq!(arg, "oEther");
    assert_eq!(mismatch.fragment, "notAnAddress");

    assert!(chain.deploys().is_empty());
    assert!(world.contracts().is_empty());
}

#[tokio::test]
async fn network_failure_is_reraised_with_no_world_change() {
    let chain = Arc::new(FailingChain::default());
    let ctx = context(chain.clone());
    let world = World::new("test").with_event("earlier step");
    let before = world.clone();

    let err = build_maximillion(&ctx, &world, from(), &command(&format!("Deploy {O_ETHER}")))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::Invocation(InvocationError::Network(ref message)) if message == "connection refused"
    ));
    assert_eq!(chain.calls.load(Ordering::SeqCst), 1);
    assert_eq!(world, before);
}

#[tokio::test]
async fn address_can_name_a_stored_contract() {
    let ctx = context(Arc::new(RecordingChain::new()));
    let world = World::from_parts(
        "test",
        BTreeMap::new(),
        BTreeMap::from([(
            IndexPath::new(["Tokens", "oEther"]),
            ContractMetadata::new("oEther", "Ether market").with_address(o_ether()),
        )]),
    );

    let built = build_maximillion(&ctx, &world, from(), &command("Deploy Tokens.oEther"))
        .await
        .unwrap();
    assert_eq!(
        built.metadata.get("oEtherAddress"),
        Some(&Value::Address(o_ether()))
    );
}

#[tokio::test]
async fn trailing_input_is_tolerated_unless_strict() {
    let text = format!("Deploy {O_ETHER} with a note");
    let world = World::new("test");

    let lenient = context(Arc::new(RecordingChain::new()));
    assert!(build_maximillion(&lenient, &world, from(), &command(&text)).await.is_ok());

    let strict = context(Arc::new(RecordingChain::new())).with_dispatch(DispatchOptions {
        strict_catchall: true,
    });
    let err = build_maximillion(&strict, &world, from(), &command(&text))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::Dispatch(DispatchError::AmbiguousOrNoMatch { .. })
    ));
}

#[tokio::test]
async fn unknown_commands_and_namespaces_are_reported() {
    let ctx = context(Arc::new(RecordingChain::new()));
    let world = World::new("test");

    let upgrade = Event::parse("Maximillion Upgrade").unwrap();
    let err = process_contract_event(&ctx, &world, from(), &upgrade)
        .await
        .unwrap_err();
    assert!(matches!(err, ContractError::UnknownCommand { ref command, .. } if command == "Upgrade"));

    let comptroller = Event::parse("Comptroller Deploy").unwrap();
    let err = process_contract_event(&ctx, &world, from(), &comptroller)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown contract `Comptroller` (expected one of: Maximillion, PriceOracle)"
    );
}
