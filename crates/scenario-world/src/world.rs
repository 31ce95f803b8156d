//! The immutable, versioned scenario world.
//!
//! A [`World`] is a snapshot. Every transition borrows the current world and
//! returns a successor with a version one higher; the predecessor is never
//! observed to change. Collections sit behind [`Arc`] and are cloned only
//! when a successor actually writes to them.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use scenario_types::EventId;
use serde::{Deserialize, Serialize};

use crate::contract::{ContractMetadata, ContractRecord, IndexPath};

/// An event that was applied to the world, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Unique, time-ordered id.
    pub id: EventId,
    /// Zero-based position in the log.
    pub sequence: u64,
    /// Canonical event text.
    pub text: String,
    /// When the event was appended.
    pub recorded_at: DateTime<Utc>,
}

/// A chain side effect folded into the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Human readable summary (`Added Maximillion (0x...)`).
    pub message: String,
    /// Transaction that caused it, when known.
    pub tx_hash: Option<B256>,
}

impl Action {
    /// Create an action record.
    pub fn new(message: impl Into<String>, tx_hash: Option<B256>) -> Self {
        Self {
            message: message.into(),
            tx_hash,
        }
    }
}

/// Snapshot of all scenario-visible state for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    network: String,
    version: u64,
    contracts: Arc<BTreeMap<String, ContractRecord>>,
    store: Arc<BTreeMap<IndexPath, ContractMetadata>>,
    event_log: Arc<Vec<LoggedEvent>>,
    actions: Arc<Vec<Action>>,
}

impl World {
    /// An empty world for `network` at version 0.
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            version: 0,
            contracts: Arc::default(),
            store: Arc::default(),
            event_log: Arc::default(),
            actions: Arc::default(),
        }
    }

    /// Rebuild a world from persisted contracts and store entries.
    pub fn from_parts(
        network: impl Into<String>,
        contracts: BTreeMap<String, ContractRecord>,
        store: BTreeMap<IndexPath, ContractMetadata>,
    ) -> Self {
        Self {
            contracts: Arc::new(contracts),
            store: Arc::new(store),
            ..Self::new(network)
        }
    }

    /// Network this world is bound to.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Number of transitions since the world was created.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Registered contracts by logical name.
    pub fn contracts(&self) -> &BTreeMap<String, ContractRecord> {
        &self.contracts
    }

    /// Stored metadata by index path.
    pub fn store(&self) -> &BTreeMap<IndexPath, ContractMetadata> {
        &self.store
    }

    /// Applied events in execution order.
    pub fn event_log(&self) -> &[LoggedEvent] {
        &self.event_log
    }

    /// Chain side effects in the order they were folded in.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Look up a contract by logical name.
    pub fn contract(&self, name: &str) -> Option<&ContractRecord> {
        self.contracts.get(name)
    }

    /// Look up stored metadata by index path.
    pub fn metadata_at(&self, path: &IndexPath) -> Option<&ContractMetadata> {
        self.store.get(path)
    }

    /// Resolve a logical contract name or a dotted index path to an address.
    ///
    /// Names are matched exactly first, then ignoring ASCII case.
    pub fn contract_address(&self, name_or_path: &str) -> Option<Address> {
        if let Some(record) = self.contracts.get(name_or_path) {
            return Some(record.address);
        }
        let by_case = self
            .contracts
            .values()
            .find(|record| record.name.eq_ignore_ascii_case(name_or_path));
        if let Some(record) = by_case {
            return Some(record.address);
        }
        name_or_path
            .parse::<IndexPath>()
            .ok()
            .and_then(|path| self.store.get(&path))
            .and_then(|metadata| metadata.address)
    }

    /// Successor with `text` appended to the event log.
    #[must_use]
    pub fn with_event(&self, text: impl Into<String>) -> Self {
        let mut next = self.successor();
        let sequence = u64::try_from(next.event_log.len()).unwrap_or(u64::MAX);
        Arc::make_mut(&mut next.event_log).push(LoggedEvent {
            id: EventId::new(),
            sequence,
            text: text.into(),
            recorded_at: Utc::now(),
        });
        next
    }

    /// Successor with `action` appended to the action log.
    #[must_use]
    pub fn with_action(&self, action: Action) -> Self {
        let mut next = self.successor();
        Arc::make_mut(&mut next.actions).push(action);
        next
    }

    /// Successor registering a contract and its store entries in one step.
    pub(crate) fn with_contract(
        &self,
        record: ContractRecord,
        entries: impl IntoIterator<Item = (IndexPath, ContractMetadata)>,
        action: Action,
    ) -> Self {
        let mut next = self.successor();
        Arc::make_mut(&mut next.contracts).insert(record.name.clone(), record);
        Arc::make_mut(&mut next.store).extend(entries);
        Arc::make_mut(&mut next.actions).push(action);
        next
    }

    fn successor(&self) -> Self {
        Self {
            version: self.version.saturating_add(1),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_is_empty() {
        let world = World::new("development");
        assert_eq!(world.network(), "development");
        assert_eq!(world.version(), 0);
        assert!(world.contracts().is_empty());
        assert!(world.store().is_empty());
        assert!(world.event_log().is_empty());
    }

    #[test]
    fn with_event_appends_in_order_without_touching_predecessor() {
        let first = World::new("development");
        let second = first.with_event("Maximillion Deploy 0x01");
        let third = second.with_event("PriceOracle Deploy Simple");

        assert!(first.event_log().is_empty());
        assert_eq!(second.event_log().len(), 1);
        assert_eq!(third.version(), 2);

        let texts: Vec<&str> = third.event_log().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["Maximillion Deploy 0x01", "PriceOracle Deploy Simple"]);
        let sequences: Vec<u64> = third.event_log().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, [0, 1]);
    }

    #[test]
    fn with_action_appends() {
        let world = World::new("development").with_action(Action::new("Set price", None));
        assert_eq!(world.actions().len(), 1);
        assert_eq!(world.version(), 1);
    }

    #[test]
    fn contract_address_resolves_names_and_paths() {
        let address = Address::repeat_byte(0x42);
        let record = ContractRecord {
            name: "Maximillion".to_owned(),
            address,
            contract: "Maximillion".to_owned(),
            tx_hash: None,
            block_number: None,
        };
        let metadata = ContractMetadata::new("oEther", "Ether market").with_address(address);
        let world = World::from_parts(
            "development",
            BTreeMap::from([("Maximillion".to_owned(), record)]),
            BTreeMap::from([(IndexPath::new(["Tokens", "oEther"]), metadata)]),
        );

        assert_eq!(world.contract_address("Maximillion"), Some(address));
        assert_eq!(world.contract_address("maximillion"), Some(address));
        assert_eq!(world.contract_address("Tokens.oEther"), Some(address));
        assert_eq!(world.contract_address("Tokens.oDai"), None);
        assert_eq!(world.contract_address(""), None);
    }
}
