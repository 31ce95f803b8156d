//! Registration of deployed contracts into the world.

use scenario_types::{ContractInstance, Invocation};
use tracing::debug;

use crate::contract::{ContractRecord, IndexEntry};
use crate::error::WorldError;
use crate::world::{Action, World};

/// Register a deployed contract under `name` and each requested index path.
///
/// Returns a successor of `world`; `world` itself is left as it was. The
/// successor's `contracts` gain `name -> instance`, its store gains one entry
/// per [`IndexEntry`], and its action log records the addition. Unrelated
/// contracts and store entries are carried over untouched.
///
/// Calling this twice with the same inputs yields equal worlds.
///
/// # Errors
///
/// Returns [`WorldError::FailedInvocation`] if `invocation` is a failure and
/// [`WorldError::EmptyIndexPath`] if any entry has an empty path. No
/// successor is produced in either case.
pub fn store_and_save_contract<T>(
    world: &World,
    instance: &ContractInstance,
    name: &str,
    invocation: &Invocation<T>,
    indices: Vec<IndexEntry>,
) -> Result<World, WorldError> {
    if let Some(error) = invocation.error() {
        return Err(WorldError::FailedInvocation {
            name: name.to_owned(),
            message: error.to_string(),
        });
    }
    if indices.iter().any(|entry| entry.path.is_empty()) {
        return Err(WorldError::EmptyIndexPath {
            name: name.to_owned(),
        });
    }

    let receipt = invocation.receipt();
    let record = ContractRecord {
        name: name.to_owned(),
        address: instance.address,
        contract: instance.contract.clone(),
        tx_hash: receipt.map(|r| r.tx_hash),
        block_number: receipt.map(|r| r.block_number),
    };
    let action = Action::new(
        format!("Added {name} ({:#x})", instance.address),
        record.tx_hash,
    );

    let index_count = indices.len();
    let next = world.with_contract(
        record,
        indices
            .into_iter()
            .map(|entry| (entry.path, entry.metadata)),
        action,
    );

    debug!(
        contract = name,
        address = %instance.address,
        indices = index_count,
        version = next.version(),
        "stored contract"
    );
    Ok(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::contract::{ContractMetadata, IndexPath};
    use alloy_primitives::{Address, B256};
    use scenario_types::{InvocationError, Receipt};

    fn deployed(byte: u8, contract: &str) -> (ContractInstance, Invocation<ContractInstance>) {
        let instance = ContractInstance::new(Address::repeat_byte(byte), contract);
        let receipt = Receipt {
            tx_hash: B256::repeat_byte(byte),
            block_number: u64::from(byte),
            from: Address::repeat_byte(0x01),
            to: None,
            contract_address: Some(instance.address),
        };
        (instance.clone(), Invocation::success(instance, Some(receipt)))
    }

    fn maximillion_entry(address: Address) -> IndexEntry {
        IndexEntry::new(
            IndexPath::new(["Maximillion"]),
            ContractMetadata::new("Maximillion", "Maximillion")
                .with_data("oEtherAddress", Address::repeat_byte(0xee))
                .with_address(address),
        )
    }

    #[test]
    fn registration_leaves_input_world_unchanged() {
        let world = World::new("development").with_event("setup");
        let before = world.clone();
        let (instance, invocation) = deployed(0x10, "Maximillion");

        let next = store_and_save_contract(
            &world,
            &instance,
            "Maximillion",
            &invocation,
            vec![maximillion_entry(instance.address)],
        )
        .unwrap();

        assert_eq!(world, before);
        assert!(world.contract("Maximillion").is_none());
        assert_eq!(next.version(), world.version() + 1);
    }

    #[test]
    fn registered_contract_is_retrievable_by_every_index() {
        let (instance, invocation) = deployed(0x10, "Maximillion");
        let metadata = maximillion_entry(instance.address).metadata;
        let entries = vec![
            IndexEntry::new(IndexPath::new(["Maximillion"]), metadata.clone()),
            IndexEntry::new(IndexPath::new(["Contracts", "Maximillion"]), metadata.clone()),
        ];

        let world = store_and_save_contract(
            &World::new("development"),
            &instance,
            "Maximillion",
            &invocation,
            entries,
        )
        .unwrap();

        for path in ["Maximillion", "Contracts.Maximillion"] {
            let path: IndexPath = path.parse().unwrap();
            assert_eq!(world.metadata_at(&path), Some(&metadata));
        }
        let record = world.contract("Maximillion").unwrap();
        assert_eq!(record.address, instance.address);
        assert_eq!(record.tx_hash, Some(B256::repeat_byte(0x10)));
        assert_eq!(world.actions().len(), 1);
        assert!(world.actions()[0].message.starts_with("Added Maximillion (0x1010"));
    }

    #[test]
    fn identical_calls_yield_equal_worlds() {
        let world = World::new("development");
        let (instance, invocation) = deployed(0x10, "Maximillion");
        let call = || {
            store_and_save_contract(
                &world,
                &instance,
                "Maximillion",
                &invocation,
                vec![maximillion_entry(instance.address)],
            )
            .unwrap()
        };
        assert_eq!(call(), call());
    }

    #[test]
    fn second_registration_keeps_unrelated_entries() {
        let (oracle, oracle_invocation) = deployed(0x20, "SimplePriceOracle");
        let oracle_entry = IndexEntry::new(
            IndexPath::new(["PriceOracle"]),
            ContractMetadata::new("PriceOracle", "Simple").with_address(oracle.address),
        );
        let world = store_and_save_contract(
            &World::new("development"),
            &oracle,
            "PriceOracle",
            &oracle_invocation,
            vec![oracle_entry.clone()],
        )
        .unwrap();

        let (max, max_invocation) = deployed(0x10, "Maximillion");
        let next = store_and_save_contract(
            &world,
            &max,
            "Maximillion",
            &max_invocation,
            vec![maximillion_entry(max.address)],
        )
        .unwrap();

        assert_eq!(
            next.metadata_at(&oracle_entry.path),
            Some(&oracle_entry.metadata)
        );
        assert_eq!(next.contract("PriceOracle"), world.contract("PriceOracle"));
        assert_eq!(next.contracts().len(), 2);
    }

    #[test]
    fn failed_invocation_is_rejected() {
        let instance = ContractInstance::new(Address::ZERO, "Maximillion");
        let invocation: Invocation<ContractInstance> =
            Invocation::failure(InvocationError::Network("timeout".to_owned()));
        let err = store_and_save_contract(
            &World::new("development"),
            &instance,
            "Maximillion",
            &invocation,
            vec![maximillion_entry(Address::ZERO)],
        )
        .unwrap_err();
        assert!(matches!(err, WorldError::FailedInvocation { .. }));
    }

    #[test]
    fn empty_index_path_is_rejected() {
        let (instance, invocation) = deployed(0x10, "Maximillion");
        let entry = IndexEntry::new(
            IndexPath::new(Vec::<String>::new()),
            ContractMetadata::new("Maximillion", "Maximillion"),
        );
        let err = store_and_save_contract(
            &World::new("development"),
            &instance,
            "Maximillion",
            &invocation,
            vec![entry],
        )
        .unwrap_err();
        assert_eq!(
            err,
            WorldError::EmptyIndexPath {
                name: "Maximillion".to_owned()
            }
        );
    }
}
