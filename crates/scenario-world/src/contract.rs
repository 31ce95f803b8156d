//! Records describing deployed contracts and the paths they are indexed by.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256};
use scenario_types::Value;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// A deployed contract registered under a logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Logical name (`Maximillion`, `PriceOracle`).
    pub name: String,
    /// Deployed address.
    pub address: Address,
    /// Artifact the contract was deployed from.
    pub contract: String,
    /// Deployment transaction, when the chain reported one.
    pub tx_hash: Option<B256>,
    /// Block the deployment landed in.
    pub block_number: Option<u64>,
}

/// Builder-supplied description of a contract, stored by index path.
///
/// Records are never modified once built: [`with_data`](Self::with_data) and
/// [`with_address`](Self::with_address) return new records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    /// Logical name of the contract.
    pub name: String,
    /// Human readable description, usually the constructor that built it.
    pub description: String,
    /// Deployed address, attached once deployment succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Arbitrary named data recorded by the builder.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}

impl ContractMetadata {
    /// Create a record with no address and no data.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            address: None,
            data: BTreeMap::new(),
        }
    }

    /// Return a record with `key` set to `value`.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Return a copy of this record bound to `address`.
    #[must_use]
    pub fn with_address(&self, address: Address) -> Self {
        Self {
            address: Some(address),
            ..self.clone()
        }
    }

    /// Look up a data entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// A dotted store key such as `Maximillion` or `Tokens.oEther`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexPath(Vec<String>);

impl IndexPath {
    /// Build a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether the path has no segments or any empty segment.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(String::is_empty)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for IndexPath {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = Self::new(s.split('.'));
        if path.is_empty() {
            return Err(WorldError::InvalidIndexPath(s.to_owned()));
        }
        Ok(path)
    }
}

impl TryFrom<String> for IndexPath {
    type Error = WorldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndexPath> for String {
    fn from(path: IndexPath) -> Self {
        path.to_string()
    }
}

/// One store entry requested by a builder: the path and the record to put there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Where to store the record.
    pub path: IndexPath,
    /// The record.
    pub metadata: ContractMetadata,
}

impl IndexEntry {
    /// Pair a path with a record.
    pub const fn new(path: IndexPath, metadata: ContractMetadata) -> Self {
        Self { path, metadata }
    }
}
