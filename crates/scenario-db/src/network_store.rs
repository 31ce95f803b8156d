//! JSON files holding each network's deployed contracts.
//!
//! One file per network, `<dir>/<network>.json`:
//!
//! ```text
//! {
//!   "network": "development",
//!   "contracts": { "<name>": ContractRecord, ... },
//!   "indices":   { "<dotted.path>": ContractMetadata, ... }
//! }
//! ```
//!
//! Writes go to a sibling temp file that is then renamed over the target,
//! so a crash mid-save leaves the previous file intact. Only contracts and
//! indices are persisted; event and action logs belong to a single run.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use scenario_world::{ContractMetadata, ContractRecord, IndexPath, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DbError;

#[derive(Serialize)]
struct NetworkFileRef<'a> {
    network: &'a str,
    contracts: &'a BTreeMap<String, ContractRecord>,
    indices: &'a BTreeMap<IndexPath, ContractMetadata>,
}

#[derive(Deserialize)]
struct NetworkFile {
    network: String,
    #[serde(default)]
    contracts: BTreeMap<String, ContractRecord>,
    #[serde(default)]
    indices: BTreeMap<IndexPath, ContractMetadata>,
}

/// Saves and restores worlds under a networks directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStore {
    dir: PathBuf,
}

impl NetworkStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the network files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for `network`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidNetwork`] if the name is empty or contains
    /// a path separator or `..`.
    pub fn path_for(&self, network: &str) -> Result<PathBuf, DbError> {
        if network.is_empty()
            || network.contains(['/', '\\'])
            || network == "."
            || network == ".."
        {
            return Err(DbError::InvalidNetwork(network.to_owned()));
        }
        Ok(self.dir.join(format!("{network}.json")))
    }

    /// Write the world's contracts and indices to its network file.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the directory or file cannot be written,
    /// or [`DbError::Serialization`] if encoding fails.
    pub async fn save(&self, world: &World) -> Result<PathBuf, DbError> {
        let path = self.path_for(world.network())?;
        let file = NetworkFileRef {
            network: world.network(),
            contracts: world.contracts(),
            indices: world.store(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(|source| DbError::Serialization {
            path: path.clone(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| DbError::Io {
                path: self.dir.clone(),
                source,
            })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| DbError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| DbError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(
            network = world.network(),
            version = world.version(),
            contracts = world.contracts().len(),
            path = %path.display(),
            "saved network"
        );
        Ok(path)
    }

    /// Restore the world saved for `network`.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet. The restored world
    /// starts at version 0 with empty event and action logs.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file exists but cannot be read,
    /// [`DbError::Serialization`] if it is not a valid network file, or
    /// [`DbError::NetworkMismatch`] if it records a different network.
    pub async fn load(&self, network: &str) -> Result<Option<World>, DbError> {
        let path = self.path_for(network)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DbError::Io { path, source }),
        };
        let file: NetworkFile =
            serde_json::from_slice(&bytes).map_err(|source| DbError::Serialization {
                path: path.clone(),
                source,
            })?;
        if file.network != network {
            return Err(DbError::NetworkMismatch {
                path,
                expected: network.to_owned(),
                found: file.network,
            });
        }

        info!(
            network,
            contracts = file.contracts.len(),
            indices = file.indices.len(),
            "loaded network"
        );
        Ok(Some(World::from_parts(network, file.contracts, file.indices)))
    }

    /// Restore `network`, or start an empty world if nothing was saved.
    ///
    /// # Errors
    ///
    /// Propagates any [`load`](Self::load) error.
    pub async fn load_or_new(&self, network: &str) -> Result<World, DbError> {
        Ok(self
            .load(network)
            .await?
            .unwrap_or_else(|| World::new(network)))
    }
}
