//! Read-only registry of deployable contract artifacts.
//!
//! An artifact names a contract and the value kinds its constructor and
//! methods take. The registry is built once at startup and shared behind an
//! `Arc`; nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use scenario_types::ValueKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors loading artifact files.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// An artifact file or directory could not be read.
    #[error("failed to read artifacts at {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact file was not valid JSON.
    #[error("failed to parse artifact {path}: {source}")]
    Json {
        /// Offending path.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },
}

/// Interface description of one deployable contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Contract name, as used by `deploy`.
    pub name: String,
    /// Constructor argument kinds.
    #[serde(default)]
    pub constructor: Vec<ValueKind>,
    /// Callable methods and their argument kinds.
    #[serde(default)]
    pub methods: BTreeMap<String, Vec<ValueKind>>,
}

impl Artifact {
    /// An artifact with the given constructor and no methods.
    pub fn new(name: impl Into<String>, constructor: Vec<ValueKind>) -> Self {
        Self {
            name: name.into(),
            constructor,
            methods: BTreeMap::new(),
        }
    }

    /// Add a method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>, inputs: Vec<ValueKind>) -> Self {
        self.methods.insert(method.into(), inputs);
        self
    }
}

/// Artifacts by contract name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, Artifact>,
}

impl ArtifactRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            artifacts: BTreeMap::new(),
        }
    }

    /// The contracts the bundled builders deploy.
    pub fn builtin() -> Self {
        Self::new()
            .with(Artifact::new("Maximillion", vec![ValueKind::Address]))
            .with(
                Artifact::new("SimplePriceOracle", vec![]).with_method(
                    "setUnderlyingPrice",
                    vec![ValueKind::Address, ValueKind::Number],
                ),
            )
            .with(Artifact::new("FixedPriceOracle", vec![ValueKind::Number]))
            .with(Artifact::new("NotPriceOracle", vec![]))
    }

    /// Add or replace an artifact.
    #[must_use]
    pub fn with(mut self, artifact: Artifact) -> Self {
        self.artifacts.insert(artifact.name.clone(), artifact);
        self
    }

    /// Look up an artifact by contract name.
    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    /// Registered contract names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    /// Extend this registry with every `*.json` artifact in `dir`.
    ///
    /// Files override built-in artifacts of the same name.
    pub fn load_dir(mut self, dir: &Path) -> Result<Self, ArtifactError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ArtifactError::Io { path, source }
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let contents = std::fs::read_to_string(&path).map_err(io_err(&path))?;
            let artifact: Artifact = serde_json::from_str(&contents)
                .map_err(|source| ArtifactError::Json {
                    path: path.clone(),
                    source,
                })?;
            debug!(artifact = %artifact.name, path = %path.display(), "loaded artifact");
            self = self.with(artifact);
        }
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_lending_artifacts() {
        let registry = ArtifactRegistry::builtin();
        assert_eq!(
            registry.get("Maximillion").map(|a| a.constructor.clone()),
            Some(vec![ValueKind::Address])
        );
        let oracle = registry.get("SimplePriceOracle").unwrap();
        assert!(oracle.methods.contains_key("setUnderlyingPrice"));
        assert!(registry.get("Comptroller").is_none());
    }

    #[test]
    fn load_dir_reads_json_and_overrides() {
        let dir = std::env::temp_dir().join(format!("artifacts-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("Comptroller.json"),
            r#"{"name": "Comptroller", "methods": {"_setPriceOracle": ["Address"]}}"#,
        )
        .unwrap();
        std::fs::write(dir.join("Maximillion.json"), r#"{"name": "Maximillion"}"#).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let registry = ArtifactRegistry::builtin().load_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let comptroller = registry.get("Comptroller").unwrap();
        assert_eq!(comptroller.methods["_setPriceOracle"], vec![ValueKind::Address]);
        assert!(registry.get("Maximillion").unwrap().constructor.is_empty());
    }

    #[test]
    fn load_dir_reports_bad_json() {
        let dir = std::env::temp_dir().join(format!("artifacts-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Broken.json"), "{").unwrap();

        let err = ArtifactRegistry::new().load_dir(&dir).unwrap_err();
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(err, ArtifactError::Json { .. }));
    }

    #[test]
    fn missing_dir_is_an_io_error() {
        let err = ArtifactRegistry::new()
            .load_dir(Path::new("/nonexistent/artifacts"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
