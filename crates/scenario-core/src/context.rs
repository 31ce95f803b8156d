//! Shared collaborators handed to every builder.

use std::fmt;
use std::sync::Arc;

use crate::artifact::{ArtifactError, ArtifactRegistry};
use crate::chain::{Chain, DevChain};
use crate::config::ScenarioConfig;
use crate::fetcher::DispatchOptions;

/// The chain, artifact registry, and dispatch options a builder runs with.
///
/// Cloning is cheap; collaborators are shared.
#[derive(Clone)]
pub struct Context {
    chain: Arc<dyn Chain>,
    artifacts: Arc<ArtifactRegistry>,
    dispatch: DispatchOptions,
}

impl Context {
    /// Bundle a chain and registry with default dispatch options.
    pub fn new(chain: Arc<dyn Chain>, artifacts: Arc<ArtifactRegistry>) -> Self {
        Self {
            chain,
            artifacts,
            dispatch: DispatchOptions::default(),
        }
    }

    /// A context backed by a [`DevChain`], configured from `config`.
    ///
    /// Artifacts from `artifacts.dir` are layered over the built-in set.
    pub fn development(config: &ScenarioConfig) -> Result<Self, ArtifactError> {
        let registry = match &config.artifacts.dir {
            Some(dir) => ArtifactRegistry::builtin().load_dir(dir)?,
            None => ArtifactRegistry::builtin(),
        };
        let artifacts = Arc::new(registry);
        let chain = Arc::new(DevChain::new(Arc::clone(&artifacts), config.dev_chain.seed));
        Ok(Self::new(chain, artifacts).with_dispatch(config.dispatch.into()))
    }

    /// Replace the dispatch options.
    #[must_use]
    pub const fn with_dispatch(mut self, dispatch: DispatchOptions) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// The chain collaborator.
    pub fn chain(&self) -> &Arc<dyn Chain> {
        &self.chain
    }

    /// The artifact registry.
    pub fn artifacts(&self) -> &ArtifactRegistry {
        &self.artifacts
    }

    /// Dispatch options for every fetcher lookup.
    pub const fn dispatch(&self) -> DispatchOptions {
        self.dispatch
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("artifacts", &self.artifacts.names().collect::<Vec<_>>())
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}
