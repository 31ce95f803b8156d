//! Dispatch engine and collaborators for the lending scenario harness.
//!
//! This crate turns a parsed [`Command`] into exactly one side-effecting
//! call: it selects a fetcher by argument shape, coerces the arguments, and
//! runs the fetcher's handler against a [`Chain`].
//!
//! # Modules
//!
//! - [`fetcher`] -- [`Fetcher`] and [`Arg`] declarations and the
//!   [`get_fetcher_value`] dispatch engine.
//! - [`chain`] -- The [`Chain`] collaborator trait and the deterministic
//!   in-memory [`DevChain`].
//! - [`artifact`] -- Read-only registry of deployable contract interfaces.
//! - [`context`] -- The [`Context`] bundle handed to builders.
//! - [`config`] -- Configuration loading from YAML and the environment.
//!
//! [`Command`]: scenario_types::Command

pub mod artifact;
pub mod chain;
pub mod config;
pub mod context;
pub mod fetcher;

// Re-export primary types at crate root.
pub use artifact::{Artifact, ArtifactError, ArtifactRegistry};
pub use chain::{Chain, DevChain};
pub use config::{ConfigError, LogFormat, ScenarioConfig};
pub use context::Context;
pub use fetcher::{
    Arg, ArgError, DispatchError, DispatchOptions, Fetcher, FetcherArgs, RejectReason, Rejection,
    get_fetcher_value,
};
