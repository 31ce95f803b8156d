//! World state for the lending scenario harness.
//!
//! The world is the only state a scenario threads from step to step: the
//! contracts deployed so far, metadata stored under index paths, the log of
//! applied events, and the chain side effects they caused.
//!
//! # Modules
//!
//! - [`world`] -- The immutable, versioned [`World`] snapshot and its logs.
//! - [`contract`] -- Contract records, metadata, and dotted index paths.
//! - [`store`] -- [`store_and_save_contract`], folding a deployment into a
//!   successor world.
//! - [`error`] -- Error types for world transitions.

pub mod contract;
pub mod error;
pub mod store;
pub mod world;

// Re-export primary types at crate root.
pub use contract::{ContractMetadata, ContractRecord, IndexEntry, IndexPath};
pub use error::WorldError;
pub use store::store_and_save_contract;
pub use world::{Action, LoggedEvent, World};
