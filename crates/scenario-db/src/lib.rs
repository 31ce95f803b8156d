//! Deployment persistence for the lending scenario harness.
//!
//! After each successful step the runner flushes the current world to disk
//! so later runs against the same network can address contracts that were
//! deployed earlier.
//!
//! # Modules
//!
//! - [`network_store`] -- Per-network JSON files with atomic replacement
//! - [`error`] -- Shared error types

pub mod error;
pub mod network_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use network_store::NetworkStore;
