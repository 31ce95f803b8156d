//! Error types for scenario steps.
//!
//! Every variant carries the event text so a failure can be traced back to
//! the line that caused it.

use scenario_contracts::ContractError;
use scenario_db::DbError;
use scenario_types::ParseError;
use scenario_world::World;

/// Errors that can occur while applying one event.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The event text did not parse.
    #[error("cannot parse `{event}`: {source}")]
    Parse {
        /// Raw event text.
        event: String,
        /// The underlying parse error.
        source: ParseError,
    },

    /// Routing, dispatch, or the chain rejected the event.
    #[error("`{event}` failed: {source}")]
    Contract {
        /// Canonical event text.
        event: String,
        /// The underlying contract error.
        source: ContractError,
    },

    /// The successor world could not be saved.
    #[error("`{event}` applied but saving failed: {source}")]
    Persist {
        /// Canonical event text.
        event: String,
        /// The underlying persistence error.
        source: DbError,
    },
}

/// A scenario stopped at a failing step.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct ScenarioFailure {
    /// One-based line number of the failing event.
    pub line: usize,
    /// The failing step's error.
    pub source: StepError,
    /// The world after the last successful step.
    pub world: World,
}
