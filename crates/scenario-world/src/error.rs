//! Error types for the `scenario-world` crate.

/// Errors that can occur while folding results into a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A failed invocation was handed to a registration.
    #[error("cannot register {name}: invocation failed: {message}")]
    FailedInvocation {
        /// Logical contract name.
        name: String,
        /// Rendered invocation error.
        message: String,
    },

    /// A registration named an index path with no segments, or an empty one.
    #[error("cannot register {name}: index path is empty")]
    EmptyIndexPath {
        /// Logical contract name.
        name: String,
    },

    /// Dotted index path text could not be parsed.
    #[error("invalid index path `{0}`")]
    InvalidIndexPath(String),
}
