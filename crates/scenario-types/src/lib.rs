//! Shared type definitions for the lending scenario harness.
//!
//! Every other crate in the workspace speaks in these types: the argument
//! values coerced out of scenario text, the events and commands they come
//! from, and the invocation results chain calls return.
//!
//! # Modules
//!
//! - [`command`] -- Event fragments and verb/argument commands
//! - [`parse`] -- Tokenizer for the textual event syntax
//! - [`value`] -- Closed argument value model and per-kind coercion
//! - [`number`] -- Exact decimal numbers with a 256-bit mantissa
//! - [`invocation`] -- Captured chain-call results and receipts
//! - [`ids`] -- Time-ordered event ids

pub mod command;
pub mod ids;
pub mod invocation;
pub mod number;
pub mod parse;
pub mod value;

pub use command::{Command, CommandError, Event, Fragment};
pub use ids::EventId;
pub use invocation::{ContractInstance, Invocation, InvocationError, Receipt};
pub use number::{Number, NumberError};
pub use parse::ParseError;
pub use value::{MismatchReason, TypeMismatch, Value, ValueKind};
