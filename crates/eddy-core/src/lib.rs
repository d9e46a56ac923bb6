//! # Eddy Core
//!
//! Promise state machine and job records for the Eddy microtask scheduler.
//!
//! ## Design Principles
//!
//! - **Host-agnostic**: settling operations are parameterized by [`HostHooks`],
//!   the interface a scheduler implements to receive jobs and rejection
//!   notifications. The core never runs a handler itself; it only enqueues.
//! - **Deferred by construction**: registering a reaction never invokes a
//!   handler synchronously, even on an already-settled promise.
//! - **Single-assignment**: a promise settles at most once; the resolving
//!   latch makes every public settling entry point idempotent.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod host;
pub mod job;
pub mod promise;
pub mod thenable;
pub mod value;

pub use error::{PromiseError, type_error};
pub use host::{HostHooks, RejectionOperation};
pub use job::{Job, ReactionKind};
pub use promise::{Completion, Handler, Promise, PromiseState, Reaction, handler};
pub use thenable::Thenable;
pub use value::Value;
