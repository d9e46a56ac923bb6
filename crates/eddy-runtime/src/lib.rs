//! # Eddy Runtime
//!
//! The reference scheduler for `eddy-core` promises:
//! - FIFO job queue with a shared sequencer
//! - Run-to-completion drain loop with an optional per-drain budget
//! - HTML-shaped unhandled-rejection tracking
//! - Builder API for configuration
//!
//! Single-threaded and cooperative: all "concurrency" is deferred job
//! scheduling. The embedder decides when a checkpoint happens by calling
//! [`Runtime::run_until_idle`].

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod builder;
pub mod queue;
pub mod rejection;
pub mod runtime;

pub use builder::RuntimeBuilder;
pub use queue::{JobQueue, JobSequencer};
pub use rejection::{RejectionCallback, RejectionNotification, RejectionTracker};
pub use runtime::{PromiseWithResolvers, Runtime};

// Core surface, re-exported so embedders need a single dependency.
pub use eddy_core::{
    Completion, Handler, HostHooks, Job, Promise, PromiseError, PromiseState, Reaction,
    ReactionKind, RejectionOperation, Thenable, Value, handler, type_error,
};
