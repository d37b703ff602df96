//! SYN-C execution engine
//!
//! This module provides the stepped interpreter:
//! - [`engine`]: the [`engine::Execution`] state machine and its step contract
//! - [`errors`]: runtime error types
//! - [`io`]: input queue and output sinks owned by the driver
//! - [`constants`]: address-space and host budget constants
//!
//! # Execution Model
//!
//! The engine never runs on its own. A driver calls
//! [`engine::Execution::advance`] repeatedly; every call performs work up to
//! the next step and returns, so several programs can be interleaved and
//! metered by elementary-operation count.
//!
//! # Built-in Functions
//!
//! The library (`PRINT`, `MALLOC`, `READ`, the math and cast functions) is
//! implemented in `builtins` as part of the call protocol rather than as
//! user-visible functions.

mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;
mod expressions;
pub mod io;
mod loops;
mod statements;

pub use engine::{Execution, ExecutionConfig, Flow, RunState, Step, StepKind};
pub use errors::RuntimeError;
