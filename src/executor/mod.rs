//! Execution engine
//!
//! The runner boundary and sequential/pooled batch dispatch.

mod dispatch;
mod runner;

pub use dispatch::{DispatchEngine, RunOutcome};
pub use runner::ItemRunner;
