//! Worker pool state and supervision
//!
//! The synchronization state shared across a run, the supervision loop
//! that reaps workers, and cross-worker fixture coordination.

mod signal;
mod state;
mod supervisor;
mod trail;

pub use signal::Signal;
pub use state::{SharedOutcome, SharedRunState, WorkerId};
pub use supervisor::{completion_channel, supervise, CompletionSender};
pub use trail::Trail;
