//! The runner boundary
//!
//! The dispatch engine executes items through this trait; discovery, the
//! actual test protocol, and result formatting live on the other side.

use async_trait::async_trait;

use crate::models::{ItemReport, WorkItem};

/// Execution entry point provided by the embedding runner
#[async_trait]
pub trait ItemRunner: Send + Sync + 'static {
    /// Run one item's full protocol. `next` is the item the runner should
    /// prepare for afterwards, supporting look-ahead teardown ordering.
    async fn run(&self, item: &WorkItem, next: Option<&WorkItem>) -> ItemReport;

    /// Session-level stop request. Checked after each completed unit of
    /// work; a worker seeing it raises an interruption instead of
    /// proceeding to its next item.
    fn stop_requested(&self) -> Option<String> {
        None
    }
}
