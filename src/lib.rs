//! testpool - grouped parallel test dispatch
//!
//! Distributes discovered test items across a bounded pool of workers,
//! honoring per-group execution strategies:
//!
//! - `free`: items run independently, one worker each
//! - `serial`: a group's items share one worker, in declaration order
//! - `isolated_free` / `isolated_serial`: as above, but nothing else may
//!   run concurrently with the group
//!
//! The embedding runner supplies the items and the execution entry point;
//! this crate owns classification, strategy ordering, admission control,
//! the drain barriers around isolated groups, cross-worker fixture
//! coordination, and run-wide failure aggregation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use testpool::{run, ItemReport, ItemRunner, MpConfig, WorkItem};
//!
//! struct MyRunner;
//!
//! #[async_trait::async_trait]
//! impl ItemRunner for MyRunner {
//!     async fn run(&self, item: &WorkItem, _next: Option<&WorkItem>) -> ItemReport {
//!         println!("running {}", item.name());
//!         ItemReport::passed()
//!     }
//! }
//!
//! # async fn demo() -> testpool::Result<()> {
//! let items = vec![
//!     WorkItem::new("alpha"),
//!     WorkItem::new("beta").with_group("db"),
//! ];
//! let outcome = run(items, &MpConfig::default(), Arc::new(MyRunner)).await?;
//! assert!(!outcome.failed);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod pool;
pub mod schedule;
pub mod utils;

pub use config::{EnvOverrides, MpConfig, WorkerCount};
pub use error::{Error, Result};
pub use executor::{DispatchEngine, ItemRunner, RunOutcome};
pub use models::{
    Batch, BatchSet, ExecutionPlan, GroupAnnotation, GroupInfo, ItemReport, Phase, PhaseReport,
    Strategy, WorkItem, UNGROUPED,
};
pub use pool::{SharedRunState, Trail};

/// Classify, order, and dispatch a collection of work items.
///
/// Configuration errors surface before any worker is spawned; the
/// returned outcome folds in the shared failure flag.
pub async fn run<R: ItemRunner>(
    items: Vec<WorkItem>,
    config: &MpConfig,
    runner: Arc<R>,
) -> Result<RunOutcome> {
    let batches = schedule::classify(items)?;
    let plan = schedule::plan(batches);
    let engine = DispatchEngine::new(runner, config.effective_workers());
    engine.run(plan).await
}
