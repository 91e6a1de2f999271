//! Strategy ordering
//!
//! Produces the execution plan: batches sorted by isolation priority,
//! stable on discovery order. Scheduling isolated batches last means the
//! dispatcher's drain barriers never stall work that is allowed to
//! overlap.

use tracing::debug;

use crate::models::{BatchSet, ExecutionPlan};

/// Order batches into an execution plan.
pub fn plan(batches: BatchSet) -> ExecutionPlan {
    let mut ordered = batches.into_batches();
    ordered.sort_by_key(|b| b.strategy.priority());

    for batch in &ordered {
        debug!(batch = %batch.name, strategy = %batch.strategy, items = batch.len(), "planned");
    }

    ExecutionPlan::new(ordered)
}
