//! Core data model
//!
//! Work items, group annotations, strategies, batches, and per-item
//! execution reports.

mod batch;
mod item;
mod report;
mod strategy;

pub use batch::{Batch, BatchSet, ExecutionPlan};
pub use item::{GroupAnnotation, GroupInfo, WorkItem};
pub use report::{ItemReport, Phase, PhaseReport};
pub use strategy::Strategy;

/// Name of the implicit batch for items without a group declaration.
pub const UNGROUPED: &str = "ungrouped";
