//! Batch scheduling
//!
//! Classification of items into batches and ordering of batches into an
//! execution plan.

mod classify;
mod order;

pub use classify::classify;
pub use order::plan;
