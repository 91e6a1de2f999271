//! Group classification
//!
//! Partitions discovered work items into named batches, resolving each
//! item's (group, strategy) pair and rejecting conflicting declarations
//! before anything is dispatched.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{BatchSet, GroupAnnotation, GroupInfo, Strategy, WorkItem, UNGROUPED};

/// Partition items into batches in discovery order.
///
/// The first strategy recorded for a group name is authoritative: a later
/// explicit declaration that differs is a configuration error naming the
/// group. Items without a declared strategy inherit the batch's, items
/// without a group join the implicit ungrouped free batch. Each item is
/// stamped with its resolved group metadata for downstream reporting.
pub fn classify(items: Vec<WorkItem>) -> Result<BatchSet> {
    let mut batches = BatchSet::new();

    for mut item in items {
        let (group, declared) = match item.annotation() {
            GroupAnnotation::Unset => (UNGROUPED.to_string(), None),
            GroupAnnotation::Named(name) => (name.clone(), None),
            GroupAnnotation::NamedWithStrategy(name, strategy) => (name.clone(), Some(*strategy)),
        };

        let strategy = match (batches.strategy_of(&group), declared) {
            (Some(existing), Some(requested)) if existing != requested => {
                return Err(Error::GroupStrategyConflict {
                    group,
                    existing,
                    requested,
                });
            }
            (Some(existing), _) => existing,
            (None, Some(requested)) => requested,
            (None, None) => Strategy::Free,
        };

        debug!(item = %item.name(), group = %group, strategy = %strategy, "classified");
        item.stamp(GroupInfo {
            group: group.clone(),
            strategy,
        });
        batches.push_item(&group, strategy, item);
    }

    info!(
        "classified {} items into {} batches",
        batches.total_items(),
        batches.len()
    );

    Ok(batches)
}
