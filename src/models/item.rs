//! Work item models
//!
//! A work item is an opaque unit of executable work: the embedding runner
//! understands how to execute it, this crate only schedules it.

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::error::{Error, Result};

/// Group declaration attached to a work item at collection time
///
/// Resolved once, so downstream code never has to guess how many values a
/// declaration supplied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum GroupAnnotation {
    /// No group declared; the item joins the implicit ungrouped batch.
    #[default]
    Unset,
    /// Group name only; the strategy is inherited from the batch.
    Named(String),
    /// Group name with an explicit strategy.
    NamedWithStrategy(String, Strategy),
}

impl GroupAnnotation {
    /// Resolve a raw declaration into an annotation.
    ///
    /// A declaration carries at most a group name and a strategy; anything
    /// beyond that is rejected, naming the offending item. A second value
    /// that is not a recognized strategy is rejected the same way.
    pub fn parse(item: &str, values: &[&str]) -> Result<Self> {
        match values {
            [] => Ok(GroupAnnotation::Unset),
            [name] => Ok(GroupAnnotation::Named((*name).to_string())),
            [name, strategy] => {
                let strategy = strategy
                    .parse::<Strategy>()
                    .map_err(|_| Error::GroupOverspecified(item.to_string()))?;
                Ok(GroupAnnotation::NamedWithStrategy(
                    (*name).to_string(),
                    strategy,
                ))
            }
            _ => Err(Error::GroupOverspecified(item.to_string())),
        }
    }

    /// Declared group name, if any.
    pub fn group(&self) -> Option<&str> {
        match self {
            GroupAnnotation::Unset => None,
            GroupAnnotation::Named(name) => Some(name),
            GroupAnnotation::NamedWithStrategy(name, _) => Some(name),
        }
    }

    /// Declared strategy, if any.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            GroupAnnotation::NamedWithStrategy(_, strategy) => Some(*strategy),
            _ => None,
        }
    }
}

/// Resolved (group, strategy) pair stamped onto an item by the classifier
///
/// Exposed so the reporting layer can attribute results to groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group: String,
    pub strategy: Strategy,
}

/// One discrete unit of executable work
#[derive(Clone, Debug)]
pub struct WorkItem {
    name: String,
    annotation: GroupAnnotation,
    resolved: Option<GroupInfo>,
}

impl WorkItem {
    /// Create an item with no group declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: GroupAnnotation::Unset,
            resolved: None,
        }
    }

    /// Declare the item's group, inheriting the group's strategy.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.annotation = GroupAnnotation::Named(group.into());
        self
    }

    /// Declare the item's group with an explicit strategy.
    pub fn with_group_strategy(mut self, group: impl Into<String>, strategy: Strategy) -> Self {
        self.annotation = GroupAnnotation::NamedWithStrategy(group.into(), strategy);
        self
    }

    /// Attach an already-resolved annotation.
    pub fn with_annotation(mut self, annotation: GroupAnnotation) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &GroupAnnotation {
        &self.annotation
    }

    /// Resolved group metadata, present once the item has been classified.
    pub fn group_info(&self) -> Option<&GroupInfo> {
        self.resolved.as_ref()
    }

    pub(crate) fn stamp(&mut self, info: GroupInfo) {
        self.resolved = Some(info);
    }
}
