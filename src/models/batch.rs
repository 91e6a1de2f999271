//! Batches and execution plans
//!
//! A batch is a named group of work items sharing one strategy; the
//! execution plan is the ordered sequence of batches a run dispatches.

use std::collections::HashMap;

use super::{Strategy, WorkItem};

/// A named group of work items sharing one execution strategy
#[derive(Clone, Debug)]
pub struct Batch {
    pub name: String,
    pub strategy: Strategy,
    pub items: Vec<WorkItem>,
}

impl Batch {
    pub fn new(name: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            strategy,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Batches in discovery order, with by-name lookup
///
/// A batch's strategy is fixed when the batch is first created; the
/// classifier owns conflict detection.
#[derive(Clone, Debug, Default)]
pub struct BatchSet {
    batches: Vec<Batch>,
    index: HashMap<String, usize>,
}

impl BatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }

    pub fn get(&self, name: &str) -> Option<&Batch> {
        self.index.get(name).map(|&i| &self.batches[i])
    }

    pub fn strategy_of(&self, name: &str) -> Option<Strategy> {
        self.get(name).map(|b| b.strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    pub fn into_batches(self) -> Vec<Batch> {
        self.batches
    }

    pub(crate) fn push_item(&mut self, name: &str, strategy: Strategy, item: WorkItem) {
        let idx = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.batches.push(Batch::new(name, strategy));
                self.index.insert(name.to_string(), self.batches.len() - 1);
                self.batches.len() - 1
            }
        };
        self.batches[idx].items.push(item);
    }
}

/// The ordered sequence of batches to run. Immutable once built.
#[derive(Clone, Debug)]
pub struct ExecutionPlan {
    batches: Vec<Batch>,
}

impl ExecutionPlan {
    pub(crate) fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }
}
