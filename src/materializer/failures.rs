use indexmap::{map::Entry, IndexMap, IndexSet};
use log::trace;

use crate::model::{
    graph::NodeIndex,
    module::{ModuleSelector, ResolveFailure},
};

/// Every failed request for one module selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenDependency {
    pub failure: ResolveFailure,
    pub required_by: IndexSet<NodeIndex>,
}

/// Collects failed edges keyed by the selector they requested, in first-seen order.
#[derive(Debug, Default)]
pub struct FailureAggregator {
    failures: IndexMap<ModuleSelector, BrokenDependency>,
}

impl FailureAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first failure registered for a selector is the one reported;
    /// later ones only contribute their requiring node.
    pub fn register(
        &mut self,
        requested: &ModuleSelector,
        failure: &ResolveFailure,
        required_by: NodeIndex,
    ) {
        let broken = match self.failures.entry(requested.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!("First failure for {}: {}", requested, failure);
                entry.insert(BrokenDependency {
                    failure: failure.clone(),
                    required_by: IndexSet::new(),
                })
            }
        };
        broken.required_by.insert(required_by);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn get(&self, requested: &ModuleSelector) -> Option<&BrokenDependency> {
        self.failures.get(requested)
    }

    pub fn into_failures(self) -> impl Iterator<Item = (ModuleSelector, BrokenDependency)> {
        self.failures.into_iter()
    }
}
