//! Results of a benchmark run.

use crate::descriptor::UniqueId;
use crate::listener::ExecutionResult;
use serde::{Deserialize, Serialize};

/// The result of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOutcome {
    /// Id of the node.
    pub unique_id: UniqueId,
    /// How the node finished.
    pub result: ExecutionResult,
}

/// Every node result of a run, in finish order.
///
/// Children finish before their parent, so the engine root is always last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    outcomes: Vec<NodeOutcome>,
}

impl ExecutionSummary {
    pub(crate) fn from_outcomes(outcomes: Vec<NodeOutcome>) -> Self {
        Self { outcomes }
    }

    /// Returns all outcomes in finish order.
    #[must_use]
    pub fn outcomes(&self) -> &[NodeOutcome] {
        &self.outcomes
    }

    /// Returns the result of one node.
    #[must_use]
    pub fn result_for(&self, unique_id: &UniqueId) -> Option<&ExecutionResult> {
        self.outcomes
            .iter()
            .find(|outcome| &outcome.unique_id == unique_id)
            .map(|outcome| &outcome.result)
    }

    /// Number of successful nodes.
    #[must_use]
    pub fn successful_count(&self) -> usize {
        self.count(ExecutionResult::is_successful)
    }

    /// Number of failed nodes.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(ExecutionResult::is_failed)
    }

    /// Number of aborted nodes.
    #[must_use]
    pub fn aborted_count(&self) -> usize {
        self.count(|result| matches!(result, ExecutionResult::Aborted { .. }))
    }

    /// Returns true if no node failed.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.failed_count() == 0
    }

    fn count(&self, predicate: impl Fn(&ExecutionResult) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.result))
            .count()
    }
}
