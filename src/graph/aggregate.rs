//! Memoized hour aggregates.

use super::{NodeId, ResourceGraph};
use crate::core::ResourceKind;
use serde_json::Value;

/// Numeric value of an `hours` field.
///
/// Anything that is not a JSON number (strings included, even numeric ones) counts as
/// zero.
#[must_use]
pub fn hours_value(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

impl ResourceGraph {
    /// Sum of the `hours` of the work entries directly under `task`.
    ///
    /// Computed once; later calls return the memoized total.
    pub fn task_hours(&mut self, task: NodeId) -> f64 {
        if let Some(total) = self.nodes[task.0].aggregate {
            return total;
        }
        let total = self
            .children_of(task, ResourceKind::WorkEntry)
            .map(|entry| hours_value(self.node(entry).partial().field("hours")))
            .sum();
        self.nodes[task.0].aggregate = Some(total);
        total
    }

    /// Sum of the task totals under `user`, normalized by the workload configuration.
    ///
    /// Computed once; later calls return the memoized value.
    pub fn user_workload(&mut self, user: NodeId) -> f64 {
        if let Some(total) = self.nodes[user.0].aggregate {
            return total;
        }
        let tasks: Vec<NodeId> = self.children_of(user, ResourceKind::Task).collect();
        let hours: f64 = tasks.into_iter().map(|task| self.task_hours(task)).sum();
        let total = self.workload.apply(hours);
        self.nodes[user.0].aggregate = Some(total);
        total
    }
}
