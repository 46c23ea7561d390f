// src/dag/graph.rs

use std::collections::BTreeMap;

use crate::types::TaskId;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Tasks that must finish before this one when both are in a run.
    deps: Vec<TaskId>,
    /// Tasks ordered after this one.
    dependents: Vec<TaskId>,
}

/// In-memory ordering graph keyed by task id.
///
/// Acyclicity is validated in `config::validate`; here we only keep
/// adjacency information for scheduling and diagnostics.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: BTreeMap<TaskId, DagNode>,
}

impl DagGraph {
    /// Build a graph over `tasks` from `task -> [deps]` constraints.
    ///
    /// Constraints that mention a task outside `tasks` are ignored.
    pub fn new(tasks: &[TaskId], after: &BTreeMap<TaskId, Vec<TaskId>>) -> Self {
        let mut nodes: BTreeMap<TaskId, DagNode> =
            tasks.iter().map(|t| (*t, DagNode::default())).collect();

        for (task, deps) in after.iter() {
            if !nodes.contains_key(task) {
                continue;
            }
            for dep in deps {
                if !nodes.contains_key(dep) {
                    continue;
                }
                if let Some(node) = nodes.get_mut(task) {
                    node.deps.push(*dep);
                }
                if let Some(node) = nodes.get_mut(dep) {
                    node.dependents.push(*task);
                }
            }
        }

        Self { nodes }
    }

    /// All task ids, in stable order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.nodes.keys().copied()
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, task: TaskId) -> &[TaskId] {
        self.nodes
            .get(&task)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, task: TaskId) -> &[TaskId] {
        self.nodes
            .get(&task)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// The task itself followed by every transitive dependent.
    pub fn downstream_of(&self, task: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut stack = vec![task];
        while let Some(current) = stack.pop() {
            if out.contains(&current) {
                continue;
            }
            out.push(current);
            stack.extend(self.dependents_of(current).iter().copied());
        }
        out
    }

    /// True if any transitive dependency of `task` is in `set`.
    pub fn has_ancestor_in(&self, task: TaskId, set: &[TaskId]) -> bool {
        let mut stack: Vec<TaskId> = self.dependencies_of(task).to_vec();
        let mut visited = Vec::new();

        while let Some(current) = stack.pop() {
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            if set.contains(&current) {
                return true;
            }
            stack.extend(self.dependencies_of(current).iter().copied());
        }
        false
    }
}
