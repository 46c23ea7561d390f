// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::types::TaskId;

/// Triggers that arrived while an overlapping rebuild was running.
///
/// Every task triggered during the run is remembered exactly once; repeated
/// triggers for the same task coalesce. When the scheduler goes idle the
/// runtime calls `drain_pending()` and seeds the next run with all of them.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: BTreeSet<TaskId>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Record a trigger that must wait for the current run to finish.
    pub fn record_trigger(&mut self, task: TaskId) {
        let inserted = self.pending.insert(task);
        debug!(task = %task, inserted, "queued trigger for the next run");
    }

    /// Take every queued task, in task order.
    pub fn drain_pending(&mut self) -> Vec<TaskId> {
        let drained: Vec<TaskId> = std::mem::take(&mut self.pending).into_iter().collect();
        debug!(drained = drained.len(), "drained queued triggers into new run");
        drained
    }
}
